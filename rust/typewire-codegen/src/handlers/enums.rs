//! Enums render as named TypeScript enums whose members carry the wire
//! literals, so the values need no conversion.

use super::record::in_field;
use super::Resolver;
use crate::emit::CodeBlock;
use crate::names::check_identifier;
use crate::ExportError;
use typewire_core::EnumDef;

pub fn interface(resolver: &mut Resolver, def: &EnumDef) -> Result<String, ExportError> {
    check_identifier(&def.name)?;
    for member in &def.members {
        check_identifier(&member.name).map_err(|e| in_field(&def.name, &member.name, e))?;
    }
    resolver.names_mut().register_enum(&def.name, body(def))
}

/// `{RED = 1, BLUE = "blue"}`
pub fn body(def: &EnumDef) -> String {
    let members: Vec<String> = def
        .members
        .iter()
        .map(|m| format!("{} = {}", m.name, m.value))
        .collect();
    format!("{{{}}}", members.join(", "))
}

pub fn marshal(src: &str, dest: &str) -> CodeBlock {
    CodeBlock::identity(src, dest)
}
