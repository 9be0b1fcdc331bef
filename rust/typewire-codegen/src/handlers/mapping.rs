//! Dictionaries.
//!
//! Keys travel as JSON object keys, so both key and value are converted
//! inside one loop: the source key temporary iterates, a second temporary
//! holds the converted key.
//!
//! Reading from primitives with a converted key moves each value to its new
//! slot before converting it there, so nested record and tuple writes land on
//! an existing object.

use super::{Direction, Resolver};
use crate::emit::CodeBlock;
use crate::ExportError;
use typewire_core::TypeDescriptor;

pub fn interface(resolver: &mut Resolver, key: &TypeDescriptor, value: &TypeDescriptor) -> Result<String, ExportError> {
    let key = resolver.resolve_interface(key)?;
    let value = resolver.resolve_interface(value)?;
    Ok(format!("{{ [k: {}]: {} }}", key, value))
}

pub fn marshal(
    resolver: &mut Resolver,
    key: &TypeDescriptor,
    value: &TypeDescriptor,
    src: &str,
    dest: &str,
    direction: Direction,
) -> Result<CodeBlock, ExportError> {
    let key_name = resolver.names_mut().next_temp("k");
    let prepared_key = resolver.names_mut().next_temp("k");

    let key_block = resolver.marshal(key, &key_name, &prepared_key, direction)?;
    let value_src = format!("{}[{}]", src, key_name);
    let value_dest = format!("{}[{}]", dest, prepared_key);
    let value_block = if direction == Direction::FromPrimitive && key_block.transforms() {
        let in_place = resolver.marshal(value, &value_dest, &value_dest, direction)?;
        if in_place.transforms() {
            CodeBlock::concat([CodeBlock::line(format!("{} = {}", value_dest, value_src)), in_place])
        } else {
            CodeBlock::identity(&value_src, &value_dest)
        }
    } else {
        resolver.marshal(value, &value_src, &value_dest, direction)?
    };
    if !key_block.transforms() && !value_block.transforms() {
        return Ok(CodeBlock::identity(src, dest));
    }

    let mut block = CodeBlock::line(format!("let {}: any;", prepared_key));
    if direction == Direction::ToPrimitive {
        block.push_line(format!("{} = {{}}", dest));
    }
    block.push_line(format!("for (var {} in {}) {{", key_name, src));
    block.append(key_block.indented());
    block.append(value_block.indented());
    block.push_line("}");
    Ok(block)
}
