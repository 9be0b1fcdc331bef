//! Generic parameters and instantiations.
//!
//! An instantiation such as `Tag<Date>` shares the single `Tag<T>`
//! declaration with every other instantiation of `Tag`, but gets its own
//! marshalling: the template's fields with parameters substituted.

use super::{record, Direction, Resolver};
use crate::emit::CodeBlock;
use crate::names::check_identifier;
use crate::ExportError;
use typewire_core::descriptor::instantiate;
use typewire_core::TypeDescriptor;

pub fn param_interface(name: &str) -> Result<String, ExportError> {
    check_identifier(name)?;
    Ok(name.to_string())
}

pub fn instantiation_interface(
    resolver: &mut Resolver,
    desc: &TypeDescriptor,
    origin: &TypeDescriptor,
    args: &[TypeDescriptor],
) -> Result<String, ExportError> {
    let instance = instantiate(origin, args).map_err(|e| ExportError::unsupported(desc, e.to_string()))?;
    let declared = resolver.resolve_interface(origin)?;
    if !matches!(origin, TypeDescriptor::GenericRecord(_)) {
        return Ok(declared);
    }
    let rendered = args
        .iter()
        .map(|arg| resolver.resolve_interface(arg))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!("{}<{}>", instance.name, rendered.join(", ")))
}

pub fn instantiation_marshal(
    resolver: &mut Resolver,
    desc: &TypeDescriptor,
    origin: &TypeDescriptor,
    args: &[TypeDescriptor],
    src: &str,
    dest: &str,
    direction: Direction,
) -> Result<CodeBlock, ExportError> {
    let instance = instantiate(origin, args).map_err(|e| ExportError::unsupported(desc, e.to_string()))?;
    match origin {
        TypeDescriptor::GenericRecord(_) => {
            record::fields_marshal(resolver, &instance.name, &instance.fields, src, dest, direction)
        }
        _ => resolver.marshal(origin, src, dest, direction),
    }
}
