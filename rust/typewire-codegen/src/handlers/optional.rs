//! Optional values and the one union shape that means the same thing.
//!
//! Absent values are `undefined` in memory and `null` (or missing) on the
//! wire; the guard keeps the inner conversion from touching them.

use super::{Direction, Resolver};
use crate::emit::CodeBlock;
use crate::ExportError;
use typewire_core::descriptor::optional_member;
use typewire_core::TypeDescriptor;

pub fn interface(resolver: &mut Resolver, inner: &TypeDescriptor) -> Result<String, ExportError> {
    Ok(format!("{} | undefined", resolver.resolve_interface(inner)?))
}

/// A `T | none` union, members rendered in declared order.
pub fn union_interface(
    resolver: &mut Resolver,
    desc: &TypeDescriptor,
    members: &[TypeDescriptor],
) -> Result<String, ExportError> {
    optional_member(members).map_err(|e| ExportError::unsupported(desc, e.to_string()))?;
    let rendered = members
        .iter()
        .map(|m| resolver.resolve_interface(m))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rendered.join(" | "))
}

pub fn marshal(
    resolver: &mut Resolver,
    inner: &TypeDescriptor,
    src: &str,
    dest: &str,
    direction: Direction,
) -> Result<CodeBlock, ExportError> {
    let inner_block = resolver.marshal(inner, src, dest, direction)?;
    let mut block = match direction {
        Direction::ToPrimitive => CodeBlock::line(format!("if ({} !== undefined) {{", src)),
        Direction::FromPrimitive => {
            CodeBlock::transform(format!("if ({} === null) {{ {} = undefined; }} else {{", src, dest))
        }
    };
    block.append(inner_block.indented());
    block.push_line("}");
    Ok(block)
}

pub fn union_marshal(
    resolver: &mut Resolver,
    desc: &TypeDescriptor,
    members: &[TypeDescriptor],
    src: &str,
    dest: &str,
    direction: Direction,
) -> Result<CodeBlock, ExportError> {
    let inner = optional_member(members).map_err(|e| ExportError::unsupported(desc, e.to_string()))?;
    marshal(resolver, inner, src, dest, direction)
}
