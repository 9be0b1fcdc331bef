//! Lists and tuples.
//!
//! Homogeneous sequences (lists and `tuple[T, ...]`) convert element-wise
//! in a `for ... in` loop over a fresh index temporary. Fixed tuples convert
//! position by position. Either way, when no element conversion transforms,
//! the whole sequence is copied with a single assignment.

use super::{Direction, Resolver};
use crate::emit::CodeBlock;
use crate::ExportError;
use typewire_core::descriptor::variadic_element;
use typewire_core::TypeDescriptor;

// =============================================================================
// Lists and variadic tuples
// =============================================================================

pub fn list_interface(resolver: &mut Resolver, element: &TypeDescriptor) -> Result<String, ExportError> {
    Ok(format!("Array<{}>", resolver.resolve_interface(element)?))
}

pub fn variadic_interface(
    resolver: &mut Resolver,
    desc: &TypeDescriptor,
    items: &[TypeDescriptor],
) -> Result<String, ExportError> {
    let element = variadic_element(items).map_err(|e| ExportError::unsupported(desc, e.to_string()))?;
    list_interface(resolver, element)
}

pub fn list_marshal(
    resolver: &mut Resolver,
    element: &TypeDescriptor,
    src: &str,
    dest: &str,
    direction: Direction,
) -> Result<CodeBlock, ExportError> {
    let index = resolver.names_mut().next_temp("i");
    let inner = resolver.marshal(
        element,
        &format!("{}[{}]", src, index),
        &format!("{}[{}]", dest, index),
        direction,
    )?;
    if !inner.transforms() {
        return Ok(CodeBlock::identity(src, dest));
    }

    let mut block = CodeBlock::empty();
    if direction == Direction::ToPrimitive {
        block.push_line(format!("{} = []", dest));
    }
    block.push_line(format!("for (var {} in {}) {{", index, src));
    block.append(inner.indented());
    block.push_line("}");
    Ok(block)
}

pub fn variadic_marshal(
    resolver: &mut Resolver,
    desc: &TypeDescriptor,
    items: &[TypeDescriptor],
    src: &str,
    dest: &str,
    direction: Direction,
) -> Result<CodeBlock, ExportError> {
    let element = variadic_element(items).map_err(|e| ExportError::unsupported(desc, e.to_string()))?;
    list_marshal(resolver, element, src, dest, direction)
}

// =============================================================================
// Fixed tuples
// =============================================================================

pub fn tuple_interface(resolver: &mut Resolver, items: &[TypeDescriptor]) -> Result<String, ExportError> {
    let rendered = items
        .iter()
        .map(|item| resolver.resolve_interface(item))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!("[{}]", rendered.join(", ")))
}

pub fn tuple_marshal(
    resolver: &mut Resolver,
    items: &[TypeDescriptor],
    src: &str,
    dest: &str,
    direction: Direction,
) -> Result<CodeBlock, ExportError> {
    let mut positions = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        positions.push(resolver.marshal(item, &format!("{}[{}]", src, i), &format!("{}[{}]", dest, i), direction)?);
    }

    match direction {
        Direction::ToPrimitive => {
            let mut block = CodeBlock::line(format!("{} = []", dest));
            block.append(CodeBlock::concat(positions));
            if block.transforms() {
                Ok(block)
            } else {
                Ok(CodeBlock::identity(src, dest))
            }
        }
        Direction::FromPrimitive => Ok(CodeBlock::concat(positions)),
    }
}
