//! Primitive scalars: rendered by lookup, marshalled as plain copies.

use crate::emit::CodeBlock;
use typewire_core::PrimitiveKind;

pub fn interface(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::String => "string",
        PrimitiveKind::Bool => "boolean",
        PrimitiveKind::Int | PrimitiveKind::Float => "number",
        PrimitiveKind::Any => "any",
        PrimitiveKind::AnyList => "Array<any>",
        PrimitiveKind::None => "undefined",
    }
}

pub fn marshal(src: &str, dest: &str) -> CodeBlock {
    CodeBlock::identity(src, dest)
}
