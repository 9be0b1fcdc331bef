//! Type descriptor resolution.
//!
//! Each descriptor shape has a handler module that can render the shape as
//! a TypeScript type expression and emit the statements converting a value
//! of that shape between its in-memory and primitive (JSON) forms. Handlers
//! are consulted in a fixed priority order:
//!
//! | Order | Handler | Shapes |
//! |---|---|---|
//! | 1 | [`scalar`] | primitives |
//! | 2 | [`temporal`] | dates, date-times |
//! | 3 | [`sequence`] | lists, variadic tuples |
//! | 4 | [`sequence`] | fixed tuples |
//! | 5 | [`mapping`] | dictionaries |
//! | 6 | [`enums`] | enums |
//! | 7 | [`optional`] | optionals, `T | none` unions |
//! | 8 | [`generic`] | generic parameters, instantiations |
//! | 9 | [`record`] | records, generic records |
//!
//! The descriptor enum is closed, so dispatch is a single `match`; shapes
//! with no handler become [`ExportError::UnsupportedType`].

pub mod enums;
pub mod generic;
pub mod mapping;
pub mod optional;
pub mod record;
pub mod scalar;
pub mod sequence;
pub mod temporal;

use crate::emit::CodeBlock;
use crate::names::NameRegistry;
use crate::ExportError;
use tracing::trace;
use typewire_core::TypeDescriptor;

/// Which way a marshalling block converts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// In-memory TypeScript value to JSON-ready primitive.
    ToPrimitive,
    /// Decoded JSON to in-memory TypeScript value.
    FromPrimitive,
}

/// Resolves descriptors against one [`NameRegistry`].
#[derive(Debug, Default)]
pub struct Resolver {
    names: NameRegistry,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn names(&self) -> &NameRegistry {
        &self.names
    }

    pub fn names_mut(&mut self) -> &mut NameRegistry {
        &mut self.names
    }

    pub fn into_names(self) -> NameRegistry {
        self.names
    }

    /// Render `desc` as a TypeScript type expression, registering any named
    /// declarations it needs.
    pub fn resolve_interface(&mut self, desc: &TypeDescriptor) -> Result<String, ExportError> {
        match desc {
            TypeDescriptor::Primitive { primitive } => Ok(scalar::interface(*primitive).to_string()),
            TypeDescriptor::Temporal { .. } => Ok(temporal::interface().to_string()),
            TypeDescriptor::List { element } => sequence::list_interface(self, element),
            TypeDescriptor::VariadicTuple { items } => sequence::variadic_interface(self, desc, items),
            TypeDescriptor::FixedTuple { items } => sequence::tuple_interface(self, items),
            TypeDescriptor::Mapping { key, value } => mapping::interface(self, key, value),
            TypeDescriptor::Enum(def) => enums::interface(self, def),
            TypeDescriptor::Optional { inner } => optional::interface(self, inner),
            TypeDescriptor::Union { members } => optional::union_interface(self, desc, members),
            TypeDescriptor::GenericParam { name } => generic::param_interface(name),
            TypeDescriptor::GenericInstantiation { origin, args } => {
                generic::instantiation_interface(self, desc, origin, args)
            }
            TypeDescriptor::Record(def) => record::interface(self, desc, def),
            TypeDescriptor::GenericRecord(def) => record::generic_interface(self, def),
            TypeDescriptor::Opaque { name } => Err(ExportError::unsupported(
                desc,
                format!("no handler can represent '{}'", name),
            )),
        }
    }

    /// Statements converting the in-memory value at `src` into its primitive
    /// form at `dest`.
    pub fn to_primitive(&mut self, desc: &TypeDescriptor, src: &str, dest: &str) -> Result<CodeBlock, ExportError> {
        self.marshal(desc, src, dest, Direction::ToPrimitive)
    }

    /// Statements converting the primitive value at `src` into its in-memory
    /// form at `dest`.
    pub fn from_primitive(&mut self, desc: &TypeDescriptor, src: &str, dest: &str) -> Result<CodeBlock, ExportError> {
        self.marshal(desc, src, dest, Direction::FromPrimitive)
    }

    pub fn marshal(
        &mut self,
        desc: &TypeDescriptor,
        src: &str,
        dest: &str,
        direction: Direction,
    ) -> Result<CodeBlock, ExportError> {
        trace!(descriptor = %desc, src, dest, ?direction, "marshal");
        match desc {
            TypeDescriptor::Primitive { .. } => Ok(scalar::marshal(src, dest)),
            TypeDescriptor::Temporal { temporal } => Ok(temporal::marshal(*temporal, src, dest, direction)),
            TypeDescriptor::List { element } => sequence::list_marshal(self, element, src, dest, direction),
            TypeDescriptor::VariadicTuple { items } => {
                sequence::variadic_marshal(self, desc, items, src, dest, direction)
            }
            TypeDescriptor::FixedTuple { items } => sequence::tuple_marshal(self, items, src, dest, direction),
            TypeDescriptor::Mapping { key, value } => mapping::marshal(self, key, value, src, dest, direction),
            TypeDescriptor::Enum(_) => Ok(enums::marshal(src, dest)),
            TypeDescriptor::Optional { inner } => optional::marshal(self, inner, src, dest, direction),
            TypeDescriptor::Union { members } => optional::union_marshal(self, desc, members, src, dest, direction),
            TypeDescriptor::GenericParam { name } => Err(ExportError::unsupported(
                desc,
                format!("generic parameter '{}' has no concrete type to marshal", name),
            )),
            TypeDescriptor::GenericInstantiation { origin, args } => {
                generic::instantiation_marshal(self, desc, origin, args, src, dest, direction)
            }
            TypeDescriptor::Record(def) => record::marshal(self, desc, def, src, dest, direction),
            TypeDescriptor::GenericRecord(def) => Err(ExportError::unsupported(
                desc,
                format!("generic record '{}' must be instantiated before it can be marshalled", def.name),
            )),
            TypeDescriptor::Opaque { name } => Err(ExportError::unsupported(
                desc,
                format!("no handler can represent '{}'", name),
            )),
        }
    }
}
