//! Type descriptors: the closed vocabulary of schema shapes.
//!
//! A [`TypeDescriptor`] is one node of a procedure's input or output schema.
//! Descriptors are produced once per procedure (by service-side
//! introspection, or by deserializing a schema document) and are read-only
//! inputs to the TypeScript exporter and the service-side marshaller.
//!
//! Two variants exist only so that rejected shapes are representable:
//! [`TypeDescriptor::Union`] (accepted only when it normalizes to an optional)
//! and [`TypeDescriptor::Opaque`] (a service type nothing can represent).
//!
//! ## Serialized form
//!
//! ```text
//! {"kind": "record", "name": "User", "fields": [
//!     {"name": "uid", "type": {"kind": "primitive", "primitive": "string"}},
//!     {"name": "dob", "type": {"kind": "optional", "inner": {"kind": "temporal", "temporal": "date"}}}
//! ]}
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use strum::{Display, EnumString};
use thiserror::Error;

// =============================================================================
// Errors
// =============================================================================

/// A descriptor whose shape is structurally invalid for the supported grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("union of two or more non-none types is unsupported ({members} members)")]
    MultiTypeUnion { members: usize },
    #[error("variadic tuples expect exactly one element type, found {found}")]
    VariadicArity { found: usize },
    #[error("generic record '{name}' expects {expected} argument(s), found {found}")]
    GenericArity {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("'{name}' is not a record and cannot be instantiated")]
    NotGeneric { name: String },
    #[error("wrapper record '{name}' must have exactly one field, found {found}")]
    WrapperArity { name: String, found: usize },
}

// =============================================================================
// Leaf kinds
// =============================================================================

/// Scalar leaf kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PrimitiveKind {
    String,
    Bool,
    Int,
    Float,
    /// An untyped object (`dict` with no parameters).
    Any,
    /// An untyped array (bare `list` / `tuple`).
    AnyList,
    /// The absent value.
    None,
}

/// Leaves that need an explicit wire conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TemporalKind {
    Date,
    DateTime,
}

/// The literal carried by an enum member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnumLiteral {
    Int(i64),
    Float(f64),
    Str(String),
}

impl EnumLiteral {
    /// The literal as it appears on the wire.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            EnumLiteral::Int(n) => serde_json::Value::from(*n),
            EnumLiteral::Float(f) => serde_json::Value::from(*f),
            EnumLiteral::Str(s) => serde_json::Value::from(s.as_str()),
        }
    }

    /// Whether a wire value denotes this literal.
    pub fn matches(&self, value: &serde_json::Value) -> bool {
        match (self, value) {
            (EnumLiteral::Int(n), serde_json::Value::Number(num)) => num.as_i64() == Some(*n),
            (EnumLiteral::Float(f), serde_json::Value::Number(num)) => num.as_f64() == Some(*f),
            (EnumLiteral::Str(s), serde_json::Value::String(other)) => s == other,
            _ => false,
        }
    }
}

impl fmt::Display for EnumLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumLiteral::Int(n) => write!(f, "{}", n),
            EnumLiteral::Float(x) => write!(f, "{}", x),
            // JSON string syntax is also a valid TypeScript string literal.
            EnumLiteral::Str(s) => write!(f, "{}", serde_json::Value::from(s.as_str())),
        }
    }
}

// =============================================================================
// Named definitions
// =============================================================================

/// A named record field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A structured object type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDef {
    pub name: String,
    pub fields: Vec<Field>,
    /// A transparent record is a single-field wrapper alias: it renders and
    /// marshals as its field's type.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub transparent: bool,
}

impl RecordDef {
    /// The wrapped field of a transparent record, `None` for ordinary records.
    pub fn wrapped_field(&self) -> Result<Option<&Field>, DescriptorError> {
        if !self.transparent {
            return Ok(None);
        }
        match self.fields.as_slice() {
            [field] => Ok(Some(field)),
            _ => Err(DescriptorError::WrapperArity {
                name: self.name.clone(),
                found: self.fields.len(),
            }),
        }
    }
}

/// A record template whose fields may reference its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericRecordDef {
    pub name: String,
    pub params: Vec<String>,
    pub fields: Vec<Field>,
}

impl GenericRecordDef {
    /// The declaration name, e.g. `Page<T>`.
    pub fn declared_name(&self) -> String {
        format!("{}<{}>", self.name, self.params.join(", "))
    }
}

/// One enum member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumMember {
    pub name: String,
    pub value: EnumLiteral,
}

/// A closed set of literal values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumDef {
    pub name: String,
    pub members: Vec<EnumMember>,
}

impl EnumDef {
    pub fn member(&self, name: &str) -> Option<&EnumMember> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn member_for_literal(&self, value: &serde_json::Value) -> Option<&EnumMember> {
        self.members.iter().find(|m| m.value.matches(value))
    }
}

// =============================================================================
// TypeDescriptor
// =============================================================================

/// One node of a schema tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDescriptor {
    Primitive {
        primitive: PrimitiveKind,
    },
    Temporal {
        temporal: TemporalKind,
    },
    Record(RecordDef),
    GenericRecord(GenericRecordDef),
    GenericInstantiation {
        origin: Box<TypeDescriptor>,
        args: Vec<TypeDescriptor>,
    },
    GenericParam {
        name: String,
    },
    List {
        element: Box<TypeDescriptor>,
    },
    FixedTuple {
        items: Vec<TypeDescriptor>,
    },
    /// `tuple[T, ...]`; `items` holds the non-ellipsis arguments.
    VariadicTuple {
        items: Vec<TypeDescriptor>,
    },
    Mapping {
        key: Box<TypeDescriptor>,
        value: Box<TypeDescriptor>,
    },
    Optional {
        inner: Box<TypeDescriptor>,
    },
    Union {
        members: Vec<TypeDescriptor>,
    },
    Enum(EnumDef),
    Opaque {
        name: String,
    },
}

impl TypeDescriptor {
    pub fn primitive(kind: PrimitiveKind) -> Self {
        TypeDescriptor::Primitive { primitive: kind }
    }

    pub fn string() -> Self {
        Self::primitive(PrimitiveKind::String)
    }

    pub fn bool() -> Self {
        Self::primitive(PrimitiveKind::Bool)
    }

    pub fn int() -> Self {
        Self::primitive(PrimitiveKind::Int)
    }

    pub fn float() -> Self {
        Self::primitive(PrimitiveKind::Float)
    }

    pub fn any() -> Self {
        Self::primitive(PrimitiveKind::Any)
    }

    pub fn none() -> Self {
        Self::primitive(PrimitiveKind::None)
    }

    pub fn date() -> Self {
        TypeDescriptor::Temporal {
            temporal: TemporalKind::Date,
        }
    }

    pub fn date_time() -> Self {
        TypeDescriptor::Temporal {
            temporal: TemporalKind::DateTime,
        }
    }

    pub fn list(element: TypeDescriptor) -> Self {
        TypeDescriptor::List {
            element: Box::new(element),
        }
    }

    pub fn fixed_tuple(items: Vec<TypeDescriptor>) -> Self {
        TypeDescriptor::FixedTuple { items }
    }

    pub fn variadic_tuple(element: TypeDescriptor) -> Self {
        TypeDescriptor::VariadicTuple {
            items: vec![element],
        }
    }

    pub fn mapping(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        TypeDescriptor::Mapping {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn optional(inner: TypeDescriptor) -> Self {
        TypeDescriptor::Optional {
            inner: Box::new(inner),
        }
    }

    pub fn union(members: Vec<TypeDescriptor>) -> Self {
        TypeDescriptor::Union { members }
    }

    pub fn param(name: impl Into<String>) -> Self {
        TypeDescriptor::GenericParam { name: name.into() }
    }

    pub fn opaque(name: impl Into<String>) -> Self {
        TypeDescriptor::Opaque { name: name.into() }
    }

    pub fn record<N, F>(name: N, fields: impl IntoIterator<Item = (F, TypeDescriptor)>) -> Self
    where
        N: Into<String>,
        F: Into<String>,
    {
        TypeDescriptor::Record(RecordDef {
            name: name.into(),
            fields: fields.into_iter().map(|(n, ty)| Field::new(n, ty)).collect(),
            transparent: false,
        })
    }

    /// A transparent single-field wrapper record.
    pub fn wrapper(name: impl Into<String>, field: impl Into<String>, ty: TypeDescriptor) -> Self {
        TypeDescriptor::Record(RecordDef {
            name: name.into(),
            fields: vec![Field::new(field, ty)],
            transparent: true,
        })
    }

    pub fn generic_record<N, P, F>(
        name: N,
        params: impl IntoIterator<Item = P>,
        fields: impl IntoIterator<Item = (F, TypeDescriptor)>,
    ) -> Self
    where
        N: Into<String>,
        P: Into<String>,
        F: Into<String>,
    {
        TypeDescriptor::GenericRecord(GenericRecordDef {
            name: name.into(),
            params: params.into_iter().map(Into::into).collect(),
            fields: fields.into_iter().map(|(n, ty)| Field::new(n, ty)).collect(),
        })
    }

    pub fn instantiate(origin: TypeDescriptor, args: Vec<TypeDescriptor>) -> Self {
        TypeDescriptor::GenericInstantiation {
            origin: Box::new(origin),
            args,
        }
    }

    pub fn enumeration<N, M>(name: N, members: impl IntoIterator<Item = (M, EnumLiteral)>) -> Self
    where
        N: Into<String>,
        M: Into<String>,
    {
        TypeDescriptor::Enum(EnumDef {
            name: name.into(),
            members: members
                .into_iter()
                .map(|(name, value)| EnumMember {
                    name: name.into(),
                    value,
                })
                .collect(),
        })
    }

    pub fn is_none(&self) -> bool {
        matches!(
            self,
            TypeDescriptor::Primitive {
                primitive: PrimitiveKind::None
            }
        )
    }

    /// Replace generic parameter references using `bindings`.
    ///
    /// Record and generic record bodies are independent definitions and are
    /// left untouched; only structural positions (containers, unions and
    /// instantiation arguments) are rewritten.
    pub fn substitute(&self, bindings: &HashMap<&str, &TypeDescriptor>) -> TypeDescriptor {
        match self {
            TypeDescriptor::GenericParam { name } => match bindings.get(name.as_str()) {
                Some(bound) => (*bound).clone(),
                None => self.clone(),
            },
            TypeDescriptor::List { element } => Self::list(element.substitute(bindings)),
            TypeDescriptor::FixedTuple { items } => TypeDescriptor::FixedTuple {
                items: items.iter().map(|t| t.substitute(bindings)).collect(),
            },
            TypeDescriptor::VariadicTuple { items } => TypeDescriptor::VariadicTuple {
                items: items.iter().map(|t| t.substitute(bindings)).collect(),
            },
            TypeDescriptor::Mapping { key, value } => {
                Self::mapping(key.substitute(bindings), value.substitute(bindings))
            }
            TypeDescriptor::Optional { inner } => Self::optional(inner.substitute(bindings)),
            TypeDescriptor::Union { members } => TypeDescriptor::Union {
                members: members.iter().map(|t| t.substitute(bindings)).collect(),
            },
            TypeDescriptor::GenericInstantiation { origin, args } => TypeDescriptor::GenericInstantiation {
                origin: origin.clone(),
                args: args.iter().map(|t| t.substitute(bindings)).collect(),
            },
            _ => self.clone(),
        }
    }
}

// =============================================================================
// Shape normalization
// =============================================================================

/// The non-absent member of a union, provided the union is exactly `T | none`.
pub fn optional_member(members: &[TypeDescriptor]) -> Result<&TypeDescriptor, DescriptorError> {
    match members {
        [a, b] if b.is_none() && !a.is_none() => Ok(a),
        [a, b] if a.is_none() && !b.is_none() => Ok(b),
        _ => Err(DescriptorError::MultiTypeUnion {
            members: members.len(),
        }),
    }
}

/// The element type of a variadic tuple.
pub fn variadic_element(items: &[TypeDescriptor]) -> Result<&TypeDescriptor, DescriptorError> {
    match items {
        [element] => Ok(element),
        _ => Err(DescriptorError::VariadicArity { found: items.len() }),
    }
}

/// A generic record applied to concrete arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Instantiation {
    /// Bare origin name (`Page`, not `Page<T>`).
    pub name: String,
    /// Origin fields with parameters replaced by the arguments.
    pub fields: Vec<Field>,
}

/// Substitute `args` into the body of `origin`.
pub fn instantiate(origin: &TypeDescriptor, args: &[TypeDescriptor]) -> Result<Instantiation, DescriptorError> {
    match origin {
        TypeDescriptor::GenericRecord(def) => {
            if def.params.len() != args.len() {
                return Err(DescriptorError::GenericArity {
                    name: def.name.clone(),
                    expected: def.params.len(),
                    found: args.len(),
                });
            }
            let bindings: HashMap<&str, &TypeDescriptor> =
                def.params.iter().map(String::as_str).zip(args.iter()).collect();
            Ok(Instantiation {
                name: def.name.clone(),
                fields: def
                    .fields
                    .iter()
                    .map(|f| Field::new(f.name.clone(), f.ty.substitute(&bindings)))
                    .collect(),
            })
        }
        TypeDescriptor::Record(def) if args.is_empty() => Ok(Instantiation {
            name: def.name.clone(),
            fields: def.fields.clone(),
        }),
        TypeDescriptor::Record(def) => Err(DescriptorError::GenericArity {
            name: def.name.clone(),
            expected: 0,
            found: args.len(),
        }),
        other => Err(DescriptorError::NotGeneric {
            name: other.to_string(),
        }),
    }
}

// =============================================================================
// Display (diagnostics)
// =============================================================================

fn join(items: &[TypeDescriptor], sep: &str) -> String {
    items.iter().map(ToString::to_string).collect::<Vec<_>>().join(sep)
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Primitive { primitive } => write!(f, "{}", primitive),
            TypeDescriptor::Temporal { temporal } => write!(f, "{}", temporal),
            TypeDescriptor::Record(def) => write!(f, "{}", def.name),
            TypeDescriptor::GenericRecord(def) => write!(f, "{}", def.declared_name()),
            TypeDescriptor::GenericInstantiation { origin, args } => {
                let name = match origin.as_ref() {
                    TypeDescriptor::GenericRecord(def) => def.name.clone(),
                    other => other.to_string(),
                };
                write!(f, "{}<{}>", name, join(args, ", "))
            }
            TypeDescriptor::GenericParam { name } => write!(f, "{}", name),
            TypeDescriptor::List { element } => write!(f, "list<{}>", element),
            TypeDescriptor::FixedTuple { items } => write!(f, "tuple<{}>", join(items, ", ")),
            TypeDescriptor::VariadicTuple { items } => write!(f, "tuple<{}, ...>", join(items, ", ")),
            TypeDescriptor::Mapping { key, value } => write!(f, "dict<{}, {}>", key, value),
            TypeDescriptor::Optional { inner } => write!(f, "optional<{}>", inner),
            TypeDescriptor::Union { members } => write!(f, "union<{}>", join(members, " | ")),
            TypeDescriptor::Enum(def) => write!(f, "enum {}", def.name),
            TypeDescriptor::Opaque { name } => write!(f, "{}", name),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_member_accepts_either_order() {
        let members = vec![TypeDescriptor::none(), TypeDescriptor::string()];
        assert_eq!(optional_member(&members).unwrap(), &TypeDescriptor::string());
        let members = vec![TypeDescriptor::int(), TypeDescriptor::none()];
        assert_eq!(optional_member(&members).unwrap(), &TypeDescriptor::int());
    }

    #[test]
    fn optional_member_rejects_multi_type_unions() {
        let members = vec![TypeDescriptor::string(), TypeDescriptor::int()];
        assert_eq!(
            optional_member(&members),
            Err(DescriptorError::MultiTypeUnion { members: 2 })
        );
        let members = vec![TypeDescriptor::string(), TypeDescriptor::int(), TypeDescriptor::none()];
        assert!(optional_member(&members).is_err());
    }

    #[test]
    fn instantiate_substitutes_nested_params() {
        let tag = TypeDescriptor::generic_record(
            "Tag",
            ["T"],
            [
                ("value", TypeDescriptor::param("T")),
                ("history", TypeDescriptor::list(TypeDescriptor::param("T"))),
            ],
        );
        let inst = instantiate(&tag, &[TypeDescriptor::date()]).unwrap();
        assert_eq!(inst.name, "Tag");
        assert_eq!(inst.fields[0].ty, TypeDescriptor::date());
        assert_eq!(inst.fields[1].ty, TypeDescriptor::list(TypeDescriptor::date()));
    }

    #[test]
    fn instantiate_checks_arity() {
        let tag = TypeDescriptor::generic_record("Tag", ["T"], [("value", TypeDescriptor::param("T"))]);
        let err = instantiate(&tag, &[]).unwrap_err();
        assert!(matches!(err, DescriptorError::GenericArity { expected: 1, found: 0, .. }));
        assert!(matches!(
            instantiate(&TypeDescriptor::int(), &[]),
            Err(DescriptorError::NotGeneric { .. })
        ));
    }

    #[test]
    fn descriptor_serde_shape() {
        let desc = TypeDescriptor::record("User", [("dob", TypeDescriptor::optional(TypeDescriptor::date()))]);
        let json = serde_json::to_value(&desc).unwrap();
        assert_eq!(json["kind"], "record");
        assert_eq!(json["fields"][0]["type"]["kind"], "optional");
        assert_eq!(json["fields"][0]["type"]["inner"]["temporal"], "date");
        let back: TypeDescriptor = serde_json::from_value(json).unwrap();
        assert_eq!(back, desc);
    }

    #[test]
    fn display_names_the_shape() {
        let desc = TypeDescriptor::union(vec![TypeDescriptor::string(), TypeDescriptor::int()]);
        assert_eq!(desc.to_string(), "union<string | int>");
        let desc = TypeDescriptor::mapping(TypeDescriptor::int(), TypeDescriptor::date_time());
        assert_eq!(desc.to_string(), "dict<int, date_time>");
    }

    #[test]
    fn enum_literal_renders_as_typescript_literal() {
        assert_eq!(EnumLiteral::Int(3).to_string(), "3");
        assert_eq!(EnumLiteral::Str("red".into()).to_string(), "\"red\"");
        assert!(EnumLiteral::Str("red".into()).matches(&serde_json::json!("red")));
        assert!(!EnumLiteral::Int(1).matches(&serde_json::json!("1")));
    }
}
