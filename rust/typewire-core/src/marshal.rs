//! Service-side marshalling between [`Value`] and the JSON primitive form.
//!
//! This mirrors what the generated TypeScript does on the client: dates travel
//! as `YYYY-MM-DD`, date-times as RFC 3339 strings in UTC, mapping keys as
//! strings, enum members as their literals, and absent optional record fields
//! are omitted.
//!
//! Date-times keep every non-zero sub-second digit. An optional record field
//! that is missing and one holding [`Value::Null`] are the same value (see
//! [`RecordValue`]'s equality), so both round trip.

use crate::descriptor::{
    instantiate, optional_member, variadic_element, DescriptorError, Field, PrimitiveKind, TemporalKind,
    TypeDescriptor,
};
use crate::values::{EnumValue, RecordValue, Value};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::{json, Map, Number};
use std::collections::BTreeMap;
use thiserror::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MarshalError {
    #[error("{path}: expected {expected}, found {found}")]
    Mismatch {
        path: String,
        expected: String,
        found: String,
    },
    #[error("{path}: field required")]
    MissingField { path: String },
    #[error("{path}: invalid {kind} '{input}'")]
    InvalidLiteral {
        path: String,
        kind: String,
        input: String,
    },
    #[error("{path}: unsupported type {descriptor}: {reason}")]
    Unsupported {
        path: String,
        descriptor: String,
        reason: String,
    },
}

impl MarshalError {
    pub fn path(&self) -> &str {
        match self {
            MarshalError::Mismatch { path, .. }
            | MarshalError::MissingField { path }
            | MarshalError::InvalidLiteral { path, .. }
            | MarshalError::Unsupported { path, .. } => path,
        }
    }

    /// A JSON detail object for validation error responses.
    pub fn to_detail(&self) -> serde_json::Value {
        let kind = match self {
            MarshalError::Mismatch { .. } => "type_mismatch",
            MarshalError::MissingField { .. } => "missing",
            MarshalError::InvalidLiteral { .. } => "invalid_literal",
            MarshalError::Unsupported { .. } => "unsupported",
        };
        json!({
            "loc": self.path().split('.').collect::<Vec<_>>(),
            "msg": self.to_string(),
            "type": kind,
        })
    }
}

fn mismatch(path: &str, expected: impl Into<String>, found: impl Into<String>) -> MarshalError {
    MarshalError::Mismatch {
        path: path.to_string(),
        expected: expected.into(),
        found: found.into(),
    }
}

fn unsupported(path: &str, desc: &TypeDescriptor, reason: impl Into<String>) -> MarshalError {
    MarshalError::Unsupported {
        path: path.to_string(),
        descriptor: desc.to_string(),
        reason: reason.into(),
    }
}

fn descriptor_error(path: &str, desc: &TypeDescriptor, err: DescriptorError) -> MarshalError {
    unsupported(path, desc, err.to_string())
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Whether a record field of this type may be omitted on the wire.
fn accepts_absent(desc: &TypeDescriptor) -> bool {
    match desc {
        TypeDescriptor::Optional { .. } => true,
        TypeDescriptor::Union { members } => optional_member(members).is_ok(),
        other => other.is_none(),
    }
}

/// The fields a record-like descriptor marshals, or `None` for non-records.
fn record_fields(desc: &TypeDescriptor, path: &str) -> Result<Option<(String, Vec<Field>)>, MarshalError> {
    match desc {
        TypeDescriptor::Record(def) => Ok(Some((def.name.clone(), def.fields.clone()))),
        TypeDescriptor::GenericRecord(def) => Ok(Some((def.name.clone(), def.fields.clone()))),
        TypeDescriptor::GenericInstantiation { origin, args } => {
            let inst = instantiate(origin, args).map_err(|e| descriptor_error(path, desc, e))?;
            Ok(Some((inst.name, inst.fields)))
        }
        _ => Ok(None),
    }
}

// =============================================================================
// Value -> primitive
// =============================================================================

/// Convert an in-memory value into its JSON primitive form.
pub fn to_primitive(desc: &TypeDescriptor, value: &Value) -> Result<serde_json::Value, MarshalError> {
    to_primitive_at(desc, value, "$")
}

/// Like [`to_primitive`], reporting errors under `root` instead of `$`.
pub fn to_primitive_under(desc: &TypeDescriptor, value: &Value, root: &str) -> Result<serde_json::Value, MarshalError> {
    to_primitive_at(desc, value, root)
}

fn to_primitive_at(desc: &TypeDescriptor, value: &Value, path: &str) -> Result<serde_json::Value, MarshalError> {
    match desc {
        TypeDescriptor::Primitive { primitive } => primitive_out(*primitive, value, path),
        TypeDescriptor::Temporal { temporal } => match (temporal, value) {
            (TemporalKind::Date, Value::Date(d)) => Ok(json!(d.format(DATE_FORMAT).to_string())),
            (TemporalKind::DateTime, Value::DateTime(dt)) => {
                Ok(json!(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)))
            }
            (kind, other) => Err(mismatch(path, kind.to_string(), other.kind_name())),
        },
        TypeDescriptor::Record(def) => {
            if let Some(field) = def.wrapped_field().map_err(|e| descriptor_error(path, desc, e))? {
                return to_primitive_at(&field.ty, value, path);
            }
            record_out(&def.fields, value, path)
        }
        TypeDescriptor::GenericRecord(_) | TypeDescriptor::GenericInstantiation { .. } => {
            match record_fields(desc, path)? {
                Some((_, fields)) => record_out(&fields, value, path),
                None => Err(unsupported(path, desc, "not a record")),
            }
        }
        TypeDescriptor::GenericParam { .. } => {
            Err(unsupported(path, desc, "generic parameter outside an instantiation"))
        }
        TypeDescriptor::List { element } => sequence_out(element, value, path),
        TypeDescriptor::VariadicTuple { items } => {
            let element = variadic_element(items).map_err(|e| descriptor_error(path, desc, e))?;
            sequence_out(element, value, path)
        }
        TypeDescriptor::FixedTuple { items } => match value {
            Value::List(values) if values.len() == items.len() => items
                .iter()
                .zip(values)
                .enumerate()
                .map(|(i, (ty, v))| to_primitive_at(ty, v, &format!("{}[{}]", path, i)))
                .collect::<Result<Vec<_>, _>>()
                .map(serde_json::Value::Array),
            Value::List(values) => Err(mismatch(
                path,
                format!("tuple of {}", items.len()),
                format!("tuple of {}", values.len()),
            )),
            other => Err(mismatch(path, "tuple", other.kind_name())),
        },
        TypeDescriptor::Mapping { key, value: value_ty } => match value {
            Value::Map(entries) => {
                let mut out = Map::new();
                for (k, v) in entries {
                    let key_path = format!("{}[{}]", path, k);
                    let key_json = to_primitive_at(key, k, &key_path)?;
                    let key_str = match key_json {
                        serde_json::Value::String(s) => s,
                        serde_json::Value::Number(n) => n.to_string(),
                        serde_json::Value::Bool(b) => b.to_string(),
                        other => return Err(mismatch(&key_path, "scalar key", json_kind(&other))),
                    };
                    out.insert(key_str, to_primitive_at(value_ty, v, &key_path)?);
                }
                Ok(serde_json::Value::Object(out))
            }
            other => Err(mismatch(path, "map", other.kind_name())),
        },
        TypeDescriptor::Optional { inner } => optional_out(inner, value, path),
        TypeDescriptor::Union { members } => {
            let inner = optional_member(members).map_err(|e| descriptor_error(path, desc, e))?;
            optional_out(inner, value, path)
        }
        TypeDescriptor::Enum(def) => match value {
            Value::Enum(EnumValue { type_name, member }) if *type_name == def.name => def
                .member(member)
                .map(|m| m.value.to_json())
                .ok_or_else(|| mismatch(path, format!("member of {}", def.name), member.clone())),
            other => Err(mismatch(path, format!("enum {}", def.name), other.to_string())),
        },
        TypeDescriptor::Opaque { .. } => Err(unsupported(path, desc, "no representation")),
    }
}

fn primitive_out(kind: PrimitiveKind, value: &Value, path: &str) -> Result<serde_json::Value, MarshalError> {
    match (kind, value) {
        (PrimitiveKind::String, Value::String(s)) => Ok(json!(s)),
        (PrimitiveKind::Bool, Value::Bool(b)) => Ok(json!(b)),
        (PrimitiveKind::Int, Value::Int(n)) => Ok(json!(n)),
        (PrimitiveKind::Float, Value::Int(n)) => Ok(json!(*n as f64)),
        (PrimitiveKind::Float, Value::Float(f)) => Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .ok_or_else(|| MarshalError::InvalidLiteral {
                path: path.to_string(),
                kind: "float".to_string(),
                input: f.to_string(),
            }),
        (PrimitiveKind::Any, Value::Raw(json)) => Ok(json.clone()),
        (PrimitiveKind::AnyList, Value::Raw(json @ serde_json::Value::Array(_))) => Ok(json.clone()),
        (PrimitiveKind::None, Value::Null) => Ok(serde_json::Value::Null),
        (kind, other) => Err(mismatch(path, kind.to_string(), other.kind_name())),
    }
}

fn record_out(fields: &[Field], value: &Value, path: &str) -> Result<serde_json::Value, MarshalError> {
    let record = match value {
        Value::Record(r) => r,
        other => return Err(mismatch(path, "record", other.kind_name())),
    };
    let mut out = Map::new();
    for field in fields {
        let field_path = format!("{}.{}", path, field.name);
        match record.get(&field.name) {
            None | Some(Value::Null) if accepts_absent(&field.ty) => {}
            None => return Err(MarshalError::MissingField { path: field_path }),
            Some(v) => {
                out.insert(field.name.clone(), to_primitive_at(&field.ty, v, &field_path)?);
            }
        }
    }
    Ok(serde_json::Value::Object(out))
}

fn sequence_out(element: &TypeDescriptor, value: &Value, path: &str) -> Result<serde_json::Value, MarshalError> {
    match value {
        Value::List(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| to_primitive_at(element, v, &format!("{}[{}]", path, i)))
            .collect::<Result<Vec<_>, _>>()
            .map(serde_json::Value::Array),
        other => Err(mismatch(path, "list", other.kind_name())),
    }
}

fn optional_out(inner: &TypeDescriptor, value: &Value, path: &str) -> Result<serde_json::Value, MarshalError> {
    match value {
        Value::Null => Ok(serde_json::Value::Null),
        other => to_primitive_at(inner, other, path),
    }
}

// =============================================================================
// Primitive -> value
// =============================================================================

/// Convert a JSON primitive into an in-memory value.
pub fn from_primitive(desc: &TypeDescriptor, json: &serde_json::Value) -> Result<Value, MarshalError> {
    from_primitive_at(desc, json, "$")
}

/// Like [`from_primitive`], reporting errors under `root` instead of `$`.
pub fn from_primitive_under(desc: &TypeDescriptor, json: &serde_json::Value, root: &str) -> Result<Value, MarshalError> {
    from_primitive_at(desc, json, root)
}

fn from_primitive_at(desc: &TypeDescriptor, json: &serde_json::Value, path: &str) -> Result<Value, MarshalError> {
    match desc {
        TypeDescriptor::Primitive { primitive } => primitive_in(*primitive, json, path),
        TypeDescriptor::Temporal { temporal } => {
            let raw = json
                .as_str()
                .ok_or_else(|| mismatch(path, temporal.to_string(), json_kind(json)))?;
            let invalid = || MarshalError::InvalidLiteral {
                path: path.to_string(),
                kind: temporal.to_string(),
                input: raw.to_string(),
            };
            match temporal {
                TemporalKind::Date => NaiveDate::parse_from_str(raw, DATE_FORMAT)
                    .map(Value::Date)
                    .map_err(|_| invalid()),
                TemporalKind::DateTime => DateTime::parse_from_rfc3339(raw)
                    .map(|dt| Value::DateTime(dt.with_timezone(&Utc)))
                    .map_err(|_| invalid()),
            }
        }
        TypeDescriptor::Record(def) => {
            if let Some(field) = def.wrapped_field().map_err(|e| descriptor_error(path, desc, e))? {
                return from_primitive_at(&field.ty, json, path);
            }
            record_in(&def.name, &def.fields, json, path)
        }
        TypeDescriptor::GenericRecord(_) | TypeDescriptor::GenericInstantiation { .. } => {
            match record_fields(desc, path)? {
                Some((name, fields)) => record_in(&name, &fields, json, path),
                None => Err(unsupported(path, desc, "not a record")),
            }
        }
        TypeDescriptor::GenericParam { .. } => {
            Err(unsupported(path, desc, "generic parameter outside an instantiation"))
        }
        TypeDescriptor::List { element } => sequence_in(element, json, path),
        TypeDescriptor::VariadicTuple { items } => {
            let element = variadic_element(items).map_err(|e| descriptor_error(path, desc, e))?;
            sequence_in(element, json, path)
        }
        TypeDescriptor::FixedTuple { items } => match json {
            serde_json::Value::Array(values) if values.len() == items.len() => items
                .iter()
                .zip(values)
                .enumerate()
                .map(|(i, (ty, v))| from_primitive_at(ty, v, &format!("{}[{}]", path, i)))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            serde_json::Value::Array(values) => Err(mismatch(
                path,
                format!("tuple of {}", items.len()),
                format!("array of {}", values.len()),
            )),
            other => Err(mismatch(path, "tuple", json_kind(other))),
        },
        TypeDescriptor::Mapping { key, value } => match json {
            serde_json::Value::Object(entries) => {
                let mut out = Vec::with_capacity(entries.len());
                for (raw_key, raw_value) in entries {
                    let key_path = format!("{}[{}]", path, raw_key);
                    let key_json = parse_key(key, raw_key, &key_path)?;
                    out.push((
                        from_primitive_at(key, &key_json, &key_path)?,
                        from_primitive_at(value, raw_value, &key_path)?,
                    ));
                }
                Ok(Value::Map(out))
            }
            other => Err(mismatch(path, "object", json_kind(other))),
        },
        TypeDescriptor::Optional { inner } => optional_in(inner, json, path),
        TypeDescriptor::Union { members } => {
            let inner = optional_member(members).map_err(|e| descriptor_error(path, desc, e))?;
            optional_in(inner, json, path)
        }
        TypeDescriptor::Enum(def) => def
            .member_for_literal(json)
            .map(|m| Value::enum_member(def.name.clone(), m.name.clone()))
            .ok_or_else(|| mismatch(path, format!("member of {}", def.name), json.to_string())),
        TypeDescriptor::Opaque { .. } => Err(unsupported(path, desc, "no representation")),
    }
}

fn primitive_in(kind: PrimitiveKind, json: &serde_json::Value, path: &str) -> Result<Value, MarshalError> {
    match (kind, json) {
        (PrimitiveKind::String, serde_json::Value::String(s)) => Ok(Value::String(s.clone())),
        (PrimitiveKind::Bool, serde_json::Value::Bool(b)) => Ok(Value::Bool(*b)),
        (PrimitiveKind::Int, serde_json::Value::Number(n)) => n.as_i64().map(Value::Int).ok_or_else(|| {
            MarshalError::InvalidLiteral {
                path: path.to_string(),
                kind: "int".to_string(),
                input: n.to_string(),
            }
        }),
        (PrimitiveKind::Float, serde_json::Value::Number(n)) => n.as_f64().map(Value::Float).ok_or_else(|| {
            MarshalError::InvalidLiteral {
                path: path.to_string(),
                kind: "float".to_string(),
                input: n.to_string(),
            }
        }),
        (PrimitiveKind::Any, other) => Ok(Value::Raw(other.clone())),
        (PrimitiveKind::AnyList, list @ serde_json::Value::Array(_)) => Ok(Value::Raw(list.clone())),
        (PrimitiveKind::None, serde_json::Value::Null) => Ok(Value::Null),
        (kind, other) => Err(mismatch(path, kind.to_string(), json_kind(other))),
    }
}

fn record_in(name: &str, fields: &[Field], json: &serde_json::Value, path: &str) -> Result<Value, MarshalError> {
    let object = json
        .as_object()
        .ok_or_else(|| mismatch(path, format!("record {}", name), json_kind(json)))?;
    let mut values = BTreeMap::new();
    for field in fields {
        let field_path = format!("{}.{}", path, field.name);
        let value = match object.get(&field.name) {
            Some(raw) => from_primitive_at(&field.ty, raw, &field_path)?,
            None if accepts_absent(&field.ty) => Value::Null,
            None => return Err(MarshalError::MissingField { path: field_path }),
        };
        values.insert(field.name.clone(), value);
    }
    Ok(Value::Record(RecordValue {
        type_name: name.to_string(),
        fields: values,
    }))
}

fn sequence_in(element: &TypeDescriptor, json: &serde_json::Value, path: &str) -> Result<Value, MarshalError> {
    match json {
        serde_json::Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| from_primitive_at(element, v, &format!("{}[{}]", path, i)))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        other => Err(mismatch(path, "array", json_kind(other))),
    }
}

fn optional_in(inner: &TypeDescriptor, json: &serde_json::Value, path: &str) -> Result<Value, MarshalError> {
    match json {
        serde_json::Value::Null => Ok(Value::Null),
        other => from_primitive_at(inner, other, path),
    }
}

/// Object keys are always strings on the wire; recover the key's primitive
/// form from its descriptor.
fn parse_key(key: &TypeDescriptor, raw: &str, path: &str) -> Result<serde_json::Value, MarshalError> {
    let invalid = |kind: &str| MarshalError::InvalidLiteral {
        path: path.to_string(),
        kind: kind.to_string(),
        input: raw.to_string(),
    };
    match key {
        TypeDescriptor::Primitive {
            primitive: PrimitiveKind::Int,
        } => raw.parse::<i64>().map(|n| json!(n)).map_err(|_| invalid("int")),
        TypeDescriptor::Primitive {
            primitive: PrimitiveKind::Float,
        } => raw
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(serde_json::Value::Number)
            .ok_or_else(|| invalid("float")),
        TypeDescriptor::Primitive {
            primitive: PrimitiveKind::Bool,
        } => raw.parse::<bool>().map(|b| json!(b)).map_err(|_| invalid("bool")),
        TypeDescriptor::Enum(def) => {
            let as_str = json!(raw);
            if def.member_for_literal(&as_str).is_some() {
                return Ok(as_str);
            }
            serde_json::from_str::<Number>(raw)
                .map(serde_json::Value::Number)
                .map_err(|_| invalid("enum key"))
        }
        _ => Ok(json!(raw)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
