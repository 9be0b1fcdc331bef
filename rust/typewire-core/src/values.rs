//! Service-side in-memory values.

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;
use std::fmt;

/// A value as a procedure sees it, before marshalling to the primitive form.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent (`None` on the service side, `undefined` on the client).
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    /// Lists, fixed tuples and variadic tuples.
    List(Vec<Value>),
    /// Mapping entries in insertion order; keys may be any scalar value.
    Map(Vec<(Value, Value)>),
    Record(RecordValue),
    Enum(EnumValue),
    /// Untyped JSON carried through unchanged (`any` / `any_list`).
    Raw(serde_json::Value),
}

/// A record instance. A missing field reads as [`Value::Null`], and equality
/// treats the two the same.
#[derive(Debug, Clone)]
pub struct RecordValue {
    pub type_name: String,
    pub fields: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    pub type_name: String,
    pub member: String,
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    pub fn record<N, F>(type_name: N, fields: impl IntoIterator<Item = (F, Value)>) -> Self
    where
        N: Into<String>,
        F: Into<String>,
    {
        Value::Record(RecordValue {
            type_name: type_name.into(),
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        })
    }

    pub fn enum_member(type_name: impl Into<String>, member: impl Into<String>) -> Self {
        Value::Enum(EnumValue {
            type_name: type_name.into(),
            member: member.into(),
        })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_record(&self) -> Option<&RecordValue> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Vec<Value>> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Short name of the value's shape, used in marshalling errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::DateTime(_) => "date_time",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Record(_) => "record",
            Value::Enum(_) => "enum",
            Value::Raw(_) => "raw",
        }
    }
}

static NULL: Value = Value::Null;

impl RecordValue {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// The field's value, `Null` when absent.
    pub fn field(&self, field: &str) -> &Value {
        self.fields.get(field).unwrap_or(&NULL)
    }
}

impl PartialEq for RecordValue {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name
            && self
                .fields
                .keys()
                .chain(other.fields.keys())
                .all(|name| self.field(name) == other.field(name))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Date(d) => write!(f, "{}", d),
            Value::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            Value::List(items) => {
                let items: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
            Value::Map(entries) => {
                let entries: Vec<String> = entries.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                write!(f, "{{{}}}", entries.join(", "))
            }
            Value::Record(r) => {
                let fields: Vec<String> = r.fields.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                write!(f, "{}({})", r.type_name, fields.join(", "))
            }
            Value::Enum(e) => write!(f, "{}.{}", e.type_name, e.member),
            Value::Raw(json) => write!(f, "{}", json),
        }
    }
}
