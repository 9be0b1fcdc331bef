//! Procedure metadata consumed by exporters.

use crate::descriptor::TypeDescriptor;
use crate::rpc::RpcError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A procedure's transport name and its input/output schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcedureInfo {
    pub name: String,
    pub input: TypeDescriptor,
    pub output: TypeDescriptor,
}

impl ProcedureInfo {
    pub fn new(name: impl Into<String>, input: TypeDescriptor, output: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            input,
            output,
        }
    }
}

/// Supplies the registered procedures, in registration order.
pub trait MetadataProvider {
    fn procedures(&self) -> Vec<ProcedureInfo>;
}

/// A serialized procedure set, as written by service-side introspection.
///
/// ```text
/// {"procedures": [{"name": "GetUser", "input": {...}, "output": {...}}]}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawProcedureSet")]
pub struct ProcedureSet {
    procedures: Vec<ProcedureInfo>,
}

#[derive(Deserialize)]
struct RawProcedureSet {
    #[serde(default)]
    procedures: Vec<ProcedureInfo>,
}

impl TryFrom<RawProcedureSet> for ProcedureSet {
    type Error = RpcError;

    fn try_from(raw: RawProcedureSet) -> Result<Self, Self::Error> {
        let mut set = ProcedureSet::new();
        for info in raw.procedures {
            set.insert(info)?;
        }
        Ok(set)
    }
}

impl ProcedureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a procedure, rejecting a transport name that is already taken.
    pub fn insert(&mut self, info: ProcedureInfo) -> Result<(), RpcError> {
        if self.procedures.iter().any(|p| p.name == info.name) {
            return Err(RpcError::DuplicateProcedure(info.name));
        }
        self.procedures.push(info);
        Ok(())
    }

    pub fn with(mut self, info: ProcedureInfo) -> Result<Self, RpcError> {
        self.insert(info)?;
        Ok(self)
    }

    /// Parse a JSON procedure set document.
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn names(&self) -> HashSet<&str> {
        self.procedures.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProcedureInfo> {
        self.procedures.iter()
    }

    pub fn len(&self) -> usize {
        self.procedures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }
}

impl MetadataProvider for ProcedureSet {
    fn procedures(&self) -> Vec<ProcedureInfo> {
        self.procedures.clone()
    }
}

impl MetadataProvider for Vec<ProcedureInfo> {
    fn procedures(&self) -> Vec<ProcedureInfo> {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_names_are_rejected_on_load() {
        let doc = r#"{"procedures": [
            {"name": "Ping", "input": {"kind": "primitive", "primitive": "none"}, "output": {"kind": "primitive", "primitive": "string"}},
            {"name": "Ping", "input": {"kind": "primitive", "primitive": "none"}, "output": {"kind": "primitive", "primitive": "bool"}}
        ]}"#;
        let err = ProcedureSet::from_json(doc).unwrap_err();
        assert!(err.to_string().contains("non unique procedure name 'Ping'"));
    }

    #[test]
    fn load_preserves_order() {
        let set = ProcedureSet::new()
            .with(ProcedureInfo::new("B", TypeDescriptor::none(), TypeDescriptor::none()))
            .unwrap()
            .with(ProcedureInfo::new("A", TypeDescriptor::none(), TypeDescriptor::none()))
            .unwrap();
        let reloaded = ProcedureSet::from_json(&set.to_json_pretty()).unwrap();
        let names: Vec<_> = reloaded.iter().map(|p| p.name.clone()).collect();
        assert_eq!(names, vec!["B", "A"]);
    }
}
