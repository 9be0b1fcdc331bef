//! Declaration deduplication and temporary identifiers.

use crate::ExportError;
use std::collections::HashMap;
use tracing::debug;

/// ASCII TypeScript identifier: `[A-Za-z_$][A-Za-z0-9_$]*`.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Names that end up verbatim in generated code must be identifiers.
pub fn check_identifier(name: &str) -> Result<(), ExportError> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(ExportError::InvalidName(name.to_string()))
    }
}

/// Insertion-ordered `name -> rendered body` table.
#[derive(Debug, Clone, Default)]
pub struct DeclarationTable {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl DeclarationTable {
    /// Enter `name` once. Re-entering an identical body is a no-op; a
    /// different body is a [`ExportError::NameConflict`].
    pub fn register(&mut self, name: &str, body: String) -> Result<(), ExportError> {
        if let Some(&i) = self.index.get(name) {
            let existing = &self.entries[i].1;
            if *existing == body {
                return Ok(());
            }
            return Err(ExportError::NameConflict {
                name: name.to_string(),
                existing: existing.clone(),
                incoming: body,
            });
        }
        self.index.insert(name.to_string(), self.entries.len());
        self.entries.push((name.to_string(), body));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.index.get(name).map(|&i| self.entries[i].1.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, b)| (n.as_str(), b.as_str()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Per-export registry: interface and enum tables plus the temp counter.
#[derive(Debug, Default)]
pub struct NameRegistry {
    interfaces: DeclarationTable,
    enums: DeclarationTable,
    counter: usize,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a record interface and return the name to reference it by.
    pub fn register_interface(&mut self, name: &str, body: String) -> Result<String, ExportError> {
        if !self.interfaces.contains(name) {
            debug!(interface = name, "registered interface");
        }
        self.interfaces.register(name, body)?;
        Ok(name.to_string())
    }

    pub fn register_enum(&mut self, name: &str, body: String) -> Result<String, ExportError> {
        if !self.enums.contains(name) {
            debug!(enumeration = name, "registered enum");
        }
        self.enums.register(name, body)?;
        Ok(name.to_string())
    }

    pub fn interfaces(&self) -> &DeclarationTable {
        &self.interfaces
    }

    pub fn enums(&self) -> &DeclarationTable {
        &self.enums
    }

    /// A fresh identifier such as `i0` or `k3`. All prefixes share one
    /// counter, so names never repeat within an export.
    pub fn next_temp(&mut self, prefix: &str) -> String {
        let name = format!("{}{}", prefix, self.counter);
        self.counter += 1;
        name
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty() && self.enums.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers() {
        assert!(is_identifier("GetUser"));
        assert!(is_identifier("_v2$"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("2fa"));
        assert!(!is_identifier("get-user"));
        assert!(!is_identifier("User Params"));
        assert!(matches!(check_identifier("a.b"), Err(ExportError::InvalidName(n)) if n == "a.b"));
    }

    #[test]
    fn identical_registration_is_idempotent() {
        let mut names = NameRegistry::new();
        names.register_interface("User", "{uid: string}".into()).unwrap();
        names.register_interface("User", "{uid: string}".into()).unwrap();
        assert_eq!(names.interfaces().len(), 1);
        assert_eq!(names.interfaces().get("User"), Some("{uid: string}"));
    }

    #[test]
    fn conflicting_registration_errors() {
        let mut names = NameRegistry::new();
        names.register_enum("Color", "{RED = 1}".into()).unwrap();
        let err = names.register_enum("Color", "{RED = 2}".into()).unwrap_err();
        assert!(matches!(err, ExportError::NameConflict { ref name, .. } if name == "Color"));
        assert_eq!(names.enums().get("Color"), Some("{RED = 1}"));
    }

    #[test]
    fn tables_keep_insertion_order() {
        let mut table = DeclarationTable::default();
        for name in ["Zeta", "Alpha", "Mid"] {
            table.register(name, "{}".into()).unwrap();
        }
        assert_eq!(table.names(), vec!["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn temps_share_one_counter() {
        let mut names = NameRegistry::new();
        assert_eq!(names.next_temp("i"), "i0");
        assert_eq!(names.next_temp("k"), "k1");
        assert_eq!(names.next_temp("k"), "k2");
        assert_eq!(names.next_temp("i"), "i3");
    }
}
