//! Procedure set documents.

use std::path::{Path, PathBuf};
use thiserror::Error;
use typewire_core::{ProcedureInfo, ProcedureSet};

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("cannot read schema '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid schema '{path}'")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub fn load_schema(path: &Path) -> Result<ProcedureSet, SchemaError> {
    let content = std::fs::read_to_string(path).map_err(|source| SchemaError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    ProcedureSet::from_json(&content).map_err(|source| SchemaError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// `GetUser(UserParams) -> UserDetails`
pub fn describe(info: &ProcedureInfo) -> String {
    format!("{}({}) -> {}", info.name, info.input, info.output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use typewire_core::TypeDescriptor;

    #[test]
    fn describe_procedure() {
        let info = ProcedureInfo::new(
            "GetTags",
            TypeDescriptor::record("TagQuery", [("since", TypeDescriptor::date())]),
            TypeDescriptor::list(TypeDescriptor::optional(TypeDescriptor::string())),
        );
        assert_eq!(describe(&info), "GetTags(TagQuery) -> list<optional<string>>");
    }

    #[test]
    fn missing_schema_reports_path() {
        let err = load_schema(Path::new("/nonexistent/procedures.json")).unwrap_err();
        assert!(matches!(err, SchemaError::Read { .. }));
        assert_eq!(err.to_string(), "cannot read schema '/nonexistent/procedures.json'");
    }
}
