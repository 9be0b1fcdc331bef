//! Typewire Codegen
//!
//! Type-directed TypeScript export: every procedure's input and output
//! descriptors are resolved into interface declarations, a pair of
//! marshalling functions and a typed call stub.
//!
//! ```text
//! let artifact = Exporter::new(ExportOptions::default()).export(&procedures)?;
//! artifact.write_to("client/api.ts")?;
//! ```

pub mod emit;
pub mod exporter;
pub mod handlers;
pub mod names;

pub use emit::CodeBlock;
pub use exporter::{Artifact, Declaration, DeclarationKind, ExportOptions, Exporter, GeneratedFunction, PRELUDE};
pub use handlers::{Direction, Resolver};
pub use names::{check_identifier, is_identifier, DeclarationTable, NameRegistry};

use thiserror::Error;
use typewire_core::TypeDescriptor;

// =============================================================================
// Errors
// =============================================================================

/// Errors raised while exporting a procedure set.
#[derive(Debug, Error)]
pub enum ExportError {
    /// A descriptor no handler can represent.
    #[error("unsupported type `{descriptor}`: {reason}")]
    UnsupportedType {
        descriptor: Box<TypeDescriptor>,
        reason: String,
    },

    /// Two different declarations under one name.
    #[error("conflicting declarations for '{name}': `{existing}` and `{incoming}`")]
    NameConflict {
        name: String,
        existing: String,
        incoming: String,
    },

    #[error("'{0}' is not a valid TypeScript identifier")]
    InvalidName(String),

    #[error("procedure name '{0}' is exported twice")]
    DuplicateProcedure(String),

    #[error("in procedure '{name}'")]
    Procedure {
        name: String,
        #[source]
        source: Box<ExportError>,
    },

    #[error("in field '{record}.{field}'")]
    InField {
        record: String,
        field: String,
        #[source]
        source: Box<ExportError>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    pub fn unsupported(descriptor: &TypeDescriptor, reason: impl Into<String>) -> Self {
        ExportError::UnsupportedType {
            descriptor: Box::new(descriptor.clone()),
            reason: reason.into(),
        }
    }

    /// The innermost error, with procedure and field context stripped.
    pub fn root_cause(&self) -> &ExportError {
        match self {
            ExportError::Procedure { source, .. } | ExportError::InField { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// The offending descriptor, when the root cause is an unsupported type.
    pub fn descriptor(&self) -> Option<&TypeDescriptor> {
        match self.root_cause() {
            ExportError::UnsupportedType { descriptor, .. } => Some(descriptor),
            _ => None,
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self.root_cause(), ExportError::UnsupportedType { .. })
    }

    /// Procedure, record and field names from the outermost context inwards.
    pub fn context(&self) -> Vec<String> {
        let mut out = Vec::new();
        let mut current = self;
        loop {
            match current {
                ExportError::Procedure { name, source } => {
                    out.push(name.clone());
                    current = source;
                }
                ExportError::InField { record, field, source } => {
                    out.push(format!("{}.{}", record, field));
                    current = source;
                }
                _ => return out,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_cause_strips_context() {
        let err = ExportError::Procedure {
            name: "GetUser".into(),
            source: Box::new(ExportError::InField {
                record: "UserParams".into(),
                field: "amount".into(),
                source: Box::new(ExportError::unsupported(&TypeDescriptor::opaque("Decimal"), "no handler")),
            }),
        };
        assert!(err.is_unsupported());
        assert_eq!(err.descriptor(), Some(&TypeDescriptor::opaque("Decimal")));
        assert_eq!(err.context(), vec!["GetUser", "UserParams.amount"]);
        assert_eq!(err.to_string(), "in procedure 'GetUser'");
    }
}
