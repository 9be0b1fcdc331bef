//! Error context chaining for CLI diagnostics.
//!
//! Export failures nest (procedure, then field, then the unsupported
//! type); `ErrorChain` flattens a `source()` chain into indented
//! `caused by:` lines.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorChain {
    pub primary: String,
    /// Outermost first.
    pub causes: Vec<String>,
}

impl ErrorChain {
    pub fn new(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            causes: Vec::new(),
        }
    }

    pub fn add_cause(&mut self, cause: impl Into<String>) {
        self.causes.push(cause.into());
    }

    /// ```text
    /// <prefix> <primary>
    ///   caused by: <cause 1>
    ///   caused by: <cause 2>
    /// ```
    pub fn format_with_prefix(&self, prefix: &str) -> String {
        format!("{} {}", prefix, self)
    }
}

impl fmt::Display for ErrorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.primary)?;
        for cause in &self.causes {
            write!(f, "\n  caused by: {}", cause)?;
        }
        Ok(())
    }
}

/// Collect `err` and its `source()` chain.
pub fn chain_from_error(err: &dyn std::error::Error) -> ErrorChain {
    let mut chain = ErrorChain::new(err.to_string());
    let mut source = err.source();
    while let Some(cause) = source {
        chain.add_cause(cause.to_string());
        source = cause.source();
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use typewire_codegen::ExportError;
    use typewire_core::TypeDescriptor;

    #[test]
    fn single_error() {
        let chain = ErrorChain::new("schema not found");
        assert!(chain.causes.is_empty());
        assert_eq!(chain.format_with_prefix("error:"), "error: schema not found");
    }

    #[test]
    fn prefix_and_causes() {
        let mut chain = ErrorChain::new("export failed");
        chain.add_cause("unsupported type");
        assert_eq!(chain.format_with_prefix("warning:"), "warning: export failed\n  caused by: unsupported type");
    }

    #[test]
    fn export_error_context_becomes_causes() {
        let err = ExportError::Procedure {
            name: "GetPrice".into(),
            source: Box::new(ExportError::InField {
                record: "PriceQuery".into(),
                field: "amount".into(),
                source: Box::new(ExportError::unsupported(&TypeDescriptor::opaque("Decimal"), "no handler")),
            }),
        };
        let chain = chain_from_error(&err);
        assert_eq!(chain.primary, "in procedure 'GetPrice'");
        assert_eq!(
            chain.causes,
            vec!["in field 'PriceQuery.amount'", "unsupported type `Decimal`: no handler"]
        );
    }
}
