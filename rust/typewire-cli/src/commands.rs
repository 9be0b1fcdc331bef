//! `export` and `check` command logic, separated from argument parsing.

use crate::config::TypewireConfig;
use crate::schema::{load_schema, SchemaError};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use typewire_codegen::{Artifact, ExportError, ExportOptions, Exporter};
use typewire_core::ProcedureSet;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Config(String),
    #[error("no schema given; pass one or set [export] schema in typewire.toml")]
    MissingSchema,
    #[error("no output path given; pass --output or set [export] output in typewire.toml")]
    MissingOutput,
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("export failed")]
    Export(#[from] ExportError),
    #[error("cannot read prelude '{path}'")]
    Prelude {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write '{path}'")]
    Write {
        path: PathBuf,
        #[source]
        source: ExportError,
    },
}

/// Command-line values, which take precedence over `typewire.toml`.
#[derive(Debug, Clone, Default)]
pub struct ExportArgs {
    pub schema: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub url: Option<String>,
    pub prelude: Option<PathBuf>,
}

/// Fully resolved export inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSettings {
    pub schema: PathBuf,
    pub output: Option<PathBuf>,
    pub url: Option<String>,
    pub prelude: Option<PathBuf>,
}

impl ExportSettings {
    pub fn resolve(args: ExportArgs, config: Option<&TypewireConfig>) -> Result<Self, CliError> {
        let section = config.map(|c| c.export.clone()).unwrap_or_default();
        Ok(Self {
            schema: args.schema.or(section.schema).ok_or(CliError::MissingSchema)?,
            output: args.output.or(section.output),
            url: args.url.or(section.url),
            prelude: args.prelude.or(section.prelude),
        })
    }

    pub fn output(&self) -> Result<&Path, CliError> {
        self.output.as_deref().ok_or(CliError::MissingOutput)
    }
}

/// A rendered export, ready to write or compare.
#[derive(Debug)]
pub struct ExportReport {
    pub procedures: ProcedureSet,
    pub artifact: Artifact,
    pub text: String,
    pub digest: String,
}

/// Load the schema and render the TypeScript module.
pub fn run_export(settings: &ExportSettings) -> Result<ExportReport, CliError> {
    let procedures = load_schema(&settings.schema)?;
    debug!(schema = %settings.schema.display(), procedures = procedures.len(), "loaded schema");

    let mut options = ExportOptions {
        url: settings.url.clone(),
        prelude: None,
    };
    if let Some(path) = &settings.prelude {
        let text = std::fs::read_to_string(path).map_err(|source| CliError::Prelude {
            path: path.clone(),
            source,
        })?;
        options.prelude = Some(text);
    }

    let artifact = Exporter::new(options).export(&procedures)?;
    let text = artifact.render();
    let digest = digest(&text);
    Ok(ExportReport {
        procedures,
        artifact,
        text,
        digest,
    })
}

/// Write the module, creating parent directories.
pub fn write_report(report: &ExportReport, path: &Path) -> Result<(), CliError> {
    report.artifact.write_to(path).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!(output = %path.display(), digest = %report.digest, "wrote client module");
    Ok(())
}

/// Whether the file at `path` already holds exactly this export.
pub fn is_up_to_date(report: &ExportReport, path: &Path) -> bool {
    match std::fs::read_to_string(path) {
        Ok(existing) => digest(&existing) == report.digest,
        Err(_) => false,
    }
}

/// Hex SHA-256 of the rendered text.
pub fn digest(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}
