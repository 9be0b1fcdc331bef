//! Configuration file parsing for `typewire.toml`.
//!
//! Searches the current directory then its ancestors. Relative paths in the
//! file are resolved against the directory the file was found in.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "typewire.toml";

#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq, Eq)]
pub struct TypewireConfig {
    #[serde(default)]
    pub export: ExportSection,
}

/// `[export]`
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq, Eq)]
pub struct ExportSection {
    /// Procedure set document (JSON).
    pub schema: Option<PathBuf>,
    /// Generated TypeScript module.
    pub output: Option<PathBuf>,
    /// Default endpoint written into the generated module.
    pub url: Option<String>,
    /// Replacement runtime prelude.
    pub prelude: Option<PathBuf>,
}

impl TypewireConfig {
    /// Search the current directory then its ancestors.
    pub fn load_with_path() -> Result<Option<(PathBuf, Self)>, String> {
        let dir = std::env::current_dir().map_err(|e| format!("cannot read current directory: {}", e))?;
        Self::find_from(&dir)
    }

    /// Search `start` then its ancestors for [`CONFIG_FILE`].
    pub fn find_from(start: &Path) -> Result<Option<(PathBuf, Self)>, String> {
        let mut dir = start.to_path_buf();
        loop {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.is_file() {
                let cfg = Self::load_from(&candidate)?;
                return Ok(Some((candidate, cfg)));
            }
            if !dir.pop() {
                return Ok(None);
            }
        }
    }

    /// Load a specific file, resolving its relative paths.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
        let cfg = Self::parse(&content).map_err(|e| format!("invalid toml in '{}': {}", path.display(), e))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(cfg.relative_to(base))
    }

    pub fn parse(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Rebase relative paths onto `base`.
    pub fn relative_to(mut self, base: &Path) -> Self {
        let rebase = |p: &mut Option<PathBuf>| {
            if let Some(path) = p.as_mut() {
                if path.is_relative() {
                    *path = base.join(&*path);
                }
            }
        };
        rebase(&mut self.export.schema);
        rebase(&mut self.export.output);
        rebase(&mut self.export.prelude);
        self
    }

    pub fn default_template() -> &'static str {
        r#"# Typewire configuration

[export]
# Procedure set written by the service (JSON).
schema = "procedures.json"
# Generated TypeScript client.
output = "client/api.ts"
# Default endpoint; clients may still set rpcConfig.url themselves.
# url = "/api/rpc"
# Replace the built-in runtime helpers.
# prelude = "client/prelude.ts"
"#
    }
}
