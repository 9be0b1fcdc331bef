//! Export driver.
//!
//! For every procedure the exporter resolves the input and output
//! interfaces, then generates
//!
//! ```text
//! function _{name}ParamsToPrimitive(params: In): any { ... }
//! function _{name}PrimitiveToResult(data: any): Out { ... }
//! export function call{name}(params: In): AbortableRequest<Out> { ... }
//! ```
//!
//! and assembles the artifact in a fixed section order: runtime prelude,
//! optional default URL, enums, interfaces, to-primitive functions,
//! from-primitive functions, call stubs.

use crate::handlers::Resolver;
use crate::names::{check_identifier, DeclarationTable};
use crate::ExportError;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};
use typewire_core::{MetadataProvider, ProcedureInfo};

/// The built-in runtime prelude.
pub const PRELUDE: &str = include_str!("prelude.ts");

const BODY_INDENT: &str = "    ";

// =============================================================================
// Options
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportOptions {
    /// Default endpoint, emitted as `rpcConfig.url = "...";`.
    pub url: Option<String>,
    /// Replaces [`PRELUDE`].
    pub prelude: Option<String>,
}

impl ExportOptions {
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_prelude(mut self, prelude: impl Into<String>) -> Self {
        self.prelude = Some(prelude.into());
        self
    }
}

// =============================================================================
// Artifact pieces
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Enum,
    Interface,
}

/// A named `export enum` or `export interface`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub kind: DeclarationKind,
    pub name: String,
    pub body: String,
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self.kind {
            DeclarationKind::Enum => "enum",
            DeclarationKind::Interface => "interface",
        };
        write!(f, "export {} {} {}", keyword, self.name, self.body)
    }
}

/// A generated function: header up to the opening brace, plus body lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFunction {
    pub name: String,
    pub signature: String,
    pub body: Vec<String>,
}

impl fmt::Display for GeneratedFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {{", self.signature)?;
        for line in &self.body {
            writeln!(f, "{}{}", BODY_INDENT, line)?;
        }
        write!(f, "}}")
    }
}

/// Everything one export produces, kept structured until rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub prelude: String,
    pub url: Option<String>,
    pub enums: Vec<Declaration>,
    pub interfaces: Vec<Declaration>,
    pub to_primitive: Vec<GeneratedFunction>,
    pub from_primitive: Vec<GeneratedFunction>,
    pub stubs: Vec<GeneratedFunction>,
}

impl Artifact {
    /// The complete TypeScript module text.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.prelude.len() + 1024);
        out.push_str(self.prelude.trim_end());
        out.push('\n');

        let mut section = |piece: String| {
            out.push('\n');
            out.push_str(&piece);
            out.push('\n');
        };
        if let Some(url) = &self.url {
            section(format!("rpcConfig.url = {};", quote(url)));
        }
        self.enums.iter().for_each(|d| section(d.to_string()));
        self.interfaces.iter().for_each(|d| section(d.to_string()));
        self.to_primitive.iter().for_each(|g| section(g.to_string()));
        self.from_primitive.iter().for_each(|g| section(g.to_string()));
        self.stubs.iter().for_each(|g| section(g.to_string()));
        out
    }

    /// Render to `path`, creating missing parent directories.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), ExportError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.render())?;
        Ok(())
    }

    pub fn interface(&self, name: &str) -> Option<&Declaration> {
        self.interfaces.iter().find(|d| d.name == name)
    }

    pub fn enumeration(&self, name: &str) -> Option<&Declaration> {
        self.enums.iter().find(|d| d.name == name)
    }

    /// Any generated function (marshaller or stub) by name.
    pub fn function(&self, name: &str) -> Option<&GeneratedFunction> {
        self.to_primitive
            .iter()
            .chain(&self.from_primitive)
            .chain(&self.stubs)
            .find(|g| g.name == name)
    }
}

fn quote(text: &str) -> String {
    serde_json::Value::from(text).to_string()
}

// =============================================================================
// Exporter
// =============================================================================

/// Generates TypeScript client modules. Holds only immutable options; each
/// [`Exporter::export`] call starts from an empty name registry.
#[derive(Debug, Clone, Default)]
pub struct Exporter {
    options: ExportOptions,
}

impl Exporter {
    pub fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    pub fn export(&self, provider: &dyn MetadataProvider) -> Result<Artifact, ExportError> {
        let procedures = provider.procedures();
        let mut resolver = Resolver::new();
        let mut artifact = Artifact {
            prelude: self.options.prelude.clone().unwrap_or_else(|| PRELUDE.to_string()),
            url: self.options.url.clone(),
            enums: Vec::new(),
            interfaces: Vec::new(),
            to_primitive: Vec::with_capacity(procedures.len()),
            from_primitive: Vec::with_capacity(procedures.len()),
            stubs: Vec::with_capacity(procedures.len()),
        };

        let mut seen = HashSet::new();
        for info in &procedures {
            if !seen.insert(info.name.as_str()) {
                return Err(ExportError::DuplicateProcedure(info.name.clone()));
            }
            debug!(procedure = %info.name, "exporting procedure");
            export_procedure(&mut resolver, info, &mut artifact).map_err(|e| ExportError::Procedure {
                name: info.name.clone(),
                source: Box::new(e),
            })?;
        }

        let names = resolver.into_names();
        artifact.enums = declarations(DeclarationKind::Enum, names.enums());
        artifact.interfaces = declarations(DeclarationKind::Interface, names.interfaces());

        info!(
            procedures = procedures.len(),
            interfaces = artifact.interfaces.len(),
            enums = artifact.enums.len(),
            "export complete"
        );
        Ok(artifact)
    }

    /// Export and write the rendered module to `path`.
    pub fn write(&self, provider: &dyn MetadataProvider, path: impl AsRef<Path>) -> Result<Artifact, ExportError> {
        let artifact = self.export(provider)?;
        artifact.write_to(path)?;
        Ok(artifact)
    }
}

fn declarations(kind: DeclarationKind, table: &DeclarationTable) -> Vec<Declaration> {
    table
        .iter()
        .map(|(name, body)| Declaration {
            kind,
            name: name.to_string(),
            body: body.to_string(),
        })
        .collect()
}

fn export_procedure(resolver: &mut Resolver, info: &ProcedureInfo, artifact: &mut Artifact) -> Result<(), ExportError> {
    let name = &info.name;
    check_identifier(name)?;

    let input = resolver.resolve_interface(&info.input)?;
    let output = resolver.resolve_interface(&info.output)?;

    let to_primitive = format!("_{}ParamsToPrimitive", name);
    let params = resolver.to_primitive(&info.input, "params", "preparedParams")?;
    let mut body = vec!["let preparedParams: any;".to_string()];
    if params.transforms() {
        body.extend(params.into_lines());
    } else {
        body.push("preparedParams = params".to_string());
    }
    body.push("return preparedParams;".to_string());
    artifact.to_primitive.push(GeneratedFunction {
        signature: format!("function {}(params: {}): any", to_primitive, input),
        name: to_primitive.clone(),
        body,
    });

    let from_primitive = format!("_{}PrimitiveToResult", name);
    let result = resolver.from_primitive(&info.output, "data", "data")?;
    let mut body = if result.transforms() {
        result.into_lines()
    } else {
        Vec::new()
    };
    body.push("return data;".to_string());
    artifact.from_primitive.push(GeneratedFunction {
        signature: format!("function {}(data: any): {}", from_primitive, output),
        name: from_primitive.clone(),
        body,
    });

    let stub = format!("call{}", name);
    artifact.stubs.push(GeneratedFunction {
        signature: format!("export function {}(params: {}): AbortableRequest<{}>", stub, input, output),
        name: stub,
        body: vec![format!(
            "return abortableFetch<{}, {}>({}, params, {}, {});",
            input,
            output,
            quote(name),
            to_primitive,
            from_primitive
        )],
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use typewire_core::TypeDescriptor;

    #[test]
    fn function_renders_indented_body() {
        let f = GeneratedFunction {
            name: "f".into(),
            signature: "function f(data: any): number".into(),
            body: vec!["return data;".into()],
        };
        assert_eq!(f.to_string(), "function f(data: any): number {\n    return data;\n}");
    }

    #[test]
    fn url_is_quoted() {
        let artifact = Exporter::new(ExportOptions::default().with_prelude("// prelude").with_url("/api/\"rpc\""))
            .export(&Vec::<ProcedureInfo>::new())
            .unwrap();
        assert_eq!(artifact.render(), "// prelude\n\nrpcConfig.url = \"/api/\\\"rpc\\\"\";\n");
    }

    #[test]
    fn invalid_names_are_rejected() {
        let procedures = vec![ProcedureInfo::new("get-user", TypeDescriptor::none(), TypeDescriptor::none())];
        let err = Exporter::default().export(&procedures).unwrap_err();
        assert!(matches!(err.root_cause(), ExportError::InvalidName(name) if name == "get-user"));
    }
}
