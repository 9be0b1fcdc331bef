//! Typewire CLI: generate TypeScript clients from procedure set documents.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use typewire_cli::colors::{bold, cyan, gray, green, red, status_label, yellow};
use typewire_cli::commands::{is_up_to_date, run_export, write_report, CliError, ExportArgs, ExportSettings};
use typewire_cli::config::{TypewireConfig, CONFIG_FILE};
use typewire_cli::error_chain::chain_from_error;
use typewire_cli::schema::describe;

#[derive(Parser)]
#[command(name = "typewire", version, about = "TypeScript clients for typed RPC procedures")]
struct Cli {
    /// Debug logging (overrides TYPEWIRE_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of searching for typewire.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the TypeScript client module
    Export {
        /// Procedure set document (JSON)
        schema: Option<PathBuf>,

        /// Output path (default: [export] output, else stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Default endpoint written into the module
        #[arg(long)]
        url: Option<String>,

        /// Replacement runtime prelude
        #[arg(long)]
        prelude: Option<PathBuf>,

        /// Exit 1 if the output file is missing or stale instead of writing it
        #[arg(long)]
        check: bool,
    },
    /// Validate a procedure set and report what would be exported
    Check {
        /// Procedure set document (JSON)
        schema: Option<PathBuf>,
    },
    /// Create a typewire.toml in the current directory
    Init,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_ref());
    let result = match cli.command {
        Commands::Export {
            schema,
            output,
            url,
            prelude,
            check,
        } => cmd_export(
            ExportArgs {
                schema,
                output,
                url,
                prelude,
            },
            config.as_ref(),
            check,
        ),
        Commands::Check { schema } => cmd_check(
            ExportArgs {
                schema,
                ..ExportArgs::default()
            },
            config.as_ref(),
        ),
        Commands::Init => cmd_init(),
    };

    if let Err(e) = result {
        let chain = chain_from_error(&e);
        eprintln!("{}", chain.format_with_prefix(&red("error:")));
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("typewire=debug")
    } else {
        EnvFilter::try_from_env("TYPEWIRE_LOG").unwrap_or_else(|_| EnvFilter::new("typewire=info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(explicit: Option<&PathBuf>) -> Option<TypewireConfig> {
    let loaded = match explicit {
        Some(path) => TypewireConfig::load_from(path).map(Some),
        None => TypewireConfig::load_with_path().map(|found| found.map(|(_, cfg)| cfg)),
    };
    match loaded {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{} {}", red("error:"), e);
            std::process::exit(1);
        }
    }
}

fn cmd_export(args: ExportArgs, config: Option<&TypewireConfig>, check: bool) -> Result<(), CliError> {
    let settings = ExportSettings::resolve(args, config)?;
    eprintln!("{} {}", status_label("Exporting"), settings.schema.display());
    let report = run_export(&settings)?;

    if check {
        let output = settings.output()?;
        if is_up_to_date(&report, output) {
            eprintln!("{} {} {}", green("✓"), bold(&output.display().to_string()), gray("is up to date"));
            return Ok(());
        }
        eprintln!(
            "{} {} is stale; run `typewire export` to regenerate",
            yellow("warning:"),
            output.display()
        );
        std::process::exit(1);
    }

    match &settings.output {
        Some(output) => {
            write_report(&report, output)?;
            eprintln!(
                "{} {} {}",
                status_label("Wrote"),
                output.display(),
                gray(&format!(
                    "({} procedures, {} interfaces, {} enums)",
                    report.procedures.len(),
                    report.artifact.interfaces.len(),
                    report.artifact.enums.len()
                ))
            );
            eprintln!("{} {}", status_label("sha256"), cyan(&report.digest));
        }
        None => print!("{}", report.text),
    }
    Ok(())
}

fn cmd_check(args: ExportArgs, config: Option<&TypewireConfig>) -> Result<(), CliError> {
    let settings = ExportSettings::resolve(args, config)?;
    let report = run_export(&settings)?;
    for info in report.procedures.iter() {
        println!("{} {}", status_label("Procedure"), describe(info));
    }
    println!(
        "{} {} {}",
        green("✓"),
        bold(&settings.schema.display().to_string()),
        gray(&format!(
            "({} procedures, {} interfaces, {} enums)",
            report.procedures.len(),
            report.artifact.interfaces.len(),
            report.artifact.enums.len()
        ))
    );
    Ok(())
}

fn cmd_init() -> Result<(), CliError> {
    let path = PathBuf::from(CONFIG_FILE);
    if path.exists() {
        return Err(CliError::Config(format!("{} already exists, not overwriting", CONFIG_FILE)));
    }
    std::fs::write(&path, TypewireConfig::default_template())
        .map_err(|e| CliError::Config(format!("writing {}: {}", CONFIG_FILE, e)))?;
    println!("{} {}", status_label("Created"), CONFIG_FILE);
    Ok(())
}
