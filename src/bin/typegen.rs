//! typegen CLI
//!
//! Reads a JSON Schema document, compiles it with the selected profile, and
//! writes the generated source to stdout or a file. Exit code 0 on success
//! (warnings go to stderr), 1 on compiler error with the first diagnostic
//! rendered to stderr.

use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use typegen::{compile, CompileOptions, ExtraPolicy};

#[derive(Parser)]
#[command(name = "typegen")]
#[command(about = "Generate typed data models from a JSON Schema document")]
struct Cli {
    /// Path to the schema document ("-" reads stdin)
    schema: PathBuf,

    /// Emission profile
    #[arg(short, long, default_value = "python-models-v1")]
    profile: String,

    /// Write output here instead of stdout
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Override the name of the top-level declaration
    #[arg(long)]
    root_name: Option<String>,

    /// Extensibility for objects lacking additionalProperties
    #[arg(long, value_enum)]
    extra_policy: Option<ExtraPolicyArg>,

    /// Character appended to reserved-word identifiers
    #[arg(long)]
    reserved_suffix: Option<String>,

    /// Skip description docstrings in the output
    #[arg(long)]
    no_docstrings: bool,

    /// Load options from a typegen.toml file (flags win over file values)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum ExtraPolicyArg {
    Forbid,
    Allow,
    Ignore,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => {}
        Err(RunError::Compile(err)) => {
            eprintln!("{}", err.render());
            std::process::exit(1);
        }
        Err(RunError::Other(err)) => {
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    }
}

enum RunError {
    Compile(typegen::CompileError),
    Other(anyhow::Error),
}

impl From<anyhow::Error> for RunError {
    fn from(err: anyhow::Error) -> Self {
        RunError::Other(err)
    }
}

fn run(cli: Cli) -> Result<(), RunError> {
    let mut options = match &cli.config {
        Some(path) => CompileOptions::from_toml_file(path).map_err(RunError::Other)?,
        None => CompileOptions::default(),
    };

    if cli.root_name.is_some() {
        options.root_name = cli.root_name.clone();
    }
    if let Some(policy) = cli.extra_policy {
        options.extra_policy = match policy {
            ExtraPolicyArg::Forbid => ExtraPolicy::Forbid,
            ExtraPolicyArg::Allow => ExtraPolicy::Allow,
            ExtraPolicyArg::Ignore => ExtraPolicy::Ignore,
        };
    }
    if let Some(suffix) = &cli.reserved_suffix {
        options.reserved_suffix = suffix.clone();
    }
    if cli.no_docstrings {
        options.emit_docstrings = false;
    }

    let content = if cli.schema.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| RunError::Other(e.into()))?;
        buffer
    } else {
        std::fs::read_to_string(&cli.schema)
            .map_err(|e| RunError::Other(anyhow::anyhow!("{}: {}", cli.schema.display(), e)))?
    };

    let document: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| RunError::Other(anyhow::anyhow!("failed to parse JSON: {}", e)))?;

    let compiled = compile(&document, &cli.profile, &options).map_err(RunError::Compile)?;

    for warning in compiled.diagnostics.warnings() {
        eprintln!("{}", warning);
    }

    match &cli.out {
        Some(path) => {
            std::fs::write(path, compiled.text.as_bytes()).map_err(|e| {
                RunError::Other(anyhow::anyhow!("{}: {}", path.display(), e))
            })?;
        }
        None => print!("{}", compiled.text),
    }

    Ok(())
}
