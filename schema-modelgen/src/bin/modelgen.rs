/// CLI: translates a JSON Schema into a record type, then prints its
/// description or validates an instance against it.
///
/// Usage:
///   modelgen schema.json                     > model.json
///   modelgen schema.json --instance data.json
///   modelgen schema.json --instance -        < data.json
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use schema_modelgen::{generate, GenerateOptions};
use serde_json::Value;

/// Translate a JSON Schema into a validated record model.
#[derive(Parser, Debug)]
#[command(name = "modelgen", version, about)]
struct Cli {
    /// JSON Schema file.
    schema: PathBuf,

    /// Instance to validate; `-` reads stdin. Without it the record type
    /// description is printed.
    #[arg(short, long)]
    instance: Option<String>,

    /// Record type name, overriding the schema `title`.
    #[arg(short, long)]
    name: Option<String>,

    /// Skip the meta-schema check.
    #[arg(long)]
    no_validate_schema: bool,

    /// Maximum nesting depth of objects, arrays and `$ref` hops.
    #[arg(long, default_value_t = schema_modelgen::options::DEFAULT_MAX_DEPTH)]
    max_depth: usize,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let schema = read_json(&cli.schema)?;

    let mut options = GenerateOptions::new()
        .with_validate_schema(!cli.no_validate_schema)
        .with_max_depth(cli.max_depth);
    if let Some(name) = &cli.name {
        options = options.with_model_name(name);
    }

    let model = generate(&schema, &options)
        .with_context(|| format!("cannot translate {}", cli.schema.display()))?;

    let Some(instance_arg) = &cli.instance else {
        println!("{}", serde_json::to_string_pretty(&model.describe())?);
        return Ok(ExitCode::SUCCESS);
    };

    let instance = if instance_arg == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("cannot read stdin")?;
        serde_json::from_str(&buf).context("invalid JSON on stdin")?
    } else {
        read_json(Path::new(instance_arg))?
    };

    match model.construct(&instance) {
        Ok(record) => {
            println!("{}", serde_json::to_string_pretty(&record.to_json())?);
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => {
            eprintln!("{failure}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))
}
