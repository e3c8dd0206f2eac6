#![allow(clippy::multiple_crate_versions)]

mod commands;

use anyhow::{Context, Result};
use boc_core::BocConfig;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "boc")]
#[command(about = "BOC agent language front-end")]
#[command(version)]
struct Cli {
    /// Configuration file path (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level: error, warn, info, debug or trace
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a program and print a statement summary
    Parse {
        /// Source file to parse
        file: PathBuf,
    },
    /// Interpret a program and print belief confidences and bindings
    Run {
        /// Source file to run
        file: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Evaluate a single-operator formula over uncertain inputs
    Calc {
        /// Formula such as `total = a + b`
        formula: String,
        /// Named input, repeatable
        #[arg(short, long = "input", value_name = "NAME=V±U")]
        inputs: Vec<String>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.logging.level = level.trim().to_lowercase();
    }
    config.validate().context("invalid configuration")?;

    init_tracing(&config.logging.level)?;

    match cli.command {
        Commands::Parse { file } => commands::parse::run(&file),
        Commands::Run { file, json } => commands::run::run(&file, config, json),
        Commands::Calc {
            formula,
            inputs,
            json,
        } => commands::calc::run(&formula, &inputs, json),
    }
}

/// File settings first, then `BOC_*` environment overrides
fn load_config(path: Option<&Path>) -> Result<BocConfig> {
    let mut config = match path {
        Some(path) => BocConfig::from_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => BocConfig::default(),
    };
    config.apply_env()?;
    Ok(config)
}

fn init_tracing(level: &str) -> Result<()> {
    let level: tracing::Level = level
        .parse()
        .with_context(|| format!("unknown log level '{}'", level))?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    Ok(())
}
