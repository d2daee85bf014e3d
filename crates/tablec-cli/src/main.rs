//! tablec CLI - compile spreadsheet tables to schemas, data and code

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tablec_compiler::{Compiler, Config};

#[derive(Parser)]
#[command(name = "tablec")]
#[command(
    author,
    version,
    about = "Compiles .xlsx game tables to proto3 schemas, data blobs and accessor code"
)]
struct Cli {
    /// Path to the JSON run configuration
    #[arg(short, long, default_value = "tablec.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: parse, validate and write all outputs
    Compile,

    /// Parse and validate every workbook without writing anything
    Check,

    /// Delete all configured output directories
    Clean,

    /// Write a default configuration file to the --config path
    Init,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        Config::default()
            .save(&cli.config)
            .with_context(|| format!("failed to write '{}'", cli.config.display()))?;
        eprintln!("wrote {}", cli.config.display());
        return Ok(());
    }

    let config = Config::load(&cli.config)
        .with_context(|| format!("failed to load '{}'", cli.config.display()))?;
    let compiler = Compiler::new(config);

    match cli.command {
        Commands::Compile => compiler.run().context("compilation failed")?,
        Commands::Check => compiler.check().context("validation failed")?,
        Commands::Clean => compiler.clean().context("clean failed")?,
        Commands::Init => unreachable!("handled above"),
    }

    Ok(())
}
