// src/main.rs

//! Katalog CLI
//!
//! Local execution entry point for the course catalog aggregator.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use katalog::{
    error::Result,
    models::Config,
    pipeline,
    storage::LocalStorage,
};

/// Katalog - University Course Catalog Aggregator
#[derive(Parser, Debug)]
#[command(
    name = "katalog",
    version,
    about = "Aggregates university course catalogs across site generations"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Aggregate all enabled sources and write the result artifacts
    Run,

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // No valid operating mode without configuration: a load failure aborts
    // before any fetch.
    let config = Config::load(&cli.config)?;
    config.validate()?;

    match cli.command {
        Command::Validate => {
            log::info!("Configuration OK: {}", cli.config.display());
        }

        Command::Run => {
            log::info!("Starting aggregation (config: {})", cli.config.display());

            let summary = pipeline::run(&config, pipeline::tokio_sleep()).await;

            let storage = LocalStorage::new(&config.output);
            storage.write_run(&summary).await?;

            if let Some(error) = &summary.error {
                log::error!("Run finished with error: {error}");
            } else {
                log::info!("Run complete: {} subjects", summary.total_subjects);
            }
        }
    }

    Ok(())
}
