//! labtrack CLI Binary
//!
//! Command-line interface for the labtrack metadata store.

use anyhow::Context;
use clap::Parser;
use labtrack::cli::{exit_code, map_error, Cli, RunContext};
use labtrack::config::ConfigLoader;
use labtrack::logging::{init_logging, LoggingConfig};
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    let logging_config = match build_logging_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid logging options: {:#}", e);
            process::exit(3);
        }
    };
    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("labtrack starting");

    let context = match RunContext::new(cli.base.clone(), cli.config.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Error loading configuration: {}", e);
            eprintln!("{}", map_error(&e));
            process::exit(exit_code(&e));
        }
    };

    match context.execute(&cli.command) {
        Ok(output) => {
            info!("Command completed successfully");
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", map_error(&e));
            process::exit(exit_code(&e));
        }
    }
}

/// Build logging configuration from CLI args, environment, and config file.
///
/// Without `--verbose` or `--log-level`, the configured level applies
/// (`warn` by default).
fn build_logging_config(cli: &Cli) -> anyhow::Result<LoggingConfig> {
    let mut config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)
            .map(|c| c.logging)
            .unwrap_or_default(),
        None => ConfigLoader::load().map(|c| c.logging).unwrap_or_default(),
    };

    if cli.verbose {
        config.level = "debug".to_string();
    }
    if let Some(level) = &cli.log_level {
        config.level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.format = format
            .parse()
            .with_context(|| format!("--log-format {}", format))?;
    }

    Ok(config)
}
