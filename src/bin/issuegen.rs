//! Issuegen CLI Binary
//!
//! Command-line interface for template-driven issue and use-case generation.

use clap::Parser;
use issuegen::cli::{map_error, Cli, RunContext, EXIT_FAILURE};
use issuegen::config::ConfigLoader;
use issuegen::logging::{init_logging, LoggingConfig};
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    let logging_config = build_logging_config(&cli);
    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(EXIT_FAILURE);
    }

    info!("Issuegen CLI starting");

    let context = match RunContext::new(cli.workspace.clone(), cli.config.clone()) {
        Ok(ctx) => ctx.with_progress(!cli.quiet),
        Err(e) => {
            error!("Error loading settings: {}", e);
            eprintln!("{}", map_error(&e.into()));
            process::exit(EXIT_FAILURE);
        }
    };

    match context.execute(&cli.command) {
        Ok(output) => {
            if !output.stdout.is_empty() {
                println!("{}", output.stdout);
            }
            if !output.stderr.is_empty() {
                eprintln!("{}", output.stderr);
            }
            process::exit(output.exit_code);
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("{}", map_error(&e));
            process::exit(EXIT_FAILURE);
        }
    }
}

/// Build logging configuration from CLI args and the settings file.
/// Precedence: CLI flags override the settings file, which overrides defaults.
/// `ISSUEGEN_LOG` still wins over all of these inside `init_logging`.
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    let loaded = match cli.config {
        Some(ref config_path) => ConfigLoader::load_from_file(config_path),
        None => ConfigLoader::load(&cli.workspace),
    };
    let mut config = loaded.map(|s| s.logging).unwrap_or_default();

    if cli.quiet {
        config.enabled = false;
    }
    if cli.verbose {
        config.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        config.file = Some(file.clone());
        if cli.log_output.is_none() {
            config.output = "file".to_string();
        }
    }

    config
}
