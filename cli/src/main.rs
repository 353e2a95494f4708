// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Tramites CLI
//!
//! The `tramites` binary serves the request portal and offers a few
//! operator commands that run against the same configuration.
//!
//! ## Commands
//!
//! - `tramites serve` - Run the HTTP portal
//! - `tramites config show|validate|generate` - Configuration management
//! - `tramites forms list|show` - Inspect the form catalog
//! - `tramites submit` - Submit a request with the application identity
//! - `tramites requests list|export` - Read the request list

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use tramites_core::domain::config::PortalConfigManifest;

mod commands;

use commands::{ConfigCommand, FormsCommand, RequestsCommand, ServeArgs, SubmitArgs};

/// Tramites - Request portal for academic units
#[derive(Parser)]
#[command(name = "tramites")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "TRAMITES_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); defaults to the configured level
    #[arg(long, global = true, env = "TRAMITES_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (text, json); defaults to the configured format
    #[arg(long, global = true, env = "TRAMITES_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP portal
    #[command(name = "serve")]
    Serve(ServeArgs),

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Form catalog
    #[command(name = "forms")]
    Forms {
        #[command(subcommand)]
        command: FormsCommand,
    },

    /// Submit a request using the application identity
    #[command(name = "submit")]
    Submit(SubmitArgs),

    /// Requests stored in the list
    #[command(name = "requests")]
    Requests {
        #[command(subcommand)]
        command: RequestsCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Logging settings fall back to the configuration file when it can be read
    let logging = PortalConfigManifest::load_or_default(cli.config.clone())
        .map(|c| c.spec.observability.logging)
        .unwrap_or_default();
    let level = cli.log_level.as_deref().unwrap_or(&logging.level);
    let format = cli.log_format.as_deref().unwrap_or(&logging.format);
    init_logging(level, format)?;

    match cli.command {
        Some(Commands::Serve(args)) => commands::serve::execute(args, cli.config).await,
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        Some(Commands::Forms { command }) => commands::forms::handle_command(command).await,
        Some(Commands::Submit(args)) => commands::submit::execute(args, cli.config).await,
        Some(Commands::Requests { command }) => {
            commands::requests::handle_command(command, cli.config).await
        }
        None => {
            // No command provided - show help
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str, format: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if format.eq_ignore_ascii_case("json") {
        builder.json().init();
    } else {
        builder.compact().init();
    }

    Ok(())
}
