// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use tramites_core::domain::config::PortalConfigManifest;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,

        /// Print the resolved manifest as YAML
        #[arg(long)]
        yaml: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./tramites-config.yaml)
        #[arg(short, long, default_value = "./tramites-config.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths, yaml } => show(config_override, paths, yaml).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool, yaml: bool) -> Result<()> {
    let config = PortalConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. TRAMITES_CONFIG_PATH: {}",
            std::env::var("TRAMITES_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./tramites-config.yaml");
        println!("  4. ~/.tramites/config.yaml");
        println!("  5. /etc/tramites/config.yaml");
        println!();
    }

    if yaml {
        print!(
            "{}",
            serde_yaml::to_string(&config).context("Failed to serialize configuration")?
        );
        return Ok(());
    }

    let spec = &config.spec;
    println!("{}", "Current configuration:".bold());
    println!();

    println!("{}", "Institution:".bold());
    println!("  {} ({})", spec.institution.name, spec.institution.short_name);
    println!("  {}", spec.institution.location());
    println!("  Reviewing body: {}", spec.institution.reviewing_body);
    println!();

    println!("{}", "Identity:".bold());
    println!("  Tenant: {}", display_or_unset(&spec.identity.tenant_id));
    println!("  Client: {}", display_or_unset(&spec.identity.client_id));
    println!(
        "  Client secret: {}",
        if spec.identity.client_secret.is_some() { "configured" } else { "(not set)" }
    );
    println!("  Scopes: {}", spec.identity.scopes.join(", "));
    println!();

    println!("{}", "Storage:".bold());
    println!("  Site: {}", spec.sharepoint.site_url);
    println!("  List: {}", spec.sharepoint.list_name);
    println!("  PDF folder: {}", spec.storage.base_path);
    println!();

    println!("{}", "Notifications:".bold());
    println!("  Reviewer: {}", spec.email.reviewer_address);
    println!("  Confirmation email: {}", spec.email.send_confirmation);
    match spec.automation.active_url() {
        Some(url) => println!("  Webhook: {}", url),
        None => println!("  Webhook: {}", "(disabled)".dimmed()),
    }
    println!();

    println!("{}", "Access:".bold());
    if spec.options.restrict_domain {
        println!("  Domain: @{}", spec.options.allowed_domain);
    } else {
        println!("  Domain: {}", "(unrestricted)".dimmed());
    }
    println!("  Admins: {}", spec.admins.len());
    for admin in &spec.admins {
        println!("    - {}", admin);
    }
    println!("  Max amount: {} MXN", spec.options.max_amount);
    println!();

    println!("{}", "Server:".bold());
    println!("  Listen: {}:{}", spec.network.bind_address, spec.network.port);
    if spec.observability.metrics.enabled {
        println!("  Metrics: :{}", spec.observability.metrics.port);
    }
    println!();

    Ok(())
}

fn display_or_unset(value: &str) -> String {
    if value.is_empty() {
        "(not set)".dimmed().to_string()
    } else {
        value.to_string()
    }
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = PortalConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let sample = if with_examples {
        include_str!("../../templates/config-with-examples.yaml")
    } else {
        include_str!("../../templates/config-minimal.yaml")
    };

    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_configs_are_valid() {
        for sample in [
            include_str!("../../templates/config-minimal.yaml"),
            include_str!("../../templates/config-with-examples.yaml"),
        ] {
            let config = PortalConfigManifest::from_yaml_str(sample).unwrap();
            config.validate().unwrap();
        }
    }

    #[tokio::test]
    async fn test_generate_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("tramites-config.yaml");

        generate(output.clone(), false).await.unwrap();

        let config = PortalConfigManifest::from_yaml_file(&output).unwrap();
        assert_eq!(config.spec.sharepoint.list_name, "SolicitudesCITRO");
    }
}
