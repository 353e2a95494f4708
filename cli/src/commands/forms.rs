// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Form catalog commands
//!
//! Commands: list, show

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use tramites_core::domain::catalog::FormCatalog;

#[derive(Subcommand)]
pub enum FormsCommand {
    /// List the request types
    List,

    /// Show the fields of one request type
    Show {
        /// Request type key (e.g. apoyo_academico)
        key: String,

        /// Print the definition as JSON
        #[arg(long)]
        json: bool,
    },
}

pub async fn handle_command(command: FormsCommand) -> Result<()> {
    let catalog = FormCatalog::standard();

    match command {
        FormsCommand::List => {
            println!("{}", "Request types:".bold());
            for form in catalog.forms() {
                println!(
                    "  {:<20} {} ({} campos)",
                    form.request_type.key().bold(),
                    form.title,
                    form.fields.len()
                );
            }
            Ok(())
        }
        FormsCommand::Show { key, json } => {
            let form = catalog.get_by_key(&key)?;

            if json {
                println!("{}", serde_json::to_string_pretty(form)?);
                return Ok(());
            }

            println!("{}", form.title.bold());
            println!("{}", form.subtitle.dimmed());
            println!(
                "Folio prefix: {}",
                form.request_type.folio_prefix()
            );
            println!();
            for field in &form.fields {
                let marker = if field.required { "*".red().to_string() } else { " ".to_string() };
                println!(
                    "  {}{:<24} {:<10} {}",
                    marker,
                    field.name,
                    format!("{:?}", field.kind).to_lowercase(),
                    field.label
                );
                if !field.options.is_empty() {
                    println!("      {}", field.options.join(" | ").dimmed());
                }
            }
            Ok(())
        }
    }
}
