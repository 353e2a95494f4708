// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Request list commands
//!
//! Commands: list, export

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use tramites_core::application::RecordView;
use tramites_core::domain::request::{RequestRecord, RequestStats};

#[derive(Subcommand)]
pub enum RequestsCommand {
    /// List requests of the application mailbox, or all of them with --all
    List {
        /// Every request in the list (requires the mailbox to be an admin)
        #[arg(long)]
        all: bool,

        /// Print the records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export requests as CSV (requires the mailbox to be an admin)
    Export {
        /// Output file or directory (default: generated file name in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only these folios, using the reduced column set
        #[arg(long = "folio", value_name = "FOLIO")]
        folios: Vec<String>,
    },
}

pub async fn handle_command(command: RequestsCommand, config_path: Option<PathBuf>) -> Result<()> {
    let (portal, session) = super::application_portal(config_path).await?;

    match command {
        RequestsCommand::List { all, json } => {
            let (records, stats) = if all {
                let dashboard = portal.admin(&session).dashboard(&session).await?;
                (dashboard.records, Some(dashboard.stats))
            } else {
                let records = portal.history(&session).my_requests(&session).await?;
                (records, None)
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                print_records(&records, stats);
            }
            Ok(())
        }
        RequestsCommand::Export { output, folios } => {
            let admin = portal.admin(&session);
            let file = if folios.is_empty() {
                admin.export_csv(&session).await?
            } else {
                admin.export_filtered(&session, &folios).await?
            };

            let path = match output {
                Some(path) if path.is_dir() => path.join(&file.file_name),
                Some(path) => path,
                None => PathBuf::from(&file.file_name),
            };
            std::fs::write(&path, &file.bytes)
                .with_context(|| format!("Failed to write CSV to {:?}", path))?;

            println!(
                "{}",
                format!("✓ CSV exported: {}", path.display()).green()
            );
            Ok(())
        }
    }
}

fn print_records(records: &[RequestRecord], stats: Option<RequestStats>) {
    if records.is_empty() {
        println!("{}", "No hay solicitudes registradas".dimmed());
        return;
    }

    for view in records.iter().map(RecordView::from_record) {
        println!(
            "{:<22} {:<10} {:<28} {:<14} {}",
            view.folio.bold(),
            view.date,
            view.request_title,
            view.status,
            view.amount
        );
    }

    if let Some(stats) = stats {
        println!();
        println!(
            "Total: {}  Pendientes: {}  Aprobadas: {}  Rechazadas: {}",
            stats.total, stats.pending, stats.approved, stats.rejected
        );
    }
}
