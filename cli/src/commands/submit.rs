// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Submit a request from the command line
//!
//! Runs the same pipeline as the portal (validation, PDF, upload, list item,
//! notifications) with the application identity configured in
//! `spec.identity.client_secret` acting on `spec.email.sender_mailbox`.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use tramites_core::domain::notification::DeliveryOutcome;
use tramites_core::domain::request::FieldMap;

#[derive(Args)]
pub struct SubmitArgs {
    /// Request type key (e.g. solicitud_libre)
    key: String,

    /// Field value as NAME=VALUE (repeatable)
    #[arg(short, long = "field", value_name = "NAME=VALUE", value_parser = parse_field)]
    fields: Vec<(String, String)>,

    /// JSON object with the field values; --field entries take precedence
    #[arg(long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Print the receipt as JSON
    #[arg(long)]
    json: bool,
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{}'", raw)),
    }
}

fn load_fields(file: Option<&PathBuf>, overrides: Vec<(String, String)>) -> Result<FieldMap> {
    let mut fields = FieldMap::new();

    if let Some(path) = file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {:?}", path))?;
        let value: serde_json::Value =
            serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {:?}", path))?;
        let Some(object) = value.as_object() else {
            bail!("{:?} must contain a JSON object", path);
        };
        for (name, value) in object {
            match value {
                serde_json::Value::Null => {}
                serde_json::Value::String(s) => {
                    fields.insert(name.clone(), s.clone());
                }
                other => {
                    fields.insert(name.clone(), other.to_string());
                }
            }
        }
    }

    fields.extend(overrides);
    Ok(fields)
}

fn outcome_label(outcome: &DeliveryOutcome) -> String {
    match outcome {
        DeliveryOutcome::Sent => "sent".green().to_string(),
        DeliveryOutcome::Skipped => "skipped".dimmed().to_string(),
        DeliveryOutcome::Failed(reason) => format!("{} ({})", "failed".red(), reason),
    }
}

pub async fn execute(args: SubmitArgs, config_path: Option<PathBuf>) -> Result<()> {
    let fields = load_fields(args.file.as_ref(), args.fields)?;
    let (portal, session) = super::application_portal(config_path).await?;

    let receipt = portal
        .submit(&session, &args.key, fields)
        .await
        .context("Submission failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&receipt)?);
        return Ok(());
    }

    println!(
        "{}",
        format!("✓ Solicitud enviada: {}", receipt.folio).green().bold()
    );
    println!("  Tipo: {}", receipt.request_title);
    println!("  PDF: {}", receipt.document_url);
    println!("  Elemento: {}", receipt.item_id);
    println!("  Confirmación: {}", outcome_label(&receipt.notifications.confirmation));
    println!("  Revisor: {}", outcome_label(&receipt.notifications.reviewer));
    println!("  Webhook: {}", outcome_label(&receipt.notifications.webhook));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_field() {
        assert_eq!(
            parse_field("asunto=Cambio de aula").unwrap(),
            ("asunto".to_string(), "Cambio de aula".to_string())
        );
        assert_eq!(
            parse_field("url=https://x?a=b").unwrap().1,
            "https://x?a=b"
        );
        assert!(parse_field("sin_valor").is_err());
        assert!(parse_field("=x").is_err());
    }

    #[test]
    fn test_flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fields.json");
        std::fs::write(
            &path,
            r#"{"asunto": "Original", "monto_total": 1500, "matricula": null}"#,
        )
        .unwrap();

        let fields = load_fields(
            Some(&path),
            vec![("asunto".to_string(), "Nuevo".to_string())],
        )
        .unwrap();

        assert_eq!(fields["asunto"], "Nuevo");
        assert_eq!(fields["monto_total"], "1500");
        assert!(!fields.contains_key("matricula"));
    }
}
