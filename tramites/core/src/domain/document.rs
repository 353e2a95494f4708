// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Document
//!
//! Port for producing the request letter. The PDF implementation lives in
//! `infrastructure::pdf`.

use chrono::{DateTime, Local};

use super::catalog::FormDefinition;
use super::request::{FieldMap, Folio};

/// Letterhead data printed on every document
#[derive(Debug, Clone)]
pub struct Letterhead {
    pub institution: String,
    pub university: String,
    pub city: String,
    /// Addressee of the letter (the reviewing body)
    pub addressee: String,
}

/// Everything the renderer needs for one request
#[derive(Debug, Clone)]
pub struct DocumentRequest<'a> {
    pub form: &'a FormDefinition,
    pub fields: &'a FieldMap,
    pub folio: &'a Folio,
    pub submitter_name: &'a str,
    pub student_id: &'a str,
    pub issued_at: DateTime<Local>,
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("No se pudo generar el PDF: {0}")]
    Render(String),

    #[error("No se pudo generar el PDF: documento vacío")]
    Empty,
}

/// Renders a request into document bytes
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, request: &DocumentRequest<'_>) -> Result<Vec<u8>, DocumentError>;

    /// MIME type of the produced bytes
    fn content_type(&self) -> &'static str {
        "application/pdf"
    }
}

/// Label used in the summary table: underscores become spaces, upper-cased
pub fn summary_label(field_name: &str) -> String {
    field_name.replace('_', " ").to_uppercase()
}

/// Value cut to at most `max` characters
pub fn summary_value(value: &str, max: usize) -> String {
    value.trim().chars().take(max).collect()
}
