// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Request
//!
//! The request record kept in the external list, its status lifecycle and the
//! human-readable folio that identifies it.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Request aggregate and folio generation

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::catalog::RequestType;
use super::identity::Profile;

/// Submitted form values keyed by field name
pub type FieldMap = BTreeMap<String, String>;

/// Client-generated request identifier: `<PREFIX>-<YYYYMMDD>-<HHMMSS>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Folio(String);

impl Folio {
    pub fn generate(request_type: RequestType, at: DateTime<Local>) -> Self {
        Self::with_prefix(request_type.folio_prefix(), at)
    }

    /// Folio for a raw type key; unknown keys use the `DOC` prefix
    pub fn for_key(key: &str, at: DateTime<Local>) -> Self {
        Self::with_prefix(prefix_for_key(key), at)
    }

    fn with_prefix(prefix: &str, at: DateTime<Local>) -> Self {
        Self(format!("{}-{}", prefix, at.format("%Y%m%d-%H%M%S")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Folio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Folio {
    fn from(value: String) -> Self {
        Self(value)
    }
}

pub fn prefix_for_key(key: &str) -> &'static str {
    key.parse::<RequestType>()
        .map(|t| t.folio_prefix())
        .unwrap_or("DOC")
}

pub fn folder_for_key(key: &str) -> &'static str {
    key.parse::<RequestType>()
        .map(|t| t.default_folder())
        .unwrap_or("Otros")
}

/// Lifecycle state of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RequestStatus {
    #[default]
    #[serde(rename = "Pendiente")]
    Pending,
    #[serde(rename = "En Revisión")]
    InReview,
    #[serde(rename = "Aprobado")]
    Approved,
    #[serde(rename = "Rechazado")]
    Rejected,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 4] = [
        RequestStatus::Pending,
        RequestStatus::InReview,
        RequestStatus::Approved,
        RequestStatus::Rejected,
    ];

    /// Name stored in the list's status column
    pub fn wire_name(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "Pendiente",
            RequestStatus::InReview => "En Revisión",
            RequestStatus::Approved => "Aprobado",
            RequestStatus::Rejected => "Rechazado",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RequestStatus::ALL
            .iter()
            .copied()
            .find(|st| st.wire_name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Estado no válido: {}", s))
    }
}

/// One request as stored in the external list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    /// List item id, assigned by the list store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    pub folio: Folio,
    /// Title of the request type
    pub request_title: String,
    pub submitter_name: String,
    pub submitter_email: String,
    /// Email of the signed-in account that submitted the request
    pub account_email: String,
    pub student_id: String,
    pub fields: FieldMap,
    pub amount_requested: f64,
    pub amount_authorized: f64,
    pub status: RequestStatus,
    pub document_url: String,
    pub created_at: DateTime<Utc>,
    pub reviewer_notes: String,
}

impl RequestRecord {
    /// Build a new Pending record from a submitted field map.
    ///
    /// Name and email fall back across the field names used by the different
    /// forms and finally to the signed-in profile.
    pub fn from_submission(
        folio: Folio,
        request_title: &str,
        fields: &FieldMap,
        profile: &Profile,
        document_url: &str,
        created_at: DateTime<Utc>,
    ) -> Self {
        let submitter_name = first_non_empty(
            fields,
            &["nombre_completo", "nombre_estudiante", "nombre_solicitante"],
        )
        .unwrap_or_else(|| profile.display_name.clone());

        Self {
            item_id: None,
            folio,
            request_title: request_title.to_string(),
            submitter_name,
            submitter_email: submitter_email(fields, profile),
            account_email: profile.email.clone(),
            student_id: fields.get("matricula").cloned().unwrap_or_default(),
            fields: fields.clone(),
            amount_requested: requested_amount(fields).unwrap_or(0.0),
            amount_authorized: 0.0,
            status: RequestStatus::Pending,
            document_url: document_url.to_string(),
            created_at,
            reviewer_notes: String::new(),
        }
    }
}

/// Email the submitter typed in the form, else the profile email
pub fn submitter_email(fields: &FieldMap, profile: &Profile) -> String {
    first_non_empty(fields, &["correo", "correo_solicitante"])
        .unwrap_or_else(|| profile.email.clone())
}

/// Amount requested, from `monto_total` or `monto_solicitado`
pub fn requested_amount(fields: &FieldMap) -> Option<f64> {
    first_non_empty(fields, &["monto_total", "monto_solicitado"])
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

pub fn first_non_empty(fields: &FieldMap, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|n| fields.get(*n))
        .find(|v| !v.trim().is_empty())
        .cloned()
}

/// Administrator change to a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: RequestStatus,
    #[serde(default)]
    pub amount_authorized: Option<f64>,
    #[serde(default)]
    pub reviewer_notes: Option<String>,
}

/// Dashboard counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RequestStats {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

impl RequestStats {
    pub fn from_records(records: &[RequestRecord]) -> Self {
        records.iter().fold(
            RequestStats {
                total: records.len(),
                ..Default::default()
            },
            |mut stats, r| {
                match r.status {
                    RequestStatus::Pending => stats.pending += 1,
                    RequestStatus::Approved => stats.approved += 1,
                    RequestStatus::Rejected => stats.rejected += 1,
                    RequestStatus::InReview => {}
                }
                stats
            },
        )
    }
}
