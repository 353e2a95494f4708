// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Request History
//!
//! The signed-in user's own requests, newest first, plus the row view model
//! shared with the admin panel.

use chrono::Local;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use super::session::Session;
use crate::domain::error::GatewayError;
use crate::domain::locale::format_mxn;
use crate::domain::repository::RequestRepository;
use crate::domain::request::{RequestRecord, RequestStatus};

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("No hay una sesión iniciada")]
    NotSignedIn,

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Table row for the history and admin templates
#[derive(Debug, Clone, Serialize)]
pub struct RecordView {
    pub item_id: Option<String>,
    pub folio: String,
    pub date: String,
    pub request_title: String,
    pub submitter_name: String,
    pub submitter_email: String,
    pub amount: String,
    pub amount_authorized: String,
    pub status: String,
    pub status_class: &'static str,
    pub document_url: String,
    pub reviewer_notes: String,
}

impl RecordView {
    pub fn from_record(record: &RequestRecord) -> Self {
        let status_class = match record.status {
            RequestStatus::Pending => "pending",
            RequestStatus::InReview => "review",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        };

        Self {
            item_id: record.item_id.clone(),
            folio: record.folio.to_string(),
            date: record.created_at.with_timezone(&Local).format("%d/%m/%Y").to_string(),
            request_title: record.request_title.clone(),
            submitter_name: record.submitter_name.clone(),
            submitter_email: record.submitter_email.clone(),
            amount: format_mxn(record.amount_requested),
            amount_authorized: if record.amount_authorized > 0.0 {
                format_mxn(record.amount_authorized)
            } else {
                String::new()
            },
            status: record.status.wire_name().to_string(),
            status_class,
            document_url: record.document_url.clone(),
            reviewer_notes: record.reviewer_notes.clone(),
        }
    }
}

pub struct HistoryService {
    repository: Arc<dyn RequestRepository>,
}

impl HistoryService {
    pub fn new(repository: Arc<dyn RequestRepository>) -> Self {
        Self { repository }
    }

    /// Records submitted from the session's account
    pub async fn my_requests(&self, session: &Session) -> Result<Vec<RequestRecord>, HistoryError> {
        let profile = session.profile().ok_or(HistoryError::NotSignedIn)?;
        let records = self.repository.list_for_submitter(&profile.email).await?;
        debug!(email = %profile.email, count = records.len(), "Loaded request history");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::request::{FieldMap, Folio};
    use chrono::Utc;

    #[test]
    fn test_record_view() {
        let record = RequestRecord {
            item_id: Some("4".into()),
            folio: Folio::from("LIB-20260301-120000".to_string()),
            request_title: "Solicitud Libre".into(),
            submitter_name: "Ana".into(),
            submitter_email: "ana@uv.mx".into(),
            account_email: "ana@uv.mx".into(),
            student_id: String::new(),
            fields: FieldMap::new(),
            amount_requested: 2500.0,
            amount_authorized: 0.0,
            status: RequestStatus::InReview,
            document_url: String::new(),
            created_at: Utc::now(),
            reviewer_notes: String::new(),
        };

        let view = RecordView::from_record(&record);
        assert_eq!(view.amount, "$2,500.00");
        assert_eq!(view.amount_authorized, "");
        assert_eq!(view.status, "En Revisión");
        assert_eq!(view.status_class, "review");
    }
}
