// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Admin Panel Use Cases
//!
//! Listing, statistics, status changes and CSV exports over every request.
//! All operations require the administrator role.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Reviewing-body workflows over the request list

use chrono::Local;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

use super::session::Session;
use crate::domain::error::GatewayError;
use crate::domain::repository::RequestRepository;
use crate::domain::request::{RequestRecord, RequestStats, StatusUpdate};
use crate::infrastructure::csv_export::{self, ExportError, ExportKind};

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("No hay una sesión iniciada")]
    NotSignedIn,

    #[error("No tienes permisos para acceder al panel de administración")]
    Forbidden,

    #[error("El monto autorizado debe ser un número positivo")]
    InvalidAmount,

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminDashboard {
    pub records: Vec<RequestRecord>,
    pub stats: RequestStats,
}

/// A generated CSV file
#[derive(Debug, Clone)]
pub struct CsvFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl CsvFile {
    pub const CONTENT_TYPE: &'static str = "text/csv; charset=utf-8";
}

pub struct AdminService {
    repository: Arc<dyn RequestRepository>,
    export_prefix: String,
}

impl AdminService {
    pub fn new(repository: Arc<dyn RequestRepository>, export_prefix: impl Into<String>) -> Self {
        Self {
            repository,
            export_prefix: export_prefix.into(),
        }
    }

    fn authorize(session: &Session) -> Result<(), AdminError> {
        if !session.is_signed_in() {
            return Err(AdminError::NotSignedIn);
        }
        if !session.is_admin() {
            return Err(AdminError::Forbidden);
        }
        Ok(())
    }

    pub async fn dashboard(&self, session: &Session) -> Result<AdminDashboard, AdminError> {
        Self::authorize(session)?;
        let records = self.repository.list_all().await?;
        let stats = RequestStats::from_records(&records);
        Ok(AdminDashboard { records, stats })
    }

    pub async fn update_status(
        &self,
        session: &Session,
        item_id: &str,
        update: &StatusUpdate,
    ) -> Result<(), AdminError> {
        Self::authorize(session)?;
        if let Some(amount) = update.amount_authorized {
            if amount.is_nan() || amount < 0.0 {
                return Err(AdminError::InvalidAmount);
            }
        }

        self.repository.update_status(item_id, update).await?;
        info!(item_id = %item_id, status = %update.status, "Request status changed");
        Ok(())
    }

    /// Every request with the full column set
    pub async fn export_csv(&self, session: &Session) -> Result<CsvFile, AdminError> {
        Self::authorize(session)?;
        let records = self.repository.list_all().await?;
        self.export(&records, ExportKind::Full)
    }

    /// The selected folios with the reduced column set
    pub async fn export_filtered(&self, session: &Session, folios: &[String]) -> Result<CsvFile, AdminError> {
        Self::authorize(session)?;
        let wanted: HashSet<&str> = folios.iter().map(String::as_str).collect();
        let records: Vec<RequestRecord> = self
            .repository
            .list_all()
            .await?
            .into_iter()
            .filter(|r| wanted.contains(r.folio.as_str()))
            .collect();
        self.export(&records, ExportKind::Filtered)
    }

    fn export(&self, records: &[RequestRecord], kind: ExportKind) -> Result<CsvFile, AdminError> {
        let bytes = csv_export::export(records, kind)?;
        let file_name = kind.file_name(&self.export_prefix, Local::now().date_naive());
        info!(file = %file_name, rows = records.len(), "CSV export generated");
        Ok(CsvFile { file_name, bytes })
    }
}
