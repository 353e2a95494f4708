// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Notification
//!
//! Ports for outbound email and the optional automation hook. Both are
//! best-effort from the caller's point of view.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::GatewayError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    /// HTML body
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), GatewayError>;
}

/// JSON payload posted to the automation webhook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationEvent {
    pub folio: String,
    #[serde(rename = "tipo")]
    pub request_title: String,
    #[serde(rename = "solicitante")]
    pub submitter_name: String,
    pub email: String,
    #[serde(rename = "pdfUrl")]
    pub document_url: String,
}

#[async_trait]
pub trait AutomationHook: Send + Sync {
    async fn notify(&self, event: &AutomationEvent) -> Result<(), GatewayError>;
}

/// Outcome of one best-effort send, reported back to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Sent,
    Skipped,
    Failed(String),
}

impl DeliveryOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, DeliveryOutcome::Failed(_))
    }
}
