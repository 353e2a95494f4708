// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Submit Request Use Case
//!
//! Turns a validated field map into a stored request.
//!
//! # DDD Pattern: Application Service
//!
//! - **Layer:** Application
//! - **Responsibility:** Run one submission end to end for a session
//! - **Collaborators:**
//!   - Domain: FormCatalog, validation, RequestRecord
//!   - Infrastructure: DocumentRenderer, DocumentStore, RequestRepository, Mailer, AutomationHook
//!
//! # Flow
//!
//! 1. Check sign-in, claim the session guard, resolve the form and validate
//! 2. Render the PDF letter
//! 3. Upload it and obtain its URL
//! 4. Create the list record referencing that URL
//! 5. Send confirmation (when enabled) and reviewer emails, best-effort, in that order
//! 6. Call the automation webhook when configured, best-effort
//!
//! Steps 2 to 4 abort the submission on failure. Steps 5 and 6 only log and
//! report their outcome in the receipt.

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::session::Session;
use crate::domain::catalog::{FormCatalog, RequestType, UnknownRequestType};
use crate::domain::config::{EmailConfig, InstitutionConfig, PortalConfigManifest, StorageConfig};
use crate::domain::document::{DocumentError, DocumentRenderer, DocumentRequest};
use crate::domain::error::GatewayError;
use crate::domain::locale::{format_mxn, long_date};
use crate::domain::notification::{AutomationEvent, AutomationHook, DeliveryOutcome, EmailMessage, Mailer};
use crate::domain::repository::RequestRepository;
use crate::domain::request::{FieldMap, Folio, RequestRecord};
use crate::domain::storage::{DocumentPath, DocumentStore};
use crate::domain::validation::{validate_submission, ValidationError, ValidationRules};
use crate::infrastructure::templates::{TemplateEngine, CONFIRMATION_EMAIL, REVIEWER_EMAIL};

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("No hay una sesión iniciada")]
    NotSignedIn,

    #[error("Ya hay una solicitud en proceso de envío")]
    AlreadyInProgress,

    #[error(transparent)]
    UnknownRequestType(#[from] UnknownRequestType),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("No se pudo subir el PDF: {0}")]
    Upload(GatewayError),

    #[error("{0}")]
    Persist(GatewayError),
}

impl SubmissionError {
    /// True when nothing was sent to the cloud APIs
    pub fn is_local(&self) -> bool {
        !matches!(self, SubmissionError::Upload(_) | SubmissionError::Persist(_))
    }

    fn outcome_label(&self) -> &'static str {
        match self {
            SubmissionError::NotSignedIn => "not_signed_in",
            SubmissionError::AlreadyInProgress => "in_progress",
            SubmissionError::UnknownRequestType(_) | SubmissionError::Validation(_) => "invalid",
            SubmissionError::Document(_) => "document_failed",
            SubmissionError::Upload(_) => "upload_failed",
            SubmissionError::Persist(_) => "persist_failed",
        }
    }
}

/// Outcome of each best-effort notification
#[derive(Debug, Clone, Serialize)]
pub struct NotificationReport {
    pub confirmation: DeliveryOutcome,
    pub reviewer: DeliveryOutcome,
    pub webhook: DeliveryOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub folio: Folio,
    pub request_type: RequestType,
    pub request_title: String,
    pub document_url: String,
    pub item_id: String,
    pub submitted_at: DateTime<Utc>,
    pub notifications: NotificationReport,
}

/// Configuration the orchestrator reads on every submission
#[derive(Debug, Clone)]
pub struct SubmissionSettings {
    pub rules: ValidationRules,
    pub storage: StorageConfig,
    pub email: EmailConfig,
    pub institution: InstitutionConfig,
}

impl SubmissionSettings {
    pub fn from_manifest(config: &PortalConfigManifest) -> Self {
        Self {
            rules: config.validation_rules(),
            storage: config.spec.storage.clone(),
            email: config.spec.email.clone(),
            institution: config.spec.institution.clone(),
        }
    }
}

#[derive(Serialize)]
struct EmailView<'a> {
    folio: &'a str,
    request_title: &'a str,
    submitter_name: &'a str,
    submitter_email: &'a str,
    student_id: &'a str,
    amount: Option<String>,
    date: String,
    document_url: &'a str,
    reviewing_body: &'a str,
    institution: &'a InstitutionConfig,
}

pub struct SubmissionOrchestrator {
    catalog: &'static FormCatalog,
    renderer: Arc<dyn DocumentRenderer>,
    store: Arc<dyn DocumentStore>,
    repository: Arc<dyn RequestRepository>,
    mailer: Arc<dyn Mailer>,
    hook: Option<Arc<dyn AutomationHook>>,
    templates: Arc<TemplateEngine>,
    settings: SubmissionSettings,
}

impl SubmissionOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        renderer: Arc<dyn DocumentRenderer>,
        store: Arc<dyn DocumentStore>,
        repository: Arc<dyn RequestRepository>,
        mailer: Arc<dyn Mailer>,
        hook: Option<Arc<dyn AutomationHook>>,
        templates: Arc<TemplateEngine>,
        settings: SubmissionSettings,
    ) -> Self {
        Self {
            catalog: FormCatalog::standard(),
            renderer,
            store,
            repository,
            mailer,
            hook,
            templates,
            settings,
        }
    }

    pub async fn submit(
        &self,
        session: &Session,
        request_key: &str,
        fields: FieldMap,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let result = self.run(session, request_key, fields).await;
        let outcome = match &result {
            Ok(_) => "submitted",
            Err(e) => e.outcome_label(),
        };
        metrics::counter!("tramites_submissions_total", "outcome" => outcome).increment(1);
        result
    }

    async fn run(
        &self,
        session: &Session,
        request_key: &str,
        fields: FieldMap,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let profile = session.profile().ok_or(SubmissionError::NotSignedIn)?;
        let _permit = session
            .try_begin_submission()
            .ok_or(SubmissionError::AlreadyInProgress)?;

        let request_type: RequestType = request_key.parse()?;
        let form = self.catalog.get(request_type);
        validate_submission(form, &fields, &self.settings.rules)?;

        let issued_at = Local::now();
        let folio = Folio::generate(request_type, issued_at);
        let mut record = RequestRecord::from_submission(
            folio.clone(),
            &form.title,
            &fields,
            &profile,
            "",
            issued_at.with_timezone(&Utc),
        );
        info!(folio = %folio, request_type = %request_type, "Processing submission");

        debug!(folio = %folio, "Rendering PDF");
        let bytes = self.renderer.render(&DocumentRequest {
            form,
            fields: &fields,
            folio: &folio,
            submitter_name: &record.submitter_name,
            student_id: &record.student_id,
            issued_at,
        })?;

        debug!(folio = %folio, size = bytes.len(), "Uploading PDF");
        let path = DocumentPath {
            base_path: self.settings.storage.base_path.clone(),
            folder: self.settings.storage.folder_for(request_type),
            file_name: format!("{}.pdf", folio),
        };
        let stored = self
            .store
            .upload(&path, bytes)
            .await
            .map_err(SubmissionError::Upload)?;
        record.document_url = stored.web_url;

        debug!(folio = %folio, "Creating list record");
        let item_id = self
            .repository
            .create(&record)
            .await
            .map_err(SubmissionError::Persist)?;
        record.item_id = Some(item_id.clone());

        let notifications = self.notify(&record, issued_at).await;

        info!(folio = %folio, item_id = %item_id, "Submission completed");
        Ok(SubmissionReceipt {
            folio,
            request_type,
            request_title: record.request_title,
            document_url: record.document_url,
            item_id,
            submitted_at: record.created_at,
            notifications,
        })
    }

    async fn notify(&self, record: &RequestRecord, issued_at: DateTime<Local>) -> NotificationReport {
        let institution = &self.settings.institution;
        let view = EmailView {
            folio: record.folio.as_str(),
            request_title: &record.request_title,
            submitter_name: &record.submitter_name,
            submitter_email: &record.submitter_email,
            student_id: &record.student_id,
            amount: (record.amount_requested > 0.0).then(|| format_mxn(record.amount_requested)),
            date: long_date(&issued_at),
            document_url: &record.document_url,
            reviewing_body: &institution.reviewing_body,
            institution,
        };

        let confirmation = if self.settings.email.send_confirmation {
            let subject = format!(
                "{} — Solicitud recibida (Folio: {})",
                institution.short_name, record.folio
            );
            self.send_email(record.submitter_email.clone(), subject, CONFIRMATION_EMAIL, &view)
                .await
        } else {
            DeliveryOutcome::Skipped
        };

        let reviewer = self
            .send_email(
                self.settings.email.reviewer_address.clone(),
                format!("{} — Nueva solicitud: {}", institution.short_name, record.folio),
                REVIEWER_EMAIL,
                &view,
            )
            .await;

        let webhook = match &self.hook {
            Some(hook) => self.call_webhook(hook.as_ref(), record).await,
            None => DeliveryOutcome::Skipped,
        };

        NotificationReport {
            confirmation,
            reviewer,
            webhook,
        }
    }

    async fn call_webhook(&self, hook: &dyn AutomationHook, record: &RequestRecord) -> DeliveryOutcome {
        let event = AutomationEvent {
            folio: record.folio.to_string(),
            request_title: record.request_title.clone(),
            submitter_name: record.submitter_name.clone(),
            email: record.account_email.clone(),
            document_url: record.document_url.clone(),
        };
        match hook.notify(&event).await {
            Ok(()) => DeliveryOutcome::Sent,
            Err(e) => {
                warn!(folio = %record.folio, error = %e, "Automation webhook failed");
                metrics::counter!("tramites_notifications_failed_total", "channel" => "webhook")
                    .increment(1);
                DeliveryOutcome::Failed(e.to_string())
            }
        }
    }

    async fn send_email(
        &self,
        to: String,
        subject: String,
        template: &str,
        view: &EmailView<'_>,
    ) -> DeliveryOutcome {
        let body = match self.templates.render(template, view) {
            Ok(body) => body,
            Err(e) => {
                warn!(template, error = %e, "Email template failed");
                return DeliveryOutcome::Failed(e.to_string());
            }
        };

        let message = EmailMessage { to, subject, body };
        match self.mailer.send(&message).await {
            Ok(()) => {
                debug!(to = %message.to, "Email sent");
                DeliveryOutcome::Sent
            }
            Err(e) => {
                warn!(to = %message.to, error = %e, "Email send failed");
                metrics::counter!("tramites_notifications_failed_total", "channel" => "email").increment(1);
                DeliveryOutcome::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_errors() {
        assert!(SubmissionError::AlreadyInProgress.is_local());
        assert!(!SubmissionError::Upload(GatewayError::Network("x".into())).is_local());
    }

    #[test]
    fn test_upload_error_classified_as_document() {
        use crate::domain::error::{ErrorCategory, UserFacingError};

        let err = SubmissionError::Upload(GatewayError::Api {
            status: 500,
            message: "boom".into(),
        });
        assert_eq!(UserFacingError::from_error(&err).category, ErrorCategory::Document);
    }
}
