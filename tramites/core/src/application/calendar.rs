// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Add To Calendar Use Case
//!
//! Creates an Outlook event for a submitted request. When the form carries no
//! start date, or Graph rejects the event, the caller gets a compose deep-link
//! to create it by hand instead, together with the reason.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::calendar::{
    event_end, event_location, event_start, CalendarEvent, CalendarProvider, ComposeLink, CreatedEvent,
    FallbackReason, REMINDER_MINUTES,
};
use crate::domain::catalog::{FormCatalog, RequestType, UnknownRequestType};
use crate::domain::config::InstitutionConfig;
use crate::domain::locale::format_mxn;
use crate::domain::request::{first_non_empty, requested_amount, FieldMap};
use crate::infrastructure::templates::{RenderError, TemplateEngine, EVENT_BODY};

#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    #[error(transparent)]
    UnknownRequestType(#[from] UnknownRequestType),

    #[error(transparent)]
    Template(#[from] RenderError),
}

/// A submitted request to put on the calendar
#[derive(Debug, Clone, Deserialize)]
pub struct CalendarRequest {
    pub folio: String,
    pub request_type: String,
    #[serde(default)]
    pub fields: FieldMap,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CalendarOutcome {
    Created { event: CreatedEvent },
    Fallback { url: String, reason: FallbackReason },
}

#[derive(Serialize)]
struct EventBodyView<'a> {
    folio: &'a str,
    request_title: &'a str,
    submitter_name: String,
    activity: Option<String>,
    destination: Option<String>,
    host_institution: Option<String>,
    amount: Option<String>,
    reviewing_body: &'a str,
    institution: &'a InstitutionConfig,
}

pub struct CalendarService {
    provider: Arc<dyn CalendarProvider>,
    templates: Arc<TemplateEngine>,
    institution: InstitutionConfig,
    time_zone: String,
}

impl CalendarService {
    pub fn new(
        provider: Arc<dyn CalendarProvider>,
        templates: Arc<TemplateEngine>,
        institution: InstitutionConfig,
        time_zone: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            templates,
            institution,
            time_zone: time_zone.into(),
        }
    }

    pub async fn add_to_calendar(&self, request: &CalendarRequest) -> Result<CalendarOutcome, CalendarError> {
        let request_type: RequestType = request.request_type.parse()?;
        let title = FormCatalog::standard().title(request_type);
        let subject = format!("{}: {}", self.institution.short_name, title);
        let location = event_location(&request.fields, &self.institution.location());

        let Some(start) = event_start(&request.fields) else {
            info!(folio = %request.folio, "No event date in the form, returning compose link");
            return Ok(self.fallback(request, title, &subject, &location, FallbackReason::MissingDate));
        };
        let end = event_end(&request.fields, start);

        let event = CalendarEvent {
            subject: subject.clone(),
            body_html: self.event_body(request, title)?,
            start,
            end,
            time_zone: self.time_zone.clone(),
            location: location.clone(),
            categories: vec![
                self.institution.short_name.clone(),
                "Solicitud".to_string(),
                title.to_string(),
            ],
            reminder_minutes: REMINDER_MINUTES,
        };

        match self.provider.create_event(&event).await {
            Ok(created) => Ok(CalendarOutcome::Created { event: created }),
            Err(e) => {
                warn!(folio = %request.folio, error = %e, "Calendar event failed, returning compose link");
                Ok(self.fallback(
                    request,
                    title,
                    &subject,
                    &location,
                    FallbackReason::ApiError(e.to_string()),
                ))
            }
        }
    }

    fn event_body(&self, request: &CalendarRequest, title: &str) -> Result<String, RenderError> {
        let fields = &request.fields;
        let view = EventBodyView {
            folio: &request.folio,
            request_title: title,
            submitter_name: submitter_name(fields),
            activity: first_non_empty(fields, &["titulo_actividad"]),
            destination: first_non_empty(fields, &["destino"]),
            host_institution: first_non_empty(fields, &["institucion_anfitriona"]),
            amount: requested_amount(fields).filter(|a| *a > 0.0).map(format_mxn),
            reviewing_body: &self.institution.reviewing_body,
            institution: &self.institution,
        };
        self.templates.render(EVENT_BODY, &view)
    }

    fn fallback(
        &self,
        request: &CalendarRequest,
        title: &str,
        subject: &str,
        location: &str,
        reason: FallbackReason,
    ) -> CalendarOutcome {
        // The manual link still needs a day; today stands in for a missing one
        let start = event_start(&request.fields).unwrap_or_else(|| Local::now().date_naive());
        let end = event_end(&request.fields, start);
        let body = format!(
            "Folio: {}\nTipo: {}\nSolicitante: {}\nEstado: Pendiente de Revisión\n\nSistema {} - {}",
            request.folio,
            title,
            submitter_name(&request.fields),
            self.institution.short_name,
            self.institution.university,
        );

        let url = ComposeLink {
            subject,
            body: &body,
            location,
            start,
            end,
        }
        .to_url();

        CalendarOutcome::Fallback { url, reason }
    }
}

fn submitter_name(fields: &FieldMap) -> String {
    first_non_empty(fields, &["nombre_completo", "nombre_estudiante", "nombre_solicitante"]).unwrap_or_default()
}
