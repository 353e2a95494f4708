// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Calendar
//!
//! Calendar event derived from a submitted request, the port that creates it
//! and the compose deep-link used when the event cannot be created.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Calendar event model and fallback link

use async_trait::async_trait;
use chrono::NaiveDate;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use super::error::GatewayError;
use super::locale::parse_form_date;
use super::request::{first_non_empty, FieldMap};

const COMPOSE_URL: &str = "https://outlook.office.com/calendar/0/deeplink/compose";

/// Same unreserved set as `encodeURIComponent`
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub const EVENT_START_TIME: &str = "09:00:00";
pub const EVENT_END_TIME: &str = "18:00:00";
pub const REMINDER_MINUTES: u32 = 1440;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub subject: String,
    pub body_html: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub time_zone: String,
    pub location: String,
    pub categories: Vec<String>,
    pub reminder_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedEvent {
    pub id: String,
    pub web_link: Option<String>,
}

#[async_trait]
pub trait CalendarProvider: Send + Sync {
    async fn create_event(&self, event: &CalendarEvent) -> Result<CreatedEvent, GatewayError>;
}

/// Why the manual compose link was returned instead of a created event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum FallbackReason {
    MissingDate,
    ApiError(String),
}

/// Start date: `fecha_inicio`, `fecha_actividad`, then `fecha_evento`
pub fn event_start(fields: &FieldMap) -> Option<NaiveDate> {
    first_non_empty(fields, &["fecha_inicio", "fecha_actividad", "fecha_evento"])
        .and_then(|v| parse_form_date(&v))
}

/// End date: `fecha_termino`, `fecha_fin`, then the start date
pub fn event_end(fields: &FieldMap, start: NaiveDate) -> NaiveDate {
    first_non_empty(fields, &["fecha_termino", "fecha_fin"])
        .and_then(|v| parse_form_date(&v))
        .unwrap_or(start)
}

pub fn event_location(fields: &FieldMap, default_location: &str) -> String {
    first_non_empty(fields, &["destino", "lugar"]).unwrap_or_else(|| default_location.to_string())
}

/// Parameters of the manual compose link
#[derive(Debug, Clone)]
pub struct ComposeLink<'a> {
    pub subject: &'a str,
    pub body: &'a str,
    pub location: &'a str,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ComposeLink<'_> {
    pub fn to_url(&self) -> String {
        format!(
            "{}?subject={}&body={}&location={}&startdt={}T{}&enddt={}T{}",
            COMPOSE_URL,
            utf8_percent_encode(self.subject, COMPONENT),
            utf8_percent_encode(self.body, COMPONENT),
            utf8_percent_encode(self.location, COMPONENT),
            self.start.format("%Y-%m-%d"),
            EVENT_START_TIME,
            self.end.format("%Y-%m-%d"),
            EVENT_END_TIME,
        )
    }
}
