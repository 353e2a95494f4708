// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Outlook calendar adapter: creates events with `POST <principal>/events`.

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::graph::{GraphClient, GraphPrincipal, GraphRequest};
use crate::domain::calendar::{
    CalendarEvent, CalendarProvider, CreatedEvent, EVENT_END_TIME, EVENT_START_TIME,
};
use crate::domain::error::GatewayError;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EventBody<'a> {
    subject: &'a str,
    body: ItemBody<'a>,
    start: DateTimeZone<'a>,
    end: DateTimeZone<'a>,
    location: Location<'a>,
    categories: &'a [String],
    is_reminder_on: bool,
    reminder_minutes_before_start: u32,
    importance: &'static str,
    sensitivity: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ItemBody<'a> {
    content_type: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DateTimeZone<'a> {
    date_time: String,
    time_zone: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Location<'a> {
    display_name: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventResponse {
    id: String,
    #[serde(default)]
    web_link: Option<String>,
}

pub struct OutlookCalendar {
    graph: GraphClient,
    principal: GraphPrincipal,
}

impl OutlookCalendar {
    pub fn new(graph: GraphClient, principal: GraphPrincipal) -> Self {
        Self { graph, principal }
    }
}

#[async_trait]
impl CalendarProvider for OutlookCalendar {
    async fn create_event(&self, event: &CalendarEvent) -> Result<CreatedEvent, GatewayError> {
        let body = EventBody {
            subject: &event.subject,
            body: ItemBody {
                content_type: "HTML",
                content: &event.body_html,
            },
            start: DateTimeZone {
                date_time: format!("{}T{}", event.start.format("%Y-%m-%d"), EVENT_START_TIME),
                time_zone: &event.time_zone,
            },
            end: DateTimeZone {
                date_time: format!("{}T{}", event.end.format("%Y-%m-%d"), EVENT_END_TIME),
                time_zone: &event.time_zone,
            },
            location: Location {
                display_name: &event.location,
            },
            categories: &event.categories,
            is_reminder_on: true,
            reminder_minutes_before_start: event.reminder_minutes,
            importance: "normal",
            sensitivity: "normal",
        };

        let path = format!("{}/events", self.principal.path_prefix());
        let created: EventResponse = self
            .graph
            .call_json(GraphRequest::new(Method::POST, path).json(&body)?)
            .await?;

        info!(event_id = %created.id, subject = %event.subject, "Calendar event created");
        Ok(CreatedEvent {
            id: created.id,
            web_link: created.web_link,
        })
    }
}
