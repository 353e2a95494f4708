// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Automation webhook (e.g. a Power Automate HTTP trigger).

use async_trait::async_trait;
use tracing::debug;

use crate::domain::error::GatewayError;
use crate::domain::notification::{AutomationEvent, AutomationHook};

pub struct WebhookNotifier {
    http: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self { http, url: url.into() }
    }
}

#[async_trait]
impl AutomationHook for WebhookNotifier {
    async fn notify(&self, event: &AutomationEvent) -> Result<(), GatewayError> {
        let response = self
            .http
            .post(&self.url)
            .json(event)
            .send()
            .await
            .map_err(GatewayError::from)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message: if text.trim().is_empty() {
                    format!("Error {}", status.as_u16())
                } else {
                    text
                },
            });
        }

        debug!(folio = %event.folio, "Automation webhook triggered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[tokio::test]
    async fn test_webhook_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/flow")
            .match_body(Matcher::Json(json!({
                "folio": "AVI-20260101-000000",
                "tipo": "Aval Institucional",
                "solicitante": "Ana",
                "email": "ana@uv.mx",
                "pdfUrl": "https://drive/x.pdf"
            })))
            .with_status(202)
            .create_async()
            .await;

        let notifier = WebhookNotifier::new(reqwest::Client::new(), format!("{}/flow", server.url()));
        notifier
            .notify(&AutomationEvent {
                folio: "AVI-20260101-000000".into(),
                request_title: "Aval Institucional".into(),
                submitter_name: "Ana".into(),
                email: "ana@uv.mx".into(),
                document_url: "https://drive/x.pdf".into(),
            })
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_webhook_failure_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("POST", "/flow").with_status(500).create_async().await;

        let notifier = WebhookNotifier::new(reqwest::Client::new(), format!("{}/flow", server.url()));
        let err = notifier
            .notify(&AutomationEvent {
                folio: "X".into(),
                request_title: "T".into(),
                submitter_name: String::new(),
                email: String::new(),
                document_url: String::new(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
    }
}
