// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Graph mailer: sends HTML messages through `sendMail` on the principal's mailbox.

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use tracing::debug;

use super::graph::{GraphClient, GraphPrincipal, GraphRequest};
use crate::domain::error::GatewayError;
use crate::domain::notification::{EmailMessage, Mailer};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendMailBody<'a> {
    message: MailMessage<'a>,
    save_to_sent_items: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MailMessage<'a> {
    subject: &'a str,
    body: MailBody<'a>,
    to_recipients: Vec<Recipient<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MailBody<'a> {
    content_type: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Recipient<'a> {
    email_address: EmailAddress<'a>,
}

#[derive(Serialize)]
struct EmailAddress<'a> {
    address: &'a str,
}

pub struct GraphMailer {
    graph: GraphClient,
    principal: GraphPrincipal,
}

impl GraphMailer {
    pub fn new(graph: GraphClient, principal: GraphPrincipal) -> Self {
        Self { graph, principal }
    }
}

#[async_trait]
impl Mailer for GraphMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), GatewayError> {
        let body = SendMailBody {
            message: MailMessage {
                subject: &message.subject,
                body: MailBody {
                    content_type: "HTML",
                    content: &message.body,
                },
                to_recipients: vec![Recipient {
                    email_address: EmailAddress { address: &message.to },
                }],
            },
            save_to_sent_items: true,
        };

        let path = format!("{}/sendMail", self.principal.path_prefix());
        self.graph
            .call(GraphRequest::new(Method::POST, path).json(&body)?)
            .await?;

        debug!(to = %message.to, subject = %message.subject, "Email sent");
        Ok(())
    }
}
