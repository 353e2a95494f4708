// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Gateway Factory - Application Layer
//!
//! Creates the per-session set of cloud adapters. Each session brings its own
//! credentials, so the Graph adapters are assembled around the session's
//! token provider while the HTTP client and site id cache are shared.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Wire domain ports to concrete adapters per session

use std::sync::Arc;

use crate::domain::calendar::CalendarProvider;
use crate::domain::identity::{ProfileSource, TokenProvider};
use crate::domain::notification::Mailer;
use crate::domain::repository::RequestRepository;
use crate::domain::storage::DocumentStore;
use crate::infrastructure::calendar::OutlookCalendar;
use crate::infrastructure::graph::{GraphClient, GraphPrincipal};
use crate::infrastructure::mail::GraphMailer;
use crate::infrastructure::onedrive::OneDriveStore;
use crate::infrastructure::profile::GraphProfileSource;
use crate::infrastructure::sharepoint::{SharePointListRepository, SiteIdCache};

/// Adapters one session works with
#[derive(Clone)]
pub struct Gateways {
    pub profiles: Arc<dyn ProfileSource>,
    pub repository: Arc<dyn RequestRepository>,
    pub documents: Arc<dyn DocumentStore>,
    pub mailer: Arc<dyn Mailer>,
    pub calendar: Arc<dyn CalendarProvider>,
}

pub trait GatewayFactory: Send + Sync {
    /// Adapters authenticated by `tokens`, acting on `mailbox` or the signed-in user
    fn gateways(&self, tokens: Arc<dyn TokenProvider>, mailbox: Option<&str>) -> Gateways;
}

/// Microsoft Graph implementation
pub struct GraphGatewayFactory {
    http: reqwest::Client,
    base_url: String,
    site: Arc<SiteIdCache>,
    list_name: String,
}

impl GraphGatewayFactory {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        site: Arc<SiteIdCache>,
        list_name: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            site,
            list_name: list_name.into(),
        }
    }
}

impl GatewayFactory for GraphGatewayFactory {
    fn gateways(&self, tokens: Arc<dyn TokenProvider>, mailbox: Option<&str>) -> Gateways {
        let graph = GraphClient::new(self.http.clone(), self.base_url.clone(), tokens);
        let principal = match mailbox {
            Some(upn) => GraphPrincipal::User(upn.to_string()),
            None => GraphPrincipal::Me,
        };

        Gateways {
            profiles: Arc::new(GraphProfileSource::new(graph.clone(), principal.clone())),
            repository: Arc::new(SharePointListRepository::new(
                graph.clone(),
                self.site.clone(),
                self.list_name.clone(),
            )),
            documents: Arc::new(OneDriveStore::new(graph.clone(), principal.clone())),
            mailer: Arc::new(GraphMailer::new(graph.clone(), principal.clone())),
            calendar: Arc::new(OutlookCalendar::new(graph, principal)),
        }
    }
}
