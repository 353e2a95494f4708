// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Portal
//!
//! Composition root: configuration plus the components shared by every
//! session (HTTP client, templates, PDF renderer, webhook). Use cases are
//! assembled on demand around a session's gateways.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Explicit application context handed to the HTTP and CLI layers

use anyhow::Context;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::admin::{AdminDashboard, AdminService};
use super::calendar::CalendarService;
use super::forms::{FormRenderer, PageUser};
use super::gateway_factory::{GatewayFactory, Gateways, GraphGatewayFactory};
use super::history::{HistoryService, RecordView};
use super::session::{Session, SessionError};
use super::submission::{SubmissionError, SubmissionOrchestrator, SubmissionReceipt, SubmissionSettings};
use crate::domain::config::{InstitutionConfig, PortalConfigManifest};
use crate::domain::document::DocumentRenderer;
use crate::domain::identity::{Profile, TokenProvider};
use crate::domain::notification::AutomationHook;
use crate::domain::request::{FieldMap, RequestRecord, RequestStats};
use crate::infrastructure::graph::{ClientCredentialsTokenProvider, GraphClient};
use crate::infrastructure::pdf::PdfLetterRenderer;
use crate::infrastructure::sharepoint::SiteIdCache;
use crate::infrastructure::templates::{RenderError, TemplateEngine, ADMIN_PAGE, HISTORY_PAGE};
use crate::infrastructure::webhook::WebhookNotifier;

#[derive(Serialize)]
struct ListPage<'a> {
    records: Vec<RecordView>,
    stats: Option<RequestStats>,
    user: Option<PageUser>,
    institution: &'a InstitutionConfig,
}

pub struct Portal {
    config: PortalConfigManifest,
    http: reqwest::Client,
    factory: Arc<dyn GatewayFactory>,
    templates: Arc<TemplateEngine>,
    renderer: Arc<dyn DocumentRenderer>,
    hook: Option<Arc<dyn AutomationHook>>,
    forms: FormRenderer,
}

impl Portal {
    /// Portal wired to Microsoft Graph as described by the configuration
    pub fn from_config(config: PortalConfigManifest) -> anyhow::Result<Self> {
        let http = GraphClient::http_client(Duration::from_secs(config.spec.graph.timeout_secs))
            .context("Failed to create HTTP client")?;

        let sharepoint = &config.spec.sharepoint;
        let site = Arc::new(SiteIdCache::new(
            sharepoint.site_url.clone(),
            sharepoint.site_id.clone(),
        ));
        let factory = Arc::new(GraphGatewayFactory::new(
            http.clone(),
            config.spec.graph.base_url.clone(),
            site,
            sharepoint.list_name.clone(),
        ));

        let hook: Option<Arc<dyn AutomationHook>> = config
            .spec
            .automation
            .active_url()
            .map(|url| Arc::new(WebhookNotifier::new(http.clone(), url)) as Arc<dyn AutomationHook>);

        info!(
            site = %sharepoint.site_url,
            list = %sharepoint.list_name,
            webhook = hook.is_some(),
            "Portal configured"
        );
        Self::new(config, http, factory, hook)
    }

    /// Portal with explicit gateways
    pub fn new(
        config: PortalConfigManifest,
        http: reqwest::Client,
        factory: Arc<dyn GatewayFactory>,
        hook: Option<Arc<dyn AutomationHook>>,
    ) -> anyhow::Result<Self> {
        let templates = Arc::new(TemplateEngine::new().context("Failed to load templates")?);
        let renderer: Arc<dyn DocumentRenderer> =
            Arc::new(PdfLetterRenderer::new(config.spec.institution.letterhead()));
        let forms = FormRenderer::new(templates.clone(), config.spec.institution.clone());

        Ok(Self {
            config,
            http,
            factory,
            templates,
            renderer,
            hook,
            forms,
        })
    }

    pub fn config(&self) -> &PortalConfigManifest {
        &self.config
    }

    pub fn forms(&self) -> &FormRenderer {
        &self.forms
    }

    pub fn templates(&self) -> &TemplateEngine {
        &self.templates
    }

    /// Session authenticated with the configured client credentials.
    ///
    /// Requires `spec.identity.client_secret` and `spec.email.sender_mailbox`.
    pub fn application_session(&self) -> anyhow::Result<Session> {
        let identity = &self.config.spec.identity;
        let secret = identity
            .resolve_client_secret()?
            .context("spec.identity.client_secret is required for application mode")?;
        let mailbox = self
            .config
            .spec
            .email
            .sender_mailbox
            .clone()
            .context("spec.email.sender_mailbox is required for application mode")?;

        let tokens = ClientCredentialsTokenProvider::new(
            self.http.clone(),
            identity.token_endpoint(),
            identity.client_id.clone(),
            secret,
        );
        Ok(Session::application(Arc::new(tokens), mailbox))
    }

    /// Adapters acting with the session's credentials once signed in
    pub fn gateways(&self, session: &Arc<Session>) -> Gateways {
        let tokens: Arc<dyn TokenProvider> = session.clone();
        self.factory.gateways(tokens, session.mailbox())
    }

    pub async fn sign_in(&self, session: &Session) -> Result<Profile, SessionError> {
        let gateways = self.factory.gateways(session.tokens(), session.mailbox());
        session
            .sign_in(gateways.profiles.as_ref(), &self.config.access_policy())
            .await
    }

    pub fn page_user(session: &Session) -> Option<PageUser> {
        match (session.profile(), session.role()) {
            (Some(profile), Some(role)) => Some(PageUser::new(&profile, role)),
            _ => None,
        }
    }

    pub fn submission(&self, session: &Arc<Session>) -> SubmissionOrchestrator {
        let gateways = self.gateways(session);
        SubmissionOrchestrator::new(
            self.renderer.clone(),
            gateways.documents,
            gateways.repository,
            gateways.mailer,
            self.hook.clone(),
            self.templates.clone(),
            SubmissionSettings::from_manifest(&self.config),
        )
    }

    pub async fn submit(
        &self,
        session: &Arc<Session>,
        request_key: &str,
        fields: FieldMap,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        self.submission(session).submit(session, request_key, fields).await
    }

    pub fn history(&self, session: &Arc<Session>) -> HistoryService {
        HistoryService::new(self.gateways(session).repository)
    }

    pub fn admin(&self, session: &Arc<Session>) -> AdminService {
        AdminService::new(
            self.gateways(session).repository,
            self.config.spec.institution.short_name.clone(),
        )
    }

    pub fn calendar(&self, session: &Arc<Session>) -> CalendarService {
        CalendarService::new(
            self.gateways(session).calendar,
            self.templates.clone(),
            self.config.spec.institution.clone(),
            self.config.spec.options.time_zone.clone(),
        )
    }

    pub fn history_page(&self, session: &Session, records: &[RequestRecord]) -> Result<String, RenderError> {
        self.templates.render(
            HISTORY_PAGE,
            &ListPage {
                records: records.iter().map(RecordView::from_record).collect(),
                stats: None,
                user: Self::page_user(session),
                institution: &self.config.spec.institution,
            },
        )
    }

    pub fn admin_page(&self, session: &Session, dashboard: &AdminDashboard) -> Result<String, RenderError> {
        self.templates.render(
            ADMIN_PAGE,
            &ListPage {
                records: dashboard.records.iter().map(RecordView::from_record).collect(),
                stats: Some(dashboard.stats),
                user: Self::page_user(session),
                institution: &self.config.spec.institution,
            },
        )
    }
}
