// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! SharePoint List Repository
//!
//! Stores request records as items of a SharePoint list through Graph.
//! The site id is resolved from the configured site URL and cached for
//! thirty minutes, shared by every session.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Implements `RequestRepository` over Graph list items

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::graph::{GraphClient, GraphRequest};
use crate::domain::error::GatewayError;
use crate::domain::repository::{RequestRepository, ADMIN_PAGE_SIZE, SUBMITTER_PAGE_SIZE};
use crate::domain::request::{FieldMap, Folio, RequestRecord, RequestStatus, StatusUpdate};

pub const SITE_ID_TTL: Duration = Duration::from_secs(30 * 60);

/// Site id lookup with a shared time-limited cache
pub struct SiteIdCache {
    site_url: String,
    configured: Option<String>,
    ttl: Duration,
    cached: Mutex<Option<(String, Instant)>>,
}

#[derive(Deserialize)]
struct SiteResponse {
    id: String,
}

impl SiteIdCache {
    pub fn new(site_url: impl Into<String>, configured: Option<String>) -> Self {
        Self {
            site_url: site_url.into(),
            configured: configured.filter(|s| !s.trim().is_empty()),
            ttl: SITE_ID_TTL,
            cached: Mutex::new(None),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Graph path addressing the site by hostname and server-relative path
    pub fn lookup_path(&self) -> Result<String, GatewayError> {
        let url = url::Url::parse(&self.site_url).map_err(|e| {
            GatewayError::Rejected(format!("URL de sitio inválida '{}': {}", self.site_url, e))
        })?;
        let host = url
            .host_str()
            .ok_or_else(|| GatewayError::Rejected(format!("URL de sitio sin host: {}", self.site_url)))?;
        Ok(format!("/sites/{}:{}", host, url.path().trim_end_matches('/')))
    }

    pub async fn resolve(&self, graph: &GraphClient) -> Result<String, GatewayError> {
        if let Some(id) = &self.configured {
            return Ok(id.clone());
        }

        if let Some((id, fetched_at)) = self.cached.lock().as_ref() {
            if fetched_at.elapsed() < self.ttl {
                return Ok(id.clone());
            }
        }

        let site: SiteResponse = graph.call_json(GraphRequest::get(self.lookup_path()?)).await?;
        info!(site_id = %site.id, "Resolved SharePoint site id");
        *self.cached.lock() = Some((site.id.clone(), Instant::now()));
        Ok(site.id)
    }
}

/// List item columns as stored in SharePoint
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListFields {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    folio: Option<String>,
    #[serde(default)]
    tipo_tramite: Option<String>,
    #[serde(default)]
    nombre_solicitante: Option<String>,
    #[serde(default)]
    email_solicitante: Option<String>,
    #[serde(default, rename = "EmailUsuarioM365")]
    email_usuario_m365: Option<String>,
    #[serde(default)]
    matricula: Option<String>,
    #[serde(default)]
    monto_solicitado: Option<f64>,
    #[serde(default)]
    monto_autorizado: Option<f64>,
    #[serde(default)]
    estado: Option<String>,
    #[serde(default)]
    datos_completos: Option<String>,
    #[serde(default)]
    fecha_solicitud: Option<DateTime<Utc>>,
    #[serde(default, rename = "NotasCT")]
    notas_ct: Option<String>,
    #[serde(default, rename = "URLPdf")]
    url_pdf: Option<Value>,
}

impl ListFields {
    fn from_record(record: &RequestRecord) -> Self {
        Self {
            title: Some(record.folio.to_string()),
            folio: Some(record.folio.to_string()),
            tipo_tramite: Some(record.request_title.clone()),
            nombre_solicitante: Some(record.submitter_name.clone()),
            email_solicitante: Some(record.submitter_email.clone()),
            email_usuario_m365: Some(record.account_email.clone()),
            matricula: Some(record.student_id.clone()),
            monto_solicitado: Some(record.amount_requested),
            monto_autorizado: Some(record.amount_authorized),
            estado: Some(record.status.wire_name().to_string()),
            datos_completos: serde_json::to_string(&record.fields).ok(),
            fecha_solicitud: Some(record.created_at),
            notas_ct: Some(record.reviewer_notes.clone()),
            url_pdf: Some(Value::String(record.document_url.clone())),
        }
    }

    fn into_record(self, item_id: String) -> RequestRecord {
        let folio = self.folio.or(self.title).unwrap_or_default();
        RequestRecord {
            item_id: Some(item_id),
            folio: Folio::from(folio),
            request_title: self.tipo_tramite.unwrap_or_default(),
            submitter_name: self.nombre_solicitante.unwrap_or_default(),
            submitter_email: self.email_solicitante.unwrap_or_default(),
            account_email: self.email_usuario_m365.unwrap_or_default(),
            student_id: self.matricula.unwrap_or_default(),
            fields: self
                .datos_completos
                .as_deref()
                .map(parse_field_blob)
                .unwrap_or_default(),
            amount_requested: self.monto_solicitado.unwrap_or(0.0),
            amount_authorized: self.monto_autorizado.unwrap_or(0.0),
            status: self
                .estado
                .as_deref()
                .and_then(|s| s.parse::<RequestStatus>().ok())
                .unwrap_or_default(),
            document_url: self.url_pdf.as_ref().map(url_from_column).unwrap_or_default(),
            created_at: self.fecha_solicitud.unwrap_or_default(),
            reviewer_notes: self.notas_ct.unwrap_or_default(),
        }
    }
}

/// Hyperlink columns come back either as a string or as `{ "Url": ... }`
fn url_from_column(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get("Url")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

/// Stored JSON blob back to a field map; non-string values are stringified
fn parse_field_blob(blob: &str) -> FieldMap {
    match serde_json::from_str::<serde_json::Map<String, Value>>(blob) {
        Ok(map) => map
            .into_iter()
            .map(|(k, v)| {
                let text = match v {
                    Value::String(s) => s,
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                (k, text)
            })
            .collect(),
        Err(_) => FieldMap::new(),
    }
}

/// OData string literal escaping
pub fn odata_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[derive(Deserialize)]
struct ListItem {
    id: String,
    #[serde(default)]
    fields: Option<ListFields>,
}

#[derive(Deserialize)]
struct ListItemsPage {
    #[serde(default)]
    value: Vec<ListItem>,
}

#[derive(Deserialize)]
struct CreatedItem {
    id: String,
}

#[derive(Serialize)]
struct CreateItemBody {
    fields: ListFields,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct StatusPatch<'a> {
    estado: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    monto_autorizado: Option<f64>,
    #[serde(rename = "NotasCT", skip_serializing_if = "Option::is_none")]
    notas_ct: Option<&'a str>,
}

pub struct SharePointListRepository {
    graph: GraphClient,
    site: Arc<SiteIdCache>,
    list_name: String,
}

impl SharePointListRepository {
    pub fn new(graph: GraphClient, site: Arc<SiteIdCache>, list_name: impl Into<String>) -> Self {
        Self {
            graph,
            site,
            list_name: list_name.into(),
        }
    }

    /// A 404 on the list means the configured list name is wrong
    fn missing_list(&self, err: GatewayError) -> GatewayError {
        match err {
            GatewayError::Api { status: 404, .. } => GatewayError::Api {
                status: 404,
                message: format!("La lista '{}' no existe en SharePoint", self.list_name),
            },
            other => other,
        }
    }

    async fn items_path(&self) -> Result<String, GatewayError> {
        let site_id = self.site.resolve(&self.graph).await?;
        Ok(format!("/sites/{}/lists/{}/items", site_id, self.list_name))
    }

    async fn list(&self, filter: Option<String>, top: usize) -> Result<Vec<RequestRecord>, GatewayError> {
        let mut request = GraphRequest::get(self.items_path().await?);
        if let Some(filter) = filter {
            request = request
                .query("$filter", filter)
                .header("Prefer", "HonorNonIndexedQueriesWarningMayFailRandomly");
        }
        let request = request
            .query("$select", "id,fields")
            .query("$expand", "fields")
            .query("$orderby", "fields/FechaSolicitud desc")
            .query("$top", top.to_string());

        let page: ListItemsPage = self
            .graph
            .call_json(request)
            .await
            .map_err(|e| self.missing_list(e))?;
        let records = page
            .value
            .into_iter()
            .map(|item| item.fields.unwrap_or_default().into_record(item.id))
            .collect::<Vec<_>>();

        debug!(count = records.len(), list = %self.list_name, "Fetched list items");
        Ok(records)
    }
}

#[async_trait]
impl RequestRepository for SharePointListRepository {
    async fn create(&self, record: &RequestRecord) -> Result<String, GatewayError> {
        let body = CreateItemBody {
            fields: ListFields::from_record(record),
        };
        let request = GraphRequest::new(Method::POST, self.items_path().await?).json(&body)?;
        let created: CreatedItem = self
            .graph
            .call_json(request)
            .await
            .map_err(|e| self.missing_list(e))?;

        info!(folio = %record.folio, item_id = %created.id, "Created list item");
        Ok(created.id)
    }

    async fn list_for_submitter(&self, account_email: &str) -> Result<Vec<RequestRecord>, GatewayError> {
        let filter = format!("fields/EmailUsuarioM365 eq {}", odata_quote(account_email));
        self.list(Some(filter), SUBMITTER_PAGE_SIZE).await
    }

    async fn list_all(&self) -> Result<Vec<RequestRecord>, GatewayError> {
        self.list(None, ADMIN_PAGE_SIZE).await
    }

    async fn update_status(&self, item_id: &str, update: &StatusUpdate) -> Result<(), GatewayError> {
        let patch = StatusPatch {
            estado: update.status.wire_name(),
            monto_autorizado: update.amount_authorized,
            notas_ct: update.reviewer_notes.as_deref(),
        };
        let path = format!("{}/{}/fields", self.items_path().await?, item_id);
        self.graph
            .call(GraphRequest::new(Method::PATCH, path).json(&patch)?)
            .await?;

        info!(item_id = %item_id, status = %update.status, "Updated request status");
        Ok(())
    }
}
