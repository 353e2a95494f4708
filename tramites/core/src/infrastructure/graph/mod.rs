// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Microsoft Graph Client
//!
//! Thin HTTP layer shared by the list, drive, mail, calendar and profile
//! adapters. Every call is retried exactly once when Graph answers 401: the
//! token provider is asked to refresh and the request is repeated. Any other
//! failure propagates immediately.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Anti-Corruption Layer over the Graph REST API

pub mod auth;

use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::error::GatewayError;
use crate::domain::identity::TokenProvider;

pub use auth::{ClientCredentialsTokenProvider, StaticTokenProvider};

/// Identity whose drive and mailbox are used
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphPrincipal {
    /// Delegated mode, the signed-in user
    Me,
    /// Application mode, a named mailbox
    User(String),
}

impl GraphPrincipal {
    pub fn path_prefix(&self) -> String {
        match self {
            GraphPrincipal::Me => "/me".to_string(),
            GraphPrincipal::User(upn) => format!("/users/{}", upn),
        }
    }
}

#[derive(Debug, Clone)]
enum Payload {
    Empty,
    Json(serde_json::Value),
    Bytes { bytes: Vec<u8>, content_type: String },
}

/// A single Graph call, rebuilt for the retry
#[derive(Debug, Clone)]
pub struct GraphRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: Vec<(&'static str, String)>,
    payload: Payload,
}

impl GraphRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            payload: Payload::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self, GatewayError> {
        let value = serde_json::to_value(body)
            .map_err(|e| GatewayError::InvalidResponse(format!("Failed to encode body: {}", e)))?;
        self.payload = Payload::Json(value);
        Ok(self)
    }

    pub fn bytes(mut self, bytes: Vec<u8>, content_type: &str) -> Self {
        self.payload = Payload::Bytes {
            bytes,
            content_type: content_type.to_string(),
        };
        self
    }
}

#[derive(Deserialize)]
struct GraphErrorBody {
    error: Option<GraphErrorDetail>,
}

#[derive(Deserialize)]
struct GraphErrorDetail {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Shared Graph HTTP client bound to one token provider
#[derive(Clone)]
pub struct GraphClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
}

impl GraphClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        }
    }

    /// Build the shared reqwest client with the configured timeout
    pub fn http_client(timeout: Duration) -> Result<reqwest::Client, GatewayError> {
        reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tramites/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GatewayError::Network(format!("Failed to build HTTP client: {}", e)))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Execute and decode a JSON response
    pub async fn call_json<T: DeserializeOwned>(&self, request: GraphRequest) -> Result<T, GatewayError> {
        let response = self.execute(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| GatewayError::InvalidResponse(format!("Failed to parse Graph response: {}", e)))
    }

    /// Execute and discard the response body
    pub async fn call(&self, request: GraphRequest) -> Result<(), GatewayError> {
        self.execute(request).await.map(|_| ())
    }

    /// Send with one credential refresh on 401
    pub async fn execute(&self, request: GraphRequest) -> Result<Response, GatewayError> {
        let token = self.tokens.access_token().await?;
        let response = self.send_once(&request, &token).await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Self::check(response).await;
        }

        debug!(
            method = %request.method,
            path = %request.path,
            "Graph returned 401, refreshing credentials and retrying once"
        );
        metrics::counter!("tramites_graph_retries_total").increment(1);

        let token = self.tokens.refresh().await?;
        let response = self.send_once(&request, &token).await?;
        Self::check(response).await
    }

    async fn send_once(&self, request: &GraphRequest, token: &str) -> Result<Response, GatewayError> {
        let url = format!("{}{}", self.base_url, request.path);

        let mut builder = self
            .http
            .request(request.method.clone(), &url)
            .bearer_auth(token)
            .header("Accept", "application/json");

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }

        builder = match &request.payload {
            Payload::Empty => builder,
            Payload::Json(value) => builder.json(value),
            Payload::Bytes { bytes, content_type } => builder
                .header("Content-Type", content_type.as_str())
                .body(bytes.clone()),
        };

        builder.send().await.map_err(GatewayError::from)
    }

    async fn check(response: Response) -> Result<Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = extract_error_message(&text).unwrap_or_else(|| format!("Error {}", status.as_u16()));

        warn!(status = status.as_u16(), message = %message, "Graph request failed");

        Err(GatewayError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// `error.message` (or `error.code`) from a Graph error body
fn extract_error_message(body: &str) -> Option<String> {
    let parsed: GraphErrorBody = serde_json::from_str(body).ok()?;
    let detail = parsed.error?;
    detail
        .message
        .filter(|m| !m.trim().is_empty())
        .or(detail.code)
}
