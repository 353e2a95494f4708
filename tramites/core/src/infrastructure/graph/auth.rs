// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Token providers for Graph calls.
//!
//! - [`StaticTokenProvider`] holds a bearer token handed over by the browser
//!   (or passed on the command line). The holder may replace it at any time.
//! - [`ClientCredentialsTokenProvider`] acquires application tokens with the
//!   OAuth2 client-credentials grant and caches them until shortly before expiry.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::domain::error::GatewayError;
use crate::domain::identity::{identity_error_message, TokenProvider};

/// Tokens are renewed this long before they expire
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

const GRAPH_DEFAULT_SCOPE: &str = "https://graph.microsoft.com/.default";

pub struct StaticTokenProvider {
    token: RwLock<Option<String>>,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    pub fn empty() -> Self {
        Self {
            token: RwLock::new(None),
        }
    }

    /// Replace the bearer token, e.g. after the browser renewed it
    pub fn replace(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
    }

    pub fn clear(&self) {
        *self.token.write() = None;
    }

    fn current(&self) -> Result<String, GatewayError> {
        self.token
            .read()
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| GatewayError::Token("Token no disponible; inicie sesión".to_string()))
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String, GatewayError> {
        self.current()
    }

    /// A static token cannot be renewed here; the latest replacement is used
    async fn refresh(&self) -> Result<String, GatewayError> {
        self.current()
    }
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

fn default_expires_in() -> u64 {
    3600
}

pub struct ClientCredentialsTokenProvider {
    http: reqwest::Client,
    token_endpoint: String,
    client_id: String,
    client_secret: String,
    scope: String,
    cache: Mutex<Option<CachedToken>>,
}

impl ClientCredentialsTokenProvider {
    pub fn new(
        http: reqwest::Client,
        token_endpoint: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http,
            token_endpoint: token_endpoint.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scope: GRAPH_DEFAULT_SCOPE.to_string(),
            cache: Mutex::new(None),
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    async fn acquire(&self) -> Result<CachedToken, GatewayError> {
        debug!(endpoint = %self.token_endpoint, "Requesting client-credentials token");

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", self.scope.as_str()),
        ];

        let response = self
            .http
            .post(&self.token_endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<TokenErrorResponse>(&text) {
                Ok(err) => format!(
                    "{} ({})",
                    identity_error_message(&err.error),
                    err.error_description.unwrap_or(err.error)
                ),
                Err(_) => format!("Error {}", status.as_u16()),
            };
            return Err(GatewayError::Token(message));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Token(format!("Failed to parse token response: {}", e)))?;

        info!(expires_in = body.expires_in, "Acquired application token");

        Ok(CachedToken {
            value: body.access_token,
            expires_at: Instant::now() + Duration::from_secs(body.expires_in),
        })
    }
}

#[async_trait]
impl TokenProvider for ClientCredentialsTokenProvider {
    async fn access_token(&self) -> Result<String, GatewayError> {
        let mut cache = self.cache.lock().await;
        if let Some(token) = cache.as_ref() {
            if Instant::now() + EXPIRY_MARGIN < token.expires_at {
                return Ok(token.value.clone());
            }
        }
        let fresh = self.acquire().await?;
        let value = fresh.value.clone();
        *cache = Some(fresh);
        Ok(value)
    }

    async fn refresh(&self) -> Result<String, GatewayError> {
        let mut cache = self.cache.lock().await;
        *cache = None;
        let fresh = self.acquire().await?;
        let value = fresh.value.clone();
        *cache = Some(fresh);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_provider_replace_and_clear() {
        let provider = StaticTokenProvider::new("a");
        assert_eq!(provider.access_token().await.unwrap(), "a");
        provider.replace("b");
        assert_eq!(provider.refresh().await.unwrap(), "b");
        provider.clear();
        assert!(matches!(provider.access_token().await, Err(GatewayError::Token(_))));
    }

    #[tokio::test]
    async fn test_client_credentials_caches_until_refresh() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/tenant/oauth2/v2.0/token")
            .match_body(mockito::Matcher::UrlEncoded(
                "grant_type".into(),
                "client_credentials".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"app-token","expires_in":3600}"#)
            .expect(2)
            .create_async()
            .await;

        let provider = ClientCredentialsTokenProvider::new(
            reqwest::Client::new(),
            format!("{}/tenant/oauth2/v2.0/token", server.url()),
            "client",
            "secret",
        );

        assert_eq!(provider.access_token().await.unwrap(), "app-token");
        assert_eq!(provider.access_token().await.unwrap(), "app-token");
        assert_eq!(provider.refresh().await.unwrap(), "app-token");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_credentials_error_is_friendly() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/t/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_client","error_description":"AADSTS7000215"}"#)
            .create_async()
            .await;

        let provider = ClientCredentialsTokenProvider::new(
            reqwest::Client::new(),
            format!("{}/t/token", server.url()),
            "client",
            "bad",
        );

        let err = provider.access_token().await.unwrap_err();
        let text = err.to_string();
        assert!(text.contains("Contacte al administrador"));
        assert!(text.contains("AADSTS7000215"));
    }
}
