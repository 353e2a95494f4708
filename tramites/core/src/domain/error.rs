// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Error
//!
//! Gateway errors shared by every cloud adapter, plus the keyword table that
//! turns arbitrary error text into a user-facing category.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Error vocabulary for the ports

use serde::Serialize;

/// Errors raised by adapters that talk to the cloud APIs
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    /// Non-success HTTP status; message comes from the response body when present
    #[error("{}", api_display(.status, .message))]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("Token error: {0}")]
    Token(String),

    /// Rejected locally before any request was sent
    #[error("{0}")]
    Rejected(String),
}

fn api_display(status: &u16, message: &str) -> String {
    if message.starts_with("Error ") {
        message.to_string()
    } else {
        format!("Error {}: {}", status, message)
    }
}

impl GatewayError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, GatewayError::Api { status: 401, .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GatewayError::InvalidResponse(err.to_string())
        } else {
            GatewayError::Network(err.to_string())
        }
    }
}

/// Category of a user-facing error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Configuration,
    Permission,
    AuthExpired,
    Network,
    Document,
    Generic,
}

// Ordered: first match wins.
const KEYWORD_TABLE: &[(&[&str], ErrorCategory)] = &[
    (&["no existe en SharePoint", "itemNotFound"], ErrorCategory::Configuration),
    (&["No tienes permisos", "Error 403"], ErrorCategory::Permission),
    (&["Token", "401"], ErrorCategory::AuthExpired),
    (&["network", "fetch", "connect", "timed out"], ErrorCategory::Network),
    (&["PDF"], ErrorCategory::Document),
];

impl ErrorCategory {
    /// Match error text against the keyword table
    pub fn classify(text: &str) -> Self {
        KEYWORD_TABLE
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|k| text.contains(k)))
            .map(|(_, category)| *category)
            .unwrap_or(ErrorCategory::Generic)
    }

    /// Message shown to the user. Generic errors keep the original text.
    pub fn user_message(&self, original: &str) -> String {
        match self {
            ErrorCategory::Configuration => {
                "Error de configuración: la lista o biblioteca no existe en SharePoint. Contacte al administrador.".to_string()
            }
            ErrorCategory::Permission => {
                "No tienes permisos suficientes para realizar esta acción.".to_string()
            }
            ErrorCategory::AuthExpired => {
                "Tu sesión ha expirado. Por favor, inicia sesión nuevamente.".to_string()
            }
            ErrorCategory::Network => {
                "Error de conexión. Verifica tu conexión a internet e intenta de nuevo.".to_string()
            }
            ErrorCategory::Document => {
                "Error al generar o subir el documento PDF. Intenta de nuevo.".to_string()
            }
            ErrorCategory::Generic => original.to_string(),
        }
    }
}

/// A classified, user-presentable error
#[derive(Debug, Clone, Serialize)]
pub struct UserFacingError {
    pub category: ErrorCategory,
    pub message: String,
}

impl UserFacingError {
    pub fn from_error(err: &dyn std::error::Error) -> Self {
        Self::from_text(&err.to_string())
    }

    pub fn from_text(text: &str) -> Self {
        let category = ErrorCategory::classify(text);
        Self {
            category,
            message: category.user_message(text),
        }
    }
}
