// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Identity
//!
//! Signed-in user profile, role resolution and the token/profile ports that
//! the identity adapters implement.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Identity ports and access policy

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::GatewayError;

/// Profile of the signed-in account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub surname: Option<String>,
    /// `mail`, or `userPrincipalName` when the account has no mailbox address
    pub email: String,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
}

impl Profile {
    /// Up to two upper-case initials for the avatar
    pub fn initials(&self) -> String {
        let from_parts = match (&self.given_name, &self.surname) {
            (Some(g), Some(s)) if !g.is_empty() && !s.is_empty() => {
                [g, s].iter().filter_map(|p| p.chars().next()).collect::<String>()
            }
            _ => self
                .display_name
                .split_whitespace()
                .take(2)
                .filter_map(|w| w.chars().next())
                .collect(),
        };
        from_parts.to_uppercase()
    }

    /// Domain part of the email, lower-cased
    pub fn email_domain(&self) -> Option<String> {
        email_domain(&self.email)
    }
}

pub fn email_domain(email: &str) -> Option<String> {
    email
        .rsplit_once('@')
        .map(|(_, d)| d.trim().to_lowercase())
        .filter(|d| !d.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
}

/// Who may sign in and who is an administrator
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    pub restrict_domain: bool,
    pub allowed_domain: String,
    pub admins: Vec<String>,
}

impl AccessPolicy {
    pub fn role_for(&self, email: &str) -> Role {
        if self.admins.iter().any(|a| a.eq_ignore_ascii_case(email.trim())) {
            Role::Admin
        } else {
            Role::Member
        }
    }

    /// Checks the domain restriction; returns the message shown on rejection
    pub fn check_domain(&self, email: &str) -> Result<(), String> {
        if !self.restrict_domain {
            return Ok(());
        }
        match email_domain(email) {
            Some(d) if d == self.allowed_domain.to_lowercase() => Ok(()),
            _ => Err(format!(
                "Solo se permiten emails del dominio @{}",
                self.allowed_domain
            )),
        }
    }
}

/// Source of bearer tokens for the cloud APIs
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Current access token, acquiring one if needed
    async fn access_token(&self) -> Result<String, GatewayError>;

    /// Discard the cached token and acquire a fresh one
    async fn refresh(&self) -> Result<String, GatewayError>;
}

/// Reads the signed-in account's profile
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn fetch_profile(&self) -> Result<Profile, GatewayError>;
}

/// Friendly message for an identity-provider error code
pub fn identity_error_message(code: &str) -> &'static str {
    match code {
        "consent_required" | "interaction_required" => {
            "Se requiere su consentimiento para acceder a los recursos. Inicie sesión nuevamente."
        }
        "login_required" => "Su sesión ha expirado. Inicie sesión nuevamente.",
        "invalid_grant" => "Las credenciales ya no son válidas. Inicie sesión nuevamente.",
        "user_cancelled" => "Inicio de sesión cancelado.",
        "popup_window_error" => "El navegador bloqueó la ventana de inicio de sesión.",
        "server_error" => "El servicio de identidad presentó un error. Intente más tarde.",
        "temporarily_unavailable" => {
            "El servicio de identidad no está disponible temporalmente. Intente más tarde."
        }
        "invalid_client" | "unauthorized_client" => {
            "La aplicación no está registrada correctamente. Contacte al administrador."
        }
        _ => "Error de autenticación. Intente nuevamente.",
    }
}
