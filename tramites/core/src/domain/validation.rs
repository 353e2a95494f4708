// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Validation
//!
//! Local checks run on a submitted field map before any network call.
//! The first failing rule is reported.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Submission validation rules

use once_cell::sync::Lazy;
use regex::Regex;

use super::catalog::{FieldKind, FormDefinition};
use super::identity::AccessPolicy;
use super::locale::{format_mxn, parse_form_date};
use super::request::{first_non_empty, FieldMap};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid"));

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("El campo \"{label}\" es obligatorio")]
    MissingField { field: String, label: String },

    #[error("Valor no válido para \"{label}\": {value}")]
    InvalidOption {
        field: String,
        label: String,
        value: String,
    },

    #[error("El campo \"{label}\" debe ser numérico")]
    NotNumeric { field: String, label: String },

    #[error("El campo \"{label}\" debe ser una fecha válida (AAAA-MM-DD)")]
    InvalidDate { field: String, label: String },

    #[error("El email no es válido")]
    InvalidEmail,

    #[error("Solo se permiten emails del dominio @{0}")]
    DomainNotAllowed(String),

    #[error("El monto debe ser un número positivo")]
    NegativeAmount,

    #[error("El monto no puede exceder {0} MXN")]
    AmountTooHigh(String),

    #[error("La fecha de fin no puede ser anterior a la fecha de inicio")]
    EndBeforeStart,
}

/// Limits that come from configuration
#[derive(Debug, Clone)]
pub struct ValidationRules {
    pub access: AccessPolicy,
    pub max_amount: f64,
}

const AMOUNT_FIELDS: [&str; 2] = ["monto_total", "monto_solicitado"];

/// `str::parse` accepts `NaN` and `inf`; neither is an amount.
fn parse_amount(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Validate a submission against its form definition and the configured rules
pub fn validate_submission(
    form: &FormDefinition,
    fields: &FieldMap,
    rules: &ValidationRules,
) -> Result<(), ValidationError> {
    for descriptor in &form.fields {
        let value = fields.get(&descriptor.name).map(|v| v.trim()).unwrap_or("");

        if value.is_empty() {
            if descriptor.required {
                return Err(ValidationError::MissingField {
                    field: descriptor.name.clone(),
                    label: descriptor.label.clone(),
                });
            }
            continue;
        }

        match descriptor.kind {
            FieldKind::Select if !descriptor.options.iter().any(|o| o == value) => {
                return Err(ValidationError::InvalidOption {
                    field: descriptor.name.clone(),
                    label: descriptor.label.clone(),
                    value: value.to_string(),
                });
            }
            _ if AMOUNT_FIELDS.contains(&descriptor.name.as_str())
                && parse_amount(value).is_none() =>
            {
                return Err(ValidationError::NegativeAmount);
            }
            kind if kind.is_numeric() && parse_amount(value).is_none() => {
                return Err(ValidationError::NotNumeric {
                    field: descriptor.name.clone(),
                    label: descriptor.label.clone(),
                });
            }
            FieldKind::Date if parse_form_date(value).is_none() => {
                return Err(ValidationError::InvalidDate {
                    field: descriptor.name.clone(),
                    label: descriptor.label.clone(),
                });
            }
            _ => {}
        }
    }

    if let Some(email) = first_non_empty(fields, &["correo", "correo_solicitante"]) {
        let email = email.trim();
        if !EMAIL_RE.is_match(email) {
            return Err(ValidationError::InvalidEmail);
        }
        if rules.access.check_domain(email).is_err() {
            return Err(ValidationError::DomainNotAllowed(
                rules.access.allowed_domain.clone(),
            ));
        }
    }

    if let Some(raw) = first_non_empty(fields, &AMOUNT_FIELDS) {
        let Some(amount) = parse_amount(&raw) else {
            return Err(ValidationError::NegativeAmount);
        };
        if amount < 0.0 {
            return Err(ValidationError::NegativeAmount);
        }
        // A non-positive maximum means no limit
        if rules.max_amount > 0.0 && amount > rules.max_amount {
            return Err(ValidationError::AmountTooHigh(format_mxn(rules.max_amount)));
        }
    }

    let start = fields.get("fecha_inicio").and_then(|v| parse_form_date(v));
    let end = fields.get("fecha_fin").and_then(|v| parse_form_date(v));
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(ValidationError::EndBeforeStart);
        }
    }

    Ok(())
}
