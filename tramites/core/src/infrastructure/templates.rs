// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Template Engine
//!
//! Handlebars rendering for the HTML views (form, history, admin panel), the
//! notification emails and the calendar event body. Templates are compiled
//! into the binary; values are HTML-escaped by Handlebars.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Turn view models into HTML

use handlebars::Handlebars;
use serde::Serialize;

pub const FORM_PAGE: &str = "form";
pub const HISTORY_PAGE: &str = "history";
pub const ADMIN_PAGE: &str = "admin";
pub const CONFIRMATION_EMAIL: &str = "email_confirmation";
pub const REVIEWER_EMAIL: &str = "email_reviewer";
pub const EVENT_BODY: &str = "event_body";

const TEMPLATES: &[(&str, &str)] = &[
    (FORM_PAGE, include_str!("../../templates/form.html.hbs")),
    (HISTORY_PAGE, include_str!("../../templates/history.html.hbs")),
    (ADMIN_PAGE, include_str!("../../templates/admin.html.hbs")),
    (CONFIRMATION_EMAIL, include_str!("../../templates/email_confirmation.html.hbs")),
    (REVIEWER_EMAIL, include_str!("../../templates/email_reviewer.html.hbs")),
    (EVENT_BODY, include_str!("../../templates/event_body.html.hbs")),
];

const PARTIALS: &[(&str, &str)] = &[("header", include_str!("../../templates/header.html.hbs"))];

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Invalid template '{name}': {message}")]
    Template { name: String, message: String },

    #[error("Failed to render template '{name}': {message}")]
    Render { name: String, message: String },
}

pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
}

impl TemplateEngine {
    /// Create the engine with every built-in template registered
    pub fn new() -> Result<Self, RenderError> {
        let mut handlebars = Handlebars::new();

        // Optional sections are simply omitted when their data is missing
        handlebars.set_strict_mode(false);

        for (name, source) in PARTIALS {
            handlebars
                .register_partial(name, *source)
                .map_err(|e| RenderError::Template {
                    name: name.to_string(),
                    message: e.to_string(),
                })?;
        }

        for (name, source) in TEMPLATES {
            handlebars
                .register_template_string(name, *source)
                .map_err(|e| RenderError::Template {
                    name: name.to_string(),
                    message: e.to_string(),
                })?;
        }

        Ok(Self { handlebars })
    }

    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String, RenderError> {
        self.handlebars.render(name, data).map_err(|e| RenderError::Render {
            name: name.to_string(),
            message: e.to_string(),
        })
    }

    /// Render an ad-hoc template string
    pub fn render_inline<T: Serialize>(&self, template: &str, data: &T) -> Result<String, RenderError> {
        self.handlebars
            .render_template(template, data)
            .map_err(|e| RenderError::Render {
                name: "inline".to_string(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_all_templates_register() {
        let engine = TemplateEngine::new().unwrap();
        for (name, _) in TEMPLATES {
            assert!(engine.handlebars.has_template(name));
        }
    }

    #[test]
    fn test_values_are_html_escaped() {
        let engine = TemplateEngine::new().unwrap();
        let html = engine
            .render(
                REVIEWER_EMAIL,
                &json!({
                    "folio": "AAC-1",
                    "request_title": "Apoyo",
                    "submitter_name": "<script>alert(1)</script>",
                    "submitter_email": "a@uv.mx",
                    "institution": { "name": "CITRO", "university": "UV" }
                }),
            )
            .unwrap();

        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_missing_values_render_empty() {
        let engine = TemplateEngine::new().unwrap();
        let html = engine.render_inline("[{{missing}}]", &json!({})).unwrap();
        assert_eq!(html, "[]");
    }

    #[test]
    fn test_select_marks_current_value() {
        let engine = TemplateEngine::new().unwrap();
        let html = engine
            .render(
                FORM_PAGE,
                &json!({
                    "institution": { "short_name": "CITRO" },
                    "form": {
                        "key": "solicitud_libre",
                        "title": "Solicitud Libre",
                        "fields": [{
                            "name": "categoria",
                            "label": "Categoría",
                            "input": "select",
                            "required": true,
                            "options": ["Académico", "Otro"],
                            "value": "Otro"
                        }]
                    }
                }),
            )
            .unwrap();

        assert!(html.contains("<option value=\"\">Seleccione...</option>"));
        assert!(html.contains("<option value=\"Otro\" selected>Otro</option>"));
        assert!(html.contains("<option value=\"Académico\">Académico</option>"));
    }
}
