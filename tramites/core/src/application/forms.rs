// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Dynamic Form Renderer
//!
//! Builds the input descriptors of a form from the catalog, pre-fills the
//! fields that come from the signed-in profile and renders the HTML page.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Catalog entry to view model and HTML

use serde::Serialize;
use std::sync::Arc;

use crate::domain::catalog::{FieldDescriptor, FieldKind, FormCatalog, FormDefinition, UnknownRequestType};
use crate::domain::config::InstitutionConfig;
use crate::domain::identity::{Profile, Role};
use crate::domain::request::FieldMap;
use crate::infrastructure::templates::{RenderError, TemplateEngine, FORM_PAGE};

pub const DEFAULT_HINT: &str = "Complete todos los campos marcados con *";

const DEFAULT_ROWS: u8 = 4;

/// Filled from the profile email and shown read-only
const EMAIL_FIELDS: [&str; 2] = ["correo", "correo_solicitante"];

/// Filled from the profile display name
const NAME_FIELDS: [&str; 3] = ["nombre_completo", "nombre_estudiante", "nombre_solicitante"];

#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error(transparent)]
    UnknownRequestType(#[from] UnknownRequestType),

    #[error(transparent)]
    Template(#[from] RenderError),
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldView {
    pub name: String,
    pub label: String,
    /// HTML input type, or `select` / `textarea`
    pub input: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub options: Vec<String>,
    pub value: String,
    pub placeholder: Option<String>,
    pub help: Option<String>,
    pub rows: Option<u8>,
    pub min: Option<&'static str>,
    pub step: Option<&'static str>,
    pub readonly: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormView {
    pub key: &'static str,
    pub title: String,
    pub subtitle: String,
    pub hint: &'static str,
    pub fields: Vec<FieldView>,
}

/// Signed-in user as shown in the page header
#[derive(Debug, Clone, Serialize)]
pub struct PageUser {
    pub initials: String,
    pub display_name: String,
    pub email: String,
    pub is_admin: bool,
}

impl PageUser {
    pub fn new(profile: &Profile, role: Role) -> Self {
        Self {
            initials: profile.initials(),
            display_name: profile.display_name.clone(),
            email: profile.email.clone(),
            is_admin: role == Role::Admin,
        }
    }
}

#[derive(Serialize)]
struct FormPage<'a> {
    form: &'a FormView,
    user: Option<&'a PageUser>,
    institution: &'a InstitutionConfig,
}

fn input_type(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Text => "text",
        FieldKind::Email => "email",
        FieldKind::Number | FieldKind::Currency => "number",
        FieldKind::Date => "date",
        FieldKind::Select => "select",
        FieldKind::Textarea => "textarea",
    }
}

fn field_view(field: &FieldDescriptor, profile: Option<&Profile>, values: &FieldMap) -> FieldView {
    let is_email = EMAIL_FIELDS.contains(&field.name.as_str());
    let prefill = profile.and_then(|p| {
        if is_email {
            Some(p.email.clone())
        } else if NAME_FIELDS.contains(&field.name.as_str()) {
            Some(p.display_name.clone())
        } else {
            None
        }
    });

    let value = prefill
        .filter(|v| !v.is_empty())
        .or_else(|| values.get(&field.name).cloned())
        .unwrap_or_default();

    FieldView {
        name: field.name.clone(),
        label: field.label.clone(),
        input: input_type(field.kind),
        kind: field.kind,
        required: field.required,
        options: field.options.clone(),
        value,
        placeholder: field.placeholder.clone(),
        help: field.help.clone(),
        rows: (field.kind == FieldKind::Textarea).then(|| field.rows.unwrap_or(DEFAULT_ROWS)),
        min: field.kind.is_numeric().then_some("0"),
        step: match field.kind {
            FieldKind::Currency => Some("0.01"),
            FieldKind::Number => Some("1"),
            _ => None,
        },
        readonly: is_email && profile.is_some(),
    }
}

pub struct FormRenderer {
    catalog: &'static FormCatalog,
    templates: Arc<TemplateEngine>,
    institution: InstitutionConfig,
}

impl FormRenderer {
    pub fn new(templates: Arc<TemplateEngine>, institution: InstitutionConfig) -> Self {
        Self {
            catalog: FormCatalog::standard(),
            templates,
            institution,
        }
    }

    pub fn catalog(&self) -> &'static FormCatalog {
        self.catalog
    }

    /// View model of one form; `values` re-fills a previously entered map
    pub fn describe(
        &self,
        key: &str,
        profile: Option<&Profile>,
        values: &FieldMap,
    ) -> Result<FormView, UnknownRequestType> {
        let form = self.catalog.get_by_key(key)?;
        Ok(Self::view(form, profile, values))
    }

    pub fn view(form: &FormDefinition, profile: Option<&Profile>, values: &FieldMap) -> FormView {
        FormView {
            key: form.request_type.key(),
            title: form.title.clone(),
            subtitle: if form.subtitle.trim().is_empty() {
                DEFAULT_HINT.to_string()
            } else {
                form.subtitle.clone()
            },
            hint: DEFAULT_HINT,
            fields: form
                .fields
                .iter()
                .map(|f| field_view(f, profile, values))
                .collect(),
        }
    }

    pub fn render_html(
        &self,
        key: &str,
        profile: Option<&Profile>,
        user: Option<&PageUser>,
    ) -> Result<String, FormError> {
        let view = self.describe(key, profile, &FieldMap::new())?;
        let page = FormPage {
            form: &view,
            user,
            institution: &self.institution,
        };
        Ok(self.templates.render(FORM_PAGE, &page)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> Profile {
        Profile {
            id: "1".into(),
            display_name: "Ana López".into(),
            given_name: None,
            surname: None,
            email: "ana@uv.mx".into(),
            job_title: None,
            department: None,
        }
    }

    fn renderer() -> FormRenderer {
        FormRenderer::new(
            Arc::new(TemplateEngine::new().unwrap()),
            InstitutionConfig::default(),
        )
    }

    #[test]
    fn test_prefill_from_profile() {
        let view = renderer()
            .describe("apoyo_academico", Some(&profile()), &FieldMap::new())
            .unwrap();

        let email = view.fields.iter().find(|f| f.name == "correo").unwrap();
        assert_eq!(email.value, "ana@uv.mx");
        assert!(email.readonly);

        let name = view.fields.iter().find(|f| f.name == "nombre_completo").unwrap();
        assert_eq!(name.value, "Ana López");
        assert!(!name.readonly);
    }

    #[test]
    fn test_numeric_and_textarea_attributes() {
        let view = renderer()
            .describe("apoyo_academico", None, &FieldMap::new())
            .unwrap();

        let amount = view.fields.iter().find(|f| f.name == "monto_total").unwrap();
        assert_eq!(amount.input, "number");
        assert_eq!(amount.min, Some("0"));
        assert_eq!(amount.step, Some("1"));

        for field in view.fields.iter().filter(|f| f.kind == FieldKind::Textarea) {
            assert!(field.rows.is_some());
        }
        assert_eq!(view.hint, DEFAULT_HINT);
    }

    #[test]
    fn test_unknown_key() {
        assert!(renderer().describe("nope", None, &FieldMap::new()).is_err());
    }

    #[test]
    fn test_render_html_escapes_profile() {
        let mut p = profile();
        p.display_name = "<b>Ana</b>".into();
        let user = PageUser::new(&p, Role::Member);
        let html = renderer()
            .render_html("solicitud_libre", Some(&p), Some(&user))
            .unwrap();

        assert!(html.contains("&lt;b&gt;Ana&lt;/b&gt;"));
        assert!(!html.contains("<b>Ana</b>"));
        assert!(html.contains("Seleccione..."));
    }
}
