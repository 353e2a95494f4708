// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Form Catalog
//!
//! Static declarative table mapping each request type to the fields its form
//! collects. The catalog is built once and never mutated; renderers,
//! validators and the PDF generator all read from it.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed set of request categories handled by the portal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    #[serde(rename = "apoyo_academico")]
    AcademicSupport,
    #[serde(rename = "aval_institucional")]
    InstitutionalEndorsement,
    #[serde(rename = "apoyo_terceros")]
    ThirdPartySupport,
    #[serde(rename = "comite_tutorial")]
    TutorialCommittee,
    #[serde(rename = "solicitud_libre")]
    FreeForm,
}

impl RequestType {
    pub const ALL: [RequestType; 5] = [
        RequestType::AcademicSupport,
        RequestType::InstitutionalEndorsement,
        RequestType::ThirdPartySupport,
        RequestType::TutorialCommittee,
        RequestType::FreeForm,
    ];

    /// Catalog key used in URLs and configuration
    pub fn key(&self) -> &'static str {
        match self {
            RequestType::AcademicSupport => "apoyo_academico",
            RequestType::InstitutionalEndorsement => "aval_institucional",
            RequestType::ThirdPartySupport => "apoyo_terceros",
            RequestType::TutorialCommittee => "comite_tutorial",
            RequestType::FreeForm => "solicitud_libre",
        }
    }

    /// Three-letter prefix of the folio
    pub fn folio_prefix(&self) -> &'static str {
        match self {
            RequestType::AcademicSupport => "AAC",
            RequestType::InstitutionalEndorsement => "AVI",
            RequestType::ThirdPartySupport => "TER",
            RequestType::TutorialCommittee => "CMT",
            RequestType::FreeForm => "LIB",
        }
    }

    /// Default storage folder for generated documents
    pub fn default_folder(&self) -> &'static str {
        match self {
            RequestType::AcademicSupport => "01_Apoyo_Academico",
            RequestType::InstitutionalEndorsement => "02_Aval_Institucional",
            RequestType::ThirdPartySupport => "03_Apoyo_Terceros",
            RequestType::TutorialCommittee => "04_Comite_Tutorial",
            RequestType::FreeForm => "05_Solicitud_Libre",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for RequestType {
    type Err = UnknownRequestType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RequestType::ALL
            .iter()
            .copied()
            .find(|t| t.key() == s)
            .ok_or_else(|| UnknownRequestType(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Tipo de trámite no válido: {0}")]
pub struct UnknownRequestType(pub String);

/// Input kind of a form field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Email,
    Number,
    Currency,
    Date,
    Select,
    Textarea,
}

impl FieldKind {
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldKind::Number | FieldKind::Currency)
    }
}

/// One field of a form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<u8>,
}

impl FieldDescriptor {
    fn new(name: &str, label: &str, kind: FieldKind, required: bool) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind,
            required,
            options: Vec::new(),
            placeholder: None,
            help: None,
            rows: None,
        }
    }

    fn placeholder(mut self, text: &str) -> Self {
        self.placeholder = Some(text.to_string());
        self
    }

    fn help(mut self, text: &str) -> Self {
        self.help = Some(text.to_string());
        self
    }

    fn rows(mut self, rows: u8) -> Self {
        self.rows = Some(rows);
        self
    }

    fn options(mut self, options: &[&str]) -> Self {
        self.options = options.iter().map(|o| o.to_string()).collect();
        self
    }
}

/// A complete form: request type, headings and ordered fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormDefinition {
    pub request_type: RequestType,
    pub title: String,
    pub subtitle: String,
    pub fields: Vec<FieldDescriptor>,
}

impl FormDefinition {
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }
}

/// Immutable table of every form the portal offers
#[derive(Debug, Clone)]
pub struct FormCatalog {
    forms: Vec<FormDefinition>,
}

static STANDARD_CATALOG: Lazy<FormCatalog> = Lazy::new(FormCatalog::build_standard);

impl FormCatalog {
    /// Shared instance of the standard catalog
    pub fn standard() -> &'static FormCatalog {
        &STANDARD_CATALOG
    }

    pub fn get(&self, request_type: RequestType) -> &FormDefinition {
        // build_standard registers every RequestType variant
        self.forms
            .iter()
            .find(|f| f.request_type == request_type)
            .unwrap_or(&self.forms[0])
    }

    pub fn get_by_key(&self, key: &str) -> Result<&FormDefinition, UnknownRequestType> {
        let request_type = key.parse::<RequestType>()?;
        Ok(self.get(request_type))
    }

    /// Title for a request type, as stored in the list's type column
    pub fn title(&self, request_type: RequestType) -> &str {
        &self.get(request_type).title
    }

    pub fn forms(&self) -> &[FormDefinition] {
        &self.forms
    }

    fn build_standard() -> Self {
        use FieldKind::*;

        let submitter_kinds_all = [
            "Estudiante de Licenciatura",
            "Estudiante de Maestría",
            "Estudiante de Doctorado",
            "Académico",
            "Técnico Académico",
            "Personal Administrativo",
        ];

        let academic_support = FormDefinition {
            request_type: RequestType::AcademicSupport,
            title: "Apoyo Académico".to_string(),
            subtitle: "Solicitud de apoyo para actividades académicas, congresos, viajes de investigación".to_string(),
            fields: vec![
                FieldDescriptor::new("tipo_solicitante", "Tipo de Solicitante", Select, true)
                    .options(&submitter_kinds_all),
                FieldDescriptor::new("nombre_completo", "Nombre Completo", Text, true)
                    .placeholder("Nombre completo del solicitante"),
                FieldDescriptor::new("correo", "Correo Electrónico", Email, true)
                    .placeholder("correo@uv.mx"),
                FieldDescriptor::new("matricula", "Matrícula / Número de Personal", Text, true)
                    .placeholder("Matrícula o número de personal"),
                FieldDescriptor::new("titulo_actividad", "Título de la Actividad", Text, true)
                    .placeholder("Nombre del congreso, evento, viaje, etc."),
                FieldDescriptor::new("tipo_actividad", "Tipo de Actividad", Select, true).options(&[
                    "Congreso",
                    "Conferencia",
                    "Taller",
                    "Curso",
                    "Estancia de Investigación",
                    "Trabajo de Campo",
                    "Otro",
                ]),
                FieldDescriptor::new("fecha_inicio", "Fecha de Inicio", Date, true),
                FieldDescriptor::new("fecha_fin", "Fecha de Fin", Date, false),
                FieldDescriptor::new("destino", "Destino (Ciudad, Estado, País)", Text, true)
                    .placeholder("Ej: Monterrey, N.L., México"),
                FieldDescriptor::new("institucion_anfitriona", "Institución Organizadora", Text, false)
                    .placeholder("Nombre de la institución que organiza"),
                FieldDescriptor::new("monto_total", "Monto Total Solicitado (MXN)", Number, true)
                    .placeholder("0.00")
                    .help("Incluir transporte, hospedaje, registro, etc."),
                FieldDescriptor::new("desglose_gastos", "Desglose de Gastos", Textarea, true)
                    .rows(4)
                    .placeholder("Transporte: $X, Hospedaje: $Y, Registro: $Z, etc."),
                FieldDescriptor::new("justificacion", "Justificación de la Solicitud", Textarea, true)
                    .rows(5)
                    .placeholder("Explique la importancia y beneficios de la actividad para su formación académica o investigación"),
            ],
        };

        let institutional_endorsement = FormDefinition {
            request_type: RequestType::InstitutionalEndorsement,
            title: "Aval Institucional".to_string(),
            subtitle: "Respaldo oficial para representar al CITRO en eventos académicos".to_string(),
            fields: vec![
                FieldDescriptor::new("tipo_solicitante", "Tipo de Solicitante", Select, true)
                    .options(&submitter_kinds_all[..5]),
                FieldDescriptor::new("nombre_completo", "Nombre Completo", Text, true)
                    .placeholder("Nombre completo del solicitante"),
                FieldDescriptor::new("correo", "Correo Electrónico", Email, true)
                    .placeholder("correo@uv.mx"),
                FieldDescriptor::new("matricula", "Matrícula / Número de Personal", Text, true),
                FieldDescriptor::new("titulo_actividad", "Nombre del Evento", Text, true)
                    .placeholder("Nombre completo del evento o actividad"),
                FieldDescriptor::new("tipo_participacion", "Tipo de Participación", Select, true).options(&[
                    "Ponencia Oral",
                    "Póster",
                    "Taller",
                    "Mesa Redonda",
                    "Conferencia Magistral",
                    "Asistente",
                    "Organizador",
                    "Otro",
                ]),
                FieldDescriptor::new("fecha_actividad", "Fecha del Evento", Date, true),
                FieldDescriptor::new("lugar", "Lugar (Ciudad, Estado, País)", Text, true)
                    .placeholder("Ej: Ciudad de México, CDMX, México"),
                FieldDescriptor::new("institucion_organizadora", "Institución Organizadora", Text, true)
                    .placeholder("Nombre de la institución que organiza"),
                FieldDescriptor::new("titulo_trabajo", "Título del Trabajo a Presentar", Textarea, false)
                    .rows(2)
                    .placeholder("Si aplica"),
                FieldDescriptor::new("justificacion", "Justificación", Textarea, true)
                    .rows(5)
                    .placeholder("Explique por qué requiere el aval institucional del CITRO"),
            ],
        };

        let third_party_support = FormDefinition {
            request_type: RequestType::ThirdPartySupport,
            title: "Apoyo a Terceros".to_string(),
            subtitle: "Apoyo para colaboradores externos o instituciones".to_string(),
            fields: vec![
                FieldDescriptor::new("nombre_solicitante", "Tu Nombre (Solicitante UV)", Text, true)
                    .placeholder("Académico o estudiante UV que solicita"),
                FieldDescriptor::new("correo_solicitante", "Tu Correo Electrónico", Email, true)
                    .placeholder("tu_correo@uv.mx"),
                FieldDescriptor::new("adscripcion_solicitante", "Tu Adscripción", Text, true)
                    .placeholder("Ej: Posgrado en Ecología Tropical"),
                FieldDescriptor::new("nombre_beneficiario", "Nombre del Beneficiario (Tercero)", Text, true)
                    .placeholder("Nombre de la persona o institución externa"),
                FieldDescriptor::new("institucion_beneficiario", "Institución del Beneficiario", Text, true)
                    .placeholder("Institución a la que pertenece"),
                FieldDescriptor::new("tipo_apoyo", "Tipo de Apoyo Solicitado", Select, true).options(&[
                    "Apoyo Económico",
                    "Hospedaje",
                    "Transporte",
                    "Uso de Instalaciones",
                    "Equipo",
                    "Otro",
                ]),
                FieldDescriptor::new("monto_total", "Monto Solicitado (si aplica)", Number, false)
                    .placeholder("0.00"),
                FieldDescriptor::new("periodo", "Periodo del Apoyo", Text, true)
                    .placeholder("Ej: Del 1 al 15 de marzo de 2026"),
                FieldDescriptor::new("proposito", "Propósito del Apoyo", Textarea, true)
                    .rows(4)
                    .placeholder("Describa la actividad o proyecto que justifica el apoyo"),
                FieldDescriptor::new("justificacion", "Justificación y Beneficios para el CITRO", Textarea, true)
                    .rows(5)
                    .placeholder("Explique por qué este apoyo es importante y cómo beneficia al CITRO"),
            ],
        };

        let tutorial_committee = FormDefinition {
            request_type: RequestType::TutorialCommittee,
            title: "Modificación de Comité Tutorial".to_string(),
            subtitle: "Para estudiantes de posgrado (Maestría y Doctorado)".to_string(),
            fields: vec![
                FieldDescriptor::new("nombre_estudiante", "Nombre del Estudiante", Text, true)
                    .placeholder("Nombre completo"),
                FieldDescriptor::new("correo", "Correo Electrónico", Email, true)
                    .placeholder("correo@uv.mx"),
                FieldDescriptor::new("matricula", "Matrícula", Text, true),
                FieldDescriptor::new("programa", "Programa de Posgrado", Select, true).options(&[
                    "Maestría en Ecología Tropical",
                    "Doctorado en Ecología Tropical",
                    "Maestría en Manejo de Ecosistemas",
                    "Otro",
                ]),
                FieldDescriptor::new("semestre_actual", "Semestre Actual", Select, true)
                    .options(&["1", "2", "3", "4", "5", "6", "7", "8"]),
                FieldDescriptor::new("tipo_modificacion", "Tipo de Modificación Solicitada", Select, true).options(&[
                    "Cambio de Director de Tesis",
                    "Cambio de Asesor",
                    "Agregar Miembro al Comité",
                    "Eliminar Miembro del Comité",
                    "Reemplazo de Miembro",
                ]),
                FieldDescriptor::new("comite_actual", "Comité Tutorial Actual", Textarea, true)
                    .rows(3)
                    .placeholder("Lista de miembros actuales del comité (nombres y roles)"),
                FieldDescriptor::new("comite_propuesto", "Comité Tutorial Propuesto", Textarea, true)
                    .rows(3)
                    .placeholder("Lista de miembros propuestos (nombres y roles)"),
                FieldDescriptor::new("nombre_nuevo_miembro", "Nombre del Nuevo Miembro (si aplica)", Text, false)
                    .placeholder("Dr./Dra. Nombre Completo"),
                FieldDescriptor::new("institucion_nuevo_miembro", "Institución del Nuevo Miembro", Text, false),
                FieldDescriptor::new("justificacion", "Justificación de la Modificación", Textarea, true)
                    .rows(6)
                    .placeholder("Explique las razones académicas que justifican esta modificación"),
            ],
        };

        let mut free_form_kinds = submitter_kinds_all.to_vec();
        free_form_kinds.push("Externo");

        let free_form = FormDefinition {
            request_type: RequestType::FreeForm,
            title: "Solicitud Libre".to_string(),
            subtitle: "Para trámites no contemplados en los formatos anteriores".to_string(),
            fields: vec![
                FieldDescriptor::new("tipo_solicitante", "Tipo de Solicitante", Select, true)
                    .options(&free_form_kinds),
                FieldDescriptor::new("nombre_completo", "Nombre Completo", Text, true)
                    .placeholder("Nombre completo del solicitante"),
                FieldDescriptor::new("correo", "Correo Electrónico", Email, true)
                    .placeholder("correo@uv.mx"),
                FieldDescriptor::new("matricula", "Matrícula / Número de Personal", Text, false)
                    .placeholder("Si aplica"),
                FieldDescriptor::new("asunto", "Asunto de la Solicitud", Text, true)
                    .placeholder("Resumen breve del asunto"),
                FieldDescriptor::new("categoria", "Categoría", Select, true).options(&[
                    "Académico",
                    "Administrativo",
                    "Infraestructura",
                    "Recursos",
                    "Otro",
                ]),
                FieldDescriptor::new("descripcion", "Descripción Detallada", Textarea, true)
                    .rows(8)
                    .placeholder("Describa detalladamente su solicitud, incluyendo antecedentes, justificación y resultados esperados"),
                FieldDescriptor::new("documentos_adjuntos", "Documentos Adjuntos (opcional)", Textarea, false)
                    .rows(2)
                    .placeholder("Liste los documentos que adjunta o mencione si los enviará posteriormente"),
            ],
        };

        Self {
            forms: vec![
                academic_support,
                institutional_endorsement,
                third_party_support,
                tutorial_committee,
                free_form,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_request_type_has_a_form() {
        let catalog = FormCatalog::standard();
        assert_eq!(catalog.forms().len(), RequestType::ALL.len());
        for request_type in RequestType::ALL {
            assert_eq!(catalog.get(request_type).request_type, request_type);
        }
    }

    #[test]
    fn test_key_roundtrip() {
        for request_type in RequestType::ALL {
            assert_eq!(request_type.key().parse::<RequestType>().unwrap(), request_type);
        }
        assert!("viaticos".parse::<RequestType>().is_err());
    }

    #[test]
    fn test_lookup_by_key() {
        let catalog = FormCatalog::standard();
        let form = catalog.get_by_key("comite_tutorial").unwrap();
        assert_eq!(form.title, "Modificación de Comité Tutorial");
        assert!(form.has_field("nombre_estudiante"));
        assert!(catalog.get_by_key("unknown").is_err());
    }

    #[test]
    fn test_select_fields_declare_options() {
        for form in FormCatalog::standard().forms() {
            for field in &form.fields {
                if field.kind == FieldKind::Select {
                    assert!(!field.options.is_empty(), "{} in {}", field.name, form.title);
                }
            }
        }
    }

    #[test]
    fn test_serde_uses_catalog_keys() {
        let json = serde_json::to_string(&RequestType::ThirdPartySupport).unwrap();
        assert_eq!(json, "\"apoyo_terceros\"");
    }
}
