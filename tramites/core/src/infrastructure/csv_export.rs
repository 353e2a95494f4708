// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! CSV export of request records.
//!
//! Output is UTF-8 with a byte-order mark so spreadsheet tools pick the right
//! encoding. Every cell is double-quoted (`"` doubled) and every row, the
//! header included, ends with `\n`.

use chrono::{DateTime, Local, NaiveDate, Utc};
use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::domain::request::RequestRecord;

const BOM: &[u8] = b"\xEF\xBB\xBF";

pub const FULL_HEADERS: [&str; 11] = [
    "Folio",
    "Fecha Solicitud",
    "Tipo de Trámite",
    "Nombre Solicitante",
    "Email Solicitante",
    "Matrícula",
    "Monto Solicitado",
    "Estado",
    "Monto Autorizado",
    "Notas del CT",
    "URL PDF",
];

pub const FILTERED_HEADERS: [&str; 8] = [
    "Folio",
    "Fecha",
    "Tipo",
    "Solicitante",
    "Email",
    "Estado",
    "Monto Solicitado",
    "Monto Autorizado",
];

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("No hay solicitudes para exportar")]
    Empty,

    #[error("CSV write failed: {0}")]
    Write(String),
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::Write(err.to_string())
    }
}

/// Which column set to write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Full,
    Filtered,
}

impl ExportKind {
    /// `<PREFIX>_Solicitudes_<YYYY-MM-DD>.csv` or `<PREFIX>_Filtrado_<YYYY-MM-DD>.csv`
    pub fn file_name(&self, prefix: &str, date: NaiveDate) -> String {
        let label = match self {
            ExportKind::Full => "Solicitudes",
            ExportKind::Filtered => "Filtrado",
        };
        format!("{}_{}_{}.csv", prefix, label, date.format("%Y-%m-%d"))
    }
}

fn amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

fn local_datetime(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%d/%m/%Y, %H:%M").to_string()
}

fn local_date(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%d/%m/%Y").to_string()
}

fn full_row(r: &RequestRecord) -> [String; 11] {
    [
        r.folio.to_string(),
        local_datetime(&r.created_at),
        r.request_title.clone(),
        r.submitter_name.clone(),
        r.submitter_email.clone(),
        r.student_id.clone(),
        amount(r.amount_requested),
        r.status.wire_name().to_string(),
        amount(r.amount_authorized),
        r.reviewer_notes.clone(),
        r.document_url.clone(),
    ]
}

fn filtered_row(r: &RequestRecord) -> [String; 8] {
    [
        r.folio.to_string(),
        local_date(&r.created_at),
        r.request_title.clone(),
        r.submitter_name.clone(),
        r.submitter_email.clone(),
        r.status.wire_name().to_string(),
        amount(r.amount_requested),
        amount(r.amount_authorized),
    ]
}

/// Serialize records with the chosen column set
pub fn export(records: &[RequestRecord], kind: ExportKind) -> Result<Vec<u8>, ExportError> {
    if records.is_empty() {
        return Err(ExportError::Empty);
    }

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(BOM.to_vec());

    match kind {
        ExportKind::Full => {
            writer.write_record(FULL_HEADERS)?;
            for record in records {
                writer.write_record(full_row(record))?;
            }
        }
        ExportKind::Filtered => {
            writer.write_record(FILTERED_HEADERS)?;
            for record in records {
                writer.write_record(filtered_row(record))?;
            }
        }
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Write(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::request::{FieldMap, Folio, RequestStatus};

    fn record(folio: &str, name: &str) -> RequestRecord {
        RequestRecord {
            item_id: Some("1".into()),
            folio: Folio::from(folio.to_string()),
            request_title: "Apoyo Académico".into(),
            submitter_name: name.into(),
            submitter_email: "ana@uv.mx".into(),
            account_email: "ana@uv.mx".into(),
            student_id: "S1".into(),
            fields: FieldMap::new(),
            amount_requested: 1500.5,
            amount_authorized: 0.0,
            status: RequestStatus::Pending,
            document_url: "https://drive/x.pdf".into(),
            created_at: Utc::now(),
            reviewer_notes: String::new(),
        }
    }

    #[test]
    fn test_export_n_records_gives_n_plus_one_lines() {
        let records = vec![
            record("AAC-1", "Ana"),
            record("AAC-2", "Luis \"el Güero\""),
            record("AAC-3", "Pérez, Juan"),
        ];
        let bytes = export(&records, ExportKind::Full).unwrap();

        assert!(bytes.starts_with(BOM));
        let text = std::str::from_utf8(&bytes[BOM.len()..]).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), records.len() + 1);
        assert!(text.ends_with('\n'));

        assert!(lines[0].starts_with("\"Folio\",\"Fecha Solicitud\",\"Tipo de Trámite\""));
        assert!(lines[2].contains("\"Luis \"\"el Güero\"\"\""));
        assert!(lines[3].contains("\"Pérez, Juan\""));
        assert!(lines[1].contains("\"1500.5\",\"Pendiente\",\"0\""));

        for line in &lines {
            assert!(line.starts_with('"') && line.ends_with('"'));
        }
    }

    #[test]
    fn test_filtered_columns() {
        let bytes = export(&[record("TER-1", "Ana")], ExportKind::Filtered).unwrap();
        let text = String::from_utf8(bytes[BOM.len()..].to_vec()).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(header.split(',').count(), FILTERED_HEADERS.len());
        assert!(header.contains("\"Monto Autorizado\""));
        assert!(!header.contains("URL PDF"));
    }

    #[test]
    fn test_empty_export_is_error() {
        let err = export(&[], ExportKind::Full).unwrap_err();
        assert_eq!(err.to_string(), "No hay solicitudes para exportar");
    }

    #[test]
    fn test_file_names() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(ExportKind::Full.file_name("CITRO", date), "CITRO_Solicitudes_2026-10-19.csv");
        assert_eq!(ExportKind::Filtered.file_name("CITRO", date), "CITRO_Filtrado_2026-10-19.csv");
    }
}
