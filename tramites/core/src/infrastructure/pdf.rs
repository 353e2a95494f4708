// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! PDF Letter Renderer
//!
//! Produces the A4 request letter addressed to the reviewing body: letterhead,
//! folio, request title, date line, addressee, body paragraph, a summary table
//! of every non-empty field, signature block and a footer on each page.
//!
//! Layout is computed in millimetres from the top-left corner and converted
//! to PDF coordinates (origin bottom-left) when drawing. Built-in Helvetica
//! has no metrics API here, so centring and wrapping use an average glyph width.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Implements `DocumentRenderer` with printpdf

use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Rect, Rgb,
};
use tracing::debug;

use crate::domain::document::{
    summary_label, summary_value, DocumentError, DocumentRenderer, DocumentRequest, Letterhead,
};
use crate::domain::locale::long_date;

const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN: f32 = 20.0;
const CONTENT_W: f32 = 170.0;
const PT_TO_MM: f32 = 0.3528;
/// Average Helvetica advance as a fraction of the font size
const AVG_GLYPH: f32 = 0.5;

const SUMMARY_BREAK_Y: f32 = 252.0;
const SIGNATURE_BREAK_Y: f32 = 242.0;
const FOOTER_Y: f32 = 287.0;
const VALUE_MAX_CHARS: usize = 80;

const BLUE: (u8, u8, u8) = (0, 120, 212);
const ROW_SHADE: (u8, u8, u8) = (235, 243, 251);
const FOOTER_GREY: (u8, u8, u8) = (120, 120, 120);
const BLACK: (u8, u8, u8) = (0, 0, 0);

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(Rgb::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, None))
}

/// Built-in fonts only cover WinAnsi; anything else would print as garbage.
fn printable(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7e}' | '\u{a0}'..='\u{ff}' => c,
            '‘' | '’' | '“' | '”' | '–' | '—' | '•' | '…' | '€' => c,
            '\t' | '\n' | '\r' => ' ',
            _ => '?',
        })
        .collect()
}

fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * AVG_GLYPH * PT_TO_MM
}

/// Greedy word wrap to an approximate width in millimetres
fn wrap(text: &str, size: f32, width: f32) -> Vec<String> {
    let max_chars = ((width / (size * AVG_GLYPH * PT_TO_MM)).floor() as usize).max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

enum Align {
    Left(f32),
    Center,
    Right(f32),
}

struct LetterWriter {
    doc: PdfDocumentReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    layers: Vec<PdfLayerReference>,
    y: f32,
}

impl LetterWriter {
    fn new(title: &str) -> Result<Self, DocumentError> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "Página 1");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| DocumentError::Render(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| DocumentError::Render(e.to_string()))?;
        let first = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            regular,
            bold,
            layers: vec![first],
            y: MARGIN,
        })
    }

    fn layer(&self) -> &PdfLayerReference {
        // layers always holds the first page
        &self.layers[self.layers.len() - 1]
    }

    fn new_page(&mut self) {
        let n = self.layers.len() + 1;
        let (page, layer) = self.doc.add_page(Mm(PAGE_W), Mm(PAGE_H), format!("Página {}", n));
        self.layers.push(self.doc.get_page(page).get_layer(layer));
        self.y = MARGIN;
    }

    fn break_if_below(&mut self, limit: f32) {
        if self.y > limit {
            self.new_page();
        }
    }

    fn text(&self, text: &str, size: f32, bold: bool, align: Align) {
        let text = printable(text);
        let text = text.as_str();
        let x = match align {
            Align::Left(x) => x,
            Align::Center => (PAGE_W - text_width(text, size)) / 2.0,
            Align::Right(right) => right - text_width(text, size),
        };
        let font = if bold { &self.bold } else { &self.regular };
        self.layer()
            .use_text(text, size, Mm(x.max(0.0)), Mm(PAGE_H - self.y), font);
    }

    fn fill(&self, color: (u8, u8, u8)) {
        self.layer().set_fill_color(rgb(color));
    }

    fn rule(&self, x1: f32, x2: f32, thickness: f32, color: (u8, u8, u8)) {
        let layer = self.layer();
        layer.set_outline_color(rgb(color));
        layer.set_outline_thickness(thickness);
        let y = Mm(PAGE_H - self.y);
        layer.add_line(Line {
            points: vec![(Point::new(Mm(x1), y), false), (Point::new(Mm(x2), y), false)],
            is_closed: false,
        });
    }

    fn shade_row(&self, top: f32, height: f32, color: (u8, u8, u8)) {
        let layer = self.layer();
        layer.set_fill_color(rgb(color));
        layer.add_rect(Rect::new(
            Mm(MARGIN),
            Mm(PAGE_H - (top + height)),
            Mm(MARGIN + CONTENT_W),
            Mm(PAGE_H - top),
        ));
        layer.set_fill_color(rgb(BLACK));
    }

    fn footer(&self, text: &str) {
        let text = printable(text);
        let text = text.as_str();
        let x = (PAGE_W - text_width(text, 7.0)) / 2.0;
        for layer in &self.layers {
            layer.set_fill_color(rgb(FOOTER_GREY));
            layer.use_text(text, 7.0, Mm(x.max(0.0)), Mm(PAGE_H - FOOTER_Y), &self.regular);
        }
    }

    fn finish(self) -> Result<(Vec<u8>, usize), DocumentError> {
        let pages = self.layers.len();
        let bytes = self
            .doc
            .save_to_bytes()
            .map_err(|e| DocumentError::Render(e.to_string()))?;
        Ok((bytes, pages))
    }
}

/// Renders request letters as PDF
pub struct PdfLetterRenderer {
    letterhead: Letterhead,
}

impl PdfLetterRenderer {
    pub fn new(letterhead: Letterhead) -> Self {
        Self { letterhead }
    }

    /// Non-empty fields in form order, then any extra submitted keys
    fn summary_rows(request: &DocumentRequest<'_>) -> Vec<(String, String)> {
        let in_form = request
            .form
            .fields
            .iter()
            .filter_map(|f| request.fields.get(&f.name).map(|v| (f.name.as_str(), v)));
        let extras = request
            .fields
            .iter()
            .filter(|(k, _)| !request.form.has_field(k))
            .map(|(k, v)| (k.as_str(), v));

        in_form
            .chain(extras)
            .filter(|(_, v)| !v.trim().is_empty())
            .map(|(k, v)| (summary_label(k), summary_value(v, VALUE_MAX_CHARS)))
            .collect()
    }
}

impl DocumentRenderer for PdfLetterRenderer {
    fn render(&self, request: &DocumentRequest<'_>) -> Result<Vec<u8>, DocumentError> {
        let head = &self.letterhead;
        let mut w = LetterWriter::new(&format!("Solicitud {}", request.folio))?;

        // Letterhead
        w.text(&head.institution.to_uppercase(), 11.0, true, Align::Center);
        w.y += 6.0;
        w.text(&head.university, 9.0, false, Align::Center);
        w.y += 7.0;
        w.rule(MARGIN, PAGE_W - MARGIN, 2.0, BLUE);
        w.y += 7.0;

        w.fill(BLUE);
        w.text(&format!("Folio: {}", request.folio), 8.0, true, Align::Center);
        w.fill(BLACK);
        w.y += 9.0;

        for line in wrap(&request.form.title.to_uppercase(), 13.0, CONTENT_W) {
            w.text(&line, 13.0, true, Align::Center);
            w.y += 7.0;
        }

        // Place and date
        let date_line = format!("{}, {}", head.city, long_date(&request.issued_at));
        w.y += 4.0;
        w.text(&date_line, 9.0, false, Align::Right(PAGE_W - MARGIN));
        w.y += 12.0;

        // Addressee
        for line in [head.addressee.as_str(), head.institution.as_str(), head.university.as_str()] {
            w.text(line, 9.0, false, Align::Left(MARGIN));
            w.y += 5.0;
        }
        w.text("Presente.", 9.0, true, Align::Left(MARGIN));
        w.y += 12.0;

        // Body
        let name = if request.submitter_name.trim().is_empty() {
            "[Nombre]"
        } else {
            request.submitter_name
        };
        let id = if request.student_id.trim().is_empty() {
            "[Matrícula]"
        } else {
            request.student_id
        };
        let body = format!(
            "Por medio del presente, {}, con número de identificación {}, me dirijo respetuosamente a este {} para solicitar el apoyo correspondiente según los datos del documento con folio {}.",
            name, id, head.addressee, request.folio
        );
        for line in wrap(&body, 9.0, CONTENT_W) {
            w.text(&line, 9.0, false, Align::Left(MARGIN));
            w.y += 5.5;
        }
        w.y += 8.0;

        // Summary table
        w.text("RESUMEN DE LA SOLICITUD", 10.0, true, Align::Left(MARGIN));
        w.y += 7.0;

        for (index, (label, value)) in Self::summary_rows(request).iter().enumerate() {
            w.break_if_below(SUMMARY_BREAK_Y);
            if index % 2 == 0 {
                w.shade_row(w.y - 3.5, 6.0, ROW_SHADE);
            }
            w.text(label, 8.0, true, Align::Left(MARGIN + 1.0));
            w.text(value, 8.0, false, Align::Left(MARGIN + 65.0));
            w.y += 6.0;
        }

        // Signature
        w.y += 14.0;
        w.break_if_below(SIGNATURE_BREAK_Y);
        w.text("Atentamente,", 9.0, false, Align::Left(MARGIN));
        w.y += 20.0;
        w.rule(MARGIN, MARGIN + 60.0, 0.5, BLACK);
        w.y += 5.0;
        w.text(name, 9.0, true, Align::Left(MARGIN));
        w.y += 5.0;
        w.text(id, 7.0, false, Align::Left(MARGIN));

        w.footer(&format!(
            "Folio: {}  ·  {}  ·  {} / {}",
            request.folio, date_line, head.institution, head.university
        ));

        let (bytes, pages) = w.finish()?;
        if bytes.is_empty() {
            return Err(DocumentError::Empty);
        }

        debug!(folio = %request.folio, pages, size_kb = bytes.len() / 1024, "PDF generated");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{FormCatalog, RequestType};
    use crate::domain::request::{FieldMap, Folio};
    use chrono::Local;

    fn letterhead() -> Letterhead {
        Letterhead {
            institution: "Centro de Investigaciones Tropicales (CITRO)".into(),
            university: "Universidad Veracruzana".into(),
            city: "Xalapa, Ver.".into(),
            addressee: "H. Consejo Técnico".into(),
        }
    }

    #[test]
    fn test_printable_keeps_spanish_text() {
        assert_eq!(printable("Matrícula: Peña — “ok”"), "Matrícula: Peña — “ok”");
        assert_eq!(printable("Ciudad 東京\tX"), "Ciudad ?? X");
    }

    #[test]
    fn test_wrap_respects_width() {
        let lines = wrap("uno dos tres cuatro cinco seis siete", 10.0, 20.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.join(" "), "uno dos tres cuatro cinco seis siete");
    }

    #[test]
    fn test_render_produces_pdf() {
        let form = FormCatalog::standard().get(RequestType::FreeForm);
        let mut fields = FieldMap::new();
        fields.insert("asunto".into(), "Solicitud de espacio".into());
        fields.insert("descripcion".into(), "x".repeat(300));
        let folio = Folio::from("LIB-20260101-101010".to_string());

        let bytes = PdfLetterRenderer::new(letterhead())
            .render(&DocumentRequest {
                form,
                fields: &fields,
                folio: &folio,
                submitter_name: "Ana López",
                student_id: "",
                issued_at: Local::now(),
            })
            .unwrap();

        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_summary_rows_skip_empty_and_keep_form_order() {
        let form = FormCatalog::standard().get(RequestType::FreeForm);
        let mut fields = FieldMap::new();
        fields.insert("zz_extra".into(), "extra".into());
        fields.insert("asunto".into(), "A".into());
        fields.insert("categoria".into(), "Otro".into());
        fields.insert("matricula".into(), " ".into());
        let folio = Folio::from("F".to_string());

        let request = DocumentRequest {
            form,
            fields: &fields,
            folio: &folio,
            submitter_name: "",
            student_id: "",
            issued_at: Local::now(),
        };
        let labels: Vec<String> = PdfLetterRenderer::summary_rows(&request)
            .into_iter()
            .map(|(l, _)| l)
            .collect();
        assert_eq!(labels, vec!["ASUNTO", "CATEGORIA", "ZZ EXTRA"]);
    }

    #[test]
    fn test_many_fields_add_pages() {
        let form = FormCatalog::standard().get(RequestType::FreeForm);
        let fields: FieldMap = (0..80)
            .map(|i| (format!("campo_{:02}", i), format!("valor {}", i)))
            .collect();
        let folio = Folio::from("LIB-1".to_string());

        let bytes = PdfLetterRenderer::new(letterhead())
            .render(&DocumentRequest {
                form,
                fields: &fields,
                folio: &folio,
                submitter_name: "Ana",
                student_id: "S1",
                issued_at: Local::now(),
            })
            .unwrap();
        assert!(!bytes.is_empty());
    }
}
