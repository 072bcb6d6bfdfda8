//! services/api/src/adapters/pdf.rs
//!
//! Draws laid-out reports onto A4 pages with the PDF builtin Helvetica fonts.

use design_studio_core::ports::{PortError, PortResult, ReportRenderer};
use design_studio_core::report::{LineStyle, PageGeometry, Report};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument};
use tracing::info;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 10.0;
const TOP_MM: f32 = 277.0;
const LINE_PITCH_MM: f32 = 10.0;
/// Average Helvetica glyph width as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.5;
const MM_PER_PT: f32 = 0.3528;
const LAYER: &str = "Layer 1";

fn font_size(style: LineStyle) -> f32 {
    match style {
        LineStyle::Title => 18.0,
        LineStyle::Subtitle => 12.0,
        LineStyle::Heading => 14.0,
        LineStyle::Body => 10.0,
    }
}

/// X offset that roughly centers `text` at `size` points.
fn centered_x(text: &str, size: f32) -> f32 {
    let width = text.chars().count() as f32 * size * AVG_GLYPH_WIDTH * MM_PER_PT;
    ((PAGE_WIDTH_MM - width) / 2.0).max(MARGIN_MM)
}

fn pdf_error(e: printpdf::Error) -> PortError {
    PortError::Unexpected(format!("PDF generation failed: {}", e))
}

#[derive(Clone, Default)]
pub struct PdfReportAdapter {
    geometry: PageGeometry,
}

impl PdfReportAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReportRenderer for PdfReportAdapter {
    fn render(&self, report: &Report) -> PortResult<Vec<u8>> {
        report.check_encoding()?;
        let pages = report.layout(&self.geometry);

        let (doc, first_page, first_layer) =
            PdfDocument::new(&report.title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER);
        let regular: IndirectFontRef = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(pdf_error)?;
        let bold: IndirectFontRef = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_error)?;

        let mut first = Some((first_page, first_layer));
        for page in &pages {
            let (page_ref, layer_ref) = match first.take() {
                Some(refs) => refs,
                None => doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER),
            };
            let layer = doc.get_page(page_ref).get_layer(layer_ref);

            for (row, line) in page.lines.iter().enumerate() {
                if line.text.is_empty() {
                    continue;
                }
                let size = font_size(line.style);
                let y = TOP_MM - row as f32 * LINE_PITCH_MM;
                let (x, font) = match line.style {
                    LineStyle::Title => (centered_x(&line.text, size), &bold),
                    LineStyle::Subtitle => (centered_x(&line.text, size), &regular),
                    LineStyle::Heading => (MARGIN_MM, &bold),
                    LineStyle::Body => (MARGIN_MM, &regular),
                };
                layer.use_text(line.text.clone(), size, Mm(x), Mm(y), font);
            }
        }

        let bytes = doc.save_to_bytes().map_err(pdf_error)?;
        info!("Rendered '{}' to {} page(s), {} bytes.", report.title, pages.len(), bytes.len());
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use design_studio_core::report;

    #[test]
    fn renders_a_pdf_document() {
        let report = report::build("Marketing Plan for Halo", "Lead with short-form video.");
        let bytes = PdfReportAdapter::new().render(&report).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn full_plan_renders() {
        let report = report::build_full(
            "Braid Design Launch Plan: Halo",
            &["Target Demographic: Teens".to_string()],
            vec![("Look and Feel".to_string(), "Soft and glossy.".to_string())],
        );
        assert!(PdfReportAdapter::new().render(&report).is_ok());
    }

    #[test]
    fn text_without_a_win_ansi_code_is_an_encoding_error() {
        let report = report::build("Plan", "\u{2728} sparkle");
        assert!(matches!(
            PdfReportAdapter::new().render(&report),
            Err(PortError::Encoding(_))
        ));
    }

    #[test]
    fn smart_quotes_and_dashes_render() {
        let report = report::build("Plan", "Designer\u{2019}s pick \u{2014} \u{201C}Halo\u{201D}");
        assert!(PdfReportAdapter::new().render(&report).is_ok());
    }

    #[test]
    fn long_lines_are_not_pushed_off_the_page() {
        assert_eq!(centered_x(&"x".repeat(500), 18.0), MARGIN_MM);
        assert!(centered_x("Short", 18.0) > MARGIN_MM);
    }
}
