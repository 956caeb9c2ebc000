//! Landscape A4 PDF with a grid table and an aligned totals table.
//!
//! Two passes: the data table is laid out first and its realized column
//! widths are then forced onto the totals table drawn beneath it.

use super::{DocumentFormat, DocumentRenderer, RenderError};
use crate::services::report::{Cell, ReportTable};
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Color, Greyscale, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Polygon,
};

const PAGE_WIDTH: f32 = 297.0;
const PAGE_HEIGHT: f32 = 210.0;
const MARGIN: f32 = 10.0;
const TITLE_SIZE: f32 = 16.0;
const HEAD_SIZE: f32 = 6.0;
const BODY_SIZE: f32 = 8.0;
const CELL_PADDING: f32 = 1.5;
const PT_TO_MM: f32 = 0.3528;
const LINE_SPACING: f32 = 1.2;
/// Average Helvetica glyph width as a fraction of the font size.
const GLYPH_WIDTH: f32 = 0.5;
const HEAD_FILL: f32 = 0.85;
const TOTALS_FILL: f32 = 0.94;

pub struct PdfRenderer;

impl DocumentRenderer for PdfRenderer {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pdf
    }

    fn render(&self, table: &ReportTable) -> Result<Vec<u8>, RenderError> {
        let (doc, page, layer) =
            PdfDocument::new(&table.title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_error)?;
        let layer = doc.get_page(page).get_layer(layer);

        layer.use_text(
            table.title.as_str(),
            TITLE_SIZE,
            Mm(MARGIN),
            Mm(PAGE_HEIGHT - MARGIN - TITLE_SIZE * PT_TO_MM),
            &bold,
        );

        let mut canvas = Canvas {
            doc,
            layer,
            y: PAGE_HEIGHT - MARGIN - 2.0 * TITLE_SIZE * PT_TO_MM,
        };

        // Pass one: data table.
        let widths = table.layout.scaled(PAGE_WIDTH - 2.0 * MARGIN);
        let header = lay_out_row(
            &table.headers.iter().map(String::as_str).collect::<Vec<_>>(),
            &widths,
            HEAD_SIZE,
        );
        let rows: Vec<LaidOutRow> = table
            .rows
            .iter()
            .map(|row| lay_out_cells(row, &widths, BODY_SIZE))
            .collect();

        let header_style = RowStyle {
            font: &bold,
            size: HEAD_SIZE,
            fill: Some(HEAD_FILL),
        };
        let body_style = RowStyle {
            font: &regular,
            size: BODY_SIZE,
            fill: None,
        };

        canvas.draw_row(&header, &widths, &header_style);
        for row in &rows {
            if !canvas.fits(row.height) {
                canvas.new_page();
                canvas.draw_row(&header, &widths, &header_style);
            }
            canvas.draw_row(row, &widths, &body_style);
        }

        // Pass two: totals forced onto the realized widths.
        let totals_style = RowStyle {
            font: &bold,
            size: BODY_SIZE,
            fill: Some(TOTALS_FILL),
        };
        for totals in &table.totals {
            let row = lay_out_cells(totals, &widths, BODY_SIZE);
            if !canvas.fits(row.height) {
                canvas.new_page();
            }
            canvas.draw_row(&row, &widths, &totals_style);
        }

        canvas.doc.save_to_bytes().map_err(pdf_error)
    }
}

fn pdf_error(err: printpdf::Error) -> RenderError {
    RenderError::Pdf(format!("{:?}", err))
}

struct LaidOutRow {
    lines: Vec<Vec<String>>,
    height: f32,
}

struct RowStyle<'a> {
    font: &'a IndirectFontRef,
    size: f32,
    fill: Option<f32>,
}

fn line_height(size: f32) -> f32 {
    size * PT_TO_MM * LINE_SPACING
}

fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * GLYPH_WIDTH * PT_TO_MM
}

/// Splits on newlines, then hard-wraps lines that do not fit the cell.
fn wrap(text: &str, width: f32, size: f32) -> Vec<String> {
    let capacity = (((width - 2.0 * CELL_PADDING) / (size * GLYPH_WIDTH * PT_TO_MM)) as usize).max(1);
    let mut lines = Vec::new();
    for line in text.lines() {
        let chars: Vec<char> = line.chars().collect();
        if chars.is_empty() {
            lines.push(String::new());
            continue;
        }
        for chunk in chars.chunks(capacity) {
            lines.push(chunk.iter().collect());
        }
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn lay_out_row(texts: &[&str], widths: &[f32], size: f32) -> LaidOutRow {
    let lines: Vec<Vec<String>> = texts
        .iter()
        .zip(widths)
        .map(|(text, &width)| wrap(text, width, size))
        .collect();
    let max_lines = lines.iter().map(Vec::len).max().unwrap_or(1);
    LaidOutRow {
        lines,
        height: max_lines as f32 * line_height(size) + 2.0 * CELL_PADDING,
    }
}

fn lay_out_cells(cells: &[Cell], widths: &[f32], size: f32) -> LaidOutRow {
    let texts: Vec<String> = cells.iter().map(Cell::display).collect();
    lay_out_row(
        &texts.iter().map(String::as_str).collect::<Vec<_>>(),
        widths,
        size,
    )
}

struct Canvas {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
}

impl Canvas {
    fn fits(&self, height: f32) -> bool {
        self.y - height >= MARGIN
    }

    fn new_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn draw_row(&mut self, row: &LaidOutRow, widths: &[f32], style: &RowStyle<'_>) {
        let top = self.y;
        let mut x = MARGIN;

        for (lines, &width) in row.lines.iter().zip(widths) {
            let corners = vec![
                (Point::new(Mm(x), Mm(top)), false),
                (Point::new(Mm(x + width), Mm(top)), false),
                (Point::new(Mm(x + width), Mm(top - row.height)), false),
                (Point::new(Mm(x), Mm(top - row.height)), false),
            ];

            if let Some(shade) = style.fill {
                self.layer
                    .set_fill_color(Color::Greyscale(Greyscale::new(shade, None)));
                self.layer.add_polygon(Polygon {
                    rings: vec![corners.clone()],
                    mode: PaintMode::Fill,
                    winding_order: WindingOrder::NonZero,
                });
                self.layer
                    .set_fill_color(Color::Greyscale(Greyscale::new(0.0, None)));
            }
            self.layer.add_line(Line {
                points: corners,
                is_closed: true,
            });

            let mut baseline = top - CELL_PADDING - style.size * PT_TO_MM;
            for line in lines {
                let offset = ((width - text_width(line, style.size)) / 2.0).max(CELL_PADDING);
                self.layer
                    .use_text(line.as_str(), style.size, Mm(x + offset), Mm(baseline), style.font);
                baseline -= line_height(style.size);
            }

            x += width;
        }

        self.y = top - row.height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BhartiPair, LedgerEntry};
    use crate::services::report::{datewise_report, entries_report};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn entry(id: i64) -> LedgerEntry {
        LedgerEntry {
            id,
            entry_date: "2024-01-01".parse().unwrap(),
            name: format!("Trader {}", id),
            bags: 3,
            bharti_pairs: vec![BhartiPair::new(dec!(2), dec!(3)), BhartiPair::new(dec!(1), dec!(4))],
            weight: dec!(10.00),
            rate: dec!(100.00),
            lessrate: dec!(10.00),
            amount: dec!(45.00),
            commission: dec!(0.68),
            other_amount: 5,
            total: dec!(50.68),
            quality: "A".to_string(),
            item: "Wheat".to_string(),
            market_fee: 12,
            is_marked: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            created_by: "system".to_string(),
            updated_by: "system".to_string(),
        }
    }

    #[test]
    fn renders_pdf_bytes() {
        let table = datewise_report(&[entry(1), entry(2)], "2024-01-01".parse().unwrap());
        let bytes = PdfRenderer.render(&table).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn paginates_long_tables() {
        let entries: Vec<LedgerEntry> = (1..=120).map(entry).collect();
        let table = entries_report(&entries, &[]);
        let bytes = PdfRenderer.render(&table).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn wrap_splits_on_newlines_and_width() {
        assert_eq!(wrap("(2×3)\n(1×4)", 50.0, BODY_SIZE), vec!["(2×3)", "(1×4)"]);

        let four_chars = 2.0 * CELL_PADDING + 4.5 * BODY_SIZE * GLYPH_WIDTH * PT_TO_MM;
        let narrow = wrap("abcdefghij", four_chars, BODY_SIZE);
        assert_eq!(narrow, vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap("", 10.0, BODY_SIZE), vec![String::new()]);
    }
}
