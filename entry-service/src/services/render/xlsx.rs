//! One-sheet workbook: bold header, numeric cells as numbers, bold totals.

use super::{DocumentFormat, DocumentRenderer, RenderError};
use crate::services::report::{Cell, ReportTable};
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Format, Workbook, Worksheet};

pub struct XlsxRenderer;

struct CellFormats {
    text: Format,
    wrapped: Format,
    decimal: Format,
    integer: Format,
}

impl CellFormats {
    fn new(bold: bool) -> Self {
        let base = if bold {
            Format::new().set_bold()
        } else {
            Format::new()
        };
        Self {
            text: base.clone(),
            wrapped: base.clone().set_text_wrap(),
            decimal: base.clone().set_num_format("0.00"),
            integer: base.set_num_format("0"),
        }
    }
}

fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Cell,
    formats: &CellFormats,
) -> Result<(), RenderError> {
    match cell {
        Cell::Text(s) if s.contains('\n') => {
            sheet.write_string_with_format(row, col, s, &formats.wrapped)?;
        }
        Cell::Text(s) => {
            sheet.write_string_with_format(row, col, s, &formats.text)?;
        }
        Cell::Decimal(d) => {
            sheet.write_number_with_format(row, col, d.to_f64().unwrap_or_default(), &formats.decimal)?;
        }
        Cell::Integer(i) => {
            sheet.write_number_with_format(row, col, *i as f64, &formats.integer)?;
        }
        Cell::Empty => {}
    }
    Ok(())
}

impl DocumentRenderer for XlsxRenderer {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Xlsx
    }

    fn render(&self, table: &ReportTable) -> Result<Vec<u8>, RenderError> {
        let mut workbook = Workbook::new();
        let plain = CellFormats::new(false);
        let bold = CellFormats::new(true);

        {
            let sheet = workbook.add_worksheet();
            sheet.set_name(table.kind.sheet_name())?;

            for (col, header) in table.headers.iter().enumerate() {
                sheet.write_string_with_format(0, col as u16, header, &bold.text)?;
            }

            for (r, row) in table.rows.iter().enumerate() {
                for (col, cell) in row.iter().enumerate() {
                    write_cell(sheet, r as u32 + 1, col as u16, cell, &plain)?;
                }
            }

            let first_totals_row = table.rows.len() as u32 + 1;
            for (r, row) in table.totals.iter().enumerate() {
                for (col, cell) in row.iter().enumerate() {
                    write_cell(sheet, first_totals_row + r as u32, col as u16, cell, &bold)?;
                }
            }

            for (col, width) in table.layout.widths.iter().enumerate() {
                sheet.set_column_width(col as u16, (*width + 2) as f64)?;
            }
        }

        Ok(workbook.save_to_buffer()?)
    }
}
