//! Report assembler: turns entries into a renderer-neutral table.

use crate::models::LedgerEntry;
use crate::services::aggregation::{quality_view_amount, AllAmounts};
use crate::services::calculator::round2;
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Narrowest column, in characters, so short headers still get a usable cell.
const MIN_COLUMN_CHARS: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Decimal(Decimal),
    Integer(i64),
    Empty,
}

impl Cell {
    /// Text as shown in a PDF cell. Decimals always carry two places.
    pub fn display(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Decimal(d) => round2(*d).to_string(),
            Cell::Integer(i) => i.to_string(),
            Cell::Empty => String::new(),
        }
    }

    /// Widest line of the displayed text, in characters.
    fn width(&self) -> usize {
        self.display()
            .lines()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    EntryDate,
    Quality,
    Item,
    Name,
    Bags,
    BhartiPairs,
    Weight,
    Rate,
    LessRate,
    Amount,
    /// `rate × weight / 20`, quality-wise report only.
    QualityAmount,
    Commission,
    OtherAmount,
    Total,
    AllAmount,
    MarketFee,
}

impl Column {
    /// Fields a caller may pick for the entries report, in their default order.
    pub const SELECTABLE: [Column; 15] = [
        Column::EntryDate,
        Column::Quality,
        Column::Item,
        Column::Name,
        Column::Bags,
        Column::BhartiPairs,
        Column::Weight,
        Column::Rate,
        Column::LessRate,
        Column::Amount,
        Column::Commission,
        Column::OtherAmount,
        Column::Total,
        Column::AllAmount,
        Column::MarketFee,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Column::EntryDate => "entry_date",
            Column::Quality => "quality",
            Column::Item => "item",
            Column::Name => "name",
            Column::Bags => "bags",
            Column::BhartiPairs => "bharti_pairs",
            Column::Weight => "weight",
            Column::Rate => "rate",
            Column::LessRate => "lessrate",
            Column::Amount => "amount",
            Column::QualityAmount => "quality_amount",
            Column::Commission => "commission",
            Column::OtherAmount => "other_amount",
            Column::Total => "total",
            Column::AllAmount => "all_amount",
            Column::MarketFee => "market_fee",
        }
    }

    pub fn from_key(key: &str) -> Option<Column> {
        Self::SELECTABLE
            .iter()
            .copied()
            .find(|c| c.key() == key.trim())
    }

    pub fn label(&self) -> &'static str {
        match self {
            Column::EntryDate => "DATE",
            Column::Quality => "QUALITY",
            Column::Item => "ITEM",
            Column::Name => "NAME",
            Column::Bags => "BAGS",
            Column::BhartiPairs => "BHARTI",
            Column::Weight => "WEIGHT",
            Column::Rate => "RATE",
            Column::LessRate => "LESS RATE",
            Column::Amount | Column::QualityAmount => "AMOUNT",
            Column::Commission => "COMMISSION",
            Column::OtherAmount => "OTHER",
            Column::Total => "TOTAL",
            Column::AllAmount => "ALLAMOUNT",
            Column::MarketFee => "MARKET FEE",
        }
    }

    fn cell(&self, entry: &LedgerEntry, all_amounts: &AllAmounts) -> Cell {
        match self {
            Column::EntryDate => Cell::Text(format_date(entry.entry_date)),
            Column::Quality => Cell::Text(entry.quality.clone()),
            Column::Item => Cell::Text(entry.item.clone()),
            Column::Name => Cell::Text(entry.name.clone()),
            Column::Bags => Cell::Integer(i64::from(entry.bags)),
            Column::BhartiPairs => Cell::Text(
                entry
                    .bharti_pairs
                    .iter()
                    .map(|p| p.display())
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            Column::Weight => Cell::Decimal(entry.weight),
            Column::Rate => Cell::Decimal(entry.rate),
            Column::LessRate => Cell::Decimal(entry.lessrate),
            Column::Amount => Cell::Decimal(entry.amount),
            Column::QualityAmount => Cell::Decimal(quality_view_amount(entry.rate, entry.weight)),
            Column::Commission => Cell::Decimal(entry.commission),
            Column::OtherAmount => Cell::Integer(i64::from(entry.other_amount)),
            Column::Total => Cell::Decimal(entry.total),
            Column::AllAmount => all_amounts
                .get(entry.id)
                .map(Cell::Decimal)
                .unwrap_or(Cell::Empty),
            Column::MarketFee => Cell::Integer(i64::from(entry.market_fee)),
        }
    }

    /// Column total over the rows, or `None` for columns that are not summed.
    fn total(&self, entries: &[LedgerEntry], all_amounts: &AllAmounts) -> Option<Cell> {
        let sum_dec = |f: fn(&LedgerEntry) -> Decimal| entries.iter().map(f).sum::<Decimal>();
        let sum_int = |f: fn(&LedgerEntry) -> i32| entries.iter().map(|e| i64::from(f(e))).sum::<i64>();

        match self {
            Column::Bags => Some(Cell::Integer(sum_int(|e| e.bags))),
            Column::Weight => Some(Cell::Decimal(sum_dec(|e| e.weight))),
            Column::Rate => Some(Cell::Decimal(sum_dec(|e| e.rate))),
            Column::Total => Some(Cell::Decimal(sum_dec(|e| e.total))),
            Column::MarketFee => Some(Cell::Integer(sum_int(|e| e.market_fee))),
            Column::AllAmount => Some(Cell::Decimal(all_amounts.grand_total())),
            Column::QualityAmount => Some(Cell::Decimal(
                entries
                    .iter()
                    .map(|e| quality_view_amount(e.rate, e.weight))
                    .sum(),
            )),
            _ => None,
        }
    }
}

/// Calendar date as `dd/mm/yyyy`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Entries,
    Datewise,
    Qualitywise,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Entries => "entries",
            ReportKind::Datewise => "datewise",
            ReportKind::Qualitywise => "qualitywise",
        }
    }

    /// Download file name without extension.
    pub fn file_stem(&self) -> &'static str {
        self.as_str()
    }

    pub fn sheet_name(&self) -> &'static str {
        match self {
            ReportKind::Entries => "Entries",
            ReportKind::Datewise => "Datewise",
            ReportKind::Qualitywise => "Qualitywise",
        }
    }

    fn sums(&self, column: Column) -> bool {
        match self {
            ReportKind::Entries | ReportKind::Datewise => matches!(
                column,
                Column::Bags
                    | Column::Weight
                    | Column::Total
                    | Column::MarketFee
                    | Column::AllAmount
            ),
            ReportKind::Qualitywise => matches!(
                column,
                Column::QualityAmount | Column::Weight | Column::Rate | Column::Bags
            ),
        }
    }
}

/// Column order plus widths in characters, measured from the header and data
/// rows. A second totals table is drawn on the same layout.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLayout {
    pub widths: Vec<usize>,
}

impl ColumnLayout {
    pub fn measure(headers: &[String], rows: &[Vec<Cell>]) -> Self {
        let widths = headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                rows.iter()
                    .filter_map(|row| row.get(i))
                    .map(Cell::width)
                    .chain(std::iter::once(header.chars().count()))
                    .max()
                    .unwrap_or(0)
                    .max(MIN_COLUMN_CHARS)
            })
            .collect();
        Self { widths }
    }

    /// Widths scaled proportionally to fill `available` units.
    pub fn scaled(&self, available: f32) -> Vec<f32> {
        let total: usize = self.widths.iter().sum();
        if total == 0 {
            return vec![0.0; self.widths.len()];
        }
        self.widths
            .iter()
            .map(|&w| available * w as f32 / total as f32)
            .collect()
    }
}

/// Renderer-neutral report: what a PDF or spreadsheet writer needs.
#[derive(Debug, Clone)]
pub struct ReportTable {
    pub kind: ReportKind,
    pub title: String,
    pub columns: Vec<Column>,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    pub totals: Vec<Vec<Cell>>,
    pub layout: ColumnLayout,
}

impl ReportTable {
    /// Rows appear in the order the entries were supplied.
    pub fn assemble(
        kind: ReportKind,
        title: impl Into<String>,
        columns: Vec<Column>,
        entries: &[LedgerEntry],
    ) -> Self {
        let all_amounts = AllAmounts::compute(entries);

        let headers: Vec<String> = columns.iter().map(|c| c.label().to_string()).collect();
        let rows: Vec<Vec<Cell>> = entries
            .iter()
            .map(|entry| columns.iter().map(|c| c.cell(entry, &all_amounts)).collect())
            .collect();
        let totals_row: Vec<Cell> = columns
            .iter()
            .map(|c| {
                if kind.sums(*c) {
                    c.total(entries, &all_amounts).unwrap_or(Cell::Empty)
                } else {
                    Cell::Empty
                }
            })
            .collect();
        let layout = ColumnLayout::measure(&headers, &rows);

        Self {
            kind,
            title: title.into(),
            columns,
            headers,
            rows,
            totals: vec![totals_row],
            layout,
        }
    }
}

/// Resolves a field selection. Unknown keys and repeats are dropped; if nothing
/// usable remains every selectable field is used.
pub fn resolve_selection(selected: &[String]) -> Vec<Column> {
    let mut columns: Vec<Column> = Vec::new();
    for column in selected.iter().filter_map(|key| Column::from_key(key)) {
        if !columns.contains(&column) {
            columns.push(column);
        }
    }
    if columns.is_empty() {
        Column::SELECTABLE.to_vec()
    } else {
        columns
    }
}

pub fn entries_report(entries: &[LedgerEntry], selected: &[String]) -> ReportTable {
    ReportTable::assemble(
        ReportKind::Entries,
        "Entries Report",
        resolve_selection(selected),
        entries,
    )
}

/// Entries of one day, expected newest first.
pub fn datewise_report(entries: &[LedgerEntry], date: NaiveDate) -> ReportTable {
    let columns = vec![
        Column::EntryDate,
        Column::Quality,
        Column::Item,
        Column::Name,
        Column::Bags,
        Column::BhartiPairs,
        Column::Weight,
        Column::Rate,
        Column::Amount,
        Column::Commission,
        Column::OtherAmount,
        Column::Total,
        Column::MarketFee,
    ];
    ReportTable::assemble(
        ReportKind::Datewise,
        format!("Datewise Report - {}", format_date(date)),
        columns,
        entries,
    )
}

/// Selected entries, expected by entry date descending.
pub fn qualitywise_report(entries: &[LedgerEntry]) -> ReportTable {
    let columns = vec![
        Column::QualityAmount,
        Column::Weight,
        Column::Rate,
        Column::Bags,
        Column::Item,
        Column::Name,
        Column::Quality,
        Column::EntryDate,
    ];
    ReportTable::assemble(
        ReportKind::Qualitywise,
        "Qualitywise Report",
        columns,
        entries,
    )
}
