// src/present.rs
//
// Plain-text rendering for the terminal.

use crate::process::{sort_by_income_desc, Table, COUNTY_COLUMN, INCOME_COLUMN};
use prettytable::{format, Cell, Row, Table as TextTable};
use std::fmt::Write;

pub const DEFAULT_BAR_WIDTH: usize = 40;
const MISSING: &str = "n/a";

/// `65000.0` → `"65,000"`; fractions are rounded to whole dollars.
pub fn format_income(income: Option<f64>) -> String {
    let Some(v) = income else {
        return MISSING.to_string();
    };
    let whole = v.round() as i64;
    let digits = whole.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if whole < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// County and income columns in table order, incomes right-aligned.
pub fn income_table(table: &Table) -> TextTable {
    let mut out = TextTable::new();
    out.set_format(*format::consts::FORMAT_BOX_CHARS);
    out.set_titles(Row::new(vec![
        Cell::new(COUNTY_COLUMN).style_spec("bFg"),
        Cell::new(INCOME_COLUMN).style_spec("bFg"),
    ]));
    for row in table.rows() {
        out.add_row(Row::new(vec![
            Cell::new(&row.county),
            Cell::new(&format_income(row.median_household_income)).style_spec("r"),
        ]));
    }
    out
}

/// [`income_table`] as plain text, without terminal colours.
pub fn render_table(table: &Table) -> String {
    income_table(table).to_string()
}

/// Horizontal bars keyed by county, highest income first. Bars are scaled to
/// the largest income; counties without a value are listed with no bar.
pub fn render_bar_chart(table: &Table, width: usize) -> String {
    let mut sorted = table.clone();
    sort_by_income_desc(&mut sorted);

    let max = sorted
        .rows()
        .iter()
        .filter_map(|r| r.median_household_income)
        .fold(0.0_f64, f64::max);
    let name_w = sorted
        .rows()
        .iter()
        .map(|r| r.county.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for row in sorted.rows() {
        let len = match row.median_household_income {
            Some(v) if max > 0.0 && v > 0.0 => ((v / max) * width as f64).round() as usize,
            _ => 0,
        };
        let _ = writeln!(
            out,
            "{:<name_w$} | {} {}",
            row.county,
            "#".repeat(len),
            format_income(row.median_household_income)
        );
    }
    out
}
