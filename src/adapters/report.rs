//! Report Renderer
//!
//! Renders ranked valuation records as a bordered text table or as JSON.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::ValuationRecord;

const HEADERS: [&str; 14] = [
    "Token",
    "XENFT Type",
    "Maturity",
    "Term",
    "Term Left",
    "VMUs",
    "AMP",
    "cRank",
    "Xen",
    "Xen/USD",
    "Ratio",
    "Price",
    "Price/VMU",
    "URL",
];

/// Output format for the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Table,
    Json,
}

/// Builds detail-page links and renders records
#[derive(Debug, Clone)]
pub struct ReportRenderer {
    asset_base_url: String,
    collection: String,
}

#[derive(Serialize)]
struct JsonRow<'a> {
    #[serde(flatten)]
    record: &'a ValuationRecord,
    url: String,
}

impl ReportRenderer {
    pub fn new(asset_base_url: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            asset_base_url: asset_base_url.into(),
            collection: collection.into(),
        }
    }

    pub fn asset_url(&self, token_id: &str) -> String {
        crate::adapters::blur::asset_url(&self.asset_base_url, &self.collection, token_id)
    }

    pub fn render(&self, records: &[ValuationRecord], format: ReportFormat) -> Result<String, serde_json::Error> {
        match format {
            ReportFormat::Table => Ok(self.render_table(records)),
            ReportFormat::Json => self.render_json(records),
        }
    }

    /// One row per record, columns in fixed order
    pub fn row(&self, record: &ValuationRecord) -> Vec<String> {
        vec![
            record.token_id.clone(),
            record.xenft_class.clone(),
            record.formatted_maturity.clone(),
            record.term.to_string(),
            record.days_remaining.to_string(),
            record.vmus.to_string(),
            record.amp.to_string(),
            record.c_rank.to_string(),
            format!(
                "{} (${})",
                group_thousands(&record.yield_amount.to_string()),
                format_grouped(record.yield_usd, 2)
            ),
            group_thousands(&record.yield_per_usd.to_string()),
            format!("{:.2}", record.ratio),
            format!("{} ETH (${:.2})", format_price(record.price_base), record.price_usd),
            format!(
                "{:.6} ETH (${:.2})",
                record.price_per_unit_base, record.price_per_unit_usd
            ),
            self.asset_url(&record.token_id),
        ]
    }

    pub fn render_table(&self, records: &[ValuationRecord]) -> String {
        let rows: Vec<Vec<String>> = records.iter().map(|r| self.row(r)).collect();

        let mut widths: Vec<usize> = HEADERS.iter().map(|h| h.chars().count()).collect();
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let border = {
            let mut line = String::from("+");
            for width in &widths {
                line.push_str(&"-".repeat(width + 2));
                line.push('+');
            }
            line
        };

        let mut out = String::new();
        out.push_str(&border);
        out.push('\n');
        out.push_str(&format_line(HEADERS.iter().copied(), &widths));
        out.push('\n');
        out.push_str(&border);
        out.push('\n');
        for row in &rows {
            out.push_str(&format_line(row.iter().map(String::as_str), &widths));
            out.push('\n');
        }
        if !rows.is_empty() {
            out.push_str(&border);
            out.push('\n');
        }
        out
    }

    pub fn render_json(&self, records: &[ValuationRecord]) -> Result<String, serde_json::Error> {
        let rows: Vec<JsonRow<'_>> = records
            .iter()
            .map(|record| JsonRow {
                record,
                url: self.asset_url(&record.token_id),
            })
            .collect();
        serde_json::to_string_pretty(&rows)
    }
}

fn format_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let mut line = String::from("|");
    for (cell, width) in cells.zip(widths) {
        let pad = width - cell.chars().count();
        line.push(' ');
        line.push_str(cell);
        line.push_str(&" ".repeat(pad + 1));
        line.push('|');
    }
    line
}

/// `1234567` -> `1,234,567`; keeps a leading minus sign
pub fn group_thousands(digits: &str) -> String {
    let (sign, digits) = match digits.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", digits),
    };
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}{}", sign, grouped)
}

/// Listed price without trailing zeros, keeping one decimal place: `0.50000` -> `0.5`, `2` -> `2.0`
pub fn format_price(price: Decimal) -> String {
    let normalized = price.normalize();
    if normalized.scale() == 0 {
        format!("{}.0", normalized)
    } else {
        normalized.to_string()
    }
}

/// Fixed decimals with thousands separators in the integer part
pub fn format_grouped(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value);
    match formatted.split_once('.') {
        Some((int_part, frac)) => format!("{}.{}", group_thousands(int_part), frac),
        None => group_thousands(&formatted),
    }
}
