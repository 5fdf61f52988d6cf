// src/storage/csv.rs
use crate::records::{display_price, PriceRecord};

pub const CSV_HEADER: &str = "date,province,price (K VND/kg)";
const UTF8_BOM: char = '\u{FEFF}';

/// Serializes records to CSV text, or `None` when there is nothing to export.
///
/// Fields containing a comma are wrapped in double quotes; embedded quotes are
/// left as they are.
pub fn to_csv(records: &[&PriceRecord]) -> Option<String> {
    if records.is_empty() {
        tracing::warn!("No data to export.");
        return None;
    }

    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(CSV_HEADER.to_string());
    for record in records {
        lines.push(format!(
            "{},{},{}",
            quote_if_needed(&record.date),
            quote_if_needed(&record.province),
            display_price(record.price)
        ));
    }

    let mut out = String::new();
    out.push(UTF8_BOM);
    out.push_str(&lines.join("\n"));
    Some(out)
}

/// File name for an export made on `date` (YYYY-MM-DD).
pub fn csv_file_name(date: &str) -> String {
    format!("hog_prices_{}.csv", date)
}

fn quote_if_needed(value: &str) -> String {
    if value.contains(',') {
        format!("\"{}\"", value)
    } else {
        value.to_string()
    }
}
