// src/records/table.rs
use crate::records::filter::display_price;
use crate::records::store::PriceRecord;

const HEADERS: [&str; 4] = ["ID", "Date", "Province", "Price (K VND/kg)"];

/// Renders records as an aligned text table for the terminal.
pub fn render_table(records: &[&PriceRecord]) -> String {
    if records.is_empty() {
        return "No data matches your filter.".to_string();
    }

    let rows: Vec<[String; 4]> = records
        .iter()
        .map(|r| {
            [
                r.id.to_string(),
                r.date.clone(),
                r.province.clone(),
                display_price(r.price).to_string(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &HEADERS.map(str::to_string), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("-+-"));
    out.push('\n');
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    out.pop();
    out
}

fn push_row(out: &mut String, cells: &[String; 4], widths: &[usize; 4]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths.iter())
        .enumerate()
        .map(|(col, (cell, width))| {
            let pad = " ".repeat(width - cell.chars().count());
            // Numeric columns right-aligned
            if col == 0 || col == 3 {
                format!("{pad}{cell}")
            } else {
                format!("{cell}{pad}")
            }
        })
        .collect();
    out.push_str(padded.join(" | ").trim_end());
    out.push('\n');
}
