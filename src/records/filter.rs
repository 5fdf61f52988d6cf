// src/records/filter.rs
use crate::records::store::PriceRecord;

/// Price as shown to the user: thousands of VND/kg, rounded.
pub fn display_price(price: i64) -> i64 {
    (price as f64 / 1000.0).round() as i64
}

/// Case-insensitive substring filter over province, date and the displayed price.
///
/// A blank query returns every record in the original order.
pub fn filter_records<'a>(records: &'a [PriceRecord], query: &str) -> Vec<&'a PriceRecord> {
    if query.trim().is_empty() {
        return records.iter().collect();
    }

    let needle = query.to_lowercase();
    records
        .iter()
        .filter(|r| {
            r.province.to_lowercase().contains(&needle)
                || display_price(r.price).to_string().contains(&needle)
                || r.date.to_lowercase().contains(&needle)
        })
        .collect()
}
