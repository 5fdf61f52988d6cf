// src/records/store.rs
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::extraction::ExtractedRecord;

/// One hog price row in the working set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub id: u64,
    /// YYYY-MM-DD by convention; edits are stored verbatim.
    pub date: String,
    pub province: String,
    /// VND/kg.
    pub price: i64,
}

/// Editable columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordField {
    Date,
    Province,
    Price,
}

impl FromStr for RecordField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "date" => Ok(RecordField::Date),
            "province" => Ok(RecordField::Province),
            "price" => Ok(RecordField::Price),
            other => Err(format!(
                "Unknown field '{}'. Expected one of: date, province, price",
                other
            )),
        }
    }
}

/// In-memory, ordered working set of records for the current session.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: Vec<PriceRecord>,
    next_id: u64,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[PriceRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn get(&self, id: u64) -> Option<&PriceRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Replaces the whole store with a new batch, assigning fresh ids.
    ///
    /// Ids start at the current millisecond clock (or after the last issued id,
    /// whichever is larger) and increase by one per record.
    pub fn replace_all(&mut self, incoming: Vec<ExtractedRecord>) {
        let now_ms = chrono::Utc::now().timestamp_millis().max(0) as u64;
        let first = self.next_id.max(now_ms);

        self.records = incoming
            .into_iter()
            .zip(first..)
            .map(|(rec, id)| PriceRecord {
                id,
                date: rec.date,
                province: rec.province,
                price: rec.price,
            })
            .collect();
        self.next_id = first + self.records.len() as u64;

        tracing::info!("Record store replaced with {} records", self.records.len());
    }

    /// Applies one cell edit. Returns `false` when nothing changed.
    ///
    /// Prices are typed in thousands of VND/kg: non-digits are dropped and the number
    /// is multiplied by 1000. Input with no usable digits leaves the old value.
    pub fn edit_field(&mut self, id: u64, field: RecordField, raw_value: &str) -> bool {
        let Some(record) = self.records.iter_mut().find(|r| r.id == id) else {
            tracing::debug!("Edit ignored: no record with id {}", id);
            return false;
        };

        match field {
            RecordField::Date => record.date = raw_value.to_string(),
            RecordField::Province => record.province = raw_value.to_string(),
            RecordField::Price => match parse_display_price(raw_value) {
                Some(price) => record.price = price,
                None => {
                    tracing::debug!("Edit ignored: '{}' is not a price", raw_value);
                    return false;
                }
            },
        }
        true
    }
}

fn parse_display_price(raw: &str) -> Option<i64> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse::<i64>().ok()?.checked_mul(1000)
}
