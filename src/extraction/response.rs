// src/extraction/response.rs
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::extraction::price::parse_vnd_price;
use crate::extraction::schema::{RECORDS_FIELD, SUMMARY_FIELD};
use crate::utils::error::ExtractError;

/// One record as returned by the model, before it gets a local id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    pub date: String,
    pub province: String,
    /// VND/kg, whole number.
    #[serde(deserialize_with = "deserialize_price")]
    pub price: i64,
}

/// Parsed model output; consumed once to fill the record store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionResult {
    pub summary: Option<String>,
    pub records: Vec<ExtractedRecord>,
}

impl ExtractionResult {
    pub fn has_records(&self) -> bool {
        !self.records.is_empty()
    }
}

/// Validates a raw model response as a whole.
///
/// Accepted when the JSON object carries `extractedData` (an empty array counts) or a
/// non-empty `priceMovementSummary`. Any malformed record rejects the whole response.
pub fn parse_extraction_response(raw: &str) -> Result<ExtractionResult, ExtractError> {
    let value: Value = serde_json::from_str(raw.trim())
        .map_err(|e| ExtractError::Malformed(e.to_string()))?;

    let object = value
        .as_object()
        .ok_or_else(|| ExtractError::Rejected("top-level value is not an object".to_string()))?;

    let records_value = object.get(RECORDS_FIELD).filter(|v| !v.is_null());
    let summary = object
        .get(SUMMARY_FIELD)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    if records_value.is_none() && summary.is_none() {
        return Err(ExtractError::Rejected(format!(
            "neither '{}' nor '{}' present",
            RECORDS_FIELD, SUMMARY_FIELD
        )));
    }

    let records = match records_value {
        Some(v) => Vec::<ExtractedRecord>::deserialize(v)
            .map_err(|e| ExtractError::Rejected(format!("invalid '{}': {}", RECORDS_FIELD, e)))?,
        None => Vec::new(),
    };

    tracing::debug!(
        "Parsed extraction response: {} records, summary present: {}",
        records.len(),
        summary.is_some()
    );

    Ok(ExtractionResult { summary, records })
}

// Numbers are rounded to whole VND; strings are read in Vietnamese notation.
fn deserialize_price<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64))
            .ok_or_else(|| D::Error::custom(format!("price out of range: {}", n))),
        Value::String(s) => parse_vnd_price(&s)
            .ok_or_else(|| D::Error::custom(format!("unreadable price: {:?}", s))),
        other => Err(D::Error::custom(format!("price must be a number, got {}", other))),
    }
}
