// src/extraction/price.rs
//! Vietnamese price notation: `.` groups thousands ("68.000" is 68000), and market
//! reports usually quote a range ("68.000 - 69.000 đồng/kg").

use once_cell::sync::Lazy;
use regex::Regex;

// A dotted group ("68.000", "1.250.000") or a bare run of digits
const AMOUNT: &str = r"\d{1,3}(?:\.\d{3})+|\d+";

static AMOUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^\s*(?:{AMOUNT})\s*$")).expect("Failed to compile AMOUNT_RE")
});

// One amount or a dash-separated range, optionally followed by the unit
static PRICE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^\s*({AMOUNT})(?:\s*[-–—]\s*({AMOUNT}))?\s*(?:(?:đồng|đ|vnđ|vnd)(?:\s*/\s*kg)?)?\s*$"
    ))
    .expect("Failed to compile PRICE_RE")
});

/// Parses one amount written with `.` as the thousands separator.
pub fn parse_vnd_amount(text: &str) -> Option<i64> {
    if !AMOUNT_RE.is_match(text) {
        return None;
    }
    text.trim().replace('.', "").parse().ok()
}

/// Parses a quoted price: a single amount, or a range whose mean is rounded to whole VND.
///
/// Anything else (stray separators, lists, decimals) is `None`.
pub fn parse_vnd_price(text: &str) -> Option<i64> {
    let caps = PRICE_RE.captures(text)?;
    let low = parse_vnd_amount(caps.get(1)?.as_str())?;
    match caps.get(2) {
        Some(high) => Some(range_mean(low, parse_vnd_amount(high.as_str())?)),
        None => Some(low),
    }
}

/// Mean of two bounds, rounded half up.
pub fn range_mean(low: i64, high: i64) -> i64 {
    ((low as f64 + high as f64) / 2.0).round() as i64
}
