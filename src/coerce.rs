//! Typed coercion for untrusted LLM JSON.
//!
//! Every leaf the model returns is treated as untrusted: numbers show up where
//! strings were asked for, enums come back misspelled, monetary amounts arrive
//! as prose. Each semantic field type gets one coercion function with a safe
//! default, so topic validators never fail on malformed optional data.

use chrono::NaiveDate;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Generic unset marker used by free-text fields before any section-specific
/// canonical phrase is applied.
pub const TEXT_DEFAULT: &str = "Not specified";

/// Default for excerpt fields whose source quote could not be produced.
pub const NO_EXCERPT: &str = "No excerpt available.";

/// Per-item excerpt default used inside noteworthy-item lists.
pub const NO_DIRECT_EXCERPT: &str = "No direct excerpt found.";

/// Canonical "nothing here" strings. Values equal to any of these are never
/// treated as real content: the collector skips them and list post-processing
/// collapses entries holding them.
const PLACEHOLDERS: &[&str] = &[
    "No excerpt available.",
    "No direct excerpt found.",
    "None reported.",
    "None reported",
    "None",
    "N/A",
    "n/a",
    "Not applicable",
    "Not applicable.",
    "Not specified",
    "Not discussed",
    "Not discussed.",
];

pub fn is_placeholder(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || PLACEHOLDERS.iter().any(|p| trimmed.eq_ignore_ascii_case(p))
}

/// Looks up `key` on an object value. Returns `None` for non-objects, absent
/// keys, and explicit nulls alike.
pub fn field<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value.get(key) {
        Some(Value::Null) | None => None,
        Some(v) => Some(v),
    }
}

/// Free-text coercion: strings pass through trimmed, numbers and booleans are
/// stringified, everything else (and empty strings) falls back to `default`.
pub fn coerce_text(value: Option<&Value>, default: &str) -> String {
    let text = match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    };
    if text.is_empty() {
        default.to_string()
    } else {
        text
    }
}

/// Excerpt coercion: like [`coerce_text`] but placeholders also collapse to
/// the default, so a model echoing "N/A" into an excerpt slot reads the same
/// as omitting it.
pub fn coerce_excerpt(value: Option<&Value>, default: &str) -> String {
    let text = coerce_text(value, default);
    if is_placeholder(&text) {
        default.to_string()
    } else {
        text
    }
}

/// Monetary coercion: accepts `$7.8 billion`, `USD 1,200,000`, `(3.2) million`
/// and the like. Anything that fails the format check (e.g. "seven million
/// dollars") substitutes `"N/A"` rather than failing the record.
pub fn coerce_monetary(value: Option<&Value>) -> String {
    let text = match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => return format!("${}", n),
        _ => return "N/A".to_string(),
    };
    let re = Regex::new(
        r"(?i)^\(?(?:[$€£¥]|USD|EUR|GBP)?\s*\(?-?[\d,]+(?:\.\d+)?\)?\s*(?:thousand|million|billion|trillion)?\)?$",
    )
    .unwrap();
    if re.is_match(&text) {
        text
    } else {
        "N/A".to_string()
    }
}

/// Percentage coercion: bare numbers gain a `%` suffix; `12%`, `-3.5%`,
/// `4 percent`, `(2.1)%` pass through; anything else becomes `"N/A"`.
pub fn coerce_percentage(value: Option<&Value>) -> String {
    let text = match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => return format!("{}%", n),
        _ => return "N/A".to_string(),
    };
    let re = Regex::new(r"(?i)^\(?-?\d+(?:\.\d+)?\)?\s*(?:%|percent|percentage points?|bps)$")
        .unwrap();
    if re.is_match(&text) {
        text
    } else {
        "N/A".to_string()
    }
}

/// Enum coercion: any unrecognized or missing value falls back to the safe
/// default member. Serde does the spelling check against the wire names.
pub fn coerce_enum<T: DeserializeOwned>(value: Option<&Value>, default: T) -> T {
    value
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or(default)
}

/// Date coercion: `YYYY-MM-DD` and `Month DD, YYYY` both re-emit as ISO;
/// anything else (including partial dates) becomes `"N/A"`.
pub fn coerce_date(value: Option<&Value>) -> String {
    let Some(Value::String(s)) = value else {
        return "N/A".to_string();
    };
    let trimmed = s.trim();
    let parsed = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%B %d, %Y"))
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%b %d, %Y"));
    match parsed {
        Ok(date) => date.format("%Y-%m-%d").to_string(),
        Err(_) => "N/A".to_string(),
    }
}

pub fn coerce_number(value: Option<&Value>, default: f64) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(default),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
        _ => default,
    }
}

/// Array accessor filtered down to object entries. Scalar noise inside a list
/// (e.g. a bare "None reported" string) is dropped here; whether the emptied
/// list collapses to a canonical record is the topic validator's call.
pub fn object_entries<'a>(value: &'a Value, key: &str) -> Vec<&'a Value> {
    match field(value, key) {
        Some(Value::Array(items)) => items.iter().filter(|v| v.is_object()).collect(),
        _ => Vec::new(),
    }
}
