//! Parsing and formatting of individual cell values.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

use crate::input::DataTable;

/// Offset-carrying timestamp formats seen across collection batches.
const OFFSET_FORMATS: &[&str] = &[
    "%a %b %d %H:%M:%S %z %Y",
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
];

/// Formats without an offset, read as UTC.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a raw timestamp into a UTC instant.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("empty timestamp".to_string());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(trimmed, format) {
            return Ok(dt.with_timezone(&Utc));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc());
        }
    }

    Err(format!("unrecognised timestamp '{}'", trimmed))
}

/// Checkpoint representation of a timestamp (RFC 3339, UTC).
pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parse a non-negative count; null markers become `None`.
pub fn parse_count(value: &str) -> Result<Option<u64>, String> {
    if DataTable::is_null_value(value) {
        return Ok(None);
    }
    let trimmed = value.trim();
    if let Ok(n) = trimmed.parse::<u64>() {
        return Ok(Some(n));
    }
    // Some exports write counts as floats ("12.0")
    match trimmed.parse::<f64>() {
        Ok(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(Some(f as u64)),
        Ok(_) => Err(format!("'{}' is not a non-negative integer", trimmed)),
        Err(_) => Err(format!("'{}' is not a number", trimmed)),
    }
}

/// Parse a nullable boolean.
pub fn parse_bool(value: &str) -> Result<Option<bool>, String> {
    if DataTable::is_null_value(value) {
        return Ok(None);
    }
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Ok(Some(true)),
        "false" | "f" | "no" | "n" | "0" => Ok(Some(false)),
        other => Err(format!("'{}' is not a boolean", other)),
    }
}

/// Checkpoint representation of a boolean.
pub fn format_bool(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}
