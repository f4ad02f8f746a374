pub mod product;
pub mod sale;
pub mod user;

pub use product::Product;
pub use sale::SaleLine;
pub use user::User;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;

// Cell parsing shared by the row types. People edit these tabs by hand, so the
// parsers accept the spellings a spreadsheet produces.

pub(crate) fn cell(cells: &[String], index: usize) -> &str {
    cells.get(index).map(|c| c.trim()).unwrap_or("")
}

pub(crate) fn required<'a>(cells: &'a [String], index: usize, name: &str) -> Result<&'a str, String> {
    let value = cell(cells, index);
    if value.is_empty() {
        return Err(format!("missing {}", name));
    }
    Ok(value)
}

pub(crate) fn parse_bool(value: &str, default: bool) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" => Ok(default),
        "true" | "yes" | "y" | "1" => Ok(true),
        "false" | "no" | "n" | "0" => Ok(false),
        other => Err(format!("invalid boolean '{}'", other)),
    }
}

pub(crate) fn parse_decimal(value: &str, name: &str) -> Result<Decimal, String> {
    let cleaned = value.trim().trim_start_matches('$').replace(',', "");
    Decimal::from_str(&cleaned).map_err(|_| format!("invalid {} '{}'", name, value))
}

pub(crate) fn parse_u32(value: &str, name: &str) -> Result<u32, String> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid {} '{}'", name, value))
}

/// RFC 3339 as written by this service, or the `YYYY-MM-DD HH:MM:SS` /
/// `YYYY-MM-DD` forms a spreadsheet shows after hand edits (read as UTC).
pub(crate) fn parse_timestamp(value: &str, name: &str) -> Result<DateTime<Utc>, String> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }
    Err(format!("invalid {} '{}'", name, value))
}

pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}
