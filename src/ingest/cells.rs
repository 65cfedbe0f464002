//! Lenient coercion of spreadsheet cells.
//!
//! Platform reports are hand-edited, so a bad cell never fails the upload:
//! text cells fall back to null, numeric cells to zero.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::Value;

fn is_missing_marker(s: &str) -> bool {
    s.is_empty() || s.eq_ignore_ascii_case("nan")
}

/// Trimmed text; empty and missing cells become `None`.
#[must_use]
pub fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!is_missing_marker(trimmed)).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim();
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

// Numbers go through their JSON text so 12.4 stays exactly 12.4.
fn number(value: Option<&Value>) -> Option<Decimal> {
    match value? {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s),
        _ => None,
    }
}

/// Decimal cell, zero when missing or unparsable.
#[must_use]
pub fn decimal(value: Option<&Value>) -> Decimal {
    number(value).unwrap_or(Decimal::ZERO)
}

/// Integer cell, truncating decimals (`"3.0"` is 3); `0` when unparsable.
#[must_use]
pub fn integer(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) if n.is_i64() => n.as_i64().unwrap_or(0),
        other => number(other)
            .and_then(|n| n.trunc().to_i64())
            .unwrap_or(0),
    }
}
