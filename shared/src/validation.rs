//! Validation and parsing utilities for ledger requests

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;

use crate::types::DateRange;

/// Validate product code format (printable, no whitespace)
pub fn validate_product_code(code: &str) -> Result<(), &'static str> {
    if code.trim().is_empty() {
        return Err("Product code is required");
    }
    if code.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err("Product code must not contain whitespace");
    }
    Ok(())
}

/// Validate a low-stock threshold
pub fn validate_low_stock_threshold(threshold: Decimal) -> Result<(), &'static str> {
    if threshold < Decimal::ZERO {
        return Err("Low stock threshold cannot be negative");
    }
    Ok(())
}

/// Parse a `YYYY-MM-DD` day
pub fn parse_day(date: &str) -> Result<DateRange, &'static str> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(DateRange::day)
        .map_err(|_| "Invalid date format. Use YYYY-MM-DD")
}

/// Parse a `YYYY-MM` month into its full date range
pub fn parse_month(month: &str) -> Result<DateRange, &'static str> {
    let first_day = NaiveDate::parse_from_str(&format!("{}-01", month), "%Y-%m-%d")
        .map_err(|_| "Invalid month format. Expected format: YYYY-MM")?;
    DateRange::month(first_day).ok_or("Month is out of range")
}

/// Parse a transaction timestamp
///
/// Accepts RFC 3339 (`2024-05-01T08:00:00+07:00`) or a naive
/// `YYYY-MM-DD HH:MM:SS`, which is taken as UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, &'static str> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|_| "Invalid timestamp. Use RFC 3339 or YYYY-MM-DD HH:MM:SS")
}
