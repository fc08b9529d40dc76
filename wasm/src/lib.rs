//! WebAssembly module for the Stock Ledger dashboard
//!
//! Runs the ledger rules in the browser so a movement can be previewed before
//! it is submitted:
//! - Transaction preview against the product's current summary
//! - Weighted average price
//! - Low-stock check
//! - Product code validation

use chrono::Utc;
use rust_decimal::Decimal;
use std::str::FromStr;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::validation::*;

use shared::ledger::{self, LedgerUpdate};

/// Preview the summary that recording `input_json` would produce
///
/// Takes the product's current summary and a transaction request, both as
/// JSON, and returns the resulting update as JSON. Nothing is persisted.
#[wasm_bindgen]
pub fn preview_transaction(summary_json: &str, input_json: &str) -> Result<String, JsValue> {
    preview(summary_json, input_json).map_err(|e| JsValue::from_str(&e))
}

/// Weighted average price after a stock-in; decimal values are passed as strings
#[wasm_bindgen]
pub fn weighted_average_price(
    average_price: &str,
    total_in: &str,
    quantity: &str,
    price_per_unit: &str,
) -> Result<String, JsValue> {
    average_after_receipt(average_price, total_in, quantity, price_per_unit)
        .map_err(|e| JsValue::from_str(&e))
}

/// Whether the ending stock is at or below the threshold
#[wasm_bindgen]
pub fn is_low_stock(ending_stock: f64, low_stock_threshold: f64) -> bool {
    match (
        Decimal::try_from(ending_stock),
        Decimal::try_from(low_stock_threshold),
    ) {
        (Ok(stock), Ok(threshold)) => ledger::is_low_stock(stock, threshold),
        _ => false,
    }
}

/// Validation message for a product code, or an empty string when valid
#[wasm_bindgen]
pub fn check_product_code(code: &str) -> String {
    match validate_product_code(code) {
        Ok(()) => String::new(),
        Err(msg) => msg.to_string(),
    }
}

fn preview(summary_json: &str, input_json: &str) -> Result<String, String> {
    let summary: InventorySummary =
        serde_json::from_str(summary_json).map_err(|e| format!("Invalid summary JSON: {}", e))?;
    let input: RecordTransactionInput =
        serde_json::from_str(input_json).map_err(|e| format!("Invalid transaction JSON: {}", e))?;

    let update: LedgerUpdate = ledger::validate_transaction(input, Utc::now())
        .and_then(|movement| ledger::apply_movement(&summary, &movement))
        .map_err(|e| e.to_string())?;

    serde_json::to_string(&update).map_err(|e| e.to_string())
}

fn average_after_receipt(
    average_price: &str,
    total_in: &str,
    quantity: &str,
    price_per_unit: &str,
) -> Result<String, String> {
    let parse = |name: &str, value: &str| {
        Decimal::from_str(value.trim()).map_err(|_| format!("{} is not a number", name))
    };
    let price = if price_per_unit.trim().is_empty() {
        None
    } else {
        Some(parse("price_per_unit", price_per_unit)?)
    };

    ledger::weighted_average_price(
        parse("average_price", average_price)?,
        parse("total_in", total_in)?,
        parse("quantity", quantity)?,
        price,
    )
    .map(|avg| avg.to_string())
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUMMARY: &str = r#"{
        "product_id": "6f1c2b9e-2f0a-4d3b-9a51-0c8f3f1f5a11",
        "opening_stock": "0",
        "total_in": "15",
        "total_out": "0",
        "ending_stock": "15",
        "average_price": "2.5",
        "low_stock_threshold": "5"
    }"#;

    #[test]
    fn test_preview_stock_out() {
        let json = preview(
            SUMMARY,
            r#"{
                "product_id": "6f1c2b9e-2f0a-4d3b-9a51-0c8f3f1f5a11",
                "transaction_type": "out",
                "quantity": "12"
            }"#,
        )
        .unwrap();
        let update: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(update["new_ending_stock"], "3");
        assert_eq!(update["is_low_stock"], true);
    }

    #[test]
    fn test_preview_rejects_oversell() {
        let err = preview(
            SUMMARY,
            r#"{
                "product_id": "6f1c2b9e-2f0a-4d3b-9a51-0c8f3f1f5a11",
                "transaction_type": "out",
                "quantity": "20"
            }"#,
        )
        .unwrap_err();
        assert!(err.contains("Insufficient stock"));
    }

    #[test]
    fn test_preview_rejects_summary_of_other_product() {
        let err = preview(
            SUMMARY,
            r#"{
                "product_id": "0b7f3c1a-9d2e-4f6b-8a1c-5e4d3c2b1a09",
                "transaction_type": "in",
                "quantity": "1"
            }"#,
        )
        .unwrap_err();
        assert!(err.starts_with("Invalid input"));
        assert!(!err.contains("missing"));
    }

    #[test]
    fn test_preview_rejects_bad_json() {
        let err = preview("{", "{}").unwrap_err();
        assert!(err.starts_with("Invalid summary JSON"));
    }

    #[test]
    fn test_average_after_receipt() {
        let avg = average_after_receipt("2.0", "10", "5", "4.0").unwrap();
        let avg = Decimal::from_str(&avg).unwrap();
        assert_eq!(avg.round_dp(3), Decimal::from_str("2.667").unwrap());

        // No price leaves the average unchanged
        assert_eq!(average_after_receipt("2.0", "10", "5", "").unwrap(), "2.0");
        assert!(average_after_receipt("abc", "10", "5", "1").is_err());
    }

    #[test]
    fn test_is_low_stock() {
        assert!(is_low_stock(5.0, 5.0));
        assert!(is_low_stock(0.0, 0.0));
        assert!(!is_low_stock(5.5, 5.0));
    }

    #[test]
    fn test_check_product_code() {
        assert_eq!(check_product_code("SKU-001"), "");
        assert!(!check_product_code("SKU 001").is_empty());
    }
}
