//! Inventory models: the stock transaction log and per-product summaries

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Low-stock threshold given to new products when none is supplied
pub const DEFAULT_LOW_STOCK_THRESHOLD: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

/// Direction of a stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Stock received
    In,
    /// Stock issued
    Out,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::In => "in",
            TransactionType::Out => "out",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a transaction type is neither `in` nor `out`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("transaction_type must be 'in' or 'out', got '{0}'")]
pub struct InvalidTransactionType(pub String);

impl FromStr for TransactionType {
    type Err = InvalidTransactionType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(TransactionType::In),
            "out" => Ok(TransactionType::Out),
            other => Err(InvalidTransactionType(other.to_string())),
        }
    }
}

/// A persisted, immutable entry of the stock transaction log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockTransaction {
    /// Log sequence number assigned on insert
    pub id: i64,
    pub product_id: Uuid,
    pub transaction_type: TransactionType,
    pub quantity: Decimal,
    pub price_per_unit: Option<Decimal>,
    pub total_value: Option<Decimal>,
    pub department: Option<String>,
    pub transaction_timestamp: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Request body for recording a stock movement
///
/// `transaction_type` and `timestamp` are kept as raw strings so that bad
/// values surface as ledger validation errors rather than decode failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordTransactionInput {
    pub product_id: Uuid,
    pub transaction_type: String,
    pub quantity: Decimal,
    pub price_per_unit: Option<Decimal>,
    pub total_value: Option<Decimal>,
    pub department: Option<String>,
    #[serde(alias = "transaction_timestamp")]
    pub timestamp: Option<String>,
    pub notes: Option<String>,
}

/// Running aggregate of a product's stock movements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySummary {
    pub product_id: Uuid,
    pub opening_stock: Decimal,
    pub total_in: Decimal,
    pub total_out: Decimal,
    pub ending_stock: Decimal,
    /// Quantity-weighted average cost of priced stock-in events
    pub average_price: Decimal,
    pub low_stock_threshold: Decimal,
}

impl InventorySummary {
    /// Zero-state summary for a newly created product
    pub fn new(product_id: Uuid, low_stock_threshold: Decimal) -> Self {
        Self {
            product_id,
            opening_stock: Decimal::ZERO,
            total_in: Decimal::ZERO,
            total_out: Decimal::ZERO,
            ending_stock: Decimal::ZERO,
            average_price: Decimal::ZERO,
            low_stock_threshold,
        }
    }

    /// Whether `ending_stock == opening_stock + total_in - total_out`
    ///
    /// A summary whose totals overflow is never balanced.
    pub fn is_balanced(&self) -> bool {
        self.opening_stock
            .checked_add(self.total_in)
            .and_then(|held| held.checked_sub(self.total_out))
            .map_or(false, |expected| expected == self.ending_stock)
    }

    pub fn is_low_stock(&self) -> bool {
        crate::ledger::is_low_stock(self.ending_stock, self.low_stock_threshold)
    }
}

/// Summary row joined with its product, as listed on the dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryOverview {
    pub product_id: Uuid,
    pub code: String,
    pub name: String,
    pub unit: String,
    pub category: Option<String>,
    pub opening_stock: Decimal,
    pub total_in: Decimal,
    pub total_out: Decimal,
    pub ending_stock: Decimal,
    pub average_price: Decimal,
    pub low_stock_threshold: Decimal,
    pub is_low_stock: bool,
}

/// Stock received and issued per product within one calendar month
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyInventoryRow {
    pub product_id: Uuid,
    pub code: String,
    pub name: String,
    pub unit: String,
    pub category: Option<String>,
    pub stock_in: Decimal,
    pub stock_out: Decimal,
    pub net_change: Decimal,
}

/// A product whose ending stock has reached its threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LowStockAlert {
    pub product_id: Uuid,
    pub code: String,
    pub name: String,
    pub ending_stock: Decimal,
    pub low_stock_threshold: Decimal,
}

/// Transaction listed for a single day, joined with its product name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyTransaction {
    pub id: i64,
    pub product_id: Uuid,
    pub product: String,
    pub transaction_type: TransactionType,
    pub quantity: Decimal,
    pub transaction_timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_type_parsing_is_exact() {
        assert_eq!("in".parse::<TransactionType>(), Ok(TransactionType::In));
        assert_eq!("out".parse::<TransactionType>(), Ok(TransactionType::Out));
        assert!("IN".parse::<TransactionType>().is_err());
        assert!(" out".parse::<TransactionType>().is_err());
        assert!("transfer".parse::<TransactionType>().is_err());
    }

    #[test]
    fn test_transaction_type_serializes_lowercase() {
        let json = serde_json::to_string(&TransactionType::Out).unwrap();
        assert_eq!(json, "\"out\"");
    }

    #[test]
    fn test_new_summary_is_zero_and_balanced() {
        let summary = InventorySummary::new(Uuid::new_v4(), DEFAULT_LOW_STOCK_THRESHOLD);
        assert!(summary.is_balanced());
        assert_eq!(summary.ending_stock, Decimal::ZERO);
        assert_eq!(summary.average_price, Decimal::ZERO);
        assert_eq!(summary.low_stock_threshold, Decimal::from(5));
        // Zero stock is at or below any non-negative threshold
        assert!(summary.is_low_stock());
    }

    #[test]
    fn test_overflowing_summary_is_not_balanced() {
        let mut summary = InventorySummary::new(Uuid::new_v4(), DEFAULT_LOW_STOCK_THRESHOLD);
        summary.opening_stock = Decimal::MAX;
        summary.total_in = Decimal::ONE;
        summary.ending_stock = Decimal::MAX;
        assert!(!summary.is_balanced());
    }

    #[test]
    fn test_record_input_accepts_transaction_timestamp_alias() {
        let input: RecordTransactionInput = serde_json::from_str(
            r#"{
                "product_id": "6f1c2b9e-2f0a-4d3b-9a51-0c8f3f1f5a11",
                "transaction_type": "in",
                "quantity": 3,
                "transaction_timestamp": "2024-05-01T08:00:00Z"
            }"#,
        )
        .unwrap();
        assert_eq!(input.timestamp.as_deref(), Some("2024-05-01T08:00:00Z"));
        assert_eq!(input.quantity, Decimal::from(3));
    }
}
