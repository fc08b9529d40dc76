//! Inventory ledger rules
//!
//! Validation of stock movements and recomputation of a product's
//! [`InventorySummary`]. Nothing here touches storage: the backend runs these
//! functions while holding the product's summary row lock, and the WASM crate
//! runs them to preview a movement on the dashboard.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{InventorySummary, RecordTransactionInput, StockTransaction, TransactionType};
use crate::validation::parse_timestamp;

/// Rejections raised by the ledger rules
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("Invalid input: {message}")]
    InvalidInput { field: &'static str, message: String },

    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: Uuid,
        requested: Decimal,
        available: Decimal,
    },
}

impl LedgerError {
    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        LedgerError::InvalidInput {
            field,
            message: message.into(),
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// A validated stock movement, ready to be appended to the log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockMovement {
    pub product_id: Uuid,
    pub transaction_type: TransactionType,
    pub quantity: Decimal,
    pub price_per_unit: Option<Decimal>,
    pub total_value: Option<Decimal>,
    pub department: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Outcome of applying a movement to a summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerUpdate {
    pub summary: InventorySummary,
    pub previous_ending_stock: Decimal,
    pub new_ending_stock: Decimal,
    pub previous_average_price: Decimal,
    pub average_price: Decimal,
    pub is_low_stock: bool,
}

/// Point-in-time low-stock comparison
pub fn is_low_stock(ending_stock: Decimal, low_stock_threshold: Decimal) -> bool {
    ending_stock <= low_stock_threshold
}

/// Validate a request and normalize it into a [`StockMovement`]
///
/// `now` stamps movements submitted without a timestamp.
pub fn validate_transaction(
    input: RecordTransactionInput,
    now: DateTime<Utc>,
) -> LedgerResult<StockMovement> {
    if input.quantity <= Decimal::ZERO {
        return Err(LedgerError::invalid(
            "quantity",
            "Quantity must be greater than 0",
        ));
    }

    let transaction_type: TransactionType = input
        .transaction_type
        .parse()
        .map_err(|e: crate::models::InvalidTransactionType| {
            LedgerError::invalid("transaction_type", e.to_string())
        })?;

    if matches!(input.price_per_unit, Some(p) if p < Decimal::ZERO) {
        return Err(LedgerError::invalid(
            "price_per_unit",
            "Price per unit cannot be negative",
        ));
    }
    if matches!(input.total_value, Some(v) if v < Decimal::ZERO) {
        return Err(LedgerError::invalid(
            "total_value",
            "Total value cannot be negative",
        ));
    }

    let timestamp = match input.timestamp.as_deref().map(str::trim) {
        None | Some("") => now,
        Some(raw) => parse_timestamp(raw).map_err(|msg| LedgerError::invalid("timestamp", msg))?,
    };

    let unit_price = input.price_per_unit.unwrap_or(Decimal::ZERO);
    let total_value = match input.total_value {
        Some(v) if !v.is_zero() => Some(v),
        _ if unit_price > Decimal::ZERO => Some(
            unit_price
                .checked_mul(input.quantity)
                .ok_or_else(|| LedgerError::invalid("total_value", "Total value is out of range"))?,
        ),
        other => other,
    };

    Ok(StockMovement {
        product_id: input.product_id,
        transaction_type,
        quantity: input.quantity,
        price_per_unit: input.price_per_unit,
        total_value,
        department: input.department,
        timestamp,
        notes: input.notes,
    })
}

/// Apply a validated movement to the product's current summary
///
/// Stock-out movements larger than the current ending stock are rejected;
/// the input summary is never modified.
pub fn apply_movement(
    summary: &InventorySummary,
    movement: &StockMovement,
) -> LedgerResult<LedgerUpdate> {
    if summary.product_id != movement.product_id {
        return Err(LedgerError::invalid(
            "product_id",
            format!(
                "Summary belongs to product {}, not {}",
                summary.product_id, movement.product_id
            ),
        ));
    }

    if movement.transaction_type == TransactionType::Out && movement.quantity > summary.ending_stock
    {
        return Err(LedgerError::InsufficientStock {
            product_id: movement.product_id,
            requested: movement.quantity,
            available: summary.ending_stock,
        });
    }

    let next = recompute(
        summary,
        movement.transaction_type,
        movement.quantity,
        movement.price_per_unit,
    )?;

    Ok(LedgerUpdate {
        previous_ending_stock: summary.ending_stock,
        new_ending_stock: next.ending_stock,
        previous_average_price: summary.average_price,
        average_price: next.average_price,
        is_low_stock: next.is_low_stock(),
        summary: next,
    })
}

/// Fold a product's log onto its zero state
///
/// Used for reconciliation: entries are replayed in the given order with the
/// same recompute rules, without re-checking stock sufficiency.
pub fn replay<'a, I>(base: &InventorySummary, log: I) -> LedgerResult<InventorySummary>
where
    I: IntoIterator<Item = &'a StockTransaction>,
{
    let mut state = InventorySummary {
        opening_stock: base.opening_stock,
        ending_stock: base.opening_stock,
        ..InventorySummary::new(base.product_id, base.low_stock_threshold)
    };
    for entry in log {
        if entry.product_id != base.product_id {
            continue;
        }
        state = recompute(
            &state,
            entry.transaction_type,
            entry.quantity,
            entry.price_per_unit,
        )?;
    }
    Ok(state)
}

/// Weighted average after receiving `quantity` at `price_per_unit`
///
/// Returns `average_price` unchanged when the price is absent or zero.
pub fn weighted_average_price(
    average_price: Decimal,
    total_in: Decimal,
    quantity: Decimal,
    price_per_unit: Option<Decimal>,
) -> LedgerResult<Decimal> {
    let price = match price_per_unit {
        Some(p) if p > Decimal::ZERO => p,
        _ => return Ok(average_price),
    };
    let new_total_in = total_in
        .checked_add(quantity)
        .ok_or_else(|| LedgerError::invalid("quantity", "Quantity is out of range"))?;
    if new_total_in.is_zero() {
        return Ok(average_price);
    }
    let value = average_price
        .checked_mul(total_in)
        .and_then(|held| price.checked_mul(quantity).and_then(|v| held.checked_add(v)))
        .ok_or_else(|| LedgerError::invalid("price_per_unit", "Stock value is out of range"))?;
    value
        .checked_div(new_total_in)
        .ok_or_else(|| LedgerError::invalid("price_per_unit", "Stock value is out of range"))
}

fn recompute(
    summary: &InventorySummary,
    transaction_type: TransactionType,
    quantity: Decimal,
    price_per_unit: Option<Decimal>,
) -> LedgerResult<InventorySummary> {
    let overflow = || LedgerError::invalid("quantity", "Quantity is out of range");
    let mut next = summary.clone();
    match transaction_type {
        TransactionType::In => {
            next.average_price = weighted_average_price(
                summary.average_price,
                summary.total_in,
                quantity,
                price_per_unit,
            )?;
            next.total_in = summary.total_in.checked_add(quantity).ok_or_else(overflow)?;
            next.ending_stock = summary.ending_stock.checked_add(quantity).ok_or_else(overflow)?;
        }
        TransactionType::Out => {
            next.total_out = summary.total_out.checked_add(quantity).ok_or_else(overflow)?;
            next.ending_stock = summary.ending_stock.checked_sub(quantity).ok_or_else(overflow)?;
        }
    }
    Ok(next)
}
