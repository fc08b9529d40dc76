//! Inventory ledger service
//!
//! The only writer of `inventory_summary`. Each recorded movement runs as one
//! database transaction that locks the product's summary row, appends the
//! movement to `stock_transactions` and persists the recomputed summary.
//! Locking the summary row serializes movements on the same product while
//! movements on different products proceed in parallel.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{
    apply_movement, replay, validate_low_stock_threshold, validate_transaction, InventorySummary,
    RecordTransactionInput, StockTransaction,
};
use sqlx::{Executor, FromRow, PgConnection, PgPool, Postgres};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Ledger service owning the stock-movement write path
#[derive(Clone)]
pub struct LedgerService {
    db: PgPool,
}

/// Row of `inventory_summary`
#[derive(Debug, FromRow)]
pub(crate) struct SummaryRow {
    product_id: Uuid,
    opening_stock: Decimal,
    total_in: Decimal,
    total_out: Decimal,
    ending_stock: Decimal,
    average_price: Decimal,
    low_stock_threshold: Decimal,
}

impl From<SummaryRow> for InventorySummary {
    fn from(row: SummaryRow) -> Self {
        InventorySummary {
            product_id: row.product_id,
            opening_stock: row.opening_stock,
            total_in: row.total_in,
            total_out: row.total_out,
            ending_stock: row.ending_stock,
            average_price: row.average_price,
            low_stock_threshold: row.low_stock_threshold,
        }
    }
}

/// Row of `stock_transactions`
#[derive(Debug, FromRow)]
pub(crate) struct TransactionRow {
    id: i64,
    product_id: Uuid,
    transaction_type: String,
    quantity: Decimal,
    price_per_unit: Option<Decimal>,
    total_value: Option<Decimal>,
    department: Option<String>,
    transaction_timestamp: DateTime<Utc>,
    notes: Option<String>,
}

impl TryFrom<TransactionRow> for StockTransaction {
    type Error = AppError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let transaction_type = row.transaction_type.parse().map_err(|e| {
            AppError::Internal(format!("stock transaction {} is corrupt: {}", row.id, e))
        })?;
        Ok(StockTransaction {
            id: row.id,
            product_id: row.product_id,
            transaction_type,
            quantity: row.quantity,
            price_per_unit: row.price_per_unit,
            total_value: row.total_value,
            department: row.department,
            transaction_timestamp: row.transaction_timestamp,
            notes: row.notes,
        })
    }
}

pub(crate) const SUMMARY_COLUMNS: &str = "product_id, opening_stock, total_in, total_out, \
     ending_stock, average_price, low_stock_threshold";

pub(crate) const TRANSACTION_COLUMNS: &str = "id, product_id, transaction_type, quantity, \
     price_per_unit, total_value, department, transaction_timestamp, notes";

/// Result of recording a stock movement
#[derive(Debug, Clone, Serialize)]
pub struct RecordTransactionResult {
    pub message: String,
    pub transaction: StockTransaction,
    pub previous_ending_stock: Decimal,
    pub new_ending_stock: Decimal,
    pub previous_average_price: Decimal,
    pub average_price: Decimal,
    pub is_low_stock: bool,
}

/// Stored summary compared against a replay of the product's log
#[derive(Debug, Clone, Serialize)]
pub struct Reconciliation {
    pub product_id: Uuid,
    pub transaction_count: usize,
    pub stored: InventorySummary,
    pub replayed: InventorySummary,
    /// Stored ending stock equals opening + total in - total out
    pub balanced: bool,
    /// Stored totals, ending stock and average price equal the replay
    pub matches_log: bool,
}

impl LedgerService {
    /// Create a new LedgerService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a stock movement and update the product's summary
    pub async fn record_transaction(
        &self,
        input: RecordTransactionInput,
    ) -> AppResult<RecordTransactionResult> {
        let movement = validate_transaction(input, Utc::now())?;

        // Dropping `tx` on any early return rolls the whole unit back
        let mut tx = self.db.begin().await?;

        let summary = lock_summary(&mut tx, movement.product_id).await?;
        let update = apply_movement(&summary, &movement).map_err(|e| {
            tracing::warn!(product_id = %movement.product_id, "Stock movement rejected: {}", e);
            e
        })?;

        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            r#"
            INSERT INTO stock_transactions (
                product_id, transaction_type, quantity, price_per_unit, total_value,
                department, transaction_timestamp, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            TRANSACTION_COLUMNS
        ))
        .bind(movement.product_id)
        .bind(movement.transaction_type.as_str())
        .bind(movement.quantity)
        .bind(movement.price_per_unit)
        .bind(movement.total_value)
        .bind(&movement.department)
        .bind(movement.timestamp)
        .bind(&movement.notes)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE inventory_summary
            SET total_in = $1, total_out = $2, ending_stock = $3, average_price = $4
            WHERE product_id = $5
            "#,
        )
        .bind(update.summary.total_in)
        .bind(update.summary.total_out)
        .bind(update.summary.ending_stock)
        .bind(update.summary.average_price)
        .bind(movement.product_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let transaction = StockTransaction::try_from(row)?;
        tracing::info!(
            product_id = %transaction.product_id,
            transaction_id = transaction.id,
            transaction_type = %transaction.transaction_type,
            quantity = %transaction.quantity,
            ending_stock = %update.new_ending_stock,
            "Stock transaction recorded"
        );
        if update.is_low_stock {
            tracing::info!(
                product_id = %transaction.product_id,
                ending_stock = %update.new_ending_stock,
                threshold = %update.summary.low_stock_threshold,
                "Product is low on stock"
            );
        }

        Ok(RecordTransactionResult {
            message: "Transaction recorded successfully".to_string(),
            transaction,
            previous_ending_stock: update.previous_ending_stock,
            new_ending_stock: update.new_ending_stock,
            previous_average_price: update.previous_average_price,
            average_price: update.average_price,
            is_low_stock: update.is_low_stock,
        })
    }

    /// Create the zero-state summary for a new product
    ///
    /// Takes an executor so the catalog can run it inside the transaction
    /// that inserts the product.
    pub async fn initialize_summary<'e, E>(
        executor: E,
        product_id: Uuid,
        low_stock_threshold: Decimal,
    ) -> AppResult<InventorySummary>
    where
        E: Executor<'e, Database = Postgres>,
    {
        validate_low_stock_threshold(low_stock_threshold).map_err(|msg| AppError::Validation {
            field: "low_stock_threshold".to_string(),
            message: msg.to_string(),
        })?;

        let initial = InventorySummary::new(product_id, low_stock_threshold);
        let row = sqlx::query_as::<_, SummaryRow>(&format!(
            r#"
            INSERT INTO inventory_summary (
                product_id, opening_stock, total_in, total_out, ending_stock,
                average_price, low_stock_threshold
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            SUMMARY_COLUMNS
        ))
        .bind(initial.product_id)
        .bind(initial.opening_stock)
        .bind(initial.total_in)
        .bind(initial.total_out)
        .bind(initial.ending_stock)
        .bind(initial.average_price)
        .bind(initial.low_stock_threshold)
        .fetch_one(executor)
        .await?;

        Ok(row.into())
    }

    /// Get the current summary of a product
    pub async fn get_summary(&self, product_id: Uuid) -> AppResult<InventorySummary> {
        let mut conn = self.db.acquire().await?;
        let row = sqlx::query_as::<_, SummaryRow>(&format!(
            "SELECT {} FROM inventory_summary WHERE product_id = $1",
            SUMMARY_COLUMNS
        ))
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;

        match row {
            Some(row) => Ok(row.into()),
            None => Err(missing_summary_or_product(&mut conn, product_id).await),
        }
    }

    /// Change a product's low-stock threshold
    pub async fn set_low_stock_threshold(
        &self,
        product_id: Uuid,
        threshold: Decimal,
    ) -> AppResult<InventorySummary> {
        validate_low_stock_threshold(threshold).map_err(|msg| AppError::Validation {
            field: "new_threshold".to_string(),
            message: msg.to_string(),
        })?;

        let mut conn = self.db.acquire().await?;
        let row = sqlx::query_as::<_, SummaryRow>(&format!(
            r#"
            UPDATE inventory_summary
            SET low_stock_threshold = $1
            WHERE product_id = $2
            RETURNING {}
            "#,
            SUMMARY_COLUMNS
        ))
        .bind(threshold)
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;

        match row {
            Some(row) => {
                tracing::info!(product_id = %product_id, threshold = %threshold, "Low stock threshold updated");
                Ok(row.into())
            }
            None => Err(missing_summary_or_product(&mut conn, product_id).await),
        }
    }

    /// Replay a product's log and compare it with the stored summary
    pub async fn reconcile(&self, product_id: Uuid) -> AppResult<Reconciliation> {
        let mut tx = self.db.begin().await?;

        // FOR SHARE keeps writers out until the log has been read
        let row = sqlx::query_as::<_, SummaryRow>(&format!(
            "SELECT {} FROM inventory_summary WHERE product_id = $1 FOR SHARE",
            SUMMARY_COLUMNS
        ))
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?;
        let stored: InventorySummary = match row {
            Some(row) => row.into(),
            None => return Err(missing_summary_or_product(&mut tx, product_id).await),
        };

        let log = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {} FROM stock_transactions WHERE product_id = $1 ORDER BY id",
            TRANSACTION_COLUMNS
        ))
        .bind(product_id)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(StockTransaction::try_from)
        .collect::<AppResult<Vec<_>>>()?;

        tx.commit().await?;

        let replayed = replay(&stored, &log)?;
        let matches_log = stored.total_in == replayed.total_in
            && stored.total_out == replayed.total_out
            && stored.ending_stock == replayed.ending_stock
            && stored.average_price == replayed.average_price;
        if !matches_log {
            tracing::warn!(product_id = %product_id, "Inventory summary drifted from its transaction log");
        }

        Ok(Reconciliation {
            product_id,
            transaction_count: log.len(),
            balanced: stored.is_balanced(),
            matches_log,
            stored,
            replayed,
        })
    }
}

/// Lock and load a product's summary for the rest of the transaction
async fn lock_summary(conn: &mut PgConnection, product_id: Uuid) -> AppResult<InventorySummary> {
    let row = sqlx::query_as::<_, SummaryRow>(&format!(
        "SELECT {} FROM inventory_summary WHERE product_id = $1 FOR UPDATE",
        SUMMARY_COLUMNS
    ))
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => Ok(row.into()),
        None => Err(missing_summary_or_product(conn, product_id).await),
    }
}

/// Explain an absent summary row: unknown product, or a broken catalog invariant
async fn missing_summary_or_product(conn: &mut PgConnection, product_id: Uuid) -> AppError {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
        .bind(product_id)
        .fetch_one(&mut *conn)
        .await;

    match exists {
        Ok(true) => {
            tracing::error!(product_id = %product_id, "Product exists without an inventory summary");
            AppError::MissingSummary(product_id)
        }
        Ok(false) => AppError::NotFound("Product".to_string()),
        Err(e) => e.into(),
    }
}
