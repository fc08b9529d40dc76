//! Reporting service: read-only views over products, summaries and the log

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{
    is_low_stock, DailyTransaction, DashboardSummary, DateRange, InventoryOverview,
    LowStockAlert, MonthlyInventoryRow, StockTransaction, TopProduct,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::ledger::{TransactionRow, TRANSACTION_COLUMNS};

/// Number of products listed on the dashboard
const TOP_PRODUCTS: i64 = 5;

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct OverviewRow {
    product_id: Uuid,
    code: String,
    name: String,
    unit: String,
    category: Option<String>,
    opening_stock: Decimal,
    total_in: Decimal,
    total_out: Decimal,
    ending_stock: Decimal,
    average_price: Decimal,
    low_stock_threshold: Decimal,
}

#[derive(Debug, FromRow)]
struct MonthlyRow {
    product_id: Uuid,
    code: String,
    name: String,
    unit: String,
    category: Option<String>,
    stock_in: Decimal,
    stock_out: Decimal,
}

impl TryFrom<MonthlyRow> for MonthlyInventoryRow {
    type Error = AppError;

    fn try_from(row: MonthlyRow) -> Result<Self, Self::Error> {
        let net_change = row.stock_in.checked_sub(row.stock_out).ok_or_else(|| {
            AppError::Internal(format!("net change of product {} overflows", row.product_id))
        })?;
        Ok(MonthlyInventoryRow {
            product_id: row.product_id,
            code: row.code,
            name: row.name,
            unit: row.unit,
            category: row.category,
            stock_in: row.stock_in,
            stock_out: row.stock_out,
            net_change,
        })
    }
}

#[derive(Debug, FromRow)]
struct DailyRow {
    id: i64,
    product_id: Uuid,
    product: String,
    transaction_type: String,
    quantity: Decimal,
    transaction_timestamp: DateTime<Utc>,
}

impl ReportingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List the transaction log, newest first
    pub async fn list_transactions(
        &self,
        product_id: Option<Uuid>,
    ) -> AppResult<Vec<StockTransaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            r#"
            SELECT {}
            FROM stock_transactions
            WHERE ($1::UUID IS NULL OR product_id = $1)
            ORDER BY transaction_timestamp DESC, id DESC
            "#,
            TRANSACTION_COLUMNS
        ))
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(StockTransaction::try_from).collect()
    }

    /// Transactions whose timestamp falls within `range`
    pub async fn transactions_between(&self, range: DateRange) -> AppResult<Vec<DailyTransaction>> {
        let (from, until) = range.bounds();
        let rows = sqlx::query_as::<_, DailyRow>(
            r#"
            SELECT st.id, st.product_id, p.name AS product, st.transaction_type,
                   st.quantity, st.transaction_timestamp
            FROM stock_transactions st
            JOIN products p ON p.id = st.product_id
            WHERE st.transaction_timestamp >= $1 AND st.transaction_timestamp < $2
            ORDER BY st.transaction_timestamp DESC, st.id DESC
            "#,
        )
        .bind(from)
        .bind(until)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|row| {
                let transaction_type = row.transaction_type.parse().map_err(|e| {
                    AppError::Internal(format!("stock transaction {} is corrupt: {}", row.id, e))
                })?;
                Ok(DailyTransaction {
                    id: row.id,
                    product_id: row.product_id,
                    product: row.product,
                    transaction_type,
                    quantity: row.quantity,
                    transaction_timestamp: row.transaction_timestamp,
                })
            })
            .collect()
    }

    /// Current summary of every product
    pub async fn inventory_overview(&self) -> AppResult<Vec<InventoryOverview>> {
        let rows = sqlx::query_as::<_, OverviewRow>(
            r#"
            SELECT p.id AS product_id, p.code, p.name, p.unit, p.category,
                   i.opening_stock, i.total_in, i.total_out, i.ending_stock,
                   i.average_price, i.low_stock_threshold
            FROM inventory_summary i
            JOIN products p ON p.id = i.product_id
            ORDER BY p.code
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| InventoryOverview {
                is_low_stock: is_low_stock(r.ending_stock, r.low_stock_threshold),
                product_id: r.product_id,
                code: r.code,
                name: r.name,
                unit: r.unit,
                category: r.category,
                opening_stock: r.opening_stock,
                total_in: r.total_in,
                total_out: r.total_out,
                ending_stock: r.ending_stock,
                average_price: r.average_price,
                low_stock_threshold: r.low_stock_threshold,
            })
            .collect())
    }

    /// Stock received and issued per product within a month
    pub async fn monthly_summary(&self, month: DateRange) -> AppResult<Vec<MonthlyInventoryRow>> {
        let (from, until) = month.bounds();
        let rows = sqlx::query_as::<_, MonthlyRow>(
            r#"
            SELECT p.id AS product_id, p.code, p.name, p.unit, p.category,
                   COALESCE(SUM(CASE WHEN st.transaction_type = 'in' THEN st.quantity ELSE 0 END), 0) AS stock_in,
                   COALESCE(SUM(CASE WHEN st.transaction_type = 'out' THEN st.quantity ELSE 0 END), 0) AS stock_out
            FROM products p
            LEFT JOIN stock_transactions st
                ON st.product_id = p.id
               AND st.transaction_timestamp >= $1
               AND st.transaction_timestamp < $2
            GROUP BY p.id, p.code, p.name, p.unit, p.category
            ORDER BY p.code
            "#,
        )
        .bind(from)
        .bind(until)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(MonthlyInventoryRow::try_from).collect()
    }

    /// Products whose ending stock is at or below their threshold
    pub async fn low_stock_alerts(&self) -> AppResult<Vec<LowStockAlert>> {
        let rows = sqlx::query_as::<_, (Uuid, String, String, Decimal, Decimal)>(
            r#"
            SELECT p.id, p.code, p.name, i.ending_stock, i.low_stock_threshold
            FROM inventory_summary i
            JOIN products p ON p.id = i.product_id
            WHERE i.ending_stock <= i.low_stock_threshold
            ORDER BY i.ending_stock ASC, p.code
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| LowStockAlert {
                product_id: r.0,
                code: r.1,
                name: r.2,
                ending_stock: r.3,
                low_stock_threshold: r.4,
            })
            .collect())
    }

    /// Dashboard counts; `today` bounds the transactions counted as today's
    pub async fn dashboard(&self, today: DateRange) -> AppResult<DashboardSummary> {
        let product_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.db)
            .await?;

        let low_stock_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM inventory_summary WHERE ending_stock <= low_stock_threshold",
        )
        .fetch_one(&self.db)
        .await?;

        let (from, until) = today.bounds();
        let transactions_today: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM stock_transactions
            WHERE transaction_timestamp >= $1 AND transaction_timestamp < $2
            "#,
        )
        .bind(from)
        .bind(until)
        .fetch_one(&self.db)
        .await?;

        let top_products = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT p.name, COUNT(st.id) AS transaction_count
            FROM products p
            JOIN stock_transactions st ON st.product_id = p.id
            GROUP BY p.id, p.name
            ORDER BY transaction_count DESC, p.name
            LIMIT $1
            "#,
        )
        .bind(TOP_PRODUCTS)
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(|(name, transaction_count)| TopProduct {
            name,
            transaction_count,
        })
        .collect();

        Ok(DashboardSummary {
            product_count,
            low_stock_count,
            transactions_today,
            top_products,
        })
    }

    /// Export report data as CSV
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let csv_data = String::from_utf8(
            wtr.into_inner()
                .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?,
        )
        .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))?;
        Ok(csv_data)
    }
}
