//! Product catalog service
//!
//! Products are created together with their inventory summary in a single
//! database transaction, so every product the ledger sees has a summary.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{
    validate_low_stock_threshold, CreateProductInput, InventorySummary, Product,
    UpdateProductInput,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::LedgerService;

/// Product catalog service
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
    default_low_stock_threshold: Decimal,
}

/// Row of `products`
#[derive(Debug, FromRow)]
struct ProductRow {
    id: Uuid,
    code: String,
    name: String,
    description: Option<String>,
    unit: String,
    category: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            code: row.code,
            name: row.name,
            description: row.description,
            unit: row.unit,
            category: row.category,
            created_at: row.created_at,
        }
    }
}

const PRODUCT_COLUMNS: &str = "id, code, name, description, unit, category, created_at";

/// A newly created product with its initial summary
#[derive(Debug, Clone, Serialize)]
pub struct CreatedProduct {
    #[serde(flatten)]
    pub product: Product,
    pub inventory: InventorySummary,
}

impl ProductService {
    /// Create a new ProductService instance
    pub fn new(db: PgPool, default_low_stock_threshold: Decimal) -> Self {
        Self {
            db,
            default_low_stock_threshold,
        }
    }

    /// Create a product and its zero-state inventory summary
    pub async fn create(&self, input: CreateProductInput) -> AppResult<CreatedProduct> {
        input.validate()?;
        let threshold = input
            .low_stock_threshold
            .unwrap_or(self.default_low_stock_threshold);
        validate_low_stock_threshold(threshold).map_err(|msg| AppError::Validation {
            field: "low_stock_threshold".to_string(),
            message: msg.to_string(),
        })?;

        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            INSERT INTO products (code, name, description, unit, category)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(input.code.trim())
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.unit.trim())
        .bind(&input.category)
        .fetch_one(&mut *tx)
        .await?;

        let inventory = LedgerService::initialize_summary(&mut *tx, row.id, threshold).await?;

        tx.commit().await?;

        tracing::info!(product_id = %row.id, code = %row.code, "Product created");

        Ok(CreatedProduct {
            product: row.into(),
            inventory,
        })
    }

    /// List products, optionally restricted to one category
    pub async fn list(&self, category: Option<&str>) -> AppResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            SELECT {}
            FROM products
            WHERE ($1::TEXT IS NULL OR category = $1)
            ORDER BY code
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(category)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Get a product by id
    pub async fn get(&self, product_id: Uuid) -> AppResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products WHERE id = $1",
            PRODUCT_COLUMNS
        ))
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        Ok(row.into())
    }

    /// Update a product; absent fields keep their current value
    ///
    /// An empty `description` or `category` clears it.
    pub async fn update(&self, product_id: Uuid, input: UpdateProductInput) -> AppResult<Product> {
        input.validate()?;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            UPDATE products
            SET code = COALESCE($1, code),
                name = COALESCE($2, name),
                description = CASE WHEN $3::TEXT IS NULL THEN description
                                   ELSE NULLIF(BTRIM($3), '') END,
                unit = COALESCE($4, unit),
                category = CASE WHEN $5::TEXT IS NULL THEN category
                                ELSE NULLIF(BTRIM($5), '') END
            WHERE id = $6
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(input.code.as_deref().map(str::trim))
        .bind(input.name.as_deref().map(str::trim))
        .bind(&input.description)
        .bind(input.unit.as_deref().map(str::trim))
        .bind(&input.category)
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        Ok(row.into())
    }

    /// Delete a product; its summary and transactions cascade
    pub async fn delete(&self, product_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(product_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }

        tracing::info!(product_id = %product_id, "Product deleted");
        Ok(())
    }

    /// Distinct non-empty categories
    pub async fn categories(&self) -> AppResult<Vec<String>> {
        let categories = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT category
            FROM products
            WHERE category IS NOT NULL AND category <> ''
            ORDER BY category
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(categories)
    }
}
