//! Product catalog models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// A catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    /// Unique business key
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    /// Unit of measure (pcs, kg, box, ...)
    pub unit: String,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a product
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProductInput {
    #[validate(length(min = 1, max = 50), custom = "product_code")]
    pub code: String,
    #[validate(length(min = 1, max = 200), custom = "not_blank")]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 20), custom = "not_blank")]
    pub unit: String,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    /// Overrides the configured default threshold
    pub low_stock_threshold: Option<Decimal>,
}

/// Input for updating a product; absent fields keep their current value
///
/// An empty `description` or `category` clears the stored value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProductInput {
    #[validate(length(min = 1, max = 50), custom = "product_code")]
    pub code: Option<String>,
    #[validate(length(min = 1, max = 200), custom = "not_blank")]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 20), custom = "not_blank")]
    pub unit: Option<String>,
    #[validate(length(max = 100))]
    pub category: Option<String>,
}

fn product_code(code: &str) -> Result<(), ValidationError> {
    crate::validation::validate_product_code(code).map_err(|msg| {
        let mut err = ValidationError::new("product_code");
        err.message = Some(msg.into());
        err
    })
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("not_blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}
