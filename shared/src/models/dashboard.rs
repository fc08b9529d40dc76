//! Dashboard models

use serde::{Deserialize, Serialize};

/// Headline counts shown on the inventory dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub product_count: i64,
    pub low_stock_count: i64,
    pub transactions_today: i64,
    pub top_products: Vec<TopProduct>,
}

/// A product ranked by how often it moves
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopProduct {
    pub name: String,
    pub transaction_count: i64,
}
