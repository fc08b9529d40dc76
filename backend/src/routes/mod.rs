//! Route definitions for the Stock Ledger

use axum::{
    routing::{get, put},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/products", product_routes())
        .nest("/transactions", transaction_routes())
        .nest("/inventory", inventory_routes())
}

/// Product catalog routes
fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_products).post(handlers::create_product))
        .route("/categories", get(handlers::list_categories))
        .route(
            "/:product_id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
}

/// Stock transaction routes
fn transaction_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_transactions).post(handlers::record_transaction))
        .route("/by-date", get(handlers::get_transactions_by_date))
}

/// Inventory summary and reporting routes
fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/summary", get(handlers::get_inventory_summary))
        .route("/summary/monthly", get(handlers::get_monthly_inventory_summary))
        .route("/low-stock", get(handlers::get_low_stock_alerts))
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/:product_id", get(handlers::get_product_summary))
        .route("/:product_id/threshold", put(handlers::update_low_stock_threshold))
        .route("/:product_id/reconcile", get(handlers::reconcile_product))
}
