//! Inventory summary and reporting HTTP handlers

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{
    parse_month, DashboardSummary, DateRange, InventoryOverview, InventorySummary, LowStockAlert,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::extract::{JsonBody, PathParam, QueryParams};
use crate::services::{ledger::Reconciliation, LedgerService, ReportingService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct MonthlySummaryQuery {
    pub month: Option<String>,
    pub format: Option<String>, // "json" or "csv"
}

#[derive(Debug, Deserialize)]
pub struct ThresholdUpdateRequest {
    pub new_threshold: Decimal,
}

/// Current summary of every product
pub async fn get_inventory_summary(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<InventoryOverview>>> {
    let service = ReportingService::new(state.db);
    let overview = service.inventory_overview().await?;
    Ok(Json(overview))
}

/// Stock in/out per product for a month (`?month=YYYY-MM[&format=csv]`)
pub async fn get_monthly_inventory_summary(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<MonthlySummaryQuery>,
) -> AppResult<Response> {
    let month = query
        .month
        .filter(|m| !m.is_empty())
        .ok_or_else(|| AppError::Validation {
            field: "month".to_string(),
            message: "Missing month parameter (expected format: YYYY-MM)".to_string(),
        })?;
    let range = parse_month(&month).map_err(|msg| AppError::Validation {
        field: "month".to_string(),
        message: msg.to_string(),
    })?;

    let service = ReportingService::new(state.db);
    let rows = service.monthly_summary(range).await?;

    if query.format.as_deref() == Some("csv") {
        let csv = ReportingService::export_to_csv(&rows)?;
        let disposition = format!("attachment; filename=\"inventory_{}.csv\"", month);
        Ok((
            [
                (header::CONTENT_TYPE, "text/csv".to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            csv,
        )
            .into_response())
    } else {
        Ok(Json(rows).into_response())
    }
}

/// Products at or below their low-stock threshold
pub async fn get_low_stock_alerts(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<LowStockAlert>>> {
    let service = ReportingService::new(state.db);
    let alerts = service.low_stock_alerts().await?;
    Ok(Json(alerts))
}

/// Dashboard counts
pub async fn get_dashboard(State(state): State<AppState>) -> AppResult<Json<DashboardSummary>> {
    let service = ReportingService::new(state.db);
    let today = DateRange::day(Utc::now().date_naive());
    let summary = service.dashboard(today).await?;
    Ok(Json(summary))
}

/// Summary of one product
pub async fn get_product_summary(
    State(state): State<AppState>,
    PathParam(product_id): PathParam<Uuid>,
) -> AppResult<Json<InventorySummary>> {
    let service = LedgerService::new(state.db);
    let summary = service.get_summary(product_id).await?;
    Ok(Json(summary))
}

/// Change the low-stock threshold of one product
pub async fn update_low_stock_threshold(
    State(state): State<AppState>,
    PathParam(product_id): PathParam<Uuid>,
    JsonBody(request): JsonBody<ThresholdUpdateRequest>,
) -> AppResult<Json<InventorySummary>> {
    let service = LedgerService::new(state.db);
    let summary = service
        .set_low_stock_threshold(product_id, request.new_threshold)
        .await?;
    Ok(Json(summary))
}

/// Compare a product's summary with a replay of its transaction log
pub async fn reconcile_product(
    State(state): State<AppState>,
    PathParam(product_id): PathParam<Uuid>,
) -> AppResult<Json<Reconciliation>> {
    let service = LedgerService::new(state.db);
    let reconciliation = service.reconcile(product_id).await?;
    Ok(Json(reconciliation))
}
