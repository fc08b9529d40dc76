//! Stock transaction HTTP handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use shared::{parse_day, DailyTransaction, RecordTransactionInput, StockTransaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::extract::{JsonBody, QueryParams};
use crate::services::{ledger::RecordTransactionResult, LedgerService, ReportingService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TransactionListQuery {
    pub product_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct TransactionDateQuery {
    pub date: Option<String>,
}

/// Record a stock-in or stock-out movement
pub async fn record_transaction(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<RecordTransactionInput>,
) -> AppResult<(StatusCode, Json<RecordTransactionResult>)> {
    let service = LedgerService::new(state.db);
    let result = service.record_transaction(input).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

/// List the transaction log, optionally for one product
pub async fn list_transactions(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<TransactionListQuery>,
) -> AppResult<Json<Vec<StockTransaction>>> {
    let service = ReportingService::new(state.db);
    let transactions = service.list_transactions(query.product_id).await?;
    Ok(Json(transactions))
}

/// List transactions recorded on a given day (`?date=YYYY-MM-DD`)
pub async fn get_transactions_by_date(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<TransactionDateQuery>,
) -> AppResult<Json<Vec<DailyTransaction>>> {
    let date = query
        .date
        .filter(|d| !d.is_empty())
        .ok_or_else(|| AppError::Validation {
            field: "date".to_string(),
            message: "Missing date parameter".to_string(),
        })?;
    let day = parse_day(&date).map_err(|msg| AppError::Validation {
        field: "date".to_string(),
        message: msg.to_string(),
    })?;

    let service = ReportingService::new(state.db);
    let transactions = service.transactions_between(day).await?;
    Ok(Json(transactions))
}
