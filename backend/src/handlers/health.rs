//! Health check handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub environment: String,
    pub store: StoreHealth,
}

#[derive(Serialize)]
pub struct StoreHealth {
    pub reachable: bool,
    pub pool_size: u32,
    pub idle_connections: usize,
}

/// Report liveness and whether the inventory store answers
///
/// Responds 503 while the store is unreachable so load balancers stop routing
/// ledger writes to this instance.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let reachable = sqlx::query("SELECT 1").execute(&state.db).await.is_ok();

    let status = if reachable {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if reachable { "healthy" } else { "degraded" },
            version: env!("CARGO_PKG_VERSION"),
            environment: state.config.environment.clone(),
            store: StoreHealth {
                reachable,
                pool_size: state.db.size(),
                idle_connections: state.db.num_idle(),
            },
        }),
    )
}
