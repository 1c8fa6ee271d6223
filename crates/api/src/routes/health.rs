use axum::extract::State;
use axum::{routing::get, Json, Router};
use chrono::Utc;
use projecthub_core::types::Timestamp;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the database check fails.
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: Timestamp,
    pub db_healthy: bool,
    /// Open real-time gateway connections.
    pub connections: usize,
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = match projecthub_db::health_check(&state.pool).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check database query failed");
            false
        }
    };

    Json(HealthResponse {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
        db_healthy,
        connections: state.ws_manager.connection_count().await,
    })
}

/// Liveness check, mounted at the root rather than under `/api`.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
