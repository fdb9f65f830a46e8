// handlers/health.rs - liveness and database status (public)

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;

use crate::database::health_check;
use crate::state::AppState;

/// GET /health
///
/// Answers 503 when a configured database cannot be reached. Runs without
/// a database report `"memory"`.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let timestamp = Utc::now();
    let uptime = state.started_at.elapsed().as_secs();

    let Some(pool) = state.pool.as_ref() else {
        return (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": timestamp,
                "uptime": uptime,
                "database": "memory"
            })),
        );
    };

    match health_check(pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": timestamp,
                "uptime": uptime,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": timestamp,
                    "uptime": uptime,
                    "database": "unavailable"
                })),
            )
        }
    }
}
