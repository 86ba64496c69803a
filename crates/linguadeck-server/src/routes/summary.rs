//! Summary and health endpoints

use axum::extract::{Path, State};
use axum::response::Json;
use serde_json::Value;

use super::{error_response, ApiError};
use crate::state::AppState;

/// Per-user progress rollup
pub async fn get_summary(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let summary = state.storage.get_summary(&user_id).map_err(error_response)?;

    Ok(Json(serde_json::json!({
        "totalCards": summary.total_cards,
        "dueToday": summary.due_today,
        "mastered": summary.mastered,
        "learning": summary.learning,
        "hasCards": summary.has_cards(),
    })))
}

/// Liveness probe
pub async fn health_check() -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// ============================================================================
// TESTS
// ============================================================================
