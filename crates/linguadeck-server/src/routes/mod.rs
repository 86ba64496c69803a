//! HTTP API routes
//!
//! Route table and the shared error/response shaping used by the handlers.

pub mod reviews;
pub mod summary;

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;

use linguadeck_core::{ReviewCard, StorageError};

use crate::state::AppState;

/// Handler error: status code plus a `{"error": ...}` body.
pub type ApiError = (StatusCode, Json<Value>);

/// Build the axum router with all API routes
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    Router::new()
        // Review scheduling
        .route("/api/users/{user_id}/due-cards", get(reviews::get_due_cards))
        .route("/api/users/{user_id}/reviews", post(reviews::apply_review))
        // Per-record access; POST registers a card on first exposure
        .route(
            "/api/users/{user_id}/decks/{deck_id}/cards/{card_id}",
            get(reviews::get_card).post(reviews::register_card),
        )
        // Progress rollup
        .route("/api/users/{user_id}/summary", get(summary::get_summary))
        // Liveness
        .route("/health", get(summary::health_check))
        .layer(cors)
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .with_state(state)
}

/// Map a storage error onto an HTTP response.
///
/// Validation and not-found messages go to the client verbatim; anything
/// else is logged and collapsed to an opaque 500.
pub(crate) fn error_response(err: StorageError) -> ApiError {
    let status = match &err {
        StorageError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        StorageError::NotFound(_) => StatusCode::NOT_FOUND,
        StorageError::Busy(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %err, "storage failure");
        (
            status,
            Json(serde_json::json!({ "error": "internal error" })),
        )
    } else {
        (status, Json(serde_json::json!({ "error": err.to_string() })))
    }
}

pub(crate) fn not_found(message: String) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": message })),
    )
}

/// Wire shape of a review card, shared by every handler that returns one.
pub(crate) fn card_json(card: &ReviewCard) -> Value {
    serde_json::json!({
        "userId": card.user_id,
        "cardId": card.card_id,
        "deckId": card.deck_id,
        "easinessFactor": card.easiness_factor,
        "intervalDays": card.interval_days,
        "repetition": card.repetition,
        "lastReview": card.last_review.map(|dt| dt.to_rfc3339()),
        "nextReview": card.next_review.map(|dt| dt.to_rfc3339()),
        "totalReviews": card.total_reviews,
        "correctCount": card.correct_count,
        "incorrectCount": card.incorrect_count,
        "mastered": card.is_mastered(),
        "createdAt": card.created_at.to_rfc3339(),
        "updatedAt": card.updated_at.to_rfc3339(),
    })
}
