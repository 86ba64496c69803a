//! Review endpoints
//!
//! Due-card queries, review application, and per-record access.

use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde::Deserialize;
use serde_json::Value;

use linguadeck_core::{ApplyReviewInput, DueQuery, DEFAULT_DUE_LIMIT};

use super::{card_json, error_response, not_found, ApiError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DueCardsParams {
    pub deck_id: Option<String>,
    pub limit: Option<i32>,
}

/// List cards due for review, most overdue first
pub async fn get_due_cards(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<DueCardsParams>,
) -> Result<Json<Value>, ApiError> {
    let query = DueQuery {
        user_id,
        deck_id: params.deck_id,
        limit: params.limit.unwrap_or(DEFAULT_DUE_LIMIT),
    };

    let due = state.storage.get_due_cards(&query).map_err(error_response)?;

    let cards: Vec<Value> = due.cards.iter().map(card_json).collect();
    Ok(Json(serde_json::json!({
        "cards": cards,
        "totalDue": due.total_due,
        "hasDueCards": due.has_due_cards(),
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ApplyReviewBody {
    pub card_id: String,
    pub deck_id: String,
    pub quality: i32,
    pub request_id: Option<String>,
}

/// Grade one recall and return the updated record
pub async fn apply_review(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(body): Json<ApplyReviewBody>,
) -> Result<Json<Value>, ApiError> {
    let input = ApplyReviewInput {
        user_id,
        card_id: body.card_id,
        deck_id: body.deck_id,
        quality: body.quality,
        request_id: body.request_id,
    };

    let outcome = state.storage.apply_review(&input).map_err(error_response)?;

    Ok(Json(serde_json::json!({
        "card": card_json(&outcome.card),
        "isCorrect": outcome.is_correct,
        "deduplicated": outcome.deduplicated,
    })))
}

/// Fetch one scheduling record
pub async fn get_card(
    State(state): State<AppState>,
    Path((user_id, deck_id, card_id)): Path<(String, String, String)>,
) -> Result<Json<Value>, ApiError> {
    let card = state
        .storage
        .get_card(&user_id, &card_id, &deck_id)
        .map_err(error_response)?
        .ok_or_else(|| {
            not_found(format!(
                "no review record for card {} in deck {}",
                card_id, deck_id
            ))
        })?;

    Ok(Json(card_json(&card)))
}

/// Register a card on first exposure (idempotent)
pub async fn register_card(
    State(state): State<AppState>,
    Path((user_id, deck_id, card_id)): Path<(String, String, String)>,
) -> Result<Json<Value>, ApiError> {
    let card = state
        .storage
        .register_card(&user_id, &card_id, &deck_id)
        .map_err(error_response)?;

    Ok(Json(card_json(&card)))
}

// ============================================================================
// TESTS
// ============================================================================
