//! Review Card - The per-(user, deck, card) scheduling record
//!
//! One record tracks one user's memory of one card:
//! - SM-2 state (easiness factor, interval, repetition streak)
//! - Review timestamps driving the due-card query
//! - Lifetime counters for correct and incorrect recalls

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sm2::{MemoryState, MASTERY_THRESHOLD};

/// Default page size for the due-card query.
pub const DEFAULT_DUE_LIMIT: i32 = 20;

/// Upper bound on the due-card page size.
pub const MAX_DUE_LIMIT: i32 = 100;

// ============================================================================
// REVIEW CARD
// ============================================================================

/// One user's scheduling record for one card in one deck.
///
/// Created on the user's first graded review of the card and mutated only
/// through [`Storage::apply_review`](crate::storage::Storage::apply_review).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCard {
    /// Owner of the record (opaque identifier, validated upstream)
    pub user_id: String,
    /// Card identifier (opaque, content lives in the deck service)
    pub card_id: String,
    /// Deck identifier (opaque)
    pub deck_id: String,

    // ========== SM-2 State ==========
    /// Growth multiplier for the review interval, never below 1.3
    pub easiness_factor: f64,
    /// Days between the last review and the next one
    pub interval_days: i32,
    /// Consecutive successful recalls; resets to 0 on failure
    pub repetition: i32,

    // ========== Scheduling ==========
    /// When this card was last graded
    pub last_review: Option<DateTime<Utc>>,
    /// When this card becomes due; `None` only before the first review
    pub next_review: Option<DateTime<Utc>>,

    // ========== Lifetime Counters ==========
    /// Total graded reviews, equals correct + incorrect
    pub total_reviews: i32,
    /// Reviews graded quality >= 3
    pub correct_count: i32,
    /// Reviews graded quality < 3
    pub incorrect_count: i32,

    // ========== Audit ==========
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// When the record was last modified
    pub updated_at: DateTime<Utc>,
}

impl ReviewCard {
    /// Fresh record for a card the user has not been graded on yet.
    pub fn new(
        user_id: impl Into<String>,
        card_id: impl Into<String>,
        deck_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let state = MemoryState::default();
        Self {
            user_id: user_id.into(),
            card_id: card_id.into(),
            deck_id: deck_id.into(),
            easiness_factor: state.easiness_factor,
            interval_days: state.interval_days,
            repetition: state.repetition,
            last_review: None,
            next_review: None,
            total_reviews: 0,
            correct_count: 0,
            incorrect_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// The SM-2 triple the grader operates on.
    pub fn memory_state(&self) -> MemoryState {
        MemoryState {
            easiness_factor: self.easiness_factor,
            interval_days: self.interval_days,
            repetition: self.repetition,
        }
    }

    /// Check if this card is due at the given instant. A never-reviewed
    /// card is not due; first exposure is driven by the deck flow.
    pub fn is_due_at(&self, now: DateTime<Utc>) -> bool {
        self.next_review.map(|t| t <= now).unwrap_or(false)
    }

    /// Check if this card is due now.
    pub fn is_due(&self) -> bool {
        self.is_due_at(Utc::now())
    }

    /// A card is mastered after [`MASTERY_THRESHOLD`] consecutive successes.
    pub fn is_mastered(&self) -> bool {
        self.repetition >= MASTERY_THRESHOLD
    }

    /// Reviewed at least once but not yet mastered.
    pub fn is_learning(&self) -> bool {
        self.total_reviews > 0 && !self.is_mastered()
    }
}

// ============================================================================
// OPERATION INPUTS
// ============================================================================

/// Input for grading one recall.
///
/// Uses `deny_unknown_fields` to reject malformed clients early.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ApplyReviewInput {
    /// Owner of the record
    pub user_id: String,
    /// Card being graded
    pub card_id: String,
    /// Deck the card belongs to
    pub deck_id: String,
    /// Recall quality on the 0-5 scale
    pub quality: i32,
    /// Client-generated idempotency key (UUID). A replayed key returns the
    /// current record without grading the card a second time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Input for the due-card query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DueQuery {
    /// Owner of the records
    pub user_id: String,
    /// Restrict to one deck when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deck_id: Option<String>,
    /// Maximum cards to return
    #[serde(default = "default_due_limit")]
    pub limit: i32,
}

fn default_due_limit() -> i32 {
    DEFAULT_DUE_LIMIT
}

impl DueQuery {
    /// Query across every deck with the default limit.
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            deck_id: None,
            limit: DEFAULT_DUE_LIMIT,
        }
    }
}

// ============================================================================
// OPERATION OUTPUTS
// ============================================================================

/// Result of one graded review.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    /// The updated record
    pub card: ReviewCard,
    /// Whether the rating counted as a correct recall
    pub is_correct: bool,
    /// True when a replayed request id short-circuited the grading
    pub deduplicated: bool,
}

/// Page of due cards plus the untruncated count.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DueCards {
    /// Due records, most overdue first, truncated to the query limit
    pub cards: Vec<ReviewCard>,
    /// Count of due records before truncation
    pub total_due: i64,
}

impl DueCards {
    pub fn has_due_cards(&self) -> bool {
        self.total_due > 0
    }
}

/// Read-only rollup over one user's records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    /// All records for the user
    pub total_cards: i64,
    /// Records due before the end of the current UTC day
    pub due_today: i64,
    /// Records with a repetition streak at or past the mastery threshold
    pub mastered: i64,
    /// Records reviewed at least once but not mastered
    pub learning: i64,
}

impl ReviewSummary {
    /// Used by clients to suppress their empty-state screens.
    pub fn has_cards(&self) -> bool {
        self.total_cards > 0
    }
}

// ============================================================================
// TESTS
// ============================================================================
