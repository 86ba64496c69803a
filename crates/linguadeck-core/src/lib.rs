//! # Linguadeck Core
//!
//! Spaced-repetition review engine for the Linguadeck language tutor:
//!
//! - **SM-2 Grader**: pure state transition from (easiness, interval,
//!   repetition) + a 0-5 quality rating to the next scheduling state
//! - **Scheduler**: due-card queries and atomic review application against
//!   a SQLite store
//! - **Summary Aggregator**: per-user totals, due-today, mastered, and
//!   learning counts
//!
//! The engine tracks one scheduling record per (user, deck, card). Card
//! content, authentication, and deck management live in other services;
//! identifiers here are opaque keys validated upstream.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use linguadeck_core::{ApplyReviewInput, DueQuery, Storage};
//!
//! // Create storage (uses default platform-specific location)
//! let storage = Storage::new(None)?;
//!
//! // Grade a recall
//! let outcome = storage.apply_review(&ApplyReviewInput {
//!     user_id: "user-42".into(),
//!     card_id: "card-7".into(),
//!     deck_id: "spanish-a1".into(),
//!     quality: 4,
//!     request_id: None,
//! })?;
//!
//! // Fetch what is due
//! let due = storage.get_due_cards(&DueQuery::for_user("user-42"))?;
//!
//! // Roll up the user's progress
//! let summary = storage.get_summary("user-42")?;
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod card;
pub mod sm2;
pub mod storage;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Card types
pub use card::{
    ApplyReviewInput, DueCards, DueQuery, ReviewCard, ReviewOutcome, ReviewSummary,
    DEFAULT_DUE_LIMIT, MAX_DUE_LIMIT,
};

// SM-2 algorithm
pub use sm2::{
    next_easiness,
    next_interval,
    GradeResult,
    MemoryState,
    Quality,
    Sm2Grader,
    // Constants
    DEFAULT_EASINESS_FACTOR,
    MASTERY_THRESHOLD,
    MIN_EASINESS_FACTOR,
};

// Storage layer
pub use storage::{Result, Storage, StorageError, MIGRATIONS};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        ApplyReviewInput, DueCards, DueQuery, Quality, Result, ReviewCard, ReviewOutcome,
        ReviewSummary, Sm2Grader, Storage, StorageError,
    };
}
