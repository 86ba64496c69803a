//! Card module - Core types and data structures
//!
//! Implements the review-side view of a flashcard:
//! - Per-(user, deck, card) scheduling records with SM-2 state
//! - Inputs for grading and due-card queries
//! - The per-user summary rollup

mod record;

pub use record::{
    ApplyReviewInput, DueCards, DueQuery, ReviewCard, ReviewOutcome, ReviewSummary,
    DEFAULT_DUE_LIMIT, MAX_DUE_LIMIT,
};
