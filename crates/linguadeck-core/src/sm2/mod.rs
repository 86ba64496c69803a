//! SM-2 Spaced Repetition Module
//!
//! The SuperMemo 2 scheduling family: each card carries an easiness factor,
//! a review interval in days, and a streak of consecutive successful recalls.
//! Grading a recall updates all three and decides when the card comes due
//! again.
//!
//! Reference: https://super-memory.com/english/ol/sm2.htm
//!
//! ## Core rules:
//! - Easiness: E' = E + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02)), floored at 1.3
//! - Failure (q < 3) resets the streak and schedules a next-day retry
//! - Success walks 1 day, 6 days, then round(interval * E') compounding growth

mod algorithm;
mod grader;

pub use algorithm::{
    next_easiness,
    next_interval,
    // Constants
    DEFAULT_EASINESS_FACTOR,
    FIRST_INTERVAL_DAYS,
    MASTERY_THRESHOLD,
    MIN_EASINESS_FACTOR,
    SECOND_INTERVAL_DAYS,
};

pub use grader::{GradeResult, MemoryState, Quality, Sm2Grader};
