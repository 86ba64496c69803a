//! Review Grader
//!
//! Pure, deterministic state transition: prior memory state + quality rating
//! in, new memory state out. All persistence lives in the storage layer.

use serde::{Deserialize, Serialize};

use super::algorithm::{self, DEFAULT_EASINESS_FACTOR, FIRST_INTERVAL_DAYS};

/// Self-graded recall quality on the SuperMemo 0-5 scale.
///
/// Anything at or above [`Quality::Hard`] (3) counts as a correct recall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Quality {
    /// Total blackout, no recollection at all
    Blackout,
    /// Wrong answer, but the card felt familiar once revealed
    Incorrect,
    /// Wrong answer, yet the correct one was easy to recognize
    Recognized,
    /// Correct, with serious difficulty
    Hard,
    /// Correct after some hesitation
    Good,
    /// Perfect, immediate recall
    Perfect,
}

impl Quality {
    /// Parse a raw 0-5 rating. Out-of-range values are a caller error and
    /// return `None` rather than being clamped.
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Quality::Blackout),
            1 => Some(Quality::Incorrect),
            2 => Some(Quality::Recognized),
            3 => Some(Quality::Hard),
            4 => Some(Quality::Good),
            5 => Some(Quality::Perfect),
            _ => None,
        }
    }

    /// Numeric value on the 0-5 scale
    pub fn as_i32(self) -> i32 {
        match self {
            Quality::Blackout => 0,
            Quality::Incorrect => 1,
            Quality::Recognized => 2,
            Quality::Hard => 3,
            Quality::Good => 4,
            Quality::Perfect => 5,
        }
    }

    /// A rating of 3 or above counts as a successful recall
    pub fn is_correct(self) -> bool {
        self.as_i32() >= 3
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_i32())
    }
}

/// The scheduling triple the grader operates on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryState {
    /// Growth multiplier for the review interval, never below 1.3
    pub easiness_factor: f64,
    /// Days between the last review and the next one
    pub interval_days: i32,
    /// Consecutive successful recalls; resets on failure
    pub repetition: i32,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            easiness_factor: DEFAULT_EASINESS_FACTOR,
            interval_days: 0,
            repetition: 0,
        }
    }
}

/// Outcome of grading one recall.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradeResult {
    /// The updated scheduling triple
    pub state: MemoryState,
    /// Whether the rating counted as a correct recall (quality >= 3)
    pub is_correct: bool,
}

/// SM-2 grader. Stateless; kept as a struct so the storage layer can hold
/// one instance the way it holds its connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sm2Grader;

impl Sm2Grader {
    pub fn new() -> Self {
        Self
    }

    /// Grade one recall of a card.
    ///
    /// The easiness factor is updated for every rating, success or failure.
    /// Failure resets the streak and schedules a next-day retry regardless
    /// of how large the prior interval was.
    pub fn grade(&self, state: &MemoryState, quality: Quality) -> GradeResult {
        let easiness = algorithm::next_easiness(state.easiness_factor, quality.as_i32());

        let (interval_days, repetition) = if quality.is_correct() {
            let repetition = state.repetition + 1;
            (
                algorithm::next_interval(state.interval_days, repetition, easiness),
                repetition,
            )
        } else {
            (FIRST_INTERVAL_DAYS, 0)
        };

        GradeResult {
            state: MemoryState {
                easiness_factor: easiness,
                interval_days,
                repetition,
            },
            is_correct: quality.is_correct(),
        }
    }
}
