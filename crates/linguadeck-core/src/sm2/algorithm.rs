//! SM-2 Formulas
//!
//! Pure arithmetic for the SuperMemo 2 algorithm. No I/O, no shared state.

/// Floor for the easiness factor. Without it, repeated failures would push a
/// card's growth multiplier toward zero and the card would never graduate.
pub const MIN_EASINESS_FACTOR: f64 = 1.3;

/// Easiness factor assigned to a card that has never been graded.
pub const DEFAULT_EASINESS_FACTOR: f64 = 2.5;

/// Consecutive successful recalls after which a card counts as mastered.
/// Shared by the grader and the summary aggregator.
pub const MASTERY_THRESHOLD: i32 = 3;

/// Interval after the first successful recall.
pub const FIRST_INTERVAL_DAYS: i32 = 1;

/// Interval after the second consecutive successful recall.
pub const SECOND_INTERVAL_DAYS: i32 = 6;

/// Compute the updated easiness factor for a recall of the given quality.
///
/// `E' = E + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02))`, clamped to the
/// [`MIN_EASINESS_FACTOR`] floor. Quality 5 raises E by 0.1, quality 4
/// leaves it unchanged, everything below lowers it.
pub fn next_easiness(easiness: f64, quality: i32) -> f64 {
    let q = quality as f64;
    let delta = 0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02);
    (easiness + delta).max(MIN_EASINESS_FACTOR)
}

/// Compute the interval in days for a card that has just reached
/// `repetition` consecutive successes, given the interval it carried before
/// this review and its updated easiness factor.
///
/// Never returns less than one day: a card that was just reviewed is not
/// due again the same instant.
pub fn next_interval(prev_interval_days: i32, repetition: i32, easiness: f64) -> i32 {
    match repetition {
        1 => FIRST_INTERVAL_DAYS,
        2 => SECOND_INTERVAL_DAYS,
        _ => {
            let grown = (prev_interval_days as f64 * easiness).round() as i32;
            grown.max(FIRST_INTERVAL_DAYS)
        }
    }
}
