//! SQLite Storage Implementation
//!
//! The only component allowed to read or write review records. Grading is a
//! short read-modify-write transaction on the single writer connection, so
//! two concurrent reviews of the same card cannot lose a counter increment.

use chrono::{DateTime, Days, Duration, NaiveTime, Utc};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::PathBuf;
use std::sync::Mutex;
use uuid::Uuid;

use crate::card::{
    ApplyReviewInput, DueCards, DueQuery, ReviewCard, ReviewOutcome, ReviewSummary, MAX_DUE_LIMIT,
};
use crate::sm2::{Quality, Sm2Grader, MASTERY_THRESHOLD};

/// Bounded internal retries before write contention surfaces to the caller.
const MAX_WRITE_RETRIES: u32 = 3;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Storage error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// No record for the requested (user, deck, card)
    #[error("Record not found: {0}")]
    NotFound(String),
    /// Rejected before any state change
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// Write contention that outlasted the internal retries; safe to retry
    #[error("Write contention on record {0}")]
    Busy(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

// ============================================================================
// STORAGE
// ============================================================================

/// Main storage struct.
///
/// Uses separate reader/writer connections for interior mutability. All
/// methods take `&self`, making Storage `Send + Sync` so the HTTP layer can
/// share an `Arc<Storage>` across handlers.
pub struct Storage {
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
    grader: Sm2Grader,
}

impl Storage {
    /// Apply PRAGMAs to a connection
    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -16000;
             PRAGMA temp_store = MEMORY;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;

        Ok(())
    }

    /// Create new storage instance
    pub fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let path = match db_path {
            Some(p) => p,
            None => {
                let proj_dirs = ProjectDirs::from("com", "linguadeck", "core").ok_or_else(|| {
                    StorageError::Init("Could not determine project directories".to_string())
                })?;

                let data_dir = proj_dirs.data_dir();
                std::fs::create_dir_all(data_dir)?;
                data_dir.join("linguadeck.db")
            }
        };

        // Open writer connection
        let writer_conn = Connection::open(&path)?;
        Self::configure_connection(&writer_conn)?;

        // Apply migrations on writer only
        super::migrations::apply_migrations(&writer_conn)?;

        // Open reader connection to same path
        let reader_conn = Connection::open(&path)?;
        Self::configure_connection(&reader_conn)?;

        Ok(Self {
            writer: Mutex::new(writer_conn),
            reader: Mutex::new(reader_conn),
            grader: Sm2Grader::new(),
        })
    }

    fn validate_id(value: &str, field: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(StorageError::InvalidArgument(format!(
                "{} must not be empty",
                field
            )));
        }
        Ok(())
    }

    // ========================================================================
    // CARD REGISTRATION
    // ========================================================================

    /// Create the default scheduling record for a card the user just
    /// encountered. Idempotent; an existing record is returned untouched.
    ///
    /// First exposure is driven by the deck flow, so a record created here
    /// has `next_review = NULL` and is not yet due.
    pub fn register_card(&self, user_id: &str, card_id: &str, deck_id: &str) -> Result<ReviewCard> {
        self.register_card_at(user_id, card_id, deck_id, Utc::now())
    }

    /// [`register_card`](Self::register_card) with an injected clock.
    pub fn register_card_at(
        &self,
        user_id: &str,
        card_id: &str,
        deck_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ReviewCard> {
        Self::validate_id(user_id, "userId")?;
        Self::validate_id(card_id, "cardId")?;
        Self::validate_id(deck_id, "deckId")?;

        let fresh = ReviewCard::new(user_id, card_id, deck_id, now);
        {
            let writer = self
                .writer
                .lock()
                .map_err(|_| StorageError::Init("Writer lock poisoned".into()))?;
            writer.execute(
                "INSERT OR IGNORE INTO review_cards (
                    user_id, card_id, deck_id,
                    easiness_factor, interval_days, repetition,
                    last_review, next_review,
                    total_reviews, correct_count, incorrect_count,
                    created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    fresh.user_id,
                    fresh.card_id,
                    fresh.deck_id,
                    fresh.easiness_factor,
                    fresh.interval_days,
                    fresh.repetition,
                    Option::<String>::None,
                    Option::<String>::None,
                    fresh.total_reviews,
                    fresh.correct_count,
                    fresh.incorrect_count,
                    now.to_rfc3339(),
                    now.to_rfc3339(),
                ],
            )?;
        }

        self.get_card(user_id, card_id, deck_id)?
            .ok_or_else(|| StorageError::NotFound(Self::record_key(user_id, deck_id, card_id)))
    }

    // ========================================================================
    // APPLY REVIEW
    // ========================================================================

    /// Grade one recall and persist the updated record.
    pub fn apply_review(&self, input: &ApplyReviewInput) -> Result<ReviewOutcome> {
        self.apply_review_at(input, Utc::now())
    }

    /// [`apply_review`](Self::apply_review) with an injected clock.
    ///
    /// Validation happens before any state change. The read-modify-write
    /// cycle runs inside one IMMEDIATE transaction on the writer connection;
    /// a replayed `request_id` returns the current record without grading
    /// the card a second time.
    pub fn apply_review_at(
        &self,
        input: &ApplyReviewInput,
        now: DateTime<Utc>,
    ) -> Result<ReviewOutcome> {
        Self::validate_id(&input.user_id, "userId")?;
        Self::validate_id(&input.card_id, "cardId")?;
        Self::validate_id(&input.deck_id, "deckId")?;

        let quality = Quality::from_i32(input.quality).ok_or_else(|| {
            StorageError::InvalidArgument(format!(
                "quality must be between 0 and 5, got {}",
                input.quality
            ))
        })?;

        if let Some(request_id) = &input.request_id {
            Uuid::parse_str(request_id).map_err(|_| {
                StorageError::InvalidArgument("requestId must be a valid UUID".to_string())
            })?;
        }

        let mut attempts = 0;
        loop {
            match self.try_apply_review(input, quality, now) {
                Err(StorageError::Database(e)) if Self::is_busy(&e) => {
                    if attempts >= MAX_WRITE_RETRIES {
                        return Err(StorageError::Busy(Self::record_key(
                            &input.user_id,
                            &input.deck_id,
                            &input.card_id,
                        )));
                    }
                    attempts += 1;
                    tracing::warn!(
                        user_id = %input.user_id,
                        card_id = %input.card_id,
                        attempt = attempts,
                        "review write hit contention, retrying"
                    );
                }
                other => return other,
            }
        }
    }

    fn try_apply_review(
        &self,
        input: &ApplyReviewInput,
        quality: Quality,
        now: DateTime<Utc>,
    ) -> Result<ReviewOutcome> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))?;
        let tx = writer.transaction_with_behavior(TransactionBehavior::Immediate)?;

        // Idempotent replay: a request id we have already logged means this
        // grading event was applied; hand back the record as it stands.
        if let Some(request_id) = &input.request_id {
            let seen: Option<String> = tx
                .query_row(
                    "SELECT request_id FROM review_log WHERE request_id = ?1",
                    params![request_id],
                    |row| row.get(0),
                )
                .optional()?;

            if seen.is_some() {
                let card = Self::load_card(&tx, &input.user_id, &input.card_id, &input.deck_id)?
                    .ok_or_else(|| {
                        StorageError::NotFound(Self::record_key(
                            &input.user_id,
                            &input.deck_id,
                            &input.card_id,
                        ))
                    })?;
                tx.commit()?;
                tracing::debug!(request_id = %request_id, "replayed review request deduplicated");
                return Ok(ReviewOutcome {
                    card,
                    is_correct: quality.is_correct(),
                    deduplicated: true,
                });
            }
        }

        let existing = Self::load_card(&tx, &input.user_id, &input.card_id, &input.deck_id)?;
        let is_new = existing.is_none();
        let card = existing
            .unwrap_or_else(|| ReviewCard::new(&input.user_id, &input.card_id, &input.deck_id, now));

        let graded = self.grader.grade(&card.memory_state(), quality);
        let next_review = now + Duration::days(graded.state.interval_days as i64);
        let (correct_inc, incorrect_inc) = if graded.is_correct { (1, 0) } else { (0, 1) };

        if is_new {
            tx.execute(
                "INSERT INTO review_cards (
                    user_id, card_id, deck_id,
                    easiness_factor, interval_days, repetition,
                    last_review, next_review,
                    total_reviews, correct_count, incorrect_count,
                    created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    input.user_id,
                    input.card_id,
                    input.deck_id,
                    graded.state.easiness_factor,
                    graded.state.interval_days,
                    graded.state.repetition,
                    now.to_rfc3339(),
                    next_review.to_rfc3339(),
                    1,
                    correct_inc,
                    incorrect_inc,
                    now.to_rfc3339(),
                    now.to_rfc3339(),
                ],
            )?;
        } else {
            // Relative counter bumps: the persisted counters advance by
            // exactly one grading event no matter what was read.
            tx.execute(
                "UPDATE review_cards SET
                    easiness_factor = ?1,
                    interval_days = ?2,
                    repetition = ?3,
                    last_review = ?4,
                    next_review = ?5,
                    total_reviews = total_reviews + 1,
                    correct_count = correct_count + ?6,
                    incorrect_count = incorrect_count + ?7,
                    updated_at = ?8
                WHERE user_id = ?9 AND deck_id = ?10 AND card_id = ?11",
                params![
                    graded.state.easiness_factor,
                    graded.state.interval_days,
                    graded.state.repetition,
                    now.to_rfc3339(),
                    next_review.to_rfc3339(),
                    correct_inc,
                    incorrect_inc,
                    now.to_rfc3339(),
                    input.user_id,
                    input.deck_id,
                    input.card_id,
                ],
            )?;
        }

        // Audit trail; doubles as the idempotency ledger.
        let request_id = input
            .request_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        tx.execute(
            "INSERT INTO review_log (request_id, user_id, card_id, deck_id, quality, reviewed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                request_id,
                input.user_id,
                input.card_id,
                input.deck_id,
                quality.as_i32(),
                now.to_rfc3339(),
            ],
        )?;

        let card = Self::load_card(&tx, &input.user_id, &input.card_id, &input.deck_id)?
            .ok_or_else(|| {
                StorageError::NotFound(Self::record_key(
                    &input.user_id,
                    &input.deck_id,
                    &input.card_id,
                ))
            })?;
        tx.commit()?;

        tracing::debug!(
            user_id = %input.user_id,
            card_id = %input.card_id,
            quality = quality.as_i32(),
            interval_days = card.interval_days,
            repetition = card.repetition,
            "review applied"
        );

        Ok(ReviewOutcome {
            card,
            is_correct: graded.is_correct,
            deduplicated: false,
        })
    }

    // ========================================================================
    // DUE CARDS
    // ========================================================================

    /// Cards whose `next_review` has passed, most overdue first.
    pub fn get_due_cards(&self, query: &DueQuery) -> Result<DueCards> {
        self.get_due_cards_at(query, Utc::now())
    }

    /// [`get_due_cards`](Self::get_due_cards) with an injected clock.
    ///
    /// A record that has never been reviewed (`next_review` NULL) is not
    /// due; first exposure belongs to the deck flow.
    pub fn get_due_cards_at(&self, query: &DueQuery, now: DateTime<Utc>) -> Result<DueCards> {
        Self::validate_id(&query.user_id, "userId")?;
        if let Some(deck_id) = &query.deck_id {
            Self::validate_id(deck_id, "deckId")?;
        }
        if query.limit <= 0 {
            return Err(StorageError::InvalidArgument(format!(
                "limit must be positive, got {}",
                query.limit
            )));
        }
        let limit = query.limit.min(MAX_DUE_LIMIT);
        let now_str = now.to_rfc3339();

        let reader = self
            .reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;

        let total_due: i64 = reader.query_row(
            "SELECT COUNT(*) FROM review_cards
             WHERE user_id = ?1
               AND (?2 IS NULL OR deck_id = ?2)
               AND next_review IS NOT NULL
               AND next_review <= ?3",
            params![query.user_id, query.deck_id, now_str],
            |row| row.get(0),
        )?;

        let mut stmt = reader.prepare(
            "SELECT * FROM review_cards
             WHERE user_id = ?1
               AND (?2 IS NULL OR deck_id = ?2)
               AND next_review IS NOT NULL
               AND next_review <= ?3
             ORDER BY next_review ASC
             LIMIT ?4",
        )?;

        let rows = stmt.query_map(
            params![query.user_id, query.deck_id, now_str, limit],
            |row| Self::row_to_card(row),
        )?;

        let mut cards = Vec::new();
        for card in rows {
            cards.push(card?);
        }

        Ok(DueCards { cards, total_due })
    }

    // ========================================================================
    // POINT LOOKUP
    // ========================================================================

    /// Fetch one scheduling record; `Ok(None)` when the user has never
    /// encountered the card.
    pub fn get_card(
        &self,
        user_id: &str,
        card_id: &str,
        deck_id: &str,
    ) -> Result<Option<ReviewCard>> {
        Self::validate_id(user_id, "userId")?;
        Self::validate_id(card_id, "cardId")?;
        Self::validate_id(deck_id, "deckId")?;

        let reader = self
            .reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;
        Self::load_card(&reader, user_id, card_id, deck_id)
    }

    // ========================================================================
    // SUMMARY
    // ========================================================================

    /// Read-only rollup over one user's records.
    pub fn get_summary(&self, user_id: &str) -> Result<ReviewSummary> {
        self.get_summary_at(user_id, Utc::now())
    }

    /// [`get_summary`](Self::get_summary) with an injected clock.
    pub fn get_summary_at(&self, user_id: &str, now: DateTime<Utc>) -> Result<ReviewSummary> {
        Self::validate_id(user_id, "userId")?;

        // "Due today" runs to the end of the current UTC day, not to `now`.
        let end_of_today = (now.date_naive() + Days::new(1))
            .and_time(NaiveTime::MIN)
            .and_utc();

        let reader = self
            .reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;

        let total_cards: i64 = reader.query_row(
            "SELECT COUNT(*) FROM review_cards WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;

        let due_today: i64 = reader.query_row(
            "SELECT COUNT(*) FROM review_cards
             WHERE user_id = ?1 AND next_review IS NOT NULL AND next_review < ?2",
            params![user_id, end_of_today.to_rfc3339()],
            |row| row.get(0),
        )?;

        let mastered: i64 = reader.query_row(
            "SELECT COUNT(*) FROM review_cards WHERE user_id = ?1 AND repetition >= ?2",
            params![user_id, MASTERY_THRESHOLD],
            |row| row.get(0),
        )?;

        // Cards never reviewed fall in neither bucket.
        let learning: i64 = reader.query_row(
            "SELECT COUNT(*) FROM review_cards
             WHERE user_id = ?1 AND total_reviews > 0 AND repetition < ?2",
            params![user_id, MASTERY_THRESHOLD],
            |row| row.get(0),
        )?;

        Ok(ReviewSummary {
            total_cards,
            due_today,
            mastered,
            learning,
        })
    }

    // ========================================================================
    // HELPERS
    // ========================================================================

    fn record_key(user_id: &str, deck_id: &str, card_id: &str) -> String {
        format!("{}/{}/{}", user_id, deck_id, card_id)
    }

    fn is_busy(err: &rusqlite::Error) -> bool {
        matches!(
            err,
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::DatabaseBusy
                    || e.code == rusqlite::ErrorCode::DatabaseLocked
        )
    }

    fn load_card(
        conn: &Connection,
        user_id: &str,
        card_id: &str,
        deck_id: &str,
    ) -> Result<Option<ReviewCard>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM review_cards
             WHERE user_id = ?1 AND deck_id = ?2 AND card_id = ?3",
        )?;

        let card = stmt
            .query_row(params![user_id, deck_id, card_id], |row| {
                Self::row_to_card(row)
            })
            .optional()?;
        Ok(card)
    }

    /// Parse RFC3339 timestamp
    fn parse_timestamp(value: &str, field_name: &str) -> rusqlite::Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        format!("Invalid {} timestamp '{}': {}", field_name, value, e),
                    )),
                )
            })
    }

    /// Convert a row to ReviewCard
    fn row_to_card(row: &rusqlite::Row) -> rusqlite::Result<ReviewCard> {
        let created_at: String = row.get("created_at")?;
        let updated_at: String = row.get("updated_at")?;
        let last_review: Option<String> = row.get("last_review")?;
        let next_review: Option<String> = row.get("next_review")?;

        let created_at = Self::parse_timestamp(&created_at, "created_at")?;
        let updated_at = Self::parse_timestamp(&updated_at, "updated_at")?;

        let last_review = last_review.and_then(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        });

        let next_review = next_review.and_then(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        });

        Ok(ReviewCard {
            user_id: row.get("user_id")?,
            card_id: row.get("card_id")?,
            deck_id: row.get("deck_id")?,
            easiness_factor: row.get("easiness_factor")?,
            interval_days: row.get("interval_days")?,
            repetition: row.get("repetition")?,
            last_review,
            next_review,
            total_reviews: row.get("total_reviews")?,
            correct_count: row.get("correct_count")?,
            incorrect_count: row.get("incorrect_count")?,
            created_at,
            updated_at,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
