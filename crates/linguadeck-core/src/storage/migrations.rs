//! Database Migrations
//!
//! Schema migration definitions for the storage layer.

/// Migration definitions
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema with per-user review cards",
        up: MIGRATION_V1_UP,
    },
    Migration {
        version: 2,
        description: "Review log for auditing and idempotent replay",
        up: MIGRATION_V2_UP,
    },
];

/// A database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Version number
    pub version: u32,
    /// Description
    pub description: &'static str,
    /// SQL to apply
    pub up: &'static str,
}

/// V1: Initial schema
const MIGRATION_V1_UP: &str = r#"
CREATE TABLE IF NOT EXISTS review_cards (
    user_id TEXT NOT NULL,
    card_id TEXT NOT NULL,
    deck_id TEXT NOT NULL,

    -- SM-2 state
    easiness_factor REAL NOT NULL DEFAULT 2.5,
    interval_days INTEGER NOT NULL DEFAULT 0,
    repetition INTEGER NOT NULL DEFAULT 0,

    -- Scheduling; next_review is NULL until the first graded review
    last_review TEXT,
    next_review TEXT,

    -- Lifetime counters
    total_reviews INTEGER NOT NULL DEFAULT 0,
    correct_count INTEGER NOT NULL DEFAULT 0,
    incorrect_count INTEGER NOT NULL DEFAULT 0,

    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,

    PRIMARY KEY (user_id, deck_id, card_id)
);

-- The due-card query filters by user and orders by next_review
CREATE INDEX IF NOT EXISTS idx_cards_user_next_review ON review_cards(user_id, next_review);
CREATE INDEX IF NOT EXISTS idx_cards_user_deck ON review_cards(user_id, deck_id);
CREATE INDEX IF NOT EXISTS idx_cards_repetition ON review_cards(user_id, repetition);

-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);

INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, datetime('now'));
"#;

/// V2: One row per accepted grading event. The request_id primary key is
/// what makes a replayed ApplyReview a no-op instead of a double count.
const MIGRATION_V2_UP: &str = r#"
CREATE TABLE IF NOT EXISTS review_log (
    request_id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    card_id TEXT NOT NULL,
    deck_id TEXT NOT NULL,
    quality INTEGER NOT NULL,
    reviewed_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_review_log_user ON review_log(user_id, reviewed_at);

UPDATE schema_version SET version = 2, applied_at = datetime('now');
"#;

/// Get current schema version from database
pub fn get_current_version(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .or(Ok(0))
}

/// Apply pending migrations
pub fn apply_migrations(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    let current_version = get_current_version(conn)?;
    let mut applied = 0;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            tracing::info!(
                "Applying migration v{}: {}",
                migration.version,
                migration.description
            );

            // execute_batch handles the multi-statement SQL
            conn.execute_batch(migration.up)?;

            applied += 1;
        }
    }

    Ok(applied)
}
