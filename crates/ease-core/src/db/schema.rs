//! SQLite schema for the local journal.
//!
//! - `worries` and `challenges` hold one row per record; list columns are
//!   JSON arrays and timestamps are UTC microseconds (`*_us`)
//! - row order (`rowid`) is insertion order and is what the store exposes
//! - `settings` and `wizard_draft` are single-row tables
//! - `remote_links` maps local worry ids to ids assigned by the web service
//! - `store_meta` records the schema version alongside `PRAGMA user_version`

/// Migration v1: journal tables and metadata.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS worries (
    worry_id TEXT PRIMARY KEY,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    description TEXT NOT NULL,
    category TEXT NOT NULL CHECK (length(trim(category)) > 0),
    body_responses_json TEXT NOT NULL DEFAULT '[]',
    intensity INTEGER NOT NULL CHECK (intensity BETWEEN 1 AND 10),
    created_at_us INTEGER NOT NULL,
    is_released INTEGER NOT NULL DEFAULT 0 CHECK (is_released IN (0, 1)),
    released_at_us INTEGER,
    CHECK (
        (is_released = 0 AND released_at_us IS NULL)
        OR (is_released = 1 AND released_at_us IS NOT NULL)
    )
);

CREATE TABLE IF NOT EXISTS challenges (
    challenge_id TEXT PRIMARY KEY,
    worry_id TEXT NOT NULL,
    original_thought TEXT NOT NULL,
    evidence_for_json TEXT NOT NULL DEFAULT '[]',
    evidence_against_json TEXT NOT NULL DEFAULT '[]',
    probability_rating INTEGER NOT NULL CHECK (probability_rating BETWEEN 0 AND 100),
    helpfulness_rating INTEGER NOT NULL CHECK (helpfulness_rating BETWEEN 1 AND 10),
    distortions_json TEXT NOT NULL DEFAULT '[]',
    reframed_thought TEXT NOT NULL DEFAULT '',
    is_completed INTEGER NOT NULL DEFAULT 0 CHECK (is_completed IN (0, 1)),
    completed_at_us INTEGER,
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS settings (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    daily_worry_time INTEGER NOT NULL CHECK (daily_worry_time BETWEEN 1 AND 1440),
    notifications INTEGER NOT NULL CHECK (notifications IN (0, 1)),
    reflection_time TEXT NOT NULL,
    custom_categories_json TEXT NOT NULL DEFAULT '[]'
);

CREATE TABLE IF NOT EXISTS wizard_draft (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    draft_json TEXT NOT NULL,
    saved_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL,
    created_at_us INTEGER NOT NULL DEFAULT 0
);

INSERT OR IGNORE INTO store_meta (id, schema_version, created_at_us)
VALUES (1, 1, CAST((julianday('now') - 2440587.5) * 86400000000 AS INTEGER));

CREATE INDEX IF NOT EXISTS idx_worries_released_created
    ON worries(is_released, created_at_us DESC);

CREATE INDEX IF NOT EXISTS idx_challenges_worry
    ON challenges(worry_id);

CREATE INDEX IF NOT EXISTS idx_challenges_completed
    ON challenges(is_completed);
";

/// Migration v2: server ids for worries pushed to the web service.
pub const MIGRATION_V2_SQL: &str = r"
CREATE TABLE IF NOT EXISTS remote_links (
    worry_id TEXT PRIMARY KEY,
    remote_id TEXT NOT NULL CHECK (length(trim(remote_id)) > 0),
    linked_at_us INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_remote_links_remote
    ON remote_links(remote_id);
";

/// Indexes the read paths depend on.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_worries_released_created",
    "idx_challenges_worry",
    "idx_challenges_completed",
    "idx_remote_links_remote",
];
