//! SQLite schema definitions.

/// Current schema version for migrations.
pub const SCHEMA_VERSION: i32 = 1;

/// Complete schema for a collection database.
pub const SCHEMA: &str = r#"
-- Collection-wide scheduling preferences (JSON)
CREATE TABLE IF NOT EXISTS collection (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    config TEXT NOT NULL
);

-- Deck option groups (JSON)
CREATE TABLE IF NOT EXISTS deck_configs (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    config TEXT NOT NULL
);

-- Normal and filtered decks; kind holds the config id or filter definition
CREATE TABLE IF NOT EXISTS decks (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    kind TEXT NOT NULL,
    today_day INTEGER NOT NULL DEFAULT 0,
    today_new INTEGER NOT NULL DEFAULT 0,
    today_review INTEGER NOT NULL DEFAULT 0,
    today_millis INTEGER NOT NULL DEFAULT 0
);

-- Notes; tags are space separated
CREATE TABLE IF NOT EXISTS notes (
    id INTEGER PRIMARY KEY,
    fields TEXT NOT NULL,
    tags TEXT NOT NULL DEFAULT ''
);

-- Cards; due_kind tells how to read due and original_due
CREATE TABLE IF NOT EXISTS cards (
    id INTEGER PRIMARY KEY,
    note_id INTEGER NOT NULL REFERENCES notes(id),
    deck_id INTEGER NOT NULL,
    ordinal INTEGER NOT NULL,
    card_type TEXT NOT NULL,
    queue TEXT NOT NULL,
    due_kind TEXT NOT NULL,
    due INTEGER NOT NULL,
    interval INTEGER NOT NULL DEFAULT 0,
    ease_factor INTEGER NOT NULL DEFAULT 0,
    reps INTEGER NOT NULL DEFAULT 0,
    lapses INTEGER NOT NULL DEFAULT 0,
    left_packed INTEGER NOT NULL DEFAULT 0,
    original_due_kind TEXT,
    original_due INTEGER,
    original_deck_id INTEGER,
    flags INTEGER NOT NULL DEFAULT 0,
    modified INTEGER NOT NULL DEFAULT 0
);

-- Append-only answer log
CREATE TABLE IF NOT EXISTS revlog (
    id INTEGER PRIMARY KEY,
    card_id INTEGER NOT NULL,
    usn INTEGER NOT NULL,
    ease INTEGER NOT NULL,
    interval INTEGER NOT NULL,
    last_interval INTEGER NOT NULL,
    ease_factor INTEGER NOT NULL,
    time_taken_ms INTEGER NOT NULL,
    kind TEXT NOT NULL
);

-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_cards_deck_queue ON cards(deck_id, queue, due);
CREATE INDEX IF NOT EXISTS idx_cards_note ON cards(note_id);
CREATE INDEX IF NOT EXISTS idx_revlog_card ON revlog(card_id);
"#;
