//! SQL schema for the Taleweave SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Only last_activity_at and is_active are ever updated.
CREATE TABLE IF NOT EXISTS stories (
    story_id         TEXT PRIMARY KEY,
    title            TEXT NOT NULL,
    slug             TEXT NOT NULL UNIQUE,  -- hidden stories keep theirs
    description      TEXT NOT NULL,
    starter_text     TEXT NOT NULL,
    created_at       TEXT NOT NULL,         -- RFC 3339 UTC, fixed width
    last_activity_at TEXT NOT NULL,
    is_active        INTEGER NOT NULL DEFAULT 1
);

-- Lines are append-only; rows are deleted only to undo a failed append.
CREATE TABLE IF NOT EXISTS story_lines (
    line_id         TEXT PRIMARY KEY,
    story_id        TEXT NOT NULL REFERENCES stories(story_id),
    text            TEXT NOT NULL,
    timestamp       TEXT NOT NULL,
    ip_hash         TEXT NOT NULL,
    is_starter_text INTEGER NOT NULL DEFAULT 0
);

CREATE UNIQUE INDEX IF NOT EXISTS story_lines_one_starter_idx
    ON story_lines(story_id) WHERE is_starter_text = 1;
CREATE INDEX IF NOT EXISTS story_lines_story_idx    ON story_lines(story_id, timestamp);
CREATE INDEX IF NOT EXISTS stories_activity_idx     ON stories(is_active, last_activity_at);

PRAGMA user_version = 1;
";
