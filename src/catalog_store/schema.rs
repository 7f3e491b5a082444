//! SQLite schema for the catalog collections.
//!
//! Each collection keeps the full entity as a JSON document plus a few
//! denormalized columns for filtering and sorting. The UNIQUE index on
//! `ref_id` (NULLs exempt) is what makes backfill upserts race-free:
//! concurrent `INSERT OR IGNORE` batches for the same provider entity
//! cannot produce duplicates.

pub const CATALOG_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS tracks (
    id TEXT PRIMARY KEY,
    ref_id TEXT,
    name TEXT NOT NULL,
    album_ref_id TEXT,
    popularity INTEGER,
    doc TEXT NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_tracks_ref_id ON tracks(ref_id);
CREATE INDEX IF NOT EXISTS idx_tracks_album_ref_id ON tracks(album_ref_id);
CREATE INDEX IF NOT EXISTS idx_tracks_name ON tracks(name);

CREATE TABLE IF NOT EXISTS albums (
    id TEXT PRIMARY KEY,
    ref_id TEXT,
    name TEXT NOT NULL,
    popularity INTEGER,
    doc TEXT NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_albums_ref_id ON albums(ref_id);
CREATE INDEX IF NOT EXISTS idx_albums_name ON albums(name);

CREATE TABLE IF NOT EXISTS artists (
    id TEXT PRIMARY KEY,
    ref_id TEXT,
    name TEXT NOT NULL,
    popularity INTEGER,
    doc TEXT NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_artists_ref_id ON artists(ref_id);
CREATE INDEX IF NOT EXISTS idx_artists_name ON artists(name);
"#;
