//! Local catalog storage.
//!
//! Three independent collections (tracks, albums, artists), each keyed by a
//! local id and correlated to the external provider through an optional
//! `ref_id`. Reads are filtered/sorted/paginated; writes are single inserts
//! (manual management) or batch upserts keyed on `ref_id` (search backfill).

mod models;
mod schema;
mod store;
mod trait_def;

pub use models::{
    new_local_id, Album, AlbumFilter, AlbumKind, AlbumPatch, Artist, ArtistFilter, ArtistPatch,
    ArtistRef, Image, SortKey, Track, TrackFilter, TrackPatch, TrackSource,
};
pub use store::SqliteCatalogStore;
pub use trait_def::CatalogStore;

use thiserror::Error;

/// Errors surfaced by the storage layer.
///
/// A zero-match read is `Ok` with an empty result, never an error; these
/// variants always mean the operation itself failed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage operation failed: {0}")]
    Operation(#[from] rusqlite::Error),

    #[error("stored document is malformed: {0}")]
    Corrupt(#[from] serde_json::Error),
}
