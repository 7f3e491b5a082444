//! CatalogStore trait definition.
//!
//! Abstracts the storage backend so the search layer and the HTTP layer can
//! be exercised against fakes or an in-memory database in tests.

use std::collections::HashSet;

use super::models::*;
use super::StoreError;

/// Trait for catalog storage backends.
///
/// Read operations distinguish "zero matches" (`Ok` with an empty value)
/// from "the read failed" (`Err`). Batch upserts are keyed on `ref_id` and
/// insert-if-absent: re-upserting an already stored entity is a no-op, which
/// makes backfill persistence idempotent and safe under concurrent requests.
pub trait CatalogStore: Send + Sync {
    // =========================================================================
    // Tracks
    // =========================================================================

    /// Filtered, sorted, paginated read over the track collection.
    fn find_tracks(
        &self,
        filter: &TrackFilter,
        sort: SortKey,
        limit: usize,
        skip: usize,
    ) -> Result<Vec<Track>, StoreError>;

    /// Get a track by local id.
    fn find_track(&self, id: &str) -> Result<Option<Track>, StoreError>;

    /// Insert a single track (manual catalog management).
    fn insert_track(&self, track: &Track) -> Result<(), StoreError>;

    /// Batch insert-if-absent keyed on `ref_id`. Returns how many rows were
    /// actually inserted.
    fn upsert_tracks(&self, tracks: &[Track]) -> Result<usize, StoreError>;

    /// Which of the given `ref_id`s already exist in the track collection.
    /// One query regardless of how many ids are probed.
    fn tracks_with_ref_ids(&self, ref_ids: &[String]) -> Result<HashSet<String>, StoreError>;

    /// Apply a partial update. Returns `false` if no track has this id.
    fn update_track(&self, id: &str, patch: &TrackPatch) -> Result<bool, StoreError>;

    /// Delete by local id. Returns `false` if no track has this id.
    fn delete_track(&self, id: &str) -> Result<bool, StoreError>;

    // =========================================================================
    // Albums
    // =========================================================================

    fn find_albums(
        &self,
        filter: &AlbumFilter,
        sort: SortKey,
        limit: usize,
        skip: usize,
    ) -> Result<Vec<Album>, StoreError>;

    fn find_album(&self, id: &str) -> Result<Option<Album>, StoreError>;

    /// Get an album by its provider id.
    fn find_album_by_ref_id(&self, ref_id: &str) -> Result<Option<Album>, StoreError>;

    fn insert_album(&self, album: &Album) -> Result<(), StoreError>;

    fn upsert_albums(&self, albums: &[Album]) -> Result<usize, StoreError>;

    fn albums_with_ref_ids(&self, ref_ids: &[String]) -> Result<HashSet<String>, StoreError>;

    fn update_album(&self, id: &str, patch: &AlbumPatch) -> Result<bool, StoreError>;

    fn delete_album(&self, id: &str) -> Result<bool, StoreError>;

    // =========================================================================
    // Artists
    // =========================================================================

    fn find_artists(
        &self,
        filter: &ArtistFilter,
        sort: SortKey,
        limit: usize,
        skip: usize,
    ) -> Result<Vec<Artist>, StoreError>;

    fn find_artist(&self, id: &str) -> Result<Option<Artist>, StoreError>;

    fn insert_artist(&self, artist: &Artist) -> Result<(), StoreError>;

    fn upsert_artists(&self, artists: &[Artist]) -> Result<usize, StoreError>;

    fn artists_with_ref_ids(&self, ref_ids: &[String]) -> Result<HashSet<String>, StoreError>;

    fn update_artist(&self, id: &str, patch: &ArtistPatch) -> Result<bool, StoreError>;

    fn delete_artist(&self, id: &str) -> Result<bool, StoreError>;
}
