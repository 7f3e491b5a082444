//! Catalog entity models shared by the store, the normalizer and the HTTP
//! layer.
//!
//! Every entity carries a locally generated `id` plus an optional `ref_id`,
//! the stable identifier of the same entity at the external catalog
//! provider. `ref_id` is `None` only for entities with no provider origin
//! (user-submitted tracks, hand-entered albums).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generate a fresh local id.
pub fn new_local_id() -> String {
    Uuid::new_v4().to_string()
}

/// Image reference as delivered by the catalog provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// A contributing artist embedded in tracks and albums.
///
/// `ref_id` is the provider identifier; the referenced artist may not exist
/// in the local `artists` collection yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRef {
    pub name: String,
    pub ref_id: String,
}

/// Where a track came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackSource {
    /// Backfilled from the external catalog provider.
    Catalog,
    /// Submitted by a user; has no `ref_id`.
    Upload,
}

/// Album type classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlbumKind {
    Album,
    Single,
    Ep,
    Compilation,
}

impl AlbumKind {
    /// Parse the provider's `album_type` string. Unknown values fall back to
    /// `Album`.
    pub fn from_provider_str(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "single" => AlbumKind::Single,
            "ep" => AlbumKind::Ep,
            "compilation" => AlbumKind::Compilation,
            _ => AlbumKind::Album,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub ref_id: Option<String>,
    pub name: String,
    /// Playable/preview URL; the provider does not expose one for every
    /// track.
    pub url: Option<String>,
    pub cover_art: Vec<Image>,
    /// Release date as a string, at whatever precision the provider gave
    /// ("2020", "2020-05" or "2020-05-01").
    pub release_date: String,
    pub duration_ms: u64,
    pub disc_number: u32,
    pub track_number: u32,
    /// Denormalized copy of the owning album's name and provider id.
    pub album_name: String,
    pub album_ref_id: Option<String>,
    pub artists: Vec<ArtistRef>,
    /// Union of the contributing artists' genres.
    pub genres: Vec<String>,
    pub popularity: Option<u32>,
    pub explicit: bool,
    pub source: TrackSource,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub ref_id: Option<String>,
    pub name: String,
    pub release_date: String,
    pub images: Vec<Image>,
    pub artists: Vec<ArtistRef>,
    pub total_tracks: u32,
    pub popularity: Option<u32>,
    pub kind: AlbumKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub ref_id: Option<String>,
    pub name: String,
    pub genres: Vec<String>,
    pub images: Vec<Image>,
    pub popularity: Option<u32>,
}

/// Sort key for paginated local reads.
///
/// `Popularity` sorts descending (most popular first, entities without a
/// popularity score last); `Name` sorts ascending, case-insensitive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Popularity,
    Name,
}

// =============================================================================
// Read filters
// =============================================================================

/// Filter for paginated track reads.
#[derive(Clone, Debug)]
pub enum TrackFilter {
    /// Case-insensitive substring match on the track name. An empty needle
    /// matches everything.
    NameContains(String),
    /// Tracks belonging to the album with this provider id.
    AlbumRefId(String),
}

/// Filter for paginated album reads.
#[derive(Clone, Debug)]
pub enum AlbumFilter {
    NameContains(String),
    /// Albums whose artist list contains this provider id.
    ByArtistRefId(String),
}

/// Filter for paginated artist reads.
#[derive(Clone, Debug)]
pub enum ArtistFilter {
    NameContains(String),
}

// =============================================================================
// Update patches
// =============================================================================

/// User-editable track fields; `None` leaves the field unchanged.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TrackPatch {
    pub name: Option<String>,
    pub artists: Option<Vec<ArtistRef>>,
    pub release_date: Option<String>,
    pub disc_number: Option<u32>,
    pub track_number: Option<u32>,
    pub genres: Option<Vec<String>>,
}

/// User-editable album fields.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AlbumPatch {
    pub name: Option<String>,
    pub artists: Option<Vec<ArtistRef>>,
    pub release_date: Option<String>,
    pub total_tracks: Option<u32>,
}

/// User-editable artist fields.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ArtistPatch {
    pub name: Option<String>,
    pub genres: Option<Vec<String>>,
    pub popularity: Option<u32>,
}
