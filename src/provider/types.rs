//! Serde models for the provider's wire format.
//!
//! These mirror what the provider actually sends; mapping to local catalog
//! shapes happens in `crate::normalize`, not here.

use serde::Deserialize;

/// Entity kinds the provider can search for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    Track,
    Album,
    Artist,
}

impl ProviderKind {
    pub fn as_query_param(&self) -> &'static str {
        match self {
            ProviderKind::Track => "track",
            ProviderKind::Album => "album",
            ProviderKind::Artist => "artist",
        }
    }
}

/// One page of a paginated listing: `{"items": [...]}`.
///
/// The provider sends no has-more flag; a page with fewer items than the
/// requested limit is the last one.
#[derive(Clone, Debug, Deserialize)]
pub struct ProviderPage<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

/// Per-kind search result; only the requested kinds are present.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProviderSearchResponse {
    pub tracks: Option<ProviderPage<ProviderTrack>>,
    pub albums: Option<ProviderPage<ProviderAlbum>>,
    pub artists: Option<ProviderPage<ProviderArtist>>,
}

/// Artist stub embedded in tracks and albums. Carries no genres; a full
/// lookup is needed for those.
#[derive(Clone, Debug, Deserialize)]
pub struct ProviderArtistRef {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ProviderImage {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ProviderArtist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub images: Vec<ProviderImage>,
    #[serde(default)]
    pub popularity: Option<u32>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ProviderAlbum {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub images: Vec<ProviderImage>,
    #[serde(default)]
    pub artists: Vec<ProviderArtistRef>,
    #[serde(default)]
    pub total_tracks: u32,
    #[serde(default)]
    pub popularity: Option<u32>,
    #[serde(default)]
    pub album_type: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ProviderTrack {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default = "default_position")]
    pub disc_number: u32,
    #[serde(default = "default_position")]
    pub track_number: u32,
    #[serde(default)]
    pub explicit: bool,
    /// Absent on album-tracks listings.
    #[serde(default)]
    pub popularity: Option<u32>,
    /// Absent on album-tracks listings; the caller already knows the album.
    #[serde(default)]
    pub album: Option<ProviderAlbum>,
    #[serde(default)]
    pub artists: Vec<ProviderArtistRef>,
}

fn default_position() -> u32 {
    1
}

/// Wrapper around batch artist lookups: `{"artists": [...]}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ArtistsEnvelope {
    #[serde(default)]
    pub artists: Vec<ProviderArtist>,
}

/// Client-credentials grant response.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenGrant {
    pub access_token: String,
    pub expires_in: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artists_envelope_tolerates_missing_field() {
        let envelope: ArtistsEnvelope = serde_json::from_str("{}").unwrap();
        assert!(envelope.artists.is_empty());

        let envelope: ArtistsEnvelope = serde_json::from_str(
            r#"{"artists": [{"id": "a1", "name": "Somebody", "genres": ["jazz"]}]}"#,
        )
        .unwrap();
        assert_eq!(envelope.artists.len(), 1);
        assert_eq!(envelope.artists[0].genres, vec!["jazz"]);
    }

    #[test]
    fn album_tracks_item_without_album_or_popularity() {
        let track: ProviderTrack = serde_json::from_str(
            r#"{"id": "t1", "name": "Intro", "duration_ms": 61000,
                "artists": [{"id": "a1", "name": "Somebody"}]}"#,
        )
        .unwrap();
        assert!(track.album.is_none());
        assert!(track.popularity.is_none());
        assert_eq!(track.disc_number, 1);
        assert_eq!(track.track_number, 1);
    }
}
