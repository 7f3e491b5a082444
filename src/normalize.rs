//! Mapping from provider wire shapes to local catalog entities.
//!
//! The mapping functions are pure; the one awaitable piece is
//! [`contributing_artists`], which resolves the full artist records (and
//! with them the genre lists) for a whole page of tracks or albums in a
//! single batch lookup. Enrichment failures abort the page rather than
//! letting half-normalized records through.

use std::collections::HashMap;

use thiserror::Error;

use crate::catalog_store::{
    new_local_id, Album, AlbumKind, Artist, ArtistRef, Image, Track, TrackSource,
};
use crate::provider::{
    CatalogProvider, ProviderAlbum, ProviderArtist, ProviderArtistRef, ProviderError,
    ProviderImage, ProviderTrack,
};

/// A required secondary lookup against the provider failed; the entities
/// being normalized cannot be completed.
#[derive(Debug, Error)]
#[error("artist enrichment lookup failed: {source}")]
pub struct EnrichmentError {
    #[from]
    source: ProviderError,
}

/// The album fields a track denormalizes: art and release metadata come
/// from the owning album, not from the track itself.
#[derive(Clone, Debug)]
pub struct OwningAlbum {
    pub ref_id: String,
    pub name: String,
    pub images: Vec<Image>,
    pub release_date: String,
}

impl OwningAlbum {
    pub fn from_provider(album: &ProviderAlbum) -> Self {
        Self {
            ref_id: album.id.clone(),
            name: album.name.clone(),
            images: images_from_provider(&album.images),
            release_date: album.release_date.clone(),
        }
    }

    pub fn from_local(album: &Album) -> Self {
        Self {
            // A locally stored album without a provider id never owns
            // catalog-sourced tracks, so this path keeps the id it has.
            ref_id: album.ref_id.clone().unwrap_or_default(),
            name: album.name.clone(),
            images: album.images.clone(),
            release_date: album.release_date.clone(),
        }
    }
}

fn images_from_provider(images: &[ProviderImage]) -> Vec<Image> {
    images
        .iter()
        .map(|img| Image {
            url: img.url.clone(),
            width: img.width,
            height: img.height,
        })
        .collect()
}

fn artist_refs_from_provider(artists: &[ProviderArtistRef]) -> Vec<ArtistRef> {
    artists
        .iter()
        .map(|artist| ArtistRef {
            name: artist.name.clone(),
            ref_id: artist.id.clone(),
        })
        .collect()
}

pub fn artist_from_provider(artist: &ProviderArtist) -> Artist {
    Artist {
        id: new_local_id(),
        ref_id: Some(artist.id.clone()),
        name: artist.name.clone(),
        genres: artist.genres.clone(),
        images: images_from_provider(&artist.images),
        popularity: artist.popularity,
    }
}

pub fn album_from_provider(album: &ProviderAlbum) -> Album {
    Album {
        id: new_local_id(),
        ref_id: Some(album.id.clone()),
        name: album.name.clone(),
        release_date: album.release_date.clone(),
        images: images_from_provider(&album.images),
        artists: artist_refs_from_provider(&album.artists),
        total_tracks: album.total_tracks,
        popularity: album.popularity,
        kind: album
            .album_type
            .as_deref()
            .map(AlbumKind::from_provider_str)
            .unwrap_or(AlbumKind::Album),
    }
}

/// Normalize a provider track against its owning album and the genre union
/// of its contributing artists.
pub fn track_from_provider(track: &ProviderTrack, album: &OwningAlbum, genres: Vec<String>) -> Track {
    Track {
        id: new_local_id(),
        ref_id: Some(track.id.clone()),
        name: track.name.clone(),
        url: track.preview_url.clone(),
        cover_art: album.images.clone(),
        release_date: album.release_date.clone(),
        duration_ms: track.duration_ms,
        disc_number: track.disc_number,
        track_number: track.track_number,
        album_name: album.name.clone(),
        album_ref_id: Some(album.ref_id.clone()),
        artists: artist_refs_from_provider(&track.artists),
        genres,
        popularity: track.popularity,
        explicit: track.explicit,
        source: TrackSource::Catalog,
    }
}

/// Resolve full artist records for every id in `artist_ids` with one batch
/// lookup. Returns a map keyed by provider artist id; ids the provider does
/// not recognize are simply absent from the map.
pub async fn contributing_artists(
    provider: &dyn CatalogProvider,
    artist_ids: &[String],
) -> Result<HashMap<String, ProviderArtist>, EnrichmentError> {
    if artist_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let artists = provider.artists(artist_ids).await?;
    Ok(artists
        .into_iter()
        .map(|artist| (artist.id.clone(), artist))
        .collect())
}

/// Union of the contributing artists' genres, first-seen order, no
/// duplicates. Artists missing from `by_id` contribute nothing.
pub fn genre_union(
    artists: &[ProviderArtistRef],
    by_id: &HashMap<String, ProviderArtist>,
) -> Vec<String> {
    let mut genres: Vec<String> = Vec::new();
    for artist_ref in artists {
        if let Some(artist) = by_id.get(&artist_ref.id) {
            for genre in &artist.genres {
                if !genres.contains(genre) {
                    genres.push(genre.clone());
                }
            }
        }
    }
    genres
}
