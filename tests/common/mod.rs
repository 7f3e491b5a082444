//! Shared fixtures for integration tests: a scripted in-memory provider
//! and builders for provider-shaped entities.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use beatsync_server::provider::{
    CatalogProvider, ProviderAlbum, ProviderArtist, ProviderArtistRef, ProviderError,
    ProviderImage, ProviderKind, ProviderPage, ProviderSearchResponse, ProviderTrack,
};

// =============================================================================
// Entity builders
// =============================================================================

pub fn provider_artist(id: &str, name: &str, genres: &[&str], popularity: u32) -> ProviderArtist {
    ProviderArtist {
        id: id.to_string(),
        name: name.to_string(),
        genres: genres.iter().map(|g| g.to_string()).collect(),
        images: vec![ProviderImage {
            url: format!("https://img.example/artist/{id}"),
            width: Some(320),
            height: Some(320),
        }],
        popularity: Some(popularity),
    }
}

pub fn provider_album(id: &str, name: &str, artists: &[&ProviderArtist]) -> ProviderAlbum {
    ProviderAlbum {
        id: id.to_string(),
        name: name.to_string(),
        release_date: "2018-06-15".to_string(),
        images: vec![ProviderImage {
            url: format!("https://img.example/album/{id}"),
            width: Some(640),
            height: Some(640),
        }],
        artists: artists
            .iter()
            .map(|artist| ProviderArtistRef {
                id: artist.id.clone(),
                name: artist.name.clone(),
            })
            .collect(),
        total_tracks: 10,
        popularity: Some(55),
        album_type: Some("album".to_string()),
    }
}

pub fn provider_track(
    id: &str,
    name: &str,
    popularity: u32,
    album: &ProviderAlbum,
    artists: &[&ProviderArtist],
) -> ProviderTrack {
    ProviderTrack {
        id: id.to_string(),
        name: name.to_string(),
        preview_url: Some(format!("https://cdn.example/{id}")),
        duration_ms: 200_000,
        disc_number: 1,
        track_number: 1,
        explicit: false,
        popularity: Some(popularity),
        album: Some(album.clone()),
        artists: artists
            .iter()
            .map(|artist| ProviderArtistRef {
                id: artist.id.clone(),
                name: artist.name.clone(),
            })
            .collect(),
    }
}

// =============================================================================
// Scripted provider
// =============================================================================

/// In-memory stand-in for the external catalog. Search matches on a
/// case-insensitive name substring after stripping the `kind:` prefix the
/// specializations prepend; listings slice by offset/limit like the real
/// API. Every method bumps `calls`, which is what the cache-hit tests
/// watch.
#[derive(Default)]
pub struct FakeProvider {
    pub tracks: Vec<ProviderTrack>,
    pub albums: Vec<ProviderAlbum>,
    pub artists: Vec<ProviderArtist>,
    pub calls: AtomicUsize,
}

impl FakeProvider {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn needle(query: &str) -> String {
        query
            .split_once(':')
            .map(|(_, rest)| rest)
            .unwrap_or(query)
            .to_lowercase()
    }

    fn page<T: Clone>(matches: Vec<T>, offset: usize, limit: usize) -> Vec<T> {
        matches.into_iter().skip(offset).take(limit).collect()
    }
}

#[async_trait]
impl CatalogProvider for FakeProvider {
    async fn search(
        &self,
        query: &str,
        kinds: &[ProviderKind],
        offset: usize,
        limit: usize,
    ) -> Result<ProviderSearchResponse, ProviderError> {
        self.bump();
        let needle = Self::needle(query);
        let mut response = ProviderSearchResponse::default();
        for kind in kinds {
            match kind {
                ProviderKind::Track => {
                    let matches: Vec<_> = self
                        .tracks
                        .iter()
                        .filter(|t| t.name.to_lowercase().contains(&needle))
                        .cloned()
                        .collect();
                    response.tracks = Some(ProviderPage {
                        items: Self::page(matches, offset, limit),
                    });
                }
                ProviderKind::Album => {
                    let matches: Vec<_> = self
                        .albums
                        .iter()
                        .filter(|a| a.name.to_lowercase().contains(&needle))
                        .cloned()
                        .collect();
                    response.albums = Some(ProviderPage {
                        items: Self::page(matches, offset, limit),
                    });
                }
                ProviderKind::Artist => {
                    let matches: Vec<_> = self
                        .artists
                        .iter()
                        .filter(|a| a.name.to_lowercase().contains(&needle))
                        .cloned()
                        .collect();
                    response.artists = Some(ProviderPage {
                        items: Self::page(matches, offset, limit),
                    });
                }
            }
        }
        Ok(response)
    }

    async fn artist(&self, id: &str) -> Result<ProviderArtist, ProviderError> {
        self.bump();
        self.artists
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| ProviderError::RequestFailed(format!("no artist {id}")))
    }

    async fn artists(&self, ids: &[String]) -> Result<Vec<ProviderArtist>, ProviderError> {
        self.bump();
        Ok(self
            .artists
            .iter()
            .filter(|a| ids.contains(&a.id))
            .cloned()
            .collect())
    }

    async fn album(&self, id: &str) -> Result<ProviderAlbum, ProviderError> {
        self.bump();
        self.albums
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| ProviderError::RequestFailed(format!("no album {id}")))
    }

    async fn album_tracks(
        &self,
        album_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<ProviderTrack>, ProviderError> {
        self.bump();
        let matches: Vec<ProviderTrack> = self
            .tracks
            .iter()
            .filter(|t| t.album.as_ref().map(|a| a.id.as_str()) == Some(album_id))
            .cloned()
            .map(|mut track| {
                // Album-tracks listings carry neither the album nor a
                // popularity score, same as the real endpoint.
                track.album = None;
                track.popularity = None;
                track
            })
            .collect();
        Ok(Self::page(matches, offset, limit))
    }

    async fn artist_albums(
        &self,
        artist_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<ProviderAlbum>, ProviderError> {
        self.bump();
        let matches: Vec<_> = self
            .albums
            .iter()
            .filter(|album| album.artists.iter().any(|a| a.id == artist_id))
            .cloned()
            .collect();
        Ok(Self::page(matches, offset, limit))
    }
}
