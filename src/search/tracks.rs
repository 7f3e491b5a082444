//! Track specializations: search by name, browse by album.
//!
//! Both reuse the fetch-through algorithm; what differs is the local
//! filter, the provider call and where the owning album's art/release
//! metadata comes from. Track normalization always needs one batched
//! artist lookup per provider page for the genre union.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;

use crate::catalog_store::{Album, CatalogStore, SortKey, Track, TrackFilter};
use crate::normalize::{
    album_from_provider, artist_from_provider, contributing_artists, genre_union,
    track_from_provider, OwningAlbum,
};
use crate::provider::{CatalogProvider, ProviderKind, ProviderTrack};

use super::fetch_through::{satisfy_page, BackfillSource, FetchedPage, SatisfiedPage, SideEntities};
use super::{CatalogSearch, SearchError};

impl CatalogSearch {
    /// Search tracks by name.
    pub async fn tracks_by_name(
        &self,
        filter: &str,
        skip: usize,
    ) -> Result<SatisfiedPage<Track>, SearchError> {
        let source = Arc::new(TrackNameSource {
            store: self.store.clone(),
            provider: self.provider.clone(),
            filter: filter.to_string(),
            sort: self.sort.tracks,
        });
        satisfy_page(source, self.page_size, skip).await
    }

    /// Browse an album's tracks by the album's provider id.
    pub async fn tracks_by_album(
        &self,
        album_ref_id: &str,
        skip: usize,
    ) -> Result<SatisfiedPage<Track>, SearchError> {
        let source = Arc::new(AlbumTracksSource {
            store: self.store.clone(),
            provider: self.provider.clone(),
            album_ref_id: album_ref_id.to_string(),
            sort: self.sort.tracks,
            owning: tokio::sync::OnceCell::new(),
            pending_album: std::sync::Mutex::new(None),
        });
        satisfy_page(source, self.page_size, skip).await
    }
}

/// Normalize one provider page of tracks.
///
/// Resolves the full contributing artists with a single batch lookup (the
/// genre union needs them) and collects them, plus any embedded albums, as
/// side entities for persistence. When `owning` is given (album-tracks
/// browse) it supplies the album context for every track; otherwise each
/// track must embed its own album, and items that don't are dropped from
/// the page.
async fn normalize_track_page(
    provider: &dyn CatalogProvider,
    items: &[ProviderTrack],
    owning: Option<&OwningAlbum>,
) -> Result<(Vec<Track>, SideEntities), SearchError> {
    let mut artist_ids: Vec<String> = Vec::new();
    for item in items {
        for artist in &item.artists {
            if !artist_ids.contains(&artist.id) {
                artist_ids.push(artist.id.clone());
            }
        }
    }
    let artists_by_id: HashMap<_, _> = contributing_artists(provider, &artist_ids).await?;

    let mut extras = SideEntities::default();
    for artist in artists_by_id.values() {
        extras.push_artist(artist_from_provider(artist));
    }

    let mut tracks = Vec::with_capacity(items.len());
    for item in items {
        let album_ctx = match owning {
            Some(owning) => owning.clone(),
            None => {
                let Some(album) = &item.album else {
                    continue;
                };
                extras.push_album(album_from_provider(album));
                OwningAlbum::from_provider(album)
            }
        };
        let genres = genre_union(&item.artists, &artists_by_id);
        tracks.push(track_from_provider(item, &album_ctx, genres));
    }

    Ok((tracks, extras))
}

struct TrackNameSource {
    store: Arc<dyn CatalogStore>,
    provider: Arc<dyn CatalogProvider>,
    filter: String,
    sort: SortKey,
}

#[async_trait]
impl BackfillSource for TrackNameSource {
    type Entity = Track;

    fn read_local(&self, limit: usize, skip: usize) -> Result<Vec<Track>, SearchError> {
        Ok(self.store.find_tracks(
            &TrackFilter::NameContains(self.filter.clone()),
            self.sort,
            limit,
            skip,
        )?)
    }

    async fn fetch_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<FetchedPage<Track>, SearchError> {
        let response = self
            .provider
            .search(
                &format!("track:{}", self.filter),
                &[ProviderKind::Track],
                offset,
                limit,
            )
            .await?;
        let items = response.tracks.map(|page| page.items).unwrap_or_default();
        let raw_count = items.len();
        let (tracks, extras) =
            normalize_track_page(self.provider.as_ref(), &items, None).await?;
        Ok(FetchedPage {
            items: tracks,
            raw_count,
            extras,
        })
    }

    fn stored_ref_ids(&self, ref_ids: &[String]) -> Result<HashSet<String>, SearchError> {
        Ok(self.store.tracks_with_ref_ids(ref_ids)?)
    }

    fn persist(&self, entities: Vec<Track>, extras: SideEntities) -> Result<(), SearchError> {
        self.store.upsert_artists(&extras.artists)?;
        self.store.upsert_albums(&extras.albums)?;
        self.store.upsert_tracks(&entities)?;
        Ok(())
    }
}

struct AlbumTracksSource {
    store: Arc<dyn CatalogStore>,
    provider: Arc<dyn CatalogProvider>,
    album_ref_id: String,
    sort: SortKey,
    /// Resolved lazily on the first provider page, so a fully cached album
    /// browse never touches the provider.
    owning: tokio::sync::OnceCell<OwningAlbum>,
    /// Set when the owning album had to be fetched from the provider; it is
    /// drained into the first page's side entities so it gets persisted.
    pending_album: std::sync::Mutex<Option<Album>>,
}

impl AlbumTracksSource {
    async fn owning_album(&self) -> Result<&OwningAlbum, SearchError> {
        self.owning
            .get_or_try_init(|| async {
                if let Some(album) = self.store.find_album_by_ref_id(&self.album_ref_id)? {
                    return Ok(OwningAlbum::from_local(&album));
                }
                let fetched = self.provider.album(&self.album_ref_id).await?;
                let owning = OwningAlbum::from_provider(&fetched);
                *self.pending_album.lock().unwrap() = Some(album_from_provider(&fetched));
                Ok(owning)
            })
            .await
    }
}

#[async_trait]
impl BackfillSource for AlbumTracksSource {
    type Entity = Track;

    fn read_local(&self, limit: usize, skip: usize) -> Result<Vec<Track>, SearchError> {
        Ok(self.store.find_tracks(
            &TrackFilter::AlbumRefId(self.album_ref_id.clone()),
            self.sort,
            limit,
            skip,
        )?)
    }

    async fn fetch_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<FetchedPage<Track>, SearchError> {
        let owning = self.owning_album().await?.clone();
        let items = self
            .provider
            .album_tracks(&self.album_ref_id, offset, limit)
            .await?;
        let raw_count = items.len();
        let (tracks, mut extras) =
            normalize_track_page(self.provider.as_ref(), &items, Some(&owning)).await?;
        if let Some(album) = self.pending_album.lock().unwrap().take() {
            extras.push_album(album);
        }
        Ok(FetchedPage {
            items: tracks,
            raw_count,
            extras,
        })
    }

    fn stored_ref_ids(&self, ref_ids: &[String]) -> Result<HashSet<String>, SearchError> {
        Ok(self.store.tracks_with_ref_ids(ref_ids)?)
    }

    fn persist(&self, entities: Vec<Track>, extras: SideEntities) -> Result<(), SearchError> {
        self.store.upsert_artists(&extras.artists)?;
        self.store.upsert_albums(&extras.albums)?;
        self.store.upsert_tracks(&entities)?;
        Ok(())
    }
}
