//! Album specializations: search by name, browse by artist.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::catalog_store::{Album, AlbumFilter, CatalogStore, SortKey};
use crate::normalize::{album_from_provider, artist_from_provider, contributing_artists};
use crate::provider::{CatalogProvider, ProviderAlbum, ProviderKind};

use super::fetch_through::{satisfy_page, BackfillSource, FetchedPage, SatisfiedPage, SideEntities};
use super::{CatalogSearch, SearchError};

impl CatalogSearch {
    /// Search albums by name.
    pub async fn albums_by_name(
        &self,
        filter: &str,
        skip: usize,
    ) -> Result<SatisfiedPage<Album>, SearchError> {
        let source = Arc::new(AlbumNameSource {
            store: self.store.clone(),
            provider: self.provider.clone(),
            filter: filter.to_string(),
            sort: self.sort.albums,
        });
        satisfy_page(source, self.page_size, skip).await
    }

    /// Browse an artist's albums by the artist's provider id.
    pub async fn albums_by_artist(
        &self,
        artist_ref_id: &str,
        skip: usize,
    ) -> Result<SatisfiedPage<Album>, SearchError> {
        let source = Arc::new(ArtistAlbumsSource {
            store: self.store.clone(),
            provider: self.provider.clone(),
            artist_ref_id: artist_ref_id.to_string(),
            sort: self.sort.albums,
        });
        satisfy_page(source, self.page_size, skip).await
    }
}

struct AlbumNameSource {
    store: Arc<dyn CatalogStore>,
    provider: Arc<dyn CatalogProvider>,
    filter: String,
    sort: SortKey,
}

/// Full contributing-artist records for a page of albums, fetched as side
/// entities with one batch lookup. Album search results embed only artist
/// stubs, and an artist without genres is not worth caching.
async fn enrich_album_page_artists(
    provider: &dyn CatalogProvider,
    items: &[ProviderAlbum],
) -> Result<SideEntities, SearchError> {
    let mut artist_ids: Vec<String> = Vec::new();
    for item in items {
        for artist in &item.artists {
            if !artist_ids.contains(&artist.id) {
                artist_ids.push(artist.id.clone());
            }
        }
    }
    let artists_by_id = contributing_artists(provider, &artist_ids).await?;

    let mut extras = SideEntities::default();
    for artist in artists_by_id.values() {
        extras.push_artist(artist_from_provider(artist));
    }
    Ok(extras)
}

#[async_trait]
impl BackfillSource for AlbumNameSource {
    type Entity = Album;

    fn read_local(&self, limit: usize, skip: usize) -> Result<Vec<Album>, SearchError> {
        Ok(self.store.find_albums(
            &AlbumFilter::NameContains(self.filter.clone()),
            self.sort,
            limit,
            skip,
        )?)
    }

    async fn fetch_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<FetchedPage<Album>, SearchError> {
        let response = self
            .provider
            .search(
                &format!("album:{}", self.filter),
                &[ProviderKind::Album],
                offset,
                limit,
            )
            .await?;
        let items = response.albums.map(|page| page.items).unwrap_or_default();
        let raw_count = items.len();
        let extras = enrich_album_page_artists(self.provider.as_ref(), &items).await?;
        let albums = items.iter().map(album_from_provider).collect();
        Ok(FetchedPage {
            items: albums,
            raw_count,
            extras,
        })
    }

    fn stored_ref_ids(&self, ref_ids: &[String]) -> Result<HashSet<String>, SearchError> {
        Ok(self.store.albums_with_ref_ids(ref_ids)?)
    }

    fn persist(&self, entities: Vec<Album>, extras: SideEntities) -> Result<(), SearchError> {
        self.store.upsert_artists(&extras.artists)?;
        self.store.upsert_albums(&entities)?;
        Ok(())
    }
}

struct ArtistAlbumsSource {
    store: Arc<dyn CatalogStore>,
    provider: Arc<dyn CatalogProvider>,
    artist_ref_id: String,
    sort: SortKey,
}

#[async_trait]
impl BackfillSource for ArtistAlbumsSource {
    type Entity = Album;

    fn read_local(&self, limit: usize, skip: usize) -> Result<Vec<Album>, SearchError> {
        Ok(self.store.find_albums(
            &AlbumFilter::ByArtistRefId(self.artist_ref_id.clone()),
            self.sort,
            limit,
            skip,
        )?)
    }

    async fn fetch_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<FetchedPage<Album>, SearchError> {
        let items = self
            .provider
            .artist_albums(&self.artist_ref_id, offset, limit)
            .await?;
        let raw_count = items.len();
        let albums = items.iter().map(album_from_provider).collect();
        Ok(FetchedPage {
            items: albums,
            raw_count,
            extras: SideEntities::default(),
        })
    }

    fn stored_ref_ids(&self, ref_ids: &[String]) -> Result<HashSet<String>, SearchError> {
        Ok(self.store.albums_with_ref_ids(ref_ids)?)
    }

    fn persist(&self, entities: Vec<Album>, _extras: SideEntities) -> Result<(), SearchError> {
        self.store.upsert_albums(&entities)?;
        Ok(())
    }
}
