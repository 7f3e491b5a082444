//! Artist specialization: search by name.
//!
//! The simplest of the specializations: artist search results come back
//! complete (genres included), so there is no enrichment and there are no
//! side entities.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::catalog_store::{Artist, ArtistFilter, CatalogStore, SortKey};
use crate::normalize::artist_from_provider;
use crate::provider::{CatalogProvider, ProviderKind};

use super::fetch_through::{satisfy_page, BackfillSource, FetchedPage, SatisfiedPage, SideEntities};
use super::{CatalogSearch, SearchError};

impl CatalogSearch {
    /// Search artists by name.
    pub async fn artists_by_name(
        &self,
        filter: &str,
        skip: usize,
    ) -> Result<SatisfiedPage<Artist>, SearchError> {
        let source = Arc::new(ArtistNameSource {
            store: self.store.clone(),
            provider: self.provider.clone(),
            filter: filter.to_string(),
            sort: self.sort.artists,
        });
        satisfy_page(source, self.page_size, skip).await
    }
}

struct ArtistNameSource {
    store: Arc<dyn CatalogStore>,
    provider: Arc<dyn CatalogProvider>,
    filter: String,
    sort: SortKey,
}

#[async_trait]
impl BackfillSource for ArtistNameSource {
    type Entity = Artist;

    fn read_local(&self, limit: usize, skip: usize) -> Result<Vec<Artist>, SearchError> {
        Ok(self.store.find_artists(
            &ArtistFilter::NameContains(self.filter.clone()),
            self.sort,
            limit,
            skip,
        )?)
    }

    async fn fetch_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<FetchedPage<Artist>, SearchError> {
        let response = self
            .provider
            .search(
                &format!("artist:{}", self.filter),
                &[ProviderKind::Artist],
                offset,
                limit,
            )
            .await?;
        let items = response.artists.map(|page| page.items).unwrap_or_default();
        let raw_count = items.len();
        let artists = items.iter().map(artist_from_provider).collect();
        Ok(FetchedPage {
            items: artists,
            raw_count,
            extras: SideEntities::default(),
        })
    }

    fn stored_ref_ids(&self, ref_ids: &[String]) -> Result<HashSet<String>, SearchError> {
        Ok(self.store.artists_with_ref_ids(ref_ids)?)
    }

    fn persist(&self, entities: Vec<Artist>, _extras: SideEntities) -> Result<(), SearchError> {
        self.store.upsert_artists(&entities)?;
        Ok(())
    }
}
