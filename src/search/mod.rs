//! Fetch-through catalog search.
//!
//! Queries are answered from the local store first; when a page comes up
//! short, the shortfall is topped up from the external provider, page by
//! page, and the newly discovered entities are written back to the store
//! off the response path. One generic algorithm
//! ([`fetch_through::satisfy_page`]) carries the pagination and
//! deduplication logic; the per-kind modules supply filters, provider query
//! syntax and enrichment.

mod albums;
mod artists;
mod fetch_through;
mod tracks;

pub use fetch_through::{satisfy_page, BackfillSource, FetchedPage, RefKeyed, SatisfiedPage, SideEntities};

use std::sync::Arc;

use thiserror::Error;

use crate::catalog_store::{CatalogStore, SortKey};
use crate::normalize::EnrichmentError;
use crate::provider::CatalogProvider;
use crate::{catalog_store::StoreError, provider::ProviderError};

/// Result page size for every fetch-through operation.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Errors surfaced by a fetch-through search.
///
/// An empty page is not an error; these mean the request failed and no
/// partial result was returned.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Enrichment(#[from] EnrichmentError),
}

/// Per-kind sort key for the local-read path.
///
/// Popularity-descending is the default everywhere; this exists so the
/// choice is configuration, not an accident of one code path.
#[derive(Clone, Copy, Debug, Default)]
pub struct SortConfig {
    pub tracks: SortKey,
    pub albums: SortKey,
    pub artists: SortKey,
}

/// The fetch-through search service: one operation per entity-kind
/// specialization, all sharing the same store, provider and page size.
pub struct CatalogSearch {
    pub(crate) store: Arc<dyn CatalogStore>,
    pub(crate) provider: Arc<dyn CatalogProvider>,
    pub(crate) page_size: usize,
    pub(crate) sort: SortConfig,
}

impl CatalogSearch {
    pub fn new(store: Arc<dyn CatalogStore>, provider: Arc<dyn CatalogProvider>) -> Self {
        Self {
            store,
            provider,
            page_size: DEFAULT_PAGE_SIZE,
            sort: SortConfig::default(),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_sort(mut self, sort: SortConfig) -> Self {
        self.sort = sort;
        self
    }
}
