use std::sync::Arc;

use axum::extract::FromRef;

use crate::catalog_store::CatalogStore;
use crate::search::CatalogSearch;

pub type GuardedCatalogStore = Arc<dyn CatalogStore>;
pub type GuardedCatalogSearch = Arc<CatalogSearch>;

#[derive(Clone)]
pub struct ServerState {
    pub catalog_store: GuardedCatalogStore,
    pub search: GuardedCatalogSearch,
}

impl FromRef<ServerState> for GuardedCatalogStore {
    fn from_ref(input: &ServerState) -> Self {
        input.catalog_store.clone()
    }
}

impl FromRef<ServerState> for GuardedCatalogSearch {
    fn from_ref(input: &ServerState) -> Self {
        input.search.clone()
    }
}
