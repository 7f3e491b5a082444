//! The fetch-through page algorithm.
//!
//! `satisfy_page` is generic over a [`BackfillSource`], which binds it to a
//! concrete entity kind: how to read the local page, how to fetch and
//! normalize one provider page, how to probe which ref_ids are already
//! stored, and how to write new discoveries back.
//!
//! Within one call, provider pages are fetched in increasing offset order
//! and fully processed before the next fetch. Across concurrent calls there
//! is no coordination; persistence stays safe because the store's upserts
//! are insert-if-absent on `ref_id`.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::catalog_store::{Album, Artist, Track};

use super::SearchError;

/// Access to the stable provider id that deduplication keys on.
pub trait RefKeyed {
    fn ref_id(&self) -> Option<&str>;
}

impl RefKeyed for Track {
    fn ref_id(&self) -> Option<&str> {
        self.ref_id.as_deref()
    }
}

impl RefKeyed for Album {
    fn ref_id(&self) -> Option<&str> {
        self.ref_id.as_deref()
    }
}

impl RefKeyed for Artist {
    fn ref_id(&self) -> Option<&str> {
        self.ref_id.as_deref()
    }
}

/// Entities of other kinds discovered while normalizing a page of the
/// primary kind: the artists and albums embedded in track results, the
/// artists embedded in album results. They ride along to persistence so a
/// track search also warms the artist and album collections.
#[derive(Debug, Default)]
pub struct SideEntities {
    pub artists: Vec<Artist>,
    pub albums: Vec<Album>,
}

impl SideEntities {
    pub fn is_empty(&self) -> bool {
        self.artists.is_empty() && self.albums.is_empty()
    }

    /// Add an artist unless one with the same ref_id is already queued.
    pub fn push_artist(&mut self, artist: Artist) {
        if !self
            .artists
            .iter()
            .any(|existing| existing.ref_id == artist.ref_id)
        {
            self.artists.push(artist);
        }
    }

    /// Add an album unless one with the same ref_id is already queued.
    pub fn push_album(&mut self, album: Album) {
        if !self
            .albums
            .iter()
            .any(|existing| existing.ref_id == album.ref_id)
        {
            self.albums.push(album);
        }
    }

    pub fn merge(&mut self, other: SideEntities) {
        for artist in other.artists {
            self.push_artist(artist);
        }
        for album in other.albums {
            self.push_album(album);
        }
    }
}

/// One fetched-and-normalized provider page.
pub struct FetchedPage<E> {
    /// Normalized entities, in provider order.
    pub items: Vec<E>,
    /// How many items the provider returned BEFORE any normalization
    /// dropped one. Exhaustion is judged on this count: a raw page smaller
    /// than the requested limit is the provider's last.
    pub raw_count: usize,
    pub extras: SideEntities,
}

/// Binds `satisfy_page` to one entity kind and one concrete query.
#[async_trait]
pub trait BackfillSource: Send + Sync {
    type Entity: RefKeyed + Clone + Send + Sync + 'static;

    /// One page from the local store, best-first.
    fn read_local(&self, limit: usize, skip: usize) -> Result<Vec<Self::Entity>, SearchError>;

    /// Fetch and normalize one provider page.
    async fn fetch_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<FetchedPage<Self::Entity>, SearchError>;

    /// Which of the given ref_ids already exist in the local store. Called
    /// once per provider page with that page's ids.
    fn stored_ref_ids(&self, ref_ids: &[String]) -> Result<HashSet<String>, SearchError>;

    /// Write newly discovered entities back to the store. Runs off the
    /// response path; must be idempotent.
    fn persist(&self, entities: Vec<Self::Entity>, extras: SideEntities)
        -> Result<(), SearchError>;
}

/// A satisfied page plus the handle of its write-back task, if one was
/// spawned. The response does not wait for persistence; callers that need
/// the cache warm (tests, mostly) await the handle.
pub struct SatisfiedPage<E> {
    pub items: Vec<E>,
    pub backfill: Option<JoinHandle<()>>,
}

/// Serve up to `page_size` entities at offset `skip`, preferring local
/// data and backfilling only the shortfall from the provider.
///
/// Local results come first, in store order. Backfilled results follow in
/// provider order, deduplicated against the local page, against earlier
/// provider pages of this request, and (for persistence) against what the
/// store already holds. A short page means the provider ran out of
/// matches; it is a valid result, not an error. Any store or provider
/// failure before the page is complete aborts the whole call.
pub async fn satisfy_page<S>(
    source: Arc<S>,
    page_size: usize,
    skip: usize,
) -> Result<SatisfiedPage<S::Entity>, SearchError>
where
    S: BackfillSource + 'static,
{
    let local = source.read_local(page_size, skip)?;
    if local.len() >= page_size {
        // Cache hit: the provider is never contacted.
        return Ok(SatisfiedPage {
            items: local,
            backfill: None,
        });
    }

    let local_ref_ids: HashSet<String> = local
        .iter()
        .filter_map(|entity| entity.ref_id().map(str::to_string))
        .collect();

    let mut seen_ref_ids: HashSet<String> = HashSet::new();
    let mut to_return: Vec<S::Entity> = Vec::new();
    let mut to_persist: Vec<S::Entity> = Vec::new();
    let mut extras = SideEntities::default();
    let mut page_counter = 0usize;

    loop {
        let offset = page_counter * page_size + skip;
        let fetched = source.fetch_page(offset, page_size).await?;
        let exhausted = fetched.raw_count < page_size;
        extras.merge(fetched.extras);

        let mut fresh: Vec<S::Entity> = Vec::new();
        for entity in fetched.items {
            let Some(ref_id) = entity.ref_id() else {
                continue;
            };
            if seen_ref_ids.contains(ref_id) || local_ref_ids.contains(ref_id) {
                continue;
            }
            seen_ref_ids.insert(ref_id.to_string());
            fresh.push(entity);
        }

        if !fresh.is_empty() {
            // One existence probe for the whole page, not one per item.
            let page_ids: Vec<String> = fresh
                .iter()
                .filter_map(|entity| entity.ref_id().map(str::to_string))
                .collect();
            let already_stored = source.stored_ref_ids(&page_ids)?;

            for entity in fresh {
                let known = entity
                    .ref_id()
                    .map(|ref_id| already_stored.contains(ref_id))
                    .unwrap_or(false);
                if !known {
                    to_persist.push(entity.clone());
                }
                to_return.push(entity);
            }
        }

        if local.len() + to_return.len() >= page_size || exhausted {
            break;
        }
        page_counter += 1;
    }

    let mut items = local;
    items.extend(to_return);
    items.truncate(page_size);

    let backfill = if to_persist.is_empty() && extras.is_empty() {
        None
    } else {
        debug!(
            "Scheduling backfill persistence: {} entities, {} artists, {} albums",
            to_persist.len(),
            extras.artists.len(),
            extras.albums.len()
        );
        let source = source.clone();
        Some(tokio::spawn(async move {
            if let Err(err) = source.persist(to_persist, extras) {
                // The response is already committed; the entities will be
                // rediscovered by a later backfill.
                warn!("Backfill persistence failed: {err}");
            }
        }))
    };

    Ok(SatisfiedPage { items, backfill })
}
