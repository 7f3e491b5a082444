//! End-to-end tests for the fetch-through search service.
//!
//! The service runs against an in-memory SQLite store and a scripted
//! provider, so these exercise the whole path: local read, backfill,
//! normalization, deduplication and write-back. Anything asserting on the
//! store's contents awaits the page's backfill handle first; the response
//! itself never waits for persistence.

mod common;

use std::sync::Arc;

use common::{provider_album, provider_artist, provider_track, FakeProvider};

use beatsync_server::catalog_store::{
    ArtistFilter, CatalogStore, SortKey, SqliteCatalogStore, TrackFilter,
};
use beatsync_server::search::CatalogSearch;

struct TestHarness {
    store: Arc<SqliteCatalogStore>,
    provider: Arc<FakeProvider>,
    search: CatalogSearch,
}

fn harness(provider: FakeProvider) -> TestHarness {
    let store = Arc::new(SqliteCatalogStore::in_memory().unwrap());
    let provider = Arc::new(provider);
    let search = CatalogSearch::new(store.clone(), provider.clone());
    TestHarness {
        store,
        provider,
        search,
    }
}

/// A provider catalog with `count` tracks named "Love Song <i>", all by the
/// same artist on the same album, most popular first.
fn love_songs(count: usize) -> FakeProvider {
    let artist = provider_artist("ar1", "The Examples", &["synthpop", "indie"], 72);
    let album = provider_album("al1", "Greatest Loves", &[&artist]);
    let tracks = (0..count)
        .map(|i| {
            provider_track(
                &format!("t{i}"),
                &format!("Love Song {i}"),
                (100 - i) as u32,
                &album,
                &[&artist],
            )
        })
        .collect();
    FakeProvider {
        tracks,
        albums: vec![album],
        artists: vec![artist],
        ..Default::default()
    }
}

#[tokio::test]
async fn backfill_then_requery_hits_the_cache() {
    let h = harness(love_songs(12));

    let first = h.search.tracks_by_name("love", 0).await.unwrap();
    assert_eq!(first.items.len(), 10);
    first.backfill.expect("first query must backfill").await.unwrap();

    let calls_after_first = h.provider.calls();
    assert!(calls_after_first > 0);

    let second = h.search.tracks_by_name("love", 0).await.unwrap();
    assert_eq!(second.items.len(), 10);
    assert!(second.backfill.is_none());
    assert_eq!(
        h.provider.calls(),
        calls_after_first,
        "a fully cached page must not touch the provider"
    );

    // The cached page is served popularity-first.
    let pops: Vec<u32> = second.items.iter().filter_map(|t| t.popularity).collect();
    let mut sorted = pops.clone();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(pops, sorted);
}

#[tokio::test]
async fn track_backfill_warms_album_and_artist_collections() {
    let h = harness(love_songs(4));

    let page = h.search.tracks_by_name("love", 0).await.unwrap();
    assert_eq!(page.items.len(), 4);
    page.backfill.unwrap().await.unwrap();

    let albums = h
        .store
        .albums_with_ref_ids(&["al1".to_string()])
        .unwrap();
    assert!(albums.contains("al1"));

    let artists = h
        .store
        .find_artists(
            &ArtistFilter::NameContains("Examples".to_string()),
            SortKey::Popularity,
            10,
            0,
        )
        .unwrap();
    assert_eq!(artists.len(), 1);
    assert_eq!(artists[0].genres, vec!["synthpop", "indie"]);

    // Tracks got the genre union from the artist lookup.
    assert_eq!(page.items[0].genres, vec!["synthpop", "indie"]);
}

#[tokio::test]
async fn local_results_come_first_and_are_not_duplicated() {
    let h = harness(love_songs(12));

    // Warm the cache with the first three provider tracks.
    let warmup = h.search.tracks_by_name("love song 1", 0).await.unwrap();
    if let Some(handle) = warmup.backfill {
        handle.await.unwrap();
    }
    let locally_known: Vec<String> = h
        .store
        .find_tracks(
            &TrackFilter::NameContains("love".to_string()),
            SortKey::Popularity,
            10,
            0,
        )
        .unwrap()
        .iter()
        .filter_map(|t| t.ref_id.clone())
        .collect();
    assert!(!locally_known.is_empty());

    let page = h.search.tracks_by_name("love", 0).await.unwrap();
    assert_eq!(page.items.len(), 10);

    // The locally known entities lead the page, and no ref_id repeats.
    let page_refs: Vec<&str> = page.items.iter().filter_map(|t| t.ref_id.as_deref()).collect();
    assert_eq!(&page_refs[..locally_known.len()], &locally_known[..]);
    let mut deduped = page_refs.clone();
    deduped.sort_unstable();
    deduped.dedup();
    assert_eq!(deduped.len(), page_refs.len());
}

#[tokio::test]
async fn exhausted_provider_returns_a_short_page() {
    let h = harness(love_songs(4));

    let page = h.search.tracks_by_name("love", 0).await.unwrap();
    assert_eq!(page.items.len(), 4);
}

#[tokio::test]
async fn skip_beyond_all_data_yields_an_empty_page() {
    let h = harness(love_songs(3));

    let page = h.search.tracks_by_name("love", 50).await.unwrap();
    assert!(page.items.is_empty());
    assert!(page.backfill.is_none());
}

#[tokio::test]
async fn album_browse_resolves_and_persists_the_owning_album() {
    let h = harness(love_songs(4));

    let page = h.search.tracks_by_album("al1", 0).await.unwrap();
    assert_eq!(page.items.len(), 4);

    // Art and release metadata are denormalized from the owning album even
    // though the album-tracks listing itself carries neither.
    for track in &page.items {
        assert_eq!(track.album_name, "Greatest Loves");
        assert_eq!(track.album_ref_id.as_deref(), Some("al1"));
        assert_eq!(track.release_date, "2018-06-15");
        assert!(!track.cover_art.is_empty());
        assert!(track.popularity.is_none());
    }

    page.backfill.unwrap().await.unwrap();
    let album = h.store.find_album_by_ref_id("al1").unwrap();
    assert!(album.is_some(), "the fetched owning album must be persisted");

    let cached = h
        .store
        .find_tracks(
            &TrackFilter::AlbumRefId("al1".to_string()),
            SortKey::Popularity,
            10,
            0,
        )
        .unwrap();
    assert_eq!(cached.len(), 4);
}

#[tokio::test]
async fn album_browse_with_cached_album_skips_the_album_lookup() {
    let h = harness(love_songs(4));

    let first = h.search.tracks_by_album("al1", 0).await.unwrap();
    first.backfill.unwrap().await.unwrap();

    let calls_before = h.provider.calls();
    let second = h.search.tracks_by_album("al1", 0).await.unwrap();
    assert_eq!(second.items.len(), 4);

    // Still short of a full page, so the track listing is re-fetched, but
    // the album itself now comes from the store: exactly two provider hits
    // (album_tracks + artist enrichment).
    assert_eq!(h.provider.calls() - calls_before, 2);
}

#[tokio::test]
async fn artist_search_backfills_and_stabilizes() {
    let artists = vec![
        provider_artist("ar1", "Nightdrive", &["synthwave"], 80),
        provider_artist("ar2", "Night Bus", &["trip hop"], 60),
        provider_artist("ar3", "Overnight", &["house"], 40),
    ];
    let h = harness(FakeProvider {
        artists,
        ..Default::default()
    });

    let first = h.search.artists_by_name("night", 0).await.unwrap();
    assert_eq!(first.items.len(), 3);
    first.backfill.unwrap().await.unwrap();

    let second = h.search.artists_by_name("night", 0).await.unwrap();
    assert_eq!(second.items.len(), 3);
    // Everything is already stored; nothing new to persist.
    assert!(second.backfill.is_none());

    let stored = h
        .store
        .artists_with_ref_ids(&["ar1".to_string(), "ar2".to_string(), "ar3".to_string()])
        .unwrap();
    assert_eq!(stored.len(), 3);
}

#[tokio::test]
async fn albums_by_artist_browse_round_trips_through_the_store() {
    let artist = provider_artist("ar1", "The Examples", &["indie"], 70);
    let other = provider_artist("ar2", "Unrelated", &["noise"], 10);
    let albums = vec![
        provider_album("al1", "Debut", &[&artist]),
        provider_album("al2", "Sophomore", &[&artist]),
        provider_album("al3", "Noise Tape", &[&other]),
    ];
    let h = harness(FakeProvider {
        albums,
        artists: vec![artist, other],
        ..Default::default()
    });

    let page = h.search.albums_by_artist("ar1", 0).await.unwrap();
    let names: Vec<&str> = page.items.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["Debut", "Sophomore"]);

    page.backfill.unwrap().await.unwrap();

    // The persisted albums satisfy the structural artist-contains filter.
    let stored = h
        .store
        .find_albums(
            &beatsync_server::catalog_store::AlbumFilter::ByArtistRefId("ar1".to_string()),
            SortKey::Popularity,
            10,
            0,
        )
        .unwrap();
    assert_eq!(stored.len(), 2);
}

#[tokio::test]
async fn album_search_enriches_contributing_artists() {
    let artist = provider_artist("ar1", "The Examples", &["indie", "dream pop"], 70);
    let albums = vec![provider_album("al1", "Winter Songs", &[&artist])];
    let h = harness(FakeProvider {
        albums,
        artists: vec![artist],
        ..Default::default()
    });

    let page = h.search.albums_by_name("winter", 0).await.unwrap();
    assert_eq!(page.items.len(), 1);
    page.backfill.unwrap().await.unwrap();

    // The artist stub from the album result was enriched to a full record.
    let stored = h
        .store
        .find_artists(
            &ArtistFilter::NameContains("Examples".to_string()),
            SortKey::Popularity,
            10,
            0,
        )
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].genres, vec!["indie", "dream pop"]);
    assert_eq!(stored[0].popularity, Some(70));
}
