//! Fetch-through search and browse routes.
//!
//! Thin handlers over `CatalogSearch`: an empty result is an empty JSON
//! array with status 200; a store or provider failure is a 500. The
//! backfill persistence handle is dropped here — the response never waits
//! for the write-back.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::search::{SatisfiedPage, SearchError};

use super::state::ServerState;

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    filter: String,
    #[serde(default)]
    skip: usize,
}

#[derive(Deserialize)]
struct BrowseQuery {
    #[serde(default)]
    skip: usize,
}

fn page_response<T: serde::Serialize>(result: Result<SatisfiedPage<T>, SearchError>) -> Response {
    match result {
        Ok(page) => Json(page.items).into_response(),
        Err(err) => {
            error!("Search request failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "internal server error"})),
            )
                .into_response()
        }
    }
}

async fn search_tracks(
    State(state): State<ServerState>,
    Query(params): Query<SearchQuery>,
) -> Response {
    page_response(state.search.tracks_by_name(&params.filter, params.skip).await)
}

async fn search_albums(
    State(state): State<ServerState>,
    Query(params): Query<SearchQuery>,
) -> Response {
    page_response(state.search.albums_by_name(&params.filter, params.skip).await)
}

async fn search_artists(
    State(state): State<ServerState>,
    Query(params): Query<SearchQuery>,
) -> Response {
    page_response(state.search.artists_by_name(&params.filter, params.skip).await)
}

async fn album_tracks(
    State(state): State<ServerState>,
    Path(ref_id): Path<String>,
    Query(params): Query<BrowseQuery>,
) -> Response {
    page_response(state.search.tracks_by_album(&ref_id, params.skip).await)
}

async fn artist_albums(
    State(state): State<ServerState>,
    Path(ref_id): Path<String>,
    Query(params): Query<BrowseQuery>,
) -> Response {
    page_response(state.search.albums_by_artist(&ref_id, params.skip).await)
}

pub fn make_search_routes(state: ServerState) -> Router {
    Router::new()
        .route("/search/tracks", get(search_tracks))
        .route("/search/albums", get(search_albums))
        .route("/search/artists", get(search_artists))
        .route("/albums/{ref_id}/tracks", get(album_tracks))
        .route("/artists/{ref_id}/albums", get(artist_albums))
        .with_state(state)
}
