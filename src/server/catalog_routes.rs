//! Manual catalog management routes.
//!
//! Direct CRUD over the three collections, for user-submitted tracks and
//! hand-maintained entries. These handlers only ever touch the local
//! store; the provider plays no part here.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::catalog_store::{
    new_local_id, Album, AlbumKind, AlbumPatch, Artist, ArtistPatch, ArtistRef, Image, StoreError,
    Track, TrackPatch, TrackSource,
};

use super::state::ServerState;

fn storage_error(err: StoreError) -> Response {
    error!("Catalog request failed: {err}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "internal server error"})),
    )
        .into_response()
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": "not found"})),
    )
        .into_response()
}

fn updated(flag: bool) -> Response {
    if flag {
        Json(json!({"updated": true})).into_response()
    } else {
        not_found()
    }
}

// =============================================================================
// Tracks
// =============================================================================

/// A user-submitted track. No `ref_id`: the entity has no provider origin.
#[derive(Deserialize)]
struct NewTrack {
    name: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    cover_art: Vec<Image>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    duration_ms: u64,
    #[serde(default = "default_position")]
    disc_number: u32,
    #[serde(default = "default_position")]
    track_number: u32,
    #[serde(default)]
    album_name: String,
    #[serde(default)]
    artists: Vec<ArtistRef>,
    #[serde(default)]
    genres: Vec<String>,
    #[serde(default)]
    explicit: bool,
}

fn default_position() -> u32 {
    1
}

async fn get_track(State(state): State<ServerState>, Path(id): Path<String>) -> Response {
    match state.catalog_store.find_track(&id) {
        Ok(Some(track)) => Json(track).into_response(),
        Ok(None) => not_found(),
        Err(err) => storage_error(err),
    }
}

async fn create_track(
    State(state): State<ServerState>,
    Json(payload): Json<NewTrack>,
) -> Response {
    let track = Track {
        id: new_local_id(),
        ref_id: None,
        name: payload.name,
        url: payload.url,
        cover_art: payload.cover_art,
        release_date: payload
            .release_date
            .unwrap_or_else(|| chrono::Utc::now().to_rfc3339()),
        duration_ms: payload.duration_ms,
        disc_number: payload.disc_number,
        track_number: payload.track_number,
        album_name: payload.album_name,
        album_ref_id: None,
        artists: payload.artists,
        genres: payload.genres,
        // Uploads start maximally popular so they surface in their
        // submitter's searches right away.
        popularity: Some(100),
        explicit: payload.explicit,
        source: TrackSource::Upload,
    };
    match state.catalog_store.insert_track(&track) {
        Ok(()) => Json(track).into_response(),
        Err(err) => storage_error(err),
    }
}

async fn update_track(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(patch): Json<TrackPatch>,
) -> Response {
    match state.catalog_store.update_track(&id, &patch) {
        Ok(flag) => updated(flag),
        Err(err) => storage_error(err),
    }
}

async fn delete_track(State(state): State<ServerState>, Path(id): Path<String>) -> Response {
    match state.catalog_store.delete_track(&id) {
        Ok(true) => Json(json!({"deleted": true})).into_response(),
        Ok(false) => not_found(),
        Err(err) => storage_error(err),
    }
}

// =============================================================================
// Albums
// =============================================================================

#[derive(Deserialize)]
struct NewAlbum {
    name: String,
    #[serde(default)]
    ref_id: Option<String>,
    #[serde(default)]
    release_date: String,
    #[serde(default)]
    images: Vec<Image>,
    #[serde(default)]
    artists: Vec<ArtistRef>,
    #[serde(default)]
    total_tracks: u32,
}

async fn get_album(State(state): State<ServerState>, Path(id): Path<String>) -> Response {
    match state.catalog_store.find_album(&id) {
        Ok(Some(album)) => Json(album).into_response(),
        Ok(None) => not_found(),
        Err(err) => storage_error(err),
    }
}

async fn create_album(
    State(state): State<ServerState>,
    Json(payload): Json<NewAlbum>,
) -> Response {
    let album = Album {
        id: new_local_id(),
        ref_id: payload.ref_id,
        name: payload.name,
        release_date: payload.release_date,
        images: payload.images,
        artists: payload.artists,
        total_tracks: payload.total_tracks,
        popularity: None,
        kind: AlbumKind::Album,
    };
    match state.catalog_store.insert_album(&album) {
        Ok(()) => Json(album).into_response(),
        Err(err) => storage_error(err),
    }
}

async fn update_album(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(patch): Json<AlbumPatch>,
) -> Response {
    match state.catalog_store.update_album(&id, &patch) {
        Ok(flag) => updated(flag),
        Err(err) => storage_error(err),
    }
}

async fn delete_album(State(state): State<ServerState>, Path(id): Path<String>) -> Response {
    match state.catalog_store.delete_album(&id) {
        Ok(true) => Json(json!({"deleted": true})).into_response(),
        Ok(false) => not_found(),
        Err(err) => storage_error(err),
    }
}

// =============================================================================
// Artists
// =============================================================================

#[derive(Deserialize)]
struct NewArtist {
    name: String,
    #[serde(default)]
    ref_id: Option<String>,
    #[serde(default)]
    genres: Vec<String>,
    #[serde(default)]
    images: Vec<Image>,
}

async fn get_artist(State(state): State<ServerState>, Path(id): Path<String>) -> Response {
    match state.catalog_store.find_artist(&id) {
        Ok(Some(artist)) => Json(artist).into_response(),
        Ok(None) => not_found(),
        Err(err) => storage_error(err),
    }
}

async fn create_artist(
    State(state): State<ServerState>,
    Json(payload): Json<NewArtist>,
) -> Response {
    let artist = Artist {
        id: new_local_id(),
        ref_id: payload.ref_id,
        name: payload.name,
        genres: payload.genres,
        images: payload.images,
        popularity: None,
    };
    match state.catalog_store.insert_artist(&artist) {
        Ok(()) => Json(artist).into_response(),
        Err(err) => storage_error(err),
    }
}

async fn update_artist(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(patch): Json<ArtistPatch>,
) -> Response {
    match state.catalog_store.update_artist(&id, &patch) {
        Ok(flag) => updated(flag),
        Err(err) => storage_error(err),
    }
}

async fn delete_artist(State(state): State<ServerState>, Path(id): Path<String>) -> Response {
    match state.catalog_store.delete_artist(&id) {
        Ok(true) => Json(json!({"deleted": true})).into_response(),
        Ok(false) => not_found(),
        Err(err) => storage_error(err),
    }
}

pub fn make_catalog_routes(state: ServerState) -> Router {
    Router::new()
        .route("/tracks", post(create_track))
        .route("/tracks/{id}", get(get_track))
        .route("/tracks/{id}", put(update_track))
        .route("/tracks/{id}", delete(delete_track))
        .route("/albums", post(create_album))
        .route("/albums/{id}", get(get_album))
        .route("/albums/{id}", put(update_album))
        .route("/albums/{id}", delete(delete_album))
        .route("/artists", post(create_artist))
        .route("/artists/{id}", get(get_artist))
        .route("/artists/{id}", put(update_artist))
        .route("/artists/{id}", delete(delete_artist))
        .with_state(state)
}
