//! HTTP server assembly.

mod catalog_routes;
mod search_routes;
pub mod state;

pub use state::ServerState;

use anyhow::Result;
use axum::{
    extract::Request,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::time::Instant;
use tracing::info;

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(request).await;
    info!(
        "{} {} -> {} ({:?})",
        method,
        path,
        response.status(),
        started.elapsed()
    );
    response
}

async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "beatsync-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub fn make_router(state: ServerState) -> Router {
    Router::new()
        .route("/", get(root))
        .merge(search_routes::make_search_routes(state.clone()))
        .merge(catalog_routes::make_catalog_routes(state))
        .layer(middleware::from_fn(log_requests))
}

pub async fn run_server(state: ServerState, port: u16) -> Result<()> {
    let app = make_router(state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Ready to serve at port {}!", port);
    axum::serve(listener, app).await?;
    Ok(())
}
