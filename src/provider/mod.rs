//! External catalog provider client.
//!
//! Token-authenticated search and by-id lookup against the provider's HTTP
//! API, paginated by offset and limit. The bearer token is acquired through
//! a client-credentials grant and cached inside the client until near
//! expiry; nothing outside this module ever sees it.

mod client;
mod types;

pub use client::{CatalogProvider, HttpCatalogProvider, ProviderCredentials};
pub use types::{
    ProviderAlbum, ProviderArtist, ProviderArtistRef, ProviderImage, ProviderKind, ProviderPage,
    ProviderSearchResponse, ProviderTrack,
};

use thiserror::Error;

/// Errors surfaced by the provider layer.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The client-credentials exchange failed or the provider rejected our
    /// token.
    #[error("provider authentication failed: {0}")]
    AuthFailed(String),

    /// The request itself failed: transport error, non-success status or an
    /// undecodable body.
    #[error("provider request failed: {0}")]
    RequestFailed(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::RequestFailed(err.to_string())
    }
}
