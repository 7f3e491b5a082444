//! HTTP client for the external catalog provider.
//!
//! Token acquisition and caching are internal: every request asks
//! `bearer_token()` for a usable token, which refreshes through the
//! client-credentials grant when the cached one is missing or about to
//! expire. The async mutex is held across the refresh, so concurrent
//! requests hitting an expired token trigger one exchange, not many.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::types::*;
use super::ProviderError;

/// Refresh this long before the recorded expiry rather than risk sending a
/// token that dies in flight.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(30);

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Operations the rest of the crate needs from the external catalog.
///
/// All listings page by `offset`/`limit`; a result with fewer items than
/// `limit` is the provider's last page for that query.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Free-text search, restricted to the given entity kinds.
    async fn search(
        &self,
        query: &str,
        kinds: &[ProviderKind],
        offset: usize,
        limit: usize,
    ) -> Result<ProviderSearchResponse, ProviderError>;

    /// Look up a single artist by provider id.
    async fn artist(&self, id: &str) -> Result<ProviderArtist, ProviderError>;

    /// Look up several artists in one request.
    async fn artists(&self, ids: &[String]) -> Result<Vec<ProviderArtist>, ProviderError>;

    /// Look up a single album by provider id.
    async fn album(&self, id: &str) -> Result<ProviderAlbum, ProviderError>;

    /// List an album's tracks.
    async fn album_tracks(
        &self,
        album_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<ProviderTrack>, ProviderError>;

    /// List an artist's albums.
    async fn artist_albums(
        &self,
        artist_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<ProviderAlbum>, ProviderError>;
}

/// Credentials for the client-credentials grant.
#[derive(Clone)]
pub struct ProviderCredentials {
    pub client_id: String,
    pub client_secret: String,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_usable(&self) -> bool {
        Instant::now() + TOKEN_EXPIRY_MARGIN < self.expires_at
    }
}

pub struct HttpCatalogProvider {
    http: reqwest::Client,
    api_base_url: String,
    token_url: String,
    credentials: ProviderCredentials,
    token: tokio::sync::Mutex<Option<CachedToken>>,
}

impl HttpCatalogProvider {
    /// Create a new provider client.
    ///
    /// # Arguments
    /// * `api_base_url` - Base URL of the catalog API (e.g. "https://api.example.com/v1")
    /// * `token_url` - Token endpoint for the client-credentials exchange
    /// * `credentials` - Client id/secret for the grant
    /// * `timeout_secs` - Per-request timeout; `None` for the default
    pub fn new(
        api_base_url: String,
        token_url: String,
        credentials: ProviderCredentials,
        timeout_secs: Option<u64>,
    ) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)))
            .build()?;

        Ok(Self {
            http,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            token_url,
            credentials,
            token: tokio::sync::Mutex::new(None),
        })
    }

    /// Return a usable bearer token, refreshing it if needed.
    async fn bearer_token(&self) -> Result<String, ProviderError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.is_usable() {
                return Ok(token.value.clone());
            }
        }

        debug!("Refreshing provider access token");
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::AuthFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::AuthFailed(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let grant: TokenGrant = response
            .json()
            .await
            .map_err(|e| ProviderError::AuthFailed(e.to_string()))?;

        let value = grant.access_token.clone();
        *cached = Some(CachedToken {
            value: grant.access_token,
            expires_at: Instant::now() + Duration::from_secs(grant.expires_in),
        });
        Ok(value)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let token = self.bearer_token().await?;
        let url = format!("{}{}", self.api_base_url, path);
        let response = self
            .http
            .get(&url)
            .query(query)
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ProviderError::AuthFailed(format!(
                "provider rejected token with {status}"
            )));
        }
        if !status.is_success() {
            return Err(ProviderError::RequestFailed(format!(
                "GET {path} returned {status}"
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl CatalogProvider for HttpCatalogProvider {
    async fn search(
        &self,
        query: &str,
        kinds: &[ProviderKind],
        offset: usize,
        limit: usize,
    ) -> Result<ProviderSearchResponse, ProviderError> {
        let types = kinds
            .iter()
            .map(ProviderKind::as_query_param)
            .collect::<Vec<_>>()
            .join(",");
        self.get_json(
            "/search",
            &[
                ("q", query.to_string()),
                ("type", types),
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
            ],
        )
        .await
    }

    async fn artist(&self, id: &str) -> Result<ProviderArtist, ProviderError> {
        self.get_json(&format!("/artists/{id}"), &[]).await
    }

    async fn artists(&self, ids: &[String]) -> Result<Vec<ProviderArtist>, ProviderError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let envelope: ArtistsEnvelope = self
            .get_json("/artists", &[("ids", ids.join(","))])
            .await?;
        Ok(envelope.artists)
    }

    async fn album(&self, id: &str) -> Result<ProviderAlbum, ProviderError> {
        self.get_json(&format!("/albums/{id}"), &[]).await
    }

    async fn album_tracks(
        &self,
        album_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<ProviderTrack>, ProviderError> {
        let page: ProviderPage<ProviderTrack> = self
            .get_json(
                &format!("/albums/{album_id}/tracks"),
                &[
                    ("limit", limit.to_string()),
                    ("offset", offset.to_string()),
                ],
            )
            .await?;
        Ok(page.items)
    }

    async fn artist_albums(
        &self,
        artist_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<ProviderAlbum>, ProviderError> {
        let page: ProviderPage<ProviderAlbum> = self
            .get_json(
                &format!("/artists/{artist_id}/albums"),
                &[
                    ("limit", limit.to_string()),
                    ("offset", offset.to_string()),
                ],
            )
            .await?;
        Ok(page.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> HttpCatalogProvider {
        HttpCatalogProvider::new(
            "https://api.example.com/v1/".to_string(),
            "https://auth.example.com/token".to_string(),
            ProviderCredentials {
                client_id: "id".to_string(),
                client_secret: "secret".to_string(),
            },
            None,
        )
        .unwrap()
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = test_client();
        assert_eq!(client.api_base_url, "https://api.example.com/v1");
    }

    #[test]
    fn fresh_token_is_usable_expired_is_not() {
        let fresh = CachedToken {
            value: "t".to_string(),
            expires_at: Instant::now() + Duration::from_secs(3600),
        };
        assert!(fresh.is_usable());

        let nearly_expired = CachedToken {
            value: "t".to_string(),
            expires_at: Instant::now() + Duration::from_secs(5),
        };
        assert!(!nearly_expired.is_usable());
    }
}
