//! TOML file configuration.
//!
//! Every field is optional; `AppConfig::resolve` merges these over the CLI
//! values. Example:
//!
//! ```toml
//! db_path = "/var/lib/beatsync/catalog.db"
//! port = 3000
//!
//! [provider]
//! api_base_url = "https://api.spotify.com/v1"
//! token_url = "https://accounts.spotify.com/api/token"
//! client_id = "..."
//! client_secret = "..."
//! timeout_sec = 30
//!
//! [search]
//! page_size = 10
//! track_sort = "popularity"
//! album_sort = "popularity"
//! artist_sort = "popularity"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub db_path: Option<String>,
    pub port: Option<u16>,
    #[serde(default)]
    pub provider: ProviderFileConfig,
    #[serde(default)]
    pub search: SearchFileConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProviderFileConfig {
    pub api_base_url: Option<String>,
    pub token_url: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub timeout_sec: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchFileConfig {
    pub page_size: Option<usize>,
    pub track_sort: Option<String>,
    pub album_sort: Option<String>,
    pub artist_sort: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        toml::from_str(&raw).with_context(|| format!("Failed to parse config file {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_parses_to_defaults() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert!(config.db_path.is_none());
        assert!(config.provider.client_id.is_none());
        assert!(config.search.page_size.is_none());
    }

    #[test]
    fn sections_are_independent() {
        let config: FileConfig = toml::from_str(
            r#"
            port = 8080

            [search]
            page_size = 25
            track_sort = "name"
            "#,
        )
        .unwrap();
        assert_eq!(config.port, Some(8080));
        assert_eq!(config.search.page_size, Some(25));
        assert_eq!(config.search.track_sort.as_deref(), Some("name"));
        assert!(config.provider.token_url.is_none());
    }
}
