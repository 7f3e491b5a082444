mod file_config;

pub use file_config::{FileConfig, ProviderFileConfig, SearchFileConfig};

use anyhow::{bail, Result};
use std::path::PathBuf;

use crate::catalog_store::SortKey;
use crate::search::SortConfig;

/// CLI arguments that participate in config resolution. Mirrors the clap
/// struct in `main.rs`; file config values override these where present,
/// except the provider credentials, where the environment wins.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub port: u16,
    pub provider_api_url: String,
    pub provider_token_url: String,
    pub provider_timeout_sec: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub port: u16,
    pub provider: ProviderSettings,
    pub search: SearchSettings,
}

#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub api_base_url: String,
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub timeout_sec: u64,
}

#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub page_size: usize,
    pub sort: SortConfig,
}

fn parse_sort_key(raw: &str) -> Result<SortKey> {
    match raw {
        "popularity" => Ok(SortKey::Popularity),
        "name" => Ok(SortKey::Name),
        other => bail!("Unknown sort key {:?} (expected \"popularity\" or \"name\")", other),
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments, an optional TOML file and
    /// the environment. TOML overrides CLI; `PROVIDER_CLIENT_ID` /
    /// `PROVIDER_CLIENT_SECRET` override the TOML credentials so secrets
    /// can stay out of files.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_path must be specified on the command line or in the config file")
            })?;

        let port = file.port.unwrap_or(cli.port);

        let client_id = std::env::var("PROVIDER_CLIENT_ID")
            .ok()
            .or(file.provider.client_id);
        let client_secret = std::env::var("PROVIDER_CLIENT_SECRET")
            .ok()
            .or(file.provider.client_secret);
        let (Some(client_id), Some(client_secret)) = (client_id, client_secret) else {
            bail!(
                "Provider credentials missing: set PROVIDER_CLIENT_ID/PROVIDER_CLIENT_SECRET \
                 or the [provider] section of the config file"
            );
        };

        let provider = ProviderSettings {
            api_base_url: file
                .provider
                .api_base_url
                .unwrap_or_else(|| cli.provider_api_url.clone()),
            token_url: file
                .provider
                .token_url
                .unwrap_or_else(|| cli.provider_token_url.clone()),
            client_id,
            client_secret,
            timeout_sec: file.provider.timeout_sec.unwrap_or(cli.provider_timeout_sec),
        };

        let sort = SortConfig {
            tracks: file
                .search
                .track_sort
                .as_deref()
                .map(parse_sort_key)
                .transpose()?
                .unwrap_or_default(),
            albums: file
                .search
                .album_sort
                .as_deref()
                .map(parse_sort_key)
                .transpose()?
                .unwrap_or_default(),
            artists: file
                .search
                .artist_sort
                .as_deref()
                .map(parse_sort_key)
                .transpose()?
                .unwrap_or_default(),
        };

        let search = SearchSettings {
            page_size: file
                .search
                .page_size
                .unwrap_or(crate::search::DEFAULT_PAGE_SIZE),
            sort,
        };

        Ok(AppConfig {
            db_path,
            port,
            provider,
            search,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli() -> CliConfig {
        CliConfig {
            db_path: Some(PathBuf::from("/tmp/catalog.db")),
            port: 3000,
            provider_api_url: "https://api.example.com/v1".to_string(),
            provider_token_url: "https://auth.example.com/token".to_string(),
            provider_timeout_sec: 30,
        }
    }

    fn file_with_credentials() -> FileConfig {
        toml::from_str(
            r#"
            [provider]
            client_id = "file-id"
            client_secret = "file-secret"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn file_values_override_cli() {
        let file: FileConfig = toml::from_str(
            r#"
            port = 9000

            [provider]
            client_id = "file-id"
            client_secret = "file-secret"
            timeout_sec = 5

            [search]
            page_size = 20
            track_sort = "name"
            "#,
        )
        .unwrap();

        let config = AppConfig::resolve(&cli(), Some(file)).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.provider.timeout_sec, 5);
        assert_eq!(config.search.page_size, 20);
        assert_eq!(config.search.sort.tracks, SortKey::Name);
        assert_eq!(config.search.sort.albums, SortKey::Popularity);
    }

    #[test]
    fn defaults_fill_in_when_file_is_silent() {
        let config = AppConfig::resolve(&cli(), Some(file_with_credentials())).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.search.page_size, 10);
        assert_eq!(config.search.sort.tracks, SortKey::Popularity);
        assert_eq!(config.provider.api_base_url, "https://api.example.com/v1");
    }

    #[test]
    fn unknown_sort_key_is_rejected() {
        let file: FileConfig = toml::from_str(
            r#"
            [provider]
            client_id = "id"
            client_secret = "secret"

            [search]
            album_sort = "hotness"
            "#,
        )
        .unwrap();
        assert!(AppConfig::resolve(&cli(), Some(file)).is_err());
    }

    #[test]
    fn missing_db_path_is_rejected() {
        let mut args = cli();
        args.db_path = None;
        assert!(AppConfig::resolve(&args, Some(file_with_credentials())).is_err());
    }
}
