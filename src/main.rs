use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use beatsync_server::catalog_store::SqliteCatalogStore;
use beatsync_server::config::{AppConfig, CliConfig, FileConfig};
use beatsync_server::provider::{HttpCatalogProvider, ProviderCredentials};
use beatsync_server::search::CatalogSearch;
use beatsync_server::server::{run_server, ServerState};

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite catalog database file (created if missing).
    pub db_path: Option<PathBuf>,

    /// Path to a TOML config file; its values override the CLI.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3000)]
    pub port: u16,

    /// Base URL of the external catalog provider API.
    #[clap(long, default_value = "https://api.spotify.com/v1")]
    pub provider_api_url: String,

    /// Token endpoint for the provider's client-credentials grant.
    #[clap(long, default_value = "https://accounts.spotify.com/api/token")]
    pub provider_token_url: String,

    /// Timeout in seconds for provider requests.
    #[clap(long, default_value_t = 30)]
    pub provider_timeout_sec: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let cli_config = CliConfig {
        db_path: cli_args.db_path,
        port: cli_args.port,
        provider_api_url: cli_args.provider_api_url,
        provider_token_url: cli_args.provider_token_url,
        provider_timeout_sec: cli_args.provider_timeout_sec,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    info!("Opening catalog database at {:?}...", config.db_path);
    let catalog_store = Arc::new(SqliteCatalogStore::new(&config.db_path)?);

    let provider = Arc::new(HttpCatalogProvider::new(
        config.provider.api_base_url.clone(),
        config.provider.token_url.clone(),
        ProviderCredentials {
            client_id: config.provider.client_id.clone(),
            client_secret: config.provider.client_secret.clone(),
        },
        Some(config.provider.timeout_sec),
    )?);

    let search = Arc::new(
        CatalogSearch::new(catalog_store.clone(), provider)
            .with_page_size(config.search.page_size)
            .with_sort(config.search.sort),
    );

    let state = ServerState {
        catalog_store,
        search,
    };
    run_server(state, config.port).await
}
