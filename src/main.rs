use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use url_shortener_store::application::services::ShortenerService;
use url_shortener_store::config::{self, Config};
use url_shortener_store::infrastructure::persistence::open_repository;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = config::load_from_env().context("Invalid configuration")?;
    init_tracing(&config)?;
    config.print_summary();

    let repository = open_repository(&config)
        .await
        .context("Failed to open storage backend")?;
    let service = ShortenerService::new(
        repository,
        config.base_url.clone(),
        config.request_timeout(),
    );

    service.ping().await.context("Storage backend is not reachable")?;

    let stats = service.stats().await.context("Failed to read storage stats")?;
    tracing::info!(urls = stats.urls, users = stats.users, "Storage ready");

    if !config.uses_database() {
        service
            .offload(&config.file_storage_path)
            .await
            .context("Failed to write storage snapshot")?;
        tracing::info!(path = %config.file_storage_path.display(), "Snapshot written");
    }

    Ok(())
}

fn init_tracing(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_new(&config.log_level)
        .with_context(|| format!("Invalid RUST_LOG filter '{}'", config.log_level))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_level(true);

    if config.log_format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }

    Ok(())
}
