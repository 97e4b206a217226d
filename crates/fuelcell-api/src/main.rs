use fuelcell_api::{init_tracing, AppState, Server};
use fuelcell_core::ConfigManager;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let manager = ConfigManager::load()?;
    let config = manager.config().clone();
    init_tracing(&config.logging);

    match manager.config_path() {
        Some(path) => tracing::info!(path = %path.display(), "Loaded configuration"),
        None => tracing::info!("Using default configuration"),
    }

    let state = AppState::new(config)?;
    Server::new(state)?.run().await?;
    Ok(())
}
