use anyhow::Result;
use tracing_subscriber::EnvFilter;

use daybreak_common::Config;
use daybreak_store::{migrate, Store};

/// Logging setup shared by every stage binary.
pub fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("daybreak=info".parse()?))
        .init();
    Ok(())
}

/// Load configuration, connect to the active store profile and migrate.
pub async fn connect() -> Result<(Config, Store)> {
    let config = Config::load()?;
    let store = Store::connect(config.store()).await?;
    migrate::migrate(&store).await?;
    Ok((config, store))
}
