use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use daybreak_pipeline::bootstrap;
use daybreak_pipeline::DigestController;

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init_tracing()?;

    let (_config, store) = bootstrap::connect().await?;
    let controller = DigestController::new(Arc::new(store));

    let digest_id = controller.create().await?;
    info!(digest_id, "New digest created");

    Ok(())
}
