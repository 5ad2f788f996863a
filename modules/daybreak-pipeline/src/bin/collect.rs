use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use daybreak_collector::{Collector, HttpFetcher, MetaArticleParser};
use daybreak_common::DigestState;
use daybreak_pipeline::bootstrap;
use daybreak_pipeline::DigestController;

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init_tracing()?;

    let (_config, store) = bootstrap::connect().await?;
    let controller = DigestController::new(Arc::new(store.clone()));
    let collector = Collector::new(
        store,
        Arc::new(HttpFetcher::new()),
        Arc::new(MetaArticleParser::new()),
    );

    let stats = controller
        .advance(
            DigestState::Created,
            DigestState::ArticlesCollected,
            |_| async { collector.run().await },
        )
        .await?;

    info!("{stats}");
    Ok(())
}
