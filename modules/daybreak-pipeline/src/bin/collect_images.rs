use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use daybreak_common::DigestState;
use daybreak_pipeline::bootstrap;
use daybreak_pipeline::images::{GoogleImageSearch, ImageCollector, ImageSearcher};
use daybreak_pipeline::DigestController;

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init_tracing()?;

    let (config, store) = bootstrap::connect().await?;
    let controller = DigestController::new(Arc::new(store.clone()));

    let searcher: Option<Arc<dyn ImageSearcher>> =
        match (&config.google_search_key, &config.google_search_engine_id) {
            (Some(key), Some(engine_id)) => {
                Some(Arc::new(GoogleImageSearch::new(key, engine_id)))
            }
            _ => None,
        };
    let collector = ImageCollector::new(store, searcher);

    let written = controller
        .advance(
            DigestState::StoriesEmbedded,
            DigestState::ImagesCollected,
            |digest_id| async move { collector.run(digest_id).await },
        )
        .await?;

    info!(written, "Image stage complete");
    Ok(())
}
