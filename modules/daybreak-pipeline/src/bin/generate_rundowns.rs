use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use ai_client::OpenAi;
use daybreak_common::DigestState;
use daybreak_pipeline::bootstrap;
use daybreak_pipeline::rundowns::RundownGenerator;
use daybreak_pipeline::{DigestController, Summariser};

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init_tracing()?;

    let (config, store) = bootstrap::connect().await?;
    let controller = DigestController::new(Arc::new(store.clone()));

    let agent = OpenAi::new(&config.openai_api_key, &config.chat_model);
    let generator = RundownGenerator::new(store, Summariser::new(Arc::new(agent)));

    let written = controller
        .advance(
            DigestState::ImagesCollected,
            DigestState::RundownsGenerated,
            |digest_id| async move { generator.run(digest_id).await },
        )
        .await?;

    info!(written, "Rundown stage complete");
    Ok(())
}
