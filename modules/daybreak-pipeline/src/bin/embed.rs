use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::info;

use ai_client::OpenAi;
use daybreak_common::DigestState;
use daybreak_pipeline::bootstrap;
use daybreak_pipeline::embedder::Embedder;
use daybreak_pipeline::DigestController;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EmbedMode {
    Articles,
    Stories,
}

/// Vectorise unembedded articles or stories.
#[derive(Debug, Parser)]
struct Args {
    /// What to embed.
    #[arg(long, value_enum)]
    mode: EmbedMode,
}

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init_tracing()?;
    let args = Args::parse();

    let (config, store) = bootstrap::connect().await?;
    let controller = DigestController::new(Arc::new(store.clone()));

    let agent = OpenAi::new(&config.openai_api_key, &config.chat_model)
        .with_embedding_model(&config.embedding_model);
    let embedder = Embedder::new(store, Arc::new(agent));

    let written = match args.mode {
        EmbedMode::Articles => {
            controller
                .advance(
                    DigestState::ArticlesCollected,
                    DigestState::ArticlesEmbedded,
                    |_| async { embedder.embed_articles().await },
                )
                .await?
        }
        EmbedMode::Stories => {
            controller
                .advance(
                    DigestState::StoriesGenerated,
                    DigestState::StoriesEmbedded,
                    |_| async { embedder.embed_stories().await },
                )
                .await?
        }
    };

    info!(written, mode = ?args.mode, "Embedding stage complete");
    Ok(())
}
