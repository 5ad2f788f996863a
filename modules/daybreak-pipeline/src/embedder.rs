use std::sync::Arc;

use tracing::info;

use ai_client::traits::EmbedAgent;
use daybreak_common::text::first_words;
use daybreak_common::DigestError;
use daybreak_store::Store;

/// Body words included in an article embedding input.
const BODY_WORDS_PER_EMBEDDING: usize = 800;

/// Vectorises articles and stories that have no embedding row yet.
///
/// A model failure aborts the stage: the digest state stays put and the
/// already-written embeddings are simply skipped on the next run.
pub struct Embedder {
    store: Store,
    agent: Arc<dyn EmbedAgent>,
}

impl Embedder {
    pub fn new(store: Store, agent: Arc<dyn EmbedAgent>) -> Self {
        Self { store, agent }
    }

    /// Embed every article lacking a vector. Returns how many were written.
    pub async fn embed_articles(&self) -> Result<u32, DigestError> {
        let articles = self.store.unembedded_articles().await?;
        info!(count = articles.len(), "Embedding articles");

        let mut written = 0;
        for article in articles {
            let input = format!(
                "{}\n{}\n{}",
                article.title,
                article.subtitle,
                first_words(&article.body, BODY_WORDS_PER_EMBEDDING),
            );
            let vector = self.agent.embed(&input).await?;
            self.store
                .insert_article_embedding(article.id, &vector)
                .await?;
            written += 1;
        }

        info!(written, "Article embedding complete");
        Ok(written)
    }

    /// Embed every story lacking a vector. Returns how many were written.
    pub async fn embed_stories(&self) -> Result<u32, DigestError> {
        let stories = self.store.unembedded_stories().await?;
        info!(count = stories.len(), "Embedding stories");

        let mut written = 0;
        for story in stories {
            let input = format!(
                "{}\t{}\n{}",
                story.ts.format("%Y-%m-%d"),
                story.title,
                story.summary,
            );
            let vector = self.agent.embed(&input).await?;
            self.store.insert_story_embedding(story.id, &vector).await?;
            written += 1;
        }

        info!(written, "Story embedding complete");
        Ok(written)
    }
}
