use tracing::info;

use daybreak_common::DigestError;
use daybreak_store::Store;

use crate::summarise::Summariser;

/// Generates the category rundowns for a digest from its stories.
pub struct RundownGenerator {
    store: Store,
    summariser: Summariser,
}

impl RundownGenerator {
    pub fn new(store: Store, summariser: Summariser) -> Self {
        Self { store, summariser }
    }

    /// Returns the number of rundown rows written.
    pub async fn run(&self, digest_id: i64) -> Result<u32, DigestError> {
        let stories = self.store.stories_for_digest(digest_id).await?;
        if stories.is_empty() {
            return Err(DigestError::Validation(format!(
                "digest {digest_id} has no stories to run down"
            )));
        }

        info!(digest_id, stories = stories.len(), "Generating rundowns");
        let rundowns = self.summariser.rundowns(&stories).await?;

        let mut written = 0;
        for (category, text) in rundowns.entries() {
            self.store.insert_rundown(digest_id, category, text).await?;
            written += 1;
        }

        info!(digest_id, written, "Rundowns written");
        Ok(written)
    }
}
