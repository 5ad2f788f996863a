use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use daybreak_common::DigestError;
use daybreak_store::{NewImage, Store};

/// Results requested per story headline.
const IMAGES_PER_STORY: usize = 5;
const SEARCH_TIMEOUT: Duration = Duration::from_secs(5);

/// One result from the image-search provider.
#[derive(Debug, Clone)]
pub struct ImageResult {
    pub title: Option<String>,
    pub url: String,
    pub source_page: Option<String>,
    pub height: Option<i32>,
    pub width: Option<i32>,
    pub format: Option<String>,
}

/// External image-search collaborator, queried by story headline.
#[async_trait]
pub trait ImageSearcher: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<ImageResult>>;
}

// =============================================================================
// Google Custom Search implementation
// =============================================================================

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    title: Option<String>,
    link: String,
    mime: Option<String>,
    #[serde(default)]
    image: Option<SearchItemImage>,
}

#[derive(Debug, Deserialize)]
struct SearchItemImage {
    #[serde(rename = "contextLink")]
    context_link: Option<String>,
    height: Option<i32>,
    width: Option<i32>,
}

pub struct GoogleImageSearch {
    api_key: String,
    engine_id: String,
    client: reqwest::Client,
}

impl GoogleImageSearch {
    pub fn new(api_key: &str, engine_id: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(SEARCH_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            api_key: api_key.to_string(),
            engine_id: engine_id.to_string(),
            client,
        }
    }
}

#[async_trait]
impl ImageSearcher for GoogleImageSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<ImageResult>> {
        let response = self
            .client
            .get("https://www.googleapis.com/customsearch/v1")
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
                ("searchType", "image"),
                ("num", &max_results.to_string()),
            ])
            .send()
            .await
            .context("image search request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("image search error ({status}): {body}"));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .context("image search response was not JSON")?;

        Ok(parsed
            .items
            .into_iter()
            .map(|item| {
                let image = item.image.unwrap_or(SearchItemImage {
                    context_link: None,
                    height: None,
                    width: None,
                });
                ImageResult {
                    title: item.title,
                    url: item.link,
                    source_page: image.context_link,
                    height: image.height,
                    width: image.width,
                    format: item.mime,
                }
            })
            .collect())
    }
}

// =============================================================================
// Stage
// =============================================================================

/// Fetches search images for each story in the digest that has none.
///
/// Per-story search failures are logged and skipped. Without credentials the
/// stage is a no-op so the pipeline can still advance.
pub struct ImageCollector {
    store: Store,
    searcher: Option<Arc<dyn ImageSearcher>>,
}

impl ImageCollector {
    pub fn new(store: Store, searcher: Option<Arc<dyn ImageSearcher>>) -> Self {
        Self { store, searcher }
    }

    /// Returns the number of image rows written.
    pub async fn run(&self, digest_id: i64) -> Result<u32, DigestError> {
        let Some(searcher) = &self.searcher else {
            info!(digest_id, "Image search not configured, skipping");
            return Ok(0);
        };

        let stories = self.store.stories_without_images(digest_id).await?;
        info!(digest_id, stories = stories.len(), "Collecting story images");

        let mut written = 0;
        for (story_id, title) in stories {
            let results = match searcher.search(&title, IMAGES_PER_STORY).await {
                Ok(results) => results,
                Err(e) => {
                    warn!(story_id, error = %e, "Image search failed for story");
                    continue;
                }
            };

            for result in results {
                self.store
                    .insert_image(&NewImage {
                        story_id,
                        title: result.title,
                        url: result.url,
                        source_page: result.source_page,
                        height: result.height,
                        width: result.width,
                        format: result.format,
                    })
                    .await?;
                written += 1;
            }
        }

        info!(digest_id, written, "Image collection complete");
        Ok(written)
    }
}
