use std::collections::{HashMap, HashSet};

use chrono::{Duration, Utc};
use tracing::{info, warn};

use daybreak_cluster::{story_admission, DensityClusterer, MIN_CLUSTER_SIZE};
use daybreak_common::{sanitize_keyword, DigestError};
use daybreak_store::{ArticleRow, ProviderRow, Store};

use crate::summarise::{ArticlePayload, Summariser};

/// Only articles published inside this window are clustered.
const ARTICLE_WINDOW_HOURS: i64 = 48;
/// Newest articles per cluster sent to the model.
const MAX_ARTICLES_PER_PROMPT: usize = 20;

#[derive(Debug, Default)]
pub struct StoryStats {
    pub articles: usize,
    pub clusters: usize,
    pub admitted: usize,
    pub rejected: usize,
}

impl std::fmt::Display for StoryStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Story Generation Complete ===")?;
        writeln!(f, "Articles clustered: {}", self.articles)?;
        writeln!(f, "Clusters found:     {}", self.clusters)?;
        writeln!(f, "Stories admitted:   {}", self.admitted)?;
        writeln!(f, "Clusters rejected:  {}", self.rejected)?;
        Ok(())
    }
}

/// Groups recent articles into stories and persists the admitted ones with
/// their LLM digest and keywords.
pub struct StoryGenerator {
    store: Store,
    summariser: Summariser,
}

impl StoryGenerator {
    pub fn new(store: Store, summariser: Summariser) -> Self {
        Self { store, summariser }
    }

    pub async fn run(&self, digest_id: i64) -> Result<StoryStats, DigestError> {
        let now = Utc::now();
        let since = now - Duration::hours(ARTICLE_WINDOW_HOURS);

        let embedded = self.store.embedded_articles_since(since).await?;
        let providers: HashMap<i64, ProviderRow> = self
            .store
            .providers()
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let vectors: Vec<Vec<f32>> = embedded.iter().map(|(_, v)| v.clone()).collect();
        let labels = DensityClusterer::new(MIN_CLUSTER_SIZE).fit(&vectors);

        let mut clusters: HashMap<usize, Vec<&ArticleRow>> = HashMap::new();
        for ((article, _), label) in embedded.iter().zip(&labels) {
            if let Some(label) = label {
                clusters.entry(*label).or_default().push(article);
            }
        }

        let mut stats = StoryStats {
            articles: embedded.len(),
            clusters: clusters.len(),
            ..Default::default()
        };

        let digest_description = format!("{}-{}", now.format("%Y%m%d"), digest_id);

        // Deterministic processing order.
        let mut ordered: Vec<(usize, Vec<&ArticleRow>)> = clusters.into_iter().collect();
        ordered.sort_by_key(|(label, _)| *label);

        for (label, mut articles) in ordered {
            let provider_names: HashSet<&str> = articles
                .iter()
                .filter_map(|a| providers.get(&a.provider_id))
                .map(|p| p.name.as_str())
                .collect();
            let countries: HashSet<&str> = articles
                .iter()
                .filter_map(|a| providers.get(&a.provider_id))
                .map(|p| p.country.as_str())
                .collect();

            if !story_admission(provider_names.len(), countries.len()) {
                info!(
                    cluster = label,
                    articles = articles.len(),
                    providers = provider_names.len(),
                    countries = countries.len(),
                    "Cluster below admission threshold"
                );
                stats.rejected += 1;
                continue;
            }

            articles.sort_by(|a, b| b.ts.cmp(&a.ts));
            let payload: Vec<ArticlePayload> = articles
                .iter()
                .take(MAX_ARTICLES_PER_PROMPT)
                .map(|a| ArticlePayload {
                    provider: providers
                        .get(&a.provider_id)
                        .map(|p| p.name.clone())
                        .unwrap_or_default(),
                    ts: a.ts,
                    title: a.title.clone(),
                    subtitle: a.subtitle.clone(),
                    body: a.body.clone(),
                })
                .collect();

            let digest = self.summariser.story_digest(&payload).await?;

            let story_id = self
                .store
                .insert_story(
                    now,
                    digest_id,
                    &digest_description,
                    &digest.headline,
                    &digest.story_summary,
                    &digest.coverage_summary,
                )
                .await?;

            for article in &articles {
                self.store.link_story_article(story_id, article.id).await?;
            }

            for entry in &digest.keywords {
                let Some(cleaned) = sanitize_keyword(&entry.keyword) else {
                    continue;
                };
                let keyword_id = self
                    .store
                    .upsert_keyword(&cleaned, entry.keyword_type)
                    .await?;
                self.store.link_story_keyword(story_id, keyword_id).await?;
            }

            info!(
                story_id,
                headline = %digest.headline,
                articles = articles.len(),
                providers = provider_names.len(),
                "Story written"
            );
            stats.admitted += 1;
        }

        if stats.admitted == 0 {
            warn!("No cluster met the admission criterion");
        }
        info!(
            clusters = stats.clusters,
            admitted = stats.admitted,
            rejected = stats.rejected,
            "Story generation complete"
        );
        Ok(stats)
    }
}
