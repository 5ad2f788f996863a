use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, NaiveDate, Utc};
use rand::seq::IndexedRandom;
use serde::Serialize;
use tracing::info;

use daybreak_common::text::split_sentences;
use daybreak_common::DigestError;
use daybreak_store::{ProviderRow, Store};

/// Images sampled per story.
const MAX_IMAGES_PER_STORY: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct ProviderView {
    pub name: String,
    pub url: String,
    pub favicon_url: String,
    pub country: String,
}

impl From<&ProviderRow> for ProviderView {
    fn from(row: &ProviderRow) -> Self {
        Self {
            name: row.name.clone(),
            url: row.url.clone(),
            favicon_url: row.favicon_url.clone(),
            country: row.country.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageView {
    pub url: String,
    pub article_url: String,
    pub provider: ProviderView,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArticleView {
    pub title: String,
    pub subtitle: String,
    pub date: NaiveDate,
    pub url: String,
    pub provider: ProviderView,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoryView {
    pub id: i64,
    pub title: String,
    pub ts: DateTime<Utc>,
    pub summary: Vec<String>,
    pub coverage: Vec<String>,
    pub articles: Vec<ArticleView>,
    pub images: Option<Vec<ImageView>>,
}

impl StoryView {
    fn n_articles(&self) -> usize {
        self.articles.len()
    }

    fn n_providers(&self) -> usize {
        self.articles
            .iter()
            .map(|a| a.provider.name.as_str())
            .collect::<std::collections::HashSet<_>>()
            .len()
    }
}

/// Story rank key: breadth of coverage times volume, descending.
pub fn story_rank_key(story: &StoryView) -> usize {
    story.n_providers() * story.n_articles()
}

/// Order stories for the list endpoint.
pub fn rank_stories(mut stories: Vec<StoryView>) -> Vec<StoryView> {
    stories.sort_by(|a, b| story_rank_key(b).cmp(&story_rank_key(a)));
    stories
}

/// Draw up to three images, uniformly without replacement, from the pool of
/// every image URL carried by the story's articles. `None` when no article
/// has images.
pub fn sample_images(pool: &[ImageView]) -> Option<Vec<ImageView>> {
    if pool.is_empty() {
        return None;
    }
    let sampled: Vec<ImageView> = pool
        .choose_multiple(&mut rand::rng(), MAX_IMAGES_PER_STORY)
        .cloned()
        .collect();
    Some(sampled)
}

/// The immutable view the read endpoints serve. Swapped wholesale on
/// refresh; readers always observe one consistent assembly.
#[derive(Default)]
pub struct Snapshot {
    pub ranked: Vec<StoryView>,
    by_id: HashMap<i64, usize>,
}

impl Snapshot {
    fn from_stories(stories: Vec<StoryView>) -> Self {
        let ranked = rank_stories(stories);
        let by_id = ranked.iter().enumerate().map(|(i, s)| (s.id, i)).collect();
        Self { ranked, by_id }
    }

    pub fn story(&self, id: i64) -> Option<&StoryView> {
        self.by_id.get(&id).map(|&i| &self.ranked[i])
    }
}

/// Read-side state: assembles the latest READY digest into a snapshot and
/// swaps it atomically under concurrent readers.
pub struct ViewState {
    store: Store,
    snapshot: ArcSwap<Snapshot>,
}

impl ViewState {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            snapshot: ArcSwap::from_pointee(Snapshot::default()),
        }
    }

    pub fn load(&self) -> Arc<Snapshot> {
        self.snapshot.load_full()
    }

    /// Re-assemble from the store and swap the snapshot in. On error the
    /// previous snapshot stays in place.
    pub async fn refresh(&self) -> Result<usize, DigestError> {
        let stories = self.assemble().await?;
        let snapshot = Snapshot::from_stories(stories);
        let count = snapshot.ranked.len();
        self.snapshot.store(Arc::new(snapshot));
        info!(stories = count, "View snapshot refreshed");
        Ok(count)
    }

    async fn assemble(&self) -> Result<Vec<StoryView>, DigestError> {
        let Some(digest_id) = self.store.latest_ready_digest().await? else {
            return Ok(Vec::new());
        };

        let providers: HashMap<i64, ProviderRow> = self
            .store
            .providers()
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut views = Vec::new();
        for story in self.store.stories_for_digest(digest_id).await? {
            // Articles arrive newest-first from the store.
            let articles = self.store.articles_for_story(story.id).await?;

            let mut article_views = Vec::with_capacity(articles.len());
            let mut image_pool = Vec::new();
            for article in &articles {
                let Some(provider) = providers.get(&article.provider_id) else {
                    continue;
                };
                let provider_view = ProviderView::from(provider);

                for url in article.image_url_list() {
                    image_pool.push(ImageView {
                        url,
                        article_url: article.url.clone(),
                        provider: provider_view.clone(),
                    });
                }

                article_views.push(ArticleView {
                    title: article.title.clone(),
                    subtitle: article.subtitle.clone(),
                    date: article.date,
                    url: article.url.clone(),
                    provider: provider_view,
                });
            }

            views.push(StoryView {
                id: story.id,
                title: story.title.clone(),
                ts: story.ts,
                summary: split_sentences(&story.summary),
                coverage: split_sentences(&story.coverage),
                articles: article_views,
                images: sample_images(&image_pool),
            });
        }

        Ok(views)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(name: &str) -> ProviderView {
        ProviderView {
            name: name.to_string(),
            url: format!("https://{name}.example"),
            favicon_url: String::new(),
            country: "US".to_string(),
        }
    }

    fn article(provider_name: &str, url: &str) -> ArticleView {
        ArticleView {
            title: "t".to_string(),
            subtitle: "s".to_string(),
            date: Utc::now().date_naive(),
            url: url.to_string(),
            provider: provider(provider_name),
        }
    }

    fn story(id: i64, articles: Vec<ArticleView>) -> StoryView {
        StoryView {
            id,
            title: format!("story {id}"),
            ts: Utc::now(),
            summary: vec![],
            coverage: vec![],
            articles,
            images: None,
        }
    }

    #[test]
    fn ranking_multiplies_providers_by_articles() {
        // Story 1: 2 providers x 3 articles = 6.
        let a = story(
            1,
            vec![
                article("abc", "u1"),
                article("abc", "u2"),
                article("bbc", "u3"),
            ],
        );
        // Story 2: 2 providers x 2 articles = 4.
        let b = story(2, vec![article("cnn", "u4"), article("npr", "u5")]);
        // Story 3: 1 provider x 5 articles = 5.
        let c = story(
            3,
            vec![
                article("fox", "u6"),
                article("fox", "u7"),
                article("fox", "u8"),
                article("fox", "u9"),
                article("fox", "u10"),
            ],
        );

        let ranked = rank_stories(vec![b, c, a]);
        let ids: Vec<i64> = ranked.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 3, 2]);
    }

    #[test]
    fn sampling_is_bounded_and_distinct() {
        let pool: Vec<ImageView> = (0..10)
            .map(|i| ImageView {
                url: format!("https://img.example/{i}.jpg"),
                article_url: format!("https://news.example/{i}"),
                provider: provider("abc"),
            })
            .collect();

        let sampled = sample_images(&pool).unwrap();
        assert_eq!(sampled.len(), 3);
        let distinct: std::collections::HashSet<&str> =
            sampled.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(distinct.len(), 3);
    }

    #[test]
    fn small_pools_are_returned_whole() {
        let pool = vec![ImageView {
            url: "https://img.example/only.jpg".to_string(),
            article_url: "https://news.example/1".to_string(),
            provider: provider("abc"),
        }];
        assert_eq!(sample_images(&pool).unwrap().len(), 1);
    }

    #[test]
    fn empty_pool_yields_none() {
        assert!(sample_images(&[]).is_none());
    }

    #[test]
    fn snapshot_indexes_by_id() {
        let snapshot = Snapshot::from_stories(vec![
            story(5, vec![article("abc", "u1")]),
            story(9, vec![article("bbc", "u2")]),
        ]);
        assert_eq!(snapshot.ranked.len(), 2);
        assert_eq!(snapshot.story(9).unwrap().id, 9);
        assert!(snapshot.story(4).is_none());
    }
}
