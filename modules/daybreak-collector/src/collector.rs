use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{info, warn};

use daybreak_common::text::collapse_whitespace;
use daybreak_common::DigestError;
use daybreak_store::{NewArticle, ProviderRow, Store};

use crate::fetch::{FetchError, PageFetcher};
use crate::filter::{criteria_for, passes_criteria};
use crate::homepage::extract_article_links;
use crate::parse::{ArticleParser, ParsedArticle};
use crate::timezone::normalise_publish_time;
use crate::validate::validate_article;

/// Homepage candidates kept per provider on each run.
const MAX_CANDIDATES_PER_PROVIDER: usize = 20;
/// Stagger between provider task starts.
const PER_SOURCE_DELAY: Duration = Duration::from_millis(200);
/// Back-off before the single parse retry.
const PARSE_RETRY_DELAY: Duration = Duration::from_secs(2);
/// Candidate image URLs probed per article.
const MAX_IMAGE_PROBES: usize = 5;

#[derive(Debug, Default, Clone)]
pub struct ProviderCount {
    pub candidates: u32,
    pub accepted: u32,
    pub rejected: u32,
    pub failed: u32,
}

#[derive(Debug, Default)]
pub struct CollectStats {
    pub providers: usize,
    pub counts: HashMap<String, ProviderCount>,
    pub inserted: u32,
    pub duplicates: u32,
}

impl std::fmt::Display for CollectStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Collection Complete ===")?;
        writeln!(f, "Providers:  {}", self.providers)?;
        let mut names: Vec<&String> = self.counts.keys().collect();
        names.sort();
        for name in names {
            let c = &self.counts[name];
            writeln!(
                f,
                "  {name}: {} candidates, {} accepted, {} rejected, {} failed",
                c.candidates, c.accepted, c.rejected, c.failed
            )?;
        }
        writeln!(f, "Inserted:   {}", self.inserted)?;
        writeln!(f, "Duplicates: {}", self.duplicates)?;
        Ok(())
    }
}

/// Concurrent homepage-crawl and article-filter stage.
///
/// One task per provider for both the homepage build and the download/parse
/// phases; the accepted-article list and per-provider counters sit behind
/// mutexes. Per-article failures are counted, never fatal; a provider whose
/// homepage cannot be built contributes zero articles.
pub struct Collector {
    store: Store,
    fetcher: Arc<dyn PageFetcher>,
    parser: Arc<dyn ArticleParser>,
}

impl Collector {
    pub fn new(store: Store, fetcher: Arc<dyn PageFetcher>, parser: Arc<dyn ArticleParser>) -> Self {
        Self {
            store,
            fetcher,
            parser,
        }
    }

    pub async fn run(&self) -> Result<CollectStats, DigestError> {
        let providers = self.store.providers().await?;
        let known_urls = Arc::new(self.store.article_urls().await?);
        info!(providers = providers.len(), known_urls = known_urls.len(), "Starting collection");

        // Phase 1: build sources — fetch each homepage and enumerate
        // filtered, deduplicated candidate URLs.
        let mut build_set: JoinSet<(ProviderRow, Vec<String>)> = JoinSet::new();
        for (i, provider) in providers.iter().cloned().enumerate() {
            let fetcher = Arc::clone(&self.fetcher);
            let known = Arc::clone(&known_urls);
            build_set.spawn(async move {
                tokio::time::sleep(PER_SOURCE_DELAY * i as u32).await;
                match build_provider(&*fetcher, &provider, &known).await {
                    Ok(candidates) => (provider, candidates),
                    Err(e) => {
                        warn!(provider = %provider.name, error = %e, "Provider build failed");
                        (provider, Vec::new())
                    }
                }
            });
        }

        let mut built: Vec<(ProviderRow, Vec<String>)> = Vec::new();
        while let Some(joined) = build_set.join_next().await {
            match joined {
                Ok(result) => built.push(result),
                Err(e) => warn!(error = %e, "Provider build task panicked"),
            }
        }

        // Phase 2: download and parse candidates, one task per provider.
        let accepted: Arc<Mutex<Vec<NewArticle>>> = Arc::new(Mutex::new(Vec::new()));
        let counts: Arc<Mutex<HashMap<String, ProviderCount>>> =
            Arc::new(Mutex::new(HashMap::new()));

        let mut pull_set: JoinSet<()> = JoinSet::new();
        for (provider, candidates) in built {
            let fetcher = Arc::clone(&self.fetcher);
            let parser = Arc::clone(&self.parser);
            let accepted = Arc::clone(&accepted);
            let counts = Arc::clone(&counts);

            pull_set.spawn(async move {
                let mut count = ProviderCount {
                    candidates: candidates.len() as u32,
                    ..Default::default()
                };

                for url in candidates {
                    match pull_article(&*fetcher, &*parser, &provider, &url).await {
                        Ok(Some(article)) => {
                            count.accepted += 1;
                            accepted.lock().await.push(article);
                        }
                        Ok(None) => count.rejected += 1,
                        Err(_) => count.failed += 1,
                    }
                }

                info!(
                    provider = %provider.name,
                    candidates = count.candidates,
                    accepted = count.accepted,
                    rejected = count.rejected,
                    failed = count.failed,
                    "Provider pulled"
                );
                counts.lock().await.insert(provider.name.clone(), count);
            });
        }

        while let Some(joined) = pull_set.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Provider pull task panicked");
            }
        }

        // Insert accepted articles; duplicates by URL are ignored.
        let mut stats = CollectStats {
            providers: providers.len(),
            counts: counts.lock().await.clone(),
            ..Default::default()
        };

        let articles = accepted.lock().await;
        for article in articles.iter() {
            if self.store.insert_article(article).await? {
                stats.inserted += 1;
            } else {
                stats.duplicates += 1;
            }
        }

        info!(inserted = stats.inserted, duplicates = stats.duplicates, "Collection complete");
        Ok(stats)
    }
}

/// Fetch one provider homepage and produce its candidate URL list.
async fn build_provider(
    fetcher: &dyn PageFetcher,
    provider: &ProviderRow,
    known_urls: &std::collections::HashSet<String>,
) -> Result<Vec<String>, DigestError> {
    let html = fetcher
        .fetch(&provider.url)
        .await
        .map_err(|e| DigestError::ProviderBuild {
            provider: provider.name.clone(),
            cause: e.to_string(),
        })?;

    let criteria = criteria_for(&provider.name);
    let candidates: Vec<String> = extract_article_links(&html, &provider.url)
        .into_iter()
        .filter(|url| passes_criteria(url, criteria))
        .filter(|url| !known_urls.contains(url))
        .take(MAX_CANDIDATES_PER_PROVIDER)
        .collect();

    info!(provider = %provider.name, candidates = candidates.len(), "Provider built");
    Ok(candidates)
}

/// Download and parse one candidate. `Ok(None)` means dropped (terminal
/// download failure or validation rejection); `Err` means fetch or parse
/// kept failing after the retry.
async fn pull_article(
    fetcher: &dyn PageFetcher,
    parser: &dyn ArticleParser,
    provider: &ProviderRow,
    url: &str,
) -> Result<Option<NewArticle>, DigestError> {
    let parsed = match fetch_and_parse(fetcher, parser, url).await {
        Ok(Some(parsed)) => parsed,
        Ok(None) => return Ok(None),
        Err(first) => {
            // One retry after a short back-off; half-rendered pages and
            // consent interstitials often clear on the second attempt.
            tokio::time::sleep(PARSE_RETRY_DELAY).await;
            match fetch_and_parse(fetcher, parser, url).await {
                Ok(Some(parsed)) => parsed,
                Ok(None) => return Ok(None),
                Err(e) => {
                    warn!(url, first = %first, error = %e, "Parse retry failed");
                    return Err(e);
                }
            }
        }
    };

    let ts = match parsed.published {
        Some(local) => normalise_publish_time(local, &provider.timezone, &provider.country),
        None => {
            tracing::debug!(url, "Article rejected: no publish date");
            return Ok(None);
        }
    };

    let now = Utc::now();
    if let Err(reason) =
        validate_article(&provider.name, url, &parsed.title, &parsed.body, Some(ts), now)
    {
        tracing::debug!(url, ?reason, "Article rejected");
        return Ok(None);
    }

    let ParsedArticle {
        title,
        subtitle,
        body,
        cover_image,
        image_urls,
        ..
    } = parsed;

    // Keep only image candidates the origin will actually serve.
    let mut kept_images = Vec::new();
    for image_url in image_urls.into_iter().take(MAX_IMAGE_PROBES) {
        if fetcher.probe_image(&image_url).await {
            kept_images.push(image_url);
        }
    }
    let cover_image = cover_image.filter(|c| kept_images.contains(c));

    Ok(Some(NewArticle {
        provider_id: provider.id,
        ts,
        date: ts.date_naive(),
        title,
        subtitle: collapse_whitespace(&subtitle),
        url: url.to_string(),
        body: collapse_whitespace(&body),
        image_url: cover_image,
        image_urls: kept_images,
    }))
}

/// `Ok(None)` marks a terminal download failure: the candidate is dropped
/// without a retry.
async fn fetch_and_parse(
    fetcher: &dyn PageFetcher,
    parser: &dyn ArticleParser,
    url: &str,
) -> Result<Option<ParsedArticle>, DigestError> {
    let html = match fetcher.fetch(url).await {
        Ok(html) => html,
        Err(FetchError::Terminal { status, .. }) => {
            tracing::debug!(url, status, "Terminal download failure, dropped");
            return Ok(None);
        }
        Err(e @ FetchError::Transient { .. }) => return Err(DigestError::Parse(e.to_string())),
    };
    parser.parse(&html, url).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;

    struct StaticFetcher {
        pages: HashMap<String, String>,
    }

    #[async_trait]
    impl PageFetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::Terminal {
                    url: url.to_string(),
                    status: 404,
                })
        }
    }

    fn provider() -> ProviderRow {
        ProviderRow {
            id: 1,
            name: "The Guardian".to_string(),
            url: "https://www.theguardian.com".to_string(),
            favicon_url: String::new(),
            country: "UK".to_string(),
            timezone: "Europe/London".to_string(),
        }
    }

    #[tokio::test]
    async fn build_filters_known_and_blacklisted_urls() {
        let homepage = r#"
            <html><body>
                <a href="/world/2026/mar/14/summit-ends">Summit</a>
                <a href="/sport/2026/mar/14/final">Final</a>
                <a href="/world/2026/mar/13/already-seen">Seen</a>
            </body></html>
        "#;
        let mut pages = HashMap::new();
        pages.insert("https://www.theguardian.com".to_string(), homepage.to_string());
        let fetcher = StaticFetcher { pages };

        let mut known = HashSet::new();
        known.insert("https://www.theguardian.com/world/2026/mar/13/already-seen".to_string());

        let candidates = build_provider(&fetcher, &provider(), &known).await.unwrap();
        assert_eq!(
            candidates,
            vec!["https://www.theguardian.com/world/2026/mar/14/summit-ends"]
        );
    }

    #[tokio::test]
    async fn build_failure_is_a_provider_build_error() {
        let fetcher = StaticFetcher {
            pages: HashMap::new(),
        };
        let err = build_provider(&fetcher, &provider(), &HashSet::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DigestError::ProviderBuild { .. }));
    }

    struct CountingParser {
        fail_first: std::sync::atomic::AtomicBool,
    }

    impl ArticleParser for CountingParser {
        fn parse(&self, _html: &str, url: &str) -> Result<ParsedArticle, DigestError> {
            if self.fail_first.swap(false, std::sync::atomic::Ordering::SeqCst) {
                return Err(DigestError::Parse(format!("flaky parse for {url}")));
            }
            Ok(ParsedArticle {
                title: "Seven words are needed for this title".to_string(),
                subtitle: "sub".to_string(),
                body: "word ".repeat(30).trim().to_string(),
                published: Some(
                    (Utc::now() - chrono::Duration::hours(3)).naive_utc(),
                ),
                cover_image: None,
                image_urls: Vec::new(),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn parse_is_retried_once() {
        let url = "https://www.theguardian.com/world/2026/mar/14/retry";
        let mut pages = HashMap::new();
        pages.insert(url.to_string(), "<html></html>".to_string());
        let fetcher = StaticFetcher { pages };
        let parser = CountingParser {
            fail_first: std::sync::atomic::AtomicBool::new(true),
        };

        let article = pull_article(&fetcher, &parser, &provider(), url)
            .await
            .unwrap()
            .expect("accepted after retry");
        assert_eq!(article.url, url);
    }

    /// Parser with fixed images; fetcher that refuses one of them.
    struct ImageParser;

    impl ArticleParser for ImageParser {
        fn parse(&self, _html: &str, _url: &str) -> Result<ParsedArticle, DigestError> {
            Ok(ParsedArticle {
                title: "Seven words are needed for this title".to_string(),
                subtitle: "sub".to_string(),
                body: "word ".repeat(30).trim().to_string(),
                published: Some((Utc::now() - chrono::Duration::hours(3)).naive_utc()),
                cover_image: Some("https://cdn.example.com/dead.jpg".to_string()),
                image_urls: vec![
                    "https://cdn.example.com/dead.jpg".to_string(),
                    "https://cdn.example.com/live.jpg".to_string(),
                ],
            })
        }
    }

    struct ProbingFetcher {
        pages: HashMap<String, String>,
    }

    #[async_trait]
    impl PageFetcher for ProbingFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::Terminal {
                    url: url.to_string(),
                    status: 404,
                })
        }

        async fn probe_image(&self, url: &str) -> bool {
            !url.contains("dead")
        }
    }

    #[tokio::test]
    async fn unreachable_images_are_dropped() {
        let url = "https://www.theguardian.com/world/2026/mar/14/images";
        let mut pages = HashMap::new();
        pages.insert(url.to_string(), "<html></html>".to_string());
        let fetcher = ProbingFetcher { pages };

        let article = pull_article(&fetcher, &ImageParser, &provider(), url)
            .await
            .unwrap()
            .expect("accepted");

        assert_eq!(article.image_urls, vec!["https://cdn.example.com/live.jpg"]);
        // The cover pointed at the dead image, so it is dropped too.
        assert!(article.image_url.is_none());
    }

    #[tokio::test]
    async fn terminal_fetch_failure_drops_the_candidate() {
        let fetcher = StaticFetcher {
            pages: HashMap::new(),
        };
        let parser = CountingParser {
            fail_first: std::sync::atomic::AtomicBool::new(false),
        };
        let result = pull_article(
            &fetcher,
            &parser,
            &provider(),
            "https://www.theguardian.com/world/missing",
        )
        .await
        .unwrap();
        assert!(result.is_none());
    }
}
