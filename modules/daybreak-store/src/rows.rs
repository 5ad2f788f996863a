use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

/// Static seed row describing one news provider.
#[derive(Debug, Clone, FromRow)]
pub struct ProviderRow {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub favicon_url: String,
    pub country: String,
    pub timezone: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct ArticleRow {
    pub id: i64,
    pub provider_id: i64,
    pub ts: DateTime<Utc>,
    pub date: NaiveDate,
    pub title: String,
    pub subtitle: String,
    pub url: String,
    pub body: String,
    pub image_url: Option<String>,
    /// JSON-encoded list of candidate image URLs, in page order.
    pub image_urls: Option<String>,
}

impl ArticleRow {
    /// Decode the candidate image URL list; an absent or malformed column
    /// yields an empty list.
    pub fn image_url_list(&self) -> Vec<String> {
        self.image_urls
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default()
    }
}

/// A fully validated article ready for insertion.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub provider_id: i64,
    pub ts: DateTime<Utc>,
    pub date: NaiveDate,
    pub title: String,
    pub subtitle: String,
    pub url: String,
    pub body: String,
    pub image_url: Option<String>,
    pub image_urls: Vec<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct StoryRow {
    pub id: i64,
    pub ts: DateTime<Utc>,
    pub digest_id: i64,
    pub digest_description: String,
    pub title: String,
    pub summary: String,
    pub coverage: String,
}

#[derive(Debug, Clone)]
pub struct DigestRow {
    pub id: i64,
    pub status: daybreak_common::DigestState,
    pub ts: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct RundownRow {
    pub digest_id: i64,
    pub rundown_type: String,
    pub rundown: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct TimelineRow {
    pub id: i64,
    pub ts: DateTime<Utc>,
    pub digest_id: i64,
    pub subject: String,
    pub headline: String,
    pub summary: String,
}

#[derive(Debug, Clone)]
pub struct NewTimeline {
    pub ts: DateTime<Utc>,
    pub digest_id: i64,
    pub subject: String,
    pub headline: String,
    pub summary: String,
}

#[derive(Debug, Clone)]
pub struct NewTimelineEvent {
    pub story_id: i64,
    pub description: String,
    pub date: NaiveDate,
    pub date_type: daybreak_common::DatePrecision,
}

#[derive(Debug, Clone, FromRow)]
pub struct ImageRow {
    pub id: i64,
    pub story_id: i64,
    pub title: Option<String>,
    pub url: String,
    pub source_page: Option<String>,
    pub height: Option<i32>,
    pub width: Option<i32>,
    pub format: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewImage {
    pub story_id: i64,
    pub title: Option<String>,
    pub url: String,
    pub source_page: Option<String>,
    pub height: Option<i32>,
    pub width: Option<i32>,
    pub format: Option<String>,
}
