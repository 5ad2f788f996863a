use chrono::{DateTime, Utc};

use daybreak_common::DigestError;

use crate::error::store_err;
use crate::rows::StoryRow;
use crate::Store;

impl Store {
    /// Insert a story row and return its id.
    pub async fn insert_story(
        &self,
        ts: DateTime<Utc>,
        digest_id: i64,
        digest_description: &str,
        title: &str,
        summary: &str,
        coverage: &str,
    ) -> Result<i64, DigestError> {
        let (id,): (i64,) = sqlx::query_as(
            "insert into stories (ts, digest_id, digest_description, title, summary, coverage)
             values ($1, $2, $3, $4, $5, $6)
             returning id",
        )
        .bind(ts)
        .bind(digest_id)
        .bind(digest_description)
        .bind(title)
        .bind(summary)
        .bind(coverage)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err("stories"))?;
        Ok(id)
    }

    pub async fn link_story_article(
        &self,
        story_id: i64,
        article_id: i64,
    ) -> Result<(), DigestError> {
        sqlx::query(
            "insert into story_articles (story_id, article_id) values ($1, $2)
             on conflict do nothing",
        )
        .bind(story_id)
        .bind(article_id)
        .execute(&self.pool)
        .await
        .map_err(store_err("story_articles"))?;
        Ok(())
    }

    pub async fn stories_for_digest(&self, digest_id: i64) -> Result<Vec<StoryRow>, DigestError> {
        sqlx::query_as::<_, StoryRow>("select * from stories where digest_id = $1 order by id")
            .bind(digest_id)
            .fetch_all(&self.pool)
            .await
            .map_err(store_err("stories"))
    }
}
