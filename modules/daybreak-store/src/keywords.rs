use daybreak_common::{DigestError, KeywordType};

use crate::error::store_err;
use crate::Store;

impl Store {
    /// Insert-or-fetch a keyword by its unique (keyword, type) pair.
    /// Returns the keyword id either way.
    pub async fn upsert_keyword(
        &self,
        keyword: &str,
        keyword_type: KeywordType,
    ) -> Result<i64, DigestError> {
        // The no-op update makes RETURNING yield the id on conflict too.
        let (id,): (i64,) = sqlx::query_as(
            "insert into keywords (keyword, type) values ($1, $2)
             on conflict (keyword, type) do update set keyword = excluded.keyword
             returning id",
        )
        .bind(keyword)
        .bind(keyword_type.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(store_err("keywords"))?;
        Ok(id)
    }

    pub async fn link_story_keyword(
        &self,
        story_id: i64,
        keyword_id: i64,
    ) -> Result<(), DigestError> {
        sqlx::query(
            "insert into story_keywords (story_id, keyword_id) values ($1, $2)
             on conflict do nothing",
        )
        .bind(story_id)
        .bind(keyword_id)
        .execute(&self.pool)
        .await
        .map_err(store_err("story_keywords"))?;
        Ok(())
    }

    pub async fn link_timeline_keyword(
        &self,
        timeline_id: i64,
        keyword_id: i64,
    ) -> Result<(), DigestError> {
        sqlx::query(
            "insert into timeline_keywords (timeline_id, keyword_id) values ($1, $2)
             on conflict do nothing",
        )
        .bind(timeline_id)
        .bind(keyword_id)
        .execute(&self.pool)
        .await
        .map_err(store_err("timeline_keywords"))?;
        Ok(())
    }
}
