use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};

use daybreak_common::{DigestError, StoreErrorKind};

use crate::error::store_err;
use crate::rows::{ArticleRow, StoryRow};
use crate::Store;

fn decode_vector(table: &'static str, raw: &str) -> Result<Vec<f32>, DigestError> {
    serde_json::from_str(raw).map_err(|e| DigestError::Store {
        kind: StoreErrorKind::Decode,
        table,
        cause: e.to_string(),
    })
}

fn row_with_vector<T>(
    table: &'static str,
    row: &PgRow,
) -> Result<(T, Vec<f32>), DigestError>
where
    T: for<'r> FromRow<'r, PgRow>,
{
    let entity = T::from_row(row).map_err(store_err(table))?;
    let encoded: String = row.try_get("embedding").map_err(store_err(table))?;
    let vector = decode_vector(table, &encoded)?;
    Ok((entity, vector))
}

impl Store {
    /// Articles with no embedding row yet.
    pub async fn unembedded_articles(&self) -> Result<Vec<ArticleRow>, DigestError> {
        sqlx::query_as::<_, ArticleRow>(
            "select a.*
             from articles a
             left outer join article_embeddings e on a.id = e.article_id
             where e.article_id is null
             order by a.id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_err("article_embeddings"))
    }

    pub async fn insert_article_embedding(
        &self,
        article_id: i64,
        embedding: &[f32],
    ) -> Result<(), DigestError> {
        let serialised = serde_json::to_string(embedding)
            .map_err(|e| DigestError::Validation(e.to_string()))?;
        sqlx::query(
            "insert into article_embeddings (article_id, embedding) values ($1, $2)
             on conflict (article_id) do nothing",
        )
        .bind(article_id)
        .bind(serialised)
        .execute(&self.pool)
        .await
        .map_err(store_err("article_embeddings"))?;
        Ok(())
    }

    /// Stories with no embedding row yet.
    pub async fn unembedded_stories(&self) -> Result<Vec<StoryRow>, DigestError> {
        sqlx::query_as::<_, StoryRow>(
            "select s.*
             from stories s
             left outer join story_embeddings e on s.id = e.story_id
             where e.story_id is null
             order by s.id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_err("story_embeddings"))
    }

    pub async fn insert_story_embedding(
        &self,
        story_id: i64,
        embedding: &[f32],
    ) -> Result<(), DigestError> {
        let serialised = serde_json::to_string(embedding)
            .map_err(|e| DigestError::Validation(e.to_string()))?;
        sqlx::query(
            "insert into story_embeddings (story_id, embedding) values ($1, $2)
             on conflict (story_id) do nothing",
        )
        .bind(story_id)
        .bind(serialised)
        .execute(&self.pool)
        .await
        .map_err(store_err("story_embeddings"))?;
        Ok(())
    }

    /// Embedded articles newer than `since`, with their vectors.
    pub async fn embedded_articles_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<(ArticleRow, Vec<f32>)>, DigestError> {
        let rows = sqlx::query(
            "select a.*, e.embedding
             from articles a
             join article_embeddings e on a.id = e.article_id
             where a.ts > $1
             order by a.id",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err("article_embeddings"))?;

        rows.iter()
            .map(|row| row_with_vector::<ArticleRow>("article_embeddings", row))
            .collect()
    }

    /// Embedded stories newer than `since`, with their vectors.
    pub async fn embedded_stories_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<(StoryRow, Vec<f32>)>, DigestError> {
        let rows = sqlx::query(
            "select s.*, e.embedding
             from stories s
             join story_embeddings e on s.id = e.story_id
             where s.ts > $1
             order by s.id",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err("story_embeddings"))?;

        rows.iter()
            .map(|row| row_with_vector::<StoryRow>("story_embeddings", row))
            .collect()
    }
}
