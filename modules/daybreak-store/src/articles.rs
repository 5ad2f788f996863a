use std::collections::HashSet;

use daybreak_common::DigestError;

use crate::error::store_err;
use crate::rows::{ArticleRow, NewArticle, ProviderRow};
use crate::Store;

impl Store {
    /// All active providers, in seed order.
    pub async fn providers(&self) -> Result<Vec<ProviderRow>, DigestError> {
        sqlx::query_as::<_, ProviderRow>("select * from providers order by id")
            .fetch_all(&self.pool)
            .await
            .map_err(store_err("providers"))
    }

    pub async fn provider_by_id(&self, id: i64) -> Result<Option<ProviderRow>, DigestError> {
        sqlx::query_as::<_, ProviderRow>("select * from providers where id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err("providers"))
    }

    /// The full set of article URLs already collected, for candidate dedup.
    pub async fn article_urls(&self) -> Result<HashSet<String>, DigestError> {
        let rows: Vec<(String,)> = sqlx::query_as("select url from articles")
            .fetch_all(&self.pool)
            .await
            .map_err(store_err("articles"))?;
        Ok(rows.into_iter().map(|(url,)| url).collect())
    }

    /// Insert an article, ignoring duplicates by URL.
    /// Returns true when a row was actually written.
    pub async fn insert_article(&self, article: &NewArticle) -> Result<bool, DigestError> {
        let result = sqlx::query(
            "insert into articles
                 (provider_id, ts, date, title, subtitle, url, body, image_url, image_urls)
             values ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             on conflict (url) do nothing",
        )
        .bind(article.provider_id)
        .bind(article.ts)
        .bind(article.date)
        .bind(&article.title)
        .bind(&article.subtitle)
        .bind(&article.url)
        .bind(&article.body)
        .bind(&article.image_url)
        .bind(if article.image_urls.is_empty() {
            None
        } else {
            serde_json::to_string(&article.image_urls).ok()
        })
        .execute(&self.pool)
        .await
        .map_err(store_err("articles"))?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn articles_for_story(&self, story_id: i64) -> Result<Vec<ArticleRow>, DigestError> {
        sqlx::query_as::<_, ArticleRow>(
            "select a.*
             from story_articles sa
             join articles a on a.id = sa.article_id
             where sa.story_id = $1
             order by a.ts desc",
        )
        .bind(story_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err("story_articles"))
    }
}
