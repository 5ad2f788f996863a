use daybreak_common::DigestError;

use crate::error::store_err;
use crate::rows::{ImageRow, NewImage};
use crate::Store;

impl Store {
    /// (id, title) of stories in `digest_id` that have no search images yet.
    pub async fn stories_without_images(
        &self,
        digest_id: i64,
    ) -> Result<Vec<(i64, String)>, DigestError> {
        sqlx::query_as(
            "select s.id, s.title
             from stories s
             where s.digest_id = $1
             and s.id not in (select story_id from images)
             order by s.id",
        )
        .bind(digest_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err("images"))
    }

    pub async fn insert_image(&self, image: &NewImage) -> Result<(), DigestError> {
        sqlx::query(
            "insert into images (story_id, title, url, source_page, height, width, format)
             values ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(image.story_id)
        .bind(&image.title)
        .bind(&image.url)
        .bind(&image.source_page)
        .bind(image.height)
        .bind(image.width)
        .bind(&image.format)
        .execute(&self.pool)
        .await
        .map_err(store_err("images"))?;
        Ok(())
    }

    pub async fn images_for_story(&self, story_id: i64) -> Result<Vec<ImageRow>, DigestError> {
        sqlx::query_as::<_, ImageRow>("select * from images where story_id = $1 order by id")
            .bind(story_id)
            .fetch_all(&self.pool)
            .await
            .map_err(store_err("images"))
    }
}
