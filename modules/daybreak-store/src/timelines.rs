use daybreak_common::DigestError;

use crate::error::store_err;
use crate::rows::{NewTimeline, NewTimelineEvent, RundownRow, TimelineRow};
use crate::Store;

impl Store {
    pub async fn timelines_for_digest(
        &self,
        digest_id: i64,
    ) -> Result<Vec<TimelineRow>, DigestError> {
        sqlx::query_as::<_, TimelineRow>(
            "select * from timelines where digest_id = $1 order by id",
        )
        .bind(digest_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err("timelines"))
    }

    pub async fn insert_timeline(&self, timeline: &NewTimeline) -> Result<i64, DigestError> {
        let (id,): (i64,) = sqlx::query_as(
            "insert into timelines (ts, digest_id, subject, headline, summary)
             values ($1, $2, $3, $4, $5)
             returning id",
        )
        .bind(timeline.ts)
        .bind(timeline.digest_id)
        .bind(&timeline.subject)
        .bind(&timeline.headline)
        .bind(&timeline.summary)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err("timelines"))?;
        Ok(id)
    }

    pub async fn insert_timeline_event(
        &self,
        timeline_id: i64,
        event: &NewTimelineEvent,
    ) -> Result<(), DigestError> {
        sqlx::query(
            "insert into timeline_events (timeline_id, story_id, description, date, date_type)
             values ($1, $2, $3, $4, $5)
             on conflict do nothing",
        )
        .bind(timeline_id)
        .bind(event.story_id)
        .bind(&event.description)
        .bind(event.date)
        .bind(event.date_type.to_string())
        .execute(&self.pool)
        .await
        .map_err(store_err("timeline_events"))?;
        Ok(())
    }

    pub async fn link_timeline_story(
        &self,
        timeline_id: i64,
        story_id: i64,
    ) -> Result<(), DigestError> {
        sqlx::query(
            "insert into timeline_stories (timeline_id, story_id) values ($1, $2)
             on conflict do nothing",
        )
        .bind(timeline_id)
        .bind(story_id)
        .execute(&self.pool)
        .await
        .map_err(store_err("timeline_stories"))?;
        Ok(())
    }

    pub async fn insert_rundown(
        &self,
        digest_id: i64,
        rundown_type: &str,
        rundown: &str,
    ) -> Result<(), DigestError> {
        sqlx::query(
            "insert into digest_rundowns (digest_id, rundown_type, rundown)
             values ($1, $2, $3)
             on conflict (digest_id, rundown_type) do update set rundown = excluded.rundown",
        )
        .bind(digest_id)
        .bind(rundown_type)
        .bind(rundown)
        .execute(&self.pool)
        .await
        .map_err(store_err("digest_rundowns"))?;
        Ok(())
    }

    pub async fn rundowns_for_digest(
        &self,
        digest_id: i64,
    ) -> Result<Vec<RundownRow>, DigestError> {
        sqlx::query_as::<_, RundownRow>(
            "select * from digest_rundowns where digest_id = $1 order by rundown_type",
        )
        .bind(digest_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err("digest_rundowns"))
    }
}
