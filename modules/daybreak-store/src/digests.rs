use std::str::FromStr;

use chrono::{DateTime, Utc};
use tracing::info;

use daybreak_common::{DigestError, DigestState, StoreErrorKind};

use crate::error::store_err;
use crate::rows::DigestRow;
use crate::Store;

fn parse_state(raw: &str) -> Result<DigestState, DigestError> {
    DigestState::from_str(raw).map_err(|cause| DigestError::Store {
        kind: StoreErrorKind::Decode,
        table: "digests",
        cause,
    })
}

impl Store {
    /// Allocate the next digest id (`max + 1`, 0 for an empty table) and
    /// insert the row in state CREATED. Returns the new id.
    pub async fn create_digest(&self, now: DateTime<Utc>) -> Result<i64, DigestError> {
        let (id,): (i64,) = sqlx::query_as(
            "insert into digests (id, status, ts)
             select coalesce(max(id) + 1, 0), $1, $2 from digests
             returning id",
        )
        .bind(DigestState::Created.to_string())
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err("digests"))?;

        info!(digest_id = id, "Created digest");
        Ok(id)
    }

    /// The newest digest whose state is not READY.
    pub async fn latest_incomplete_digest(&self) -> Result<DigestRow, DigestError> {
        let row: Option<(i64, String, DateTime<Utc>)> = sqlx::query_as(
            "select id, status, ts from digests
             where status != $1
             order by ts desc limit 1",
        )
        .bind(DigestState::Ready.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err("digests"))?;

        let (id, status, ts) = row.ok_or(DigestError::NoIncompleteDigest)?;
        Ok(DigestRow {
            id,
            status: parse_state(&status)?,
            ts,
        })
    }

    /// The highest-id digest in state READY, if any.
    pub async fn latest_ready_digest(&self) -> Result<Option<i64>, DigestError> {
        let row: Option<(i64,)> = sqlx::query_as(
            "select id from digests where status = $1 order by id desc limit 1",
        )
        .bind(DigestState::Ready.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err("digests"))?;
        Ok(row.map(|(id,)| id))
    }

    pub async fn digest_state(&self, digest_id: i64) -> Result<DigestState, DigestError> {
        let row: Option<(String,)> =
            sqlx::query_as("select status from digests where id = $1")
                .bind(digest_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(store_err("digests"))?;

        let (status,) = row.ok_or_else(|| DigestError::Validation(format!(
            "digest {digest_id} does not exist"
        )))?;
        parse_state(&status)
    }

    /// Move a digest to `state` and bump its timestamp.
    pub async fn set_digest_state(
        &self,
        digest_id: i64,
        state: DigestState,
        now: DateTime<Utc>,
    ) -> Result<(), DigestError> {
        sqlx::query("update digests set status = $1, ts = $2 where id = $3")
            .bind(state.to_string())
            .bind(now)
            .bind(digest_id)
            .execute(&self.pool)
            .await
            .map_err(store_err("digests"))?;

        info!(digest_id, state = %state, "Set digest state");
        Ok(())
    }
}
