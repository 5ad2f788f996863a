use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use daybreak_common::{DigestError, StoreProfile};

use crate::error::store_err;

/// The store gateway. Every persistent read and write in the system goes
/// through this type; connections are pooled and released on all paths.
#[derive(Clone)]
pub struct Store {
    pub(crate) pool: PgPool,
}

impl Store {
    /// Connect to the Postgres instance described by `profile`.
    pub async fn connect(profile: &StoreProfile) -> Result<Self, DigestError> {
        let pool = PgPoolOptions::new()
            .max_connections(8)
            .connect(&profile.connection_url())
            .await
            .map_err(store_err("connection"))?;

        info!(host = %profile.host, dbname = %profile.dbname, "Connected to store");
        Ok(Self { pool })
    }

    /// Wrap an existing pool (tests, embedded setups).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}
