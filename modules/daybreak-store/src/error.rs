use daybreak_common::{DigestError, StoreErrorKind};

/// Map an sqlx failure to the typed store error for `table`.
pub(crate) fn store_err(table: &'static str) -> impl Fn(sqlx::Error) -> DigestError {
    move |e| {
        let kind = match &e {
            sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolTimedOut => {
                StoreErrorKind::Connection
            }
            sqlx::Error::Database(db)
                if db.is_unique_violation()
                    || db.is_foreign_key_violation()
                    || db.is_check_violation() =>
            {
                StoreErrorKind::Constraint
            }
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_)
            | sqlx::Error::TypeNotFound { .. } => StoreErrorKind::Decode,
            _ => StoreErrorKind::Query,
        };
        DigestError::Store {
            kind,
            table,
            cause: e.to_string(),
        }
    }
}
