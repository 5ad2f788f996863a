use thiserror::Error;

use crate::types::DigestState;

/// Broad classification of a store failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    Connection,
    Query,
    Constraint,
    Decode,
}

#[derive(Error, Debug)]
pub enum DigestError {
    #[error("store error on {table} ({kind:?}): {cause}")]
    Store {
        kind: StoreErrorKind,
        table: &'static str,
        cause: String,
    },

    #[error("digest {digest_id} is in state {actual}, expected {expected}")]
    WrongState {
        digest_id: i64,
        actual: DigestState,
        expected: DigestState,
    },

    #[error("no incomplete digest found")]
    NoIncompleteDigest,

    #[error("summariser gave no valid response after {attempts} attempts: {cause}")]
    Summariser { attempts: u32, cause: String },

    #[error("provider build failed for {provider}: {cause}")]
    ProviderBuild { provider: String, cause: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
