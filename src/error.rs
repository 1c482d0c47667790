use thiserror::Error;

/// Failure of a remote store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("row not found")]
    NotFound,

    #[error("row already exists")]
    Conflict,

    #[error("store unavailable: {0}")]
    Unavailable(String),
}
