use thiserror::Error;

/// Failure modes of the Store, per the error taxonomy: a missing row is
/// recoverable and local, a broken database file is fatal.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("store unavailable: {0}")]
    Unavailable(#[from] rusqlite::Error),

    #[error("store unavailable: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
