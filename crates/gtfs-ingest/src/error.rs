use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("malformed feed '{feed}': {reason}")]
    MalformedFeed { feed: String, reason: String },

    #[error("feed archive unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] gtfs_store::StoreError),

    #[error("store unavailable: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("store unavailable: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, IngestError>;
