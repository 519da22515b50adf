use thiserror::Error;

/// Worker failures are fatal to the whole build: a partial set of synthetic
/// transfers must never be committed.
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("store unavailable: {0}")]
    Store(#[from] gtfs_store::StoreError),

    #[error("store unavailable: {0}")]
    Sql(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, TransferError>;
