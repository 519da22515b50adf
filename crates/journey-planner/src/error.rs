use thiserror::Error;

/// Failure modes surfaced to a Planner caller. `BudgetExceeded` from §7 is
/// deliberately absent: `journey_search` returns `Option<Itinerary>` instead
/// of raising when the wall-clock budget runs out.
#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("inconsistent data: {0}")]
    Inconsistency(String),

    #[error("store unavailable: {0}")]
    Store(#[from] gtfs_store::StoreError),

    #[error("store unavailable: {0}")]
    Sql(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, PlannerError>;
