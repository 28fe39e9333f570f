//! Scene catalog: the scene model, catalog providers, search, and the one
//! piece of durable client state (the background colour preference).

pub mod preferences;
pub mod provider;
pub mod scene;
pub mod search;

pub use preferences::*;
pub use provider::*;
pub use scene::*;
pub use search::*;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("please specify a date range for the search")]
    MissingDateRange,
    #[error("invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("catalog request failed with HTTP {0}")]
    Http(u16),
    #[error("browser storage unavailable")]
    StorageUnavailable,
    #[error("catalog document corrupt: {0}")]
    Corrupt(String),
    #[error("catalog storage error: {0}")]
    Io(String),
}
