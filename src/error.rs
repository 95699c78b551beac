//! Error types for the reading store and the reporting path.
//!
//! Bad sensor data (missing values, the fault sentinel, non-numeric payloads)
//! is never an error here; it is classified by the aggregation engine. Only
//! structural failures show up as these variants.

use thiserror::Error;

// ---

/// Failure at the reading store boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    // ---
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("reading store unavailable: {0}")]
    Unavailable(String),
}

/// Failure while building a report.
#[derive(Debug, Error)]
pub enum ReportError {
    // ---
    #[error("malformed timestamp '{timestamp}': {source}")]
    MalformedTimestamp {
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}
