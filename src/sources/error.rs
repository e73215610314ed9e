//! Error types for source adapters

use thiserror::Error;

/// Result type alias for adapter operations
pub type SourceResult<T> = Result<T, SourceError>;

/// Failure of the client-credentials exchange
#[derive(Debug, Error)]
pub enum AuthError {
    /// The token endpoint answered with a non-success status
    #[error("token endpoint returned status {0}")]
    Status(u16),

    #[error("token request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("token response could not be decoded: {0}")]
    Decode(String),
}

/// Errors an adapter reports to the record merger
///
/// None of these abort a reconciliation run. The merger turns each of them
/// into unset fields plus a diagnostic.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// Network failure talking to an HTTP source
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// HTTP source answered with a non-success status
    #[error("source returned status {0}")]
    Status(u16),

    /// Response body did not have the expected shape
    #[error("malformed response: {0}")]
    Decode(String),

    /// Database connection or query failure
    #[error("database query failed: {0}")]
    Query(#[from] sqlx::Error),

    /// The source cannot serve the requested date mode
    #[error("date mode not supported by this source")]
    Unsupported,

    /// The sentinel is not present in the scraped table
    #[error("sentinel {0:?} not found")]
    NotFound(String),

    /// Scraped page does not contain the expected frames or elements
    #[error("unexpected page structure: {0}")]
    PageStructure(String),
}

impl SourceError {
    /// Outcomes that are part of normal operation rather than faults
    pub fn is_expected(&self) -> bool {
        matches!(self, SourceError::Unsupported | SourceError::NotFound(_))
    }
}
