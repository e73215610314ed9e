//! Error types for ledger operations

use thiserror::Error;

/// Result type alias for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors that can occur while appending to or rewriting the ledger
///
/// Any of these leaves the ledger file as it was before the operation.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// I/O error (file access, temporary file, backup copy)
    #[error("ledger I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The ledger could not be parsed or rendered as CSV
    #[error("ledger CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The rewritten ledger could not replace the old one
    #[error("failed to replace ledger file: {0}")]
    Persist(#[from] tempfile::PersistError),

    /// The blocking file task panicked or was cancelled
    #[error("ledger task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
