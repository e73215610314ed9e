//! Ledger persistence and cleaning
//!
//! The ledger is the durable, date-ordered history of daily records. It is
//! appended to by every collection run and rewritten wholesale by the
//! cleaning pass.
//!
//! ## Design
//!
//! - **Trait-based**: [`LedgerBackend`] separates the collection run from the file format
//! - **Atomic**: both append and clean write a temporary file and rename it
//!   over the ledger, so a failed write leaves the previous content intact
//! - **By name**: cells are matched to columns by header name, not position
//!
//! ## Usage
//!
//! ```no_run
//! use circ_collector::ledger::{CsvLedger, LedgerBackend};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let ledger = CsvLedger::new("./circ-daily.csv");
//!     let summary = ledger.clean().await?;
//!     println!("{} rows kept", summary.kept);
//!     Ok(())
//! }
//! ```

use std::path::Path;

use async_trait::async_trait;

use crate::record::Record;

pub mod clean;
pub mod error;
pub mod file;
pub mod schema;

pub use clean::{CleanSummary, RawLedger};
pub use error::{LedgerError, LedgerResult};
pub use file::CsvLedger;
pub use schema::Column;

/// Trait for durable ledger stores
#[async_trait]
pub trait LedgerBackend: Send + Sync {
    /// Append `record` as the new last row
    ///
    /// The record receives id `max(existing id) + 1`, or 1 in an empty
    /// ledger, and is returned with that id. On error nothing is written.
    async fn append(&self, record: Record) -> LedgerResult<Record>;

    /// Normalize the whole ledger and write it back sorted by date
    async fn clean(&self) -> LedgerResult<CleanSummary>;

    /// Copy the current ledger to `to`, returning the bytes copied
    async fn backup(&self, to: &Path) -> LedgerResult<u64>;
}
