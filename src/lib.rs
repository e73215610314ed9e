pub mod collector;
pub mod config;
pub mod invocation;
pub mod ledger;
pub mod merger;
pub mod record;
pub mod sources;
pub mod util;

pub use collector::{Collector, collect};
pub use merger::{Reconciler, Reconciliation};
pub use record::{MANUAL_ILL_COMMENT, ReconcileDate, Record};
