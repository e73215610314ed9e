//! Source adapters
//!
//! Each adapter fetches one source's share of a [`Record`] for a given
//! [`ReconcileDate`] and reports failure as a [`SourceError`] instead of
//! aborting the run.
//!
//! ## Design
//!
//! - **Trait-based**: [`Source`] lets the merger run real adapters or fakes
//! - **Disjoint fields**: every adapter returns its own partial record type,
//!   applied to the shared [`Record`] only after all adapters finished
//! - **Scoped resources**: connections and sessions live for a single call
//!
//! ## Adapters
//!
//! - [`sensor::SensorAdapter`]: door count from the traffic sensor API
//! - [`circulation::CirculationAdapter`]: circulation and patron counters from PostgreSQL
//! - [`interlibrary::InterlibraryAdapter`]: ILL lent/borrowed scraped from an HTML table

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::record::{ReconcileDate, Record};

pub mod auth;
pub mod circulation;
pub mod error;
pub mod interlibrary;
pub mod sensor;

pub use error::{AuthError, SourceError, SourceResult};

/// Partial record produced by one adapter
pub trait Fields: Send {
    /// Copy this adapter's fields onto the record, by name
    fn apply_to(self, record: &mut Record);
}

/// A single data source contributing to the daily record
#[async_trait]
pub trait Source: Send + Sync {
    type Fields: Fields;

    /// Short name used in diagnostics
    fn name(&self) -> &'static str;

    /// Fetch this source's fields for `date`
    async fn fetch(&self, date: ReconcileDate) -> SourceResult<Self::Fields>;
}

fn is_thousands_grouped(text: &str) -> bool {
    static GROUPED: LazyLock<Option<Regex>> =
        LazyLock::new(|| Regex::new(r"^\d{1,3}(,\d{3})+$").ok());
    GROUPED.as_ref().is_some_and(|re| re.is_match(text))
}

/// Parse a counter cell: plain or comma-grouped integers, or integral floats
///
/// Commas are only accepted as thousands separators. Anything that does not
/// name a non-negative integer in `u64` range is `None`.
pub fn parse_count(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if raw.contains(',') {
        if !is_thousands_grouped(raw) {
            return None;
        }
        return raw.replace(',', "").parse().ok();
    }
    if let Ok(value) = raw.parse::<u64>() {
        return Some(value);
    }
    match raw.parse::<f64>() {
        Ok(value)
            if value.is_finite()
                && value >= 0.0
                && value.fract() == 0.0
                && value < u64::MAX as f64 =>
        {
            Some(value as u64)
        }
        _ => None,
    }
}
