//! Record merger - builds one day's record from every source
//!
//! ## Flow
//!
//! ```text
//!                  ┌──────────► SensorAdapter ───────┐
//! ReconcileDate ───┼──────────► CirculationAdapter ──┼──► partial fields ──► Record
//!                  └──────────► InterlibraryAdapter ─┘
//! ```
//!
//! The adapters run concurrently and write disjoint fields, so their partial
//! results are applied only after all three completed or failed. A failing
//! source leaves its fields unset and becomes a [`SourceWarning`]; it never
//! stops the other sources. Missing counters are never filled with zero.

use chrono::{Local, NaiveDate};
use tracing::{debug, instrument, warn};

use crate::record::{MANUAL_ILL_COMMENT, ReconcileDate, Record};
use crate::sources::circulation::CirculationFields;
use crate::sources::interlibrary::IllFields;
use crate::sources::sensor::SensorFields;
use crate::sources::{Fields, Source, SourceError, SourceResult};

/// A non-fatal failure of one source
#[derive(Debug)]
pub struct SourceWarning {
    pub source: &'static str,
    pub error: SourceError,
}

/// Outcome of one reconciliation run
#[derive(Debug)]
pub struct Reconciliation {
    pub record: Record,
    pub warnings: Vec<SourceWarning>,
}

impl Reconciliation {
    /// Whether every source contributed
    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty()
    }
}

type SensorSource = Box<dyn Source<Fields = SensorFields>>;
type CirculationSource = Box<dyn Source<Fields = CirculationFields>>;
type InterlibrarySource = Box<dyn Source<Fields = IllFields>>;

pub struct Reconciler {
    sensor: SensorSource,
    circulation: CirculationSource,
    interlibrary: InterlibrarySource,
}

impl Reconciler {
    pub fn new(
        sensor: SensorSource,
        circulation: CirculationSource,
        interlibrary: InterlibrarySource,
    ) -> Self {
        Self {
            sensor,
            circulation,
            interlibrary,
        }
    }

    /// Reconcile `date`, resolving "yesterday" against the local clock
    pub async fn reconcile(&self, date: ReconcileDate) -> Reconciliation {
        self.reconcile_at(date, Local::now().date_naive()).await
    }

    /// Reconcile `date`, resolving "yesterday" against `today`
    #[instrument(skip(self, today), fields(date = %date))]
    pub async fn reconcile_at(&self, date: ReconcileDate, today: NaiveDate) -> Reconciliation {
        let mut record = Record::blank(date.resolve(today));
        let mut warnings = Vec::new();

        let (sensor, circulation, interlibrary) = tokio::join!(
            self.sensor.fetch(date),
            self.circulation.fetch(date),
            self.interlibrary.fetch(date),
        );

        merge(&mut record, &mut warnings, self.sensor.name(), sensor);
        merge(&mut record, &mut warnings, self.circulation.name(), circulation);

        if let Err(SourceError::Unsupported) = &interlibrary {
            record.comments = Some(MANUAL_ILL_COMMENT.to_string());
        }
        merge(&mut record, &mut warnings, self.interlibrary.name(), interlibrary);

        debug!("reconciled {} with {} warnings", record.date, warnings.len());

        Reconciliation { record, warnings }
    }
}

fn merge<F: Fields>(
    record: &mut Record,
    warnings: &mut Vec<SourceWarning>,
    source: &'static str,
    result: SourceResult<F>,
) {
    match result {
        Ok(fields) => fields.apply_to(record),
        Err(error) => {
            if error.is_expected() {
                debug!("{source}: {error}");
            } else {
                warn!("{source}: {error}");
            }
            warnings.push(SourceWarning { source, error });
        }
    }
}
