//! Collection run - reconcile one date and hand the record to the ledger
//!
//! ```text
//! ReconcileDate → Reconciler → Record → (write enabled?) → LedgerBackend::append
//!                                               └── no ──→ preview in the log
//! ```

use anyhow::Result;
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::ledger::{CsvLedger, LedgerBackend, LedgerResult};
use crate::merger::Reconciler;
use crate::record::{ReconcileDate, Record};
use crate::sources::circulation::CirculationAdapter;
use crate::sources::interlibrary::InterlibraryAdapter;
use crate::sources::sensor::SensorAdapter;

pub struct Collector {
    reconciler: Reconciler,
    ledger: Box<dyn LedgerBackend>,
    write: bool,
}

impl Collector {
    pub fn new(reconciler: Reconciler, ledger: Box<dyn LedgerBackend>, write: bool) -> Self {
        Self {
            reconciler,
            ledger,
            write,
        }
    }

    /// Wire the real adapters and the CSV ledger from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = config.http.client()?;

        let reconciler = Reconciler::new(
            Box::new(SensorAdapter::new(client.clone(), config.sensor.clone())),
            Box::new(CirculationAdapter::new(config.database.clone())),
            Box::new(InterlibraryAdapter::new(client, config.interlibrary.clone())),
        );

        Ok(Self::new(
            reconciler,
            Box::new(CsvLedger::new(&config.files.ledger)),
            config.files.write,
        ))
    }

    pub async fn run(&self, date: ReconcileDate) -> LedgerResult<Record> {
        collect(date, &self.reconciler, self.ledger.as_ref(), self.write).await
    }
}

/// Collect `date` and, when `write` is set, append it to `ledger`
///
/// Source failures only leave fields unset. The returned error is a ledger
/// failure; the record is logged so it can be entered by hand.
#[instrument(skip(reconciler, ledger), fields(date = %date))]
pub async fn collect(
    date: ReconcileDate,
    reconciler: &Reconciler,
    ledger: &dyn LedgerBackend,
    write: bool,
) -> LedgerResult<Record> {
    let reconciliation = reconciler.reconcile(date).await;
    if !reconciliation.is_complete() {
        let missing: Vec<_> = reconciliation.warnings.iter().map(|w| w.source).collect();
        info!("incomplete record, missing {missing:?}");
    }

    let record = reconciliation.record;

    if !write {
        info!("read only, not writing: {record:?}");
        return Ok(record);
    }

    match ledger.append(record.clone()).await {
        Ok(stored) => {
            info!("appended {} with id {:?}", stored.date, stored.id);
            Ok(stored)
        }
        Err(e) => {
            warn!("record not written: {record:?}");
            Err(e)
        }
    }
}
