//! The daily record and the date it is reconciled for
//!
//! A [`Record`] holds one day's usage metrics. Counters are `Option<u64>`:
//! `None` means "not yet known" and is kept distinct from a real zero all the
//! way to the ledger, where it is written as an empty cell.
//!
//! Calendar attributes (day of week, month, ...) are not stored. They are
//! computed from [`Record::date`] whenever they are read, so they can never
//! drift from the date.

use chrono::{Datelike, Duration, NaiveDate};

/// Comment attached when the interlibrary source cannot serve the requested date
pub const MANUAL_ILL_COMMENT: &str = "manual entry required for ILL lent and ILL borrowed";

/// The calendar day a reconciliation run targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReconcileDate {
    /// The day before today, expressed relatively to every source
    Yesterday,

    /// A specific calendar day
    On(NaiveDate),
}

impl ReconcileDate {
    /// Resolve to a concrete day, relative to `today`
    pub fn resolve(self, today: NaiveDate) -> NaiveDate {
        match self {
            ReconcileDate::Yesterday => today - Duration::days(1),
            ReconcileDate::On(date) => date,
        }
    }

    pub fn is_yesterday(self) -> bool {
        matches!(self, ReconcileDate::Yesterday)
    }
}

impl std::fmt::Display for ReconcileDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcileDate::Yesterday => write!(f, "yesterday"),
            ReconcileDate::On(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

/// One day's metrics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Assigned when the record is appended to the ledger
    pub id: Option<u64>,

    /// Reconciliation key across all sources
    pub date: NaiveDate,

    // === Sensor API ===
    pub door_count: Option<u64>,

    // === Circulation database ===
    pub checked_out: Option<u64>,
    pub total_self_check: Option<u64>,
    pub desk_check_out: Option<u64>,
    pub renewed: Option<u64>,
    pub total_checked_in: Option<u64>,
    pub total_checked_out_reporting: Option<u64>,
    pub holds: Option<u64>,
    pub new_patrons: Option<u64>,
    pub new_canton_patrons: Option<u64>,

    /// Only ever filled in by hand
    pub curb_appt: Option<u64>,

    // === Interlibrary loan table ===
    pub ill_lent: Option<u64>,
    pub ill_borrowed: Option<u64>,

    pub comments: Option<String>,
}

impl Record {
    /// A record for `date` with every other field unset
    pub fn blank(date: NaiveDate) -> Self {
        Self {
            id: None,
            date,
            door_count: None,
            checked_out: None,
            total_self_check: None,
            desk_check_out: None,
            renewed: None,
            total_checked_in: None,
            total_checked_out_reporting: None,
            holds: None,
            new_patrons: None,
            new_canton_patrons: None,
            curb_appt: None,
            ill_lent: None,
            ill_borrowed: None,
            comments: None,
        }
    }

    /// Full weekday name, e.g. "Wednesday"
    pub fn day_of_week(&self) -> String {
        self.date.format("%A").to_string()
    }

    /// Full month name, e.g. "March"
    pub fn month(&self) -> String {
        self.date.format("%B").to_string()
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn day(&self) -> u32 {
        self.date.day()
    }

    /// Monday = 0 ... Sunday = 6
    pub fn day_of_week_index(&self) -> u32 {
        self.date.weekday().num_days_from_monday()
    }
}
