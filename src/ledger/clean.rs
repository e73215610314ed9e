//! Normalization of raw ledger rows
//!
//! Cleaning never invents values: cells that do not hold a valid count become
//! unset, rows whose date cannot be read are dropped, and calendar columns
//! are recomputed from the date. Running it on its own output changes nothing.

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, trace};

use crate::record::Record;
use crate::sources::parse_count;

use super::schema::{Column, DATE_FORMAT};

/// Accepted spellings of the `Date` column
const DATE_FORMATS: [&str; 3] = [DATE_FORMAT, "%Y-%m-%d", "%Y%m%d"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%m/%d/%Y %H:%M:%S"];

/// Cell texts standing for "no value"
const MISSING_MARKERS: [&str; 4] = ["nan", "none", "null", "nat"];

/// The ledger as read from disk, before any interpretation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawLedger {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawLedger {
    /// Canonical column for every header position
    ///
    /// Headers that are unknown, or repeat an earlier column, map to `None`.
    pub fn columns(&self) -> Vec<Option<Column>> {
        let mut seen = Vec::new();
        self.headers
            .iter()
            .map(|header| {
                let column = Column::from_header(header).filter(|c| !seen.contains(c))?;
                seen.push(column);
                Some(column)
            })
            .collect()
    }

    /// Canonical columns the header does not name, in canonical order
    pub fn missing_columns(&self) -> Vec<Column> {
        let columns = self.columns();
        Column::ALL
            .into_iter()
            .filter(|column| !columns.contains(&Some(*column)))
            .collect()
    }

    /// Next free id: one past the largest valid id, or 1 for an empty ledger
    pub fn next_id(&self) -> u64 {
        let Some(position) = self
            .columns()
            .iter()
            .position(|column| *column == Some(Column::Id))
        else {
            return 1;
        };

        self.rows
            .iter()
            .filter_map(|row| row.get(position))
            .filter_map(|cell| parse_id(cell))
            .max()
            .map_or(1, |max| max + 1)
    }
}

/// What a cleaning pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanSummary {
    /// Rows written back
    pub kept: usize,
    /// Rows dropped because their date could not be parsed
    pub dropped_rows: usize,
    /// Headers outside the canonical schema
    pub dropped_columns: Vec<String>,
}

fn is_missing(cell: &str) -> bool {
    let cell = cell.trim();
    cell.is_empty()
        || MISSING_MARKERS
            .iter()
            .any(|marker| cell.eq_ignore_ascii_case(marker))
}

pub fn parse_date(cell: &str) -> Option<NaiveDate> {
    let cell = cell.trim();
    if is_missing(cell) {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(cell, format).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(cell, format).ok())
                .map(|datetime| datetime.date())
        })
}

/// Ids are positive integers
pub fn parse_id(cell: &str) -> Option<u64> {
    parse_count(cell).filter(|id| *id > 0)
}

fn parse_comment(cell: &str) -> Option<String> {
    (!is_missing(cell)).then(|| cell.trim().to_string())
}

/// Interpret one raw row; `None` when the row has no readable date
pub fn record_from_row(columns: &[Option<Column>], row: &[String]) -> Option<Record> {
    let cell = |wanted: Column| {
        columns
            .iter()
            .position(|column| *column == Some(wanted))
            .and_then(|position| row.get(position))
            .map(String::as_str)
            .unwrap_or_default()
    };

    let mut record = Record::blank(parse_date(cell(Column::Date))?);
    record.id = parse_id(cell(Column::Id));
    record.comments = parse_comment(cell(Column::Comments));

    for column in Column::ALL {
        let raw = cell(column);
        if let Some(slot) = record.counter_mut(column) {
            *slot = parse_count(raw);
        }
    }

    Some(record)
}

/// Normalize every row and order the result by date
///
/// The sort is stable, so rows sharing a date keep their file order.
pub fn clean(raw: &RawLedger) -> (Vec<Record>, CleanSummary) {
    let columns = raw.columns();

    let dropped_columns: Vec<String> = raw
        .headers
        .iter()
        .zip(&columns)
        .filter(|(_, column)| column.is_none())
        .map(|(header, _)| header.clone())
        .collect();
    if !dropped_columns.is_empty() {
        debug!("dropping columns {dropped_columns:?}");
    }

    let mut records = Vec::with_capacity(raw.rows.len());
    let mut dropped_rows = 0;

    for (index, row) in raw.rows.iter().enumerate() {
        match record_from_row(&columns, row) {
            Some(record) => records.push(record),
            None => {
                trace!("dropping row {index}: unreadable date");
                dropped_rows += 1;
            }
        }
    }

    records.sort_by_key(|record| record.date);

    let summary = CleanSummary {
        kept: records.len(),
        dropped_rows,
        dropped_columns,
    };
    (records, summary)
}
