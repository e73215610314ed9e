//! CSV file ledger
//!
//! File operations run on the blocking thread pool. Every write goes to a
//! temporary file next to the ledger which then replaces it by rename.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

use crate::record::Record;

use super::clean::{self, CleanSummary, RawLedger};
use super::error::LedgerResult;
use super::schema::{Column, canonical_headers};
use super::LedgerBackend;

#[derive(Debug, Clone)]
pub struct CsvLedger {
    path: PathBuf,
}

impl CsvLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Read the ledger; a missing file is an empty ledger
pub fn read_raw(path: &Path) -> LedgerResult<RawLedger> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(RawLedger::default()),
        Err(e) => return Err(e.into()),
    };

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);

    let headers = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }

    Ok(RawLedger { headers, rows })
}

fn writer<W: Write>(inner: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(inner)
}

fn temp_file_for(path: &Path) -> io::Result<NamedTempFile> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => NamedTempFile::new_in(dir),
        _ => NamedTempFile::new_in("."),
    }
}

fn replace(path: &Path, tmp: NamedTempFile) -> LedgerResult<()> {
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;
    Ok(())
}

fn append_blocking(path: &Path, record: Record) -> LedgerResult<Record> {
    let raw = read_raw(path)?;
    let record = Record {
        id: Some(raw.next_id()),
        ..record
    };

    let missing = raw.missing_columns();
    let mut tmp = temp_file_for(path)?;

    if missing.is_empty() {
        let existing = fs::read(path)?;
        tmp.write_all(&existing)?;
        if !existing.ends_with(b"\n") {
            tmp.write_all(b"\n")?;
        }

        let mut writer = writer(&mut tmp);
        writer.write_record(record.cells(&raw.columns()))?;
        writer.flush()?;
    } else {
        if !raw.headers.is_empty() {
            info!("adding columns {missing:?} to the ledger header");
        }
        let widened = widen(raw, &missing);

        let mut writer = writer(&mut tmp);
        writer.write_record(&widened.headers)?;
        for row in &widened.rows {
            writer.write_record(row)?;
        }
        writer.write_record(record.cells(&widened.columns()))?;
        writer.flush()?;
    }

    replace(path, tmp)?;
    Ok(record)
}

/// Extend the header by `missing` and pad every row to the new width
///
/// Cells past the end of the old header have no column and are dropped.
fn widen(raw: RawLedger, missing: &[Column]) -> RawLedger {
    let width = raw.headers.len();
    let mut headers = raw.headers;
    headers.extend(missing.iter().map(|column| column.name().to_string()));

    let rows = raw
        .rows
        .into_iter()
        .map(|mut row| {
            row.truncate(width);
            row.resize(headers.len(), String::new());
            row
        })
        .collect();

    RawLedger { headers, rows }
}

/// Render records under the canonical header
pub fn render(records: &[Record]) -> LedgerResult<Vec<u8>> {
    let columns = Column::ALL.map(Some);
    let mut writer = writer(Vec::new());
    writer.write_record(canonical_headers())?;
    for record in records {
        writer.write_record(record.cells(&columns))?;
    }
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| io::Error::other(e.to_string()).into())
}

fn clean_blocking(path: &Path) -> LedgerResult<CleanSummary> {
    let raw = read_raw(path)?;
    let (records, summary) = clean::clean(&raw);

    let mut tmp = temp_file_for(path)?;
    tmp.write_all(&render(&records)?)?;
    replace(path, tmp)?;

    Ok(summary)
}

#[async_trait]
impl LedgerBackend for CsvLedger {
    #[instrument(skip(self, record), fields(ledger = %self.path.display(), date = %record.date))]
    async fn append(&self, record: Record) -> LedgerResult<Record> {
        let path = self.path.clone();
        let record = tokio::task::spawn_blocking(move || append_blocking(&path, record)).await??;
        debug!("appended record {:?}", record.id);
        Ok(record)
    }

    #[instrument(skip(self), fields(ledger = %self.path.display()))]
    async fn clean(&self) -> LedgerResult<CleanSummary> {
        let path = self.path.clone();
        let summary = tokio::task::spawn_blocking(move || clean_blocking(&path)).await??;
        info!(
            "cleaned ledger: {} rows kept, {} dropped",
            summary.kept, summary.dropped_rows
        );
        Ok(summary)
    }

    #[instrument(skip(self), fields(ledger = %self.path.display()))]
    async fn backup(&self, to: &Path) -> LedgerResult<u64> {
        let bytes = tokio::fs::copy(&self.path, to).await?;
        debug!("backed up {bytes} bytes to {}", to.display());
        Ok(bytes)
    }
}
