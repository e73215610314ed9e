//! Ledger persistence across append and clean passes

use std::fs;

use circ_collector::{
    Record,
    ledger::{CsvLedger, LedgerBackend, file::read_raw},
};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

use crate::helpers::*;

fn record(day: chrono::NaiveDate, door_count: Option<u64>) -> Record {
    Record {
        door_count,
        ..Record::blank(day)
    }
}

#[tokio::test]
async fn test_ids_are_one_to_n() {
    let dir = tempdir().unwrap();
    let ledger = CsvLedger::new(dir.path().join("circ.csv"));

    for day in 1..=10 {
        ledger.append(record(date(2023, 4, day), Some(day as u64))).await.unwrap();
    }

    let raw = read_raw(ledger.path()).unwrap();
    let ids: Vec<_> = raw.rows.iter().map(|row| row[0].clone()).collect();
    let expected: Vec<_> = (1..=10).map(|id: u64| id.to_string()).collect();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn test_clean_twice_is_byte_identical() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("circ.csv");
    fs::write(
        &path,
        ",Id,Date,DoorCount,Checked Out,New Patrons,ILL Lent,Day of Week,Comments\n\
         0,3,2023-03-17 00:00:00,98.0,N/A,1,,Sunday,nan\n\
         1,1,03/15/2023,\"1,204\",12,,2,,closed early\n\
         2,2,20230316,-4,7,0,,,\n\
         3,9,,5,5,5,5,,\n",
    )
    .unwrap();
    let ledger = CsvLedger::new(&path);

    let first = ledger.clean().await.unwrap();
    let once = fs::read(&path).unwrap();
    let second = ledger.clean().await.unwrap();
    let twice = fs::read(&path).unwrap();

    assert_eq!(first.kept, 3);
    assert_eq!(first.dropped_rows, 1);
    assert_eq!(second.kept, 3);
    assert_eq!(second.dropped_rows, 0);
    assert!(second.dropped_columns.is_empty());
    assert_eq!(String::from_utf8(once).unwrap(), String::from_utf8(twice).unwrap());
}

#[tokio::test]
async fn test_clean_derives_calendar_fields() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("circ.csv");
    fs::write(&path, "Id,Date,DayOfWeek,Month\n1,2023-03-15,Friday,July\n").unwrap();
    let ledger = CsvLedger::new(&path);

    ledger.clean().await.unwrap();

    let raw = read_raw(&path).unwrap();
    let cell = |name: &str| {
        let position = raw.headers.iter().position(|h| h == name).unwrap();
        raw.rows[0][position].clone()
    };
    assert_eq!(cell("Date"), "03/15/2023");
    assert_eq!(cell("DayOfWeek"), "Wednesday");
    assert_eq!(cell("Month"), "March");
    assert_eq!(cell("Year"), "2023");
    assert_eq!(cell("Day"), "15");
    assert_eq!(cell("DayOfWeekIndex"), "2");
}

#[tokio::test]
async fn test_clean_sorts_and_keeps_ids() {
    let dir = tempdir().unwrap();
    let ledger = CsvLedger::new(dir.path().join("circ.csv"));

    ledger.append(record(date(2023, 3, 17), Some(1))).await.unwrap();
    ledger.append(record(date(2023, 3, 15), Some(2))).await.unwrap();
    ledger.append(record(date(2023, 3, 16), None)).await.unwrap();
    ledger.clean().await.unwrap();

    let raw = read_raw(ledger.path()).unwrap();
    let rows: Vec<(&str, &str, &str)> = raw
        .rows
        .iter()
        .map(|row| (row[0].as_str(), row[1].as_str(), row[2].as_str()))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("2", "03/15/2023", "2"),
            ("3", "03/16/2023", ""),
            ("1", "03/17/2023", "1"),
        ]
    );
}

#[tokio::test]
async fn test_append_after_clean_of_legacy_ledger() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("circ.csv");
    fs::write(&path, "Id,Date,DoorCount\n7,03/14/2023,80\nabc,03/13/2023,70\n").unwrap();
    let ledger = CsvLedger::new(&path);

    ledger.clean().await.unwrap();
    let stored = ledger.append(record(date(2023, 3, 15), Some(90))).await.unwrap();

    assert_eq!(stored.id, Some(8));
    let raw = read_raw(&path).unwrap();
    assert_eq!(raw.rows.len(), 3);
    assert_eq!(raw.rows[0][0], "");
    assert_eq!(raw.rows[2][1], "03/15/2023");
}

#[tokio::test]
async fn test_backup_then_clean_preserves_original() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("circ.csv");
    let original = "Id,Date\n2,03/16/2023\n1,03/15/2023\n";
    fs::write(&path, original).unwrap();
    let ledger = CsvLedger::new(&path);

    ledger.backup(&dir.path().join("backup.csv")).await.unwrap();
    ledger.clean().await.unwrap();

    assert_eq!(fs::read_to_string(dir.path().join("backup.csv")).unwrap(), original);
    assert_ne!(fs::read_to_string(&path).unwrap(), original);
}

#[tokio::test]
async fn test_append_to_cleaner_output_without_id_column() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("circ.csv");
    fs::write(&path, ",Date,DoorCount\n0,03/14/2023,80\n").unwrap();
    let ledger = CsvLedger::new(&path);

    let first = ledger.append(record(date(2023, 3, 15), Some(90))).await.unwrap();
    let second = ledger.append(record(date(2023, 3, 16), Some(95))).await.unwrap();
    assert_eq!((first.id, second.id), (Some(1), Some(2)));

    let summary = ledger.clean().await.unwrap();
    assert_eq!(summary.dropped_columns, vec![String::new()]);

    let raw = read_raw(&path).unwrap();
    let rows: Vec<(&str, &str, &str)> = raw
        .rows
        .iter()
        .map(|row| (row[0].as_str(), row[1].as_str(), row[2].as_str()))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("", "03/14/2023", "80"),
            ("1", "03/15/2023", "90"),
            ("2", "03/16/2023", "95"),
        ]
    );

    let third = ledger.append(record(date(2023, 3, 17), None)).await.unwrap();
    assert_eq!(third.id, Some(3));
}
