//! Merge scenarios across the three sources
//!
//! A failing source must only leave its own fields unset:
//! - query failures never touch sensor data
//! - a missing library code is not a degraded date
//! - explicit dates always flag the interlibrary counts for manual entry

use std::sync::atomic::Ordering;

use assert_matches::assert_matches;
use circ_collector::{
    MANUAL_ILL_COMMENT, ReconcileDate, Reconciler,
    sources::{
        SourceError, circulation::CirculationFields, interlibrary::IllFields,
        sensor::SensorFields,
    },
};
use pretty_assertions::assert_eq;

use crate::helpers::*;

fn query_error() -> SourceError {
    SourceError::Query(sqlx::Error::PoolTimedOut)
}

#[tokio::test]
async fn test_sensor_only_with_query_error_and_missing_code() {
    let reconciler = reconciler(
        |_| Ok(SensorFields { door_count: Some(120) }),
        |_| Err(query_error()),
        |_| Err(SourceError::NotFound("zv052".into())),
    );

    let result = reconciler
        .reconcile_at(ReconcileDate::Yesterday, date(2023, 3, 16))
        .await;
    let record = result.record;

    assert_eq!(record.date, date(2023, 3, 15));
    assert_eq!(record.door_count, Some(120));
    assert_eq!(record.checked_out, None);
    assert_eq!(record.total_self_check, None);
    assert_eq!(record.desk_check_out, None);
    assert_eq!(record.renewed, None);
    assert_eq!(record.total_checked_in, None);
    assert_eq!(record.total_checked_out_reporting, None);
    assert_eq!(record.holds, None);
    assert_eq!(record.new_patrons, None);
    assert_eq!(record.new_canton_patrons, None);
    assert_eq!(record.ill_lent, None);
    assert_eq!(record.ill_borrowed, None);
    assert_eq!(record.comments, None);

    assert_eq!(result.warnings.len(), 2);
    assert_matches!(result.warnings[0].error, SourceError::Query(_));
    assert_matches!(result.warnings[1].error, SourceError::NotFound(_));
}

#[tokio::test]
async fn test_explicit_date_flags_manual_interlibrary_entry() {
    let reconciler = healthy_reconciler();

    for day in [date(2023, 1, 1), date(2023, 3, 15), date(2024, 2, 29)] {
        let result = reconciler.reconcile(ReconcileDate::On(day)).await;

        assert_eq!(result.record.date, day);
        assert_eq!(result.record.comments.as_deref(), Some(MANUAL_ILL_COMMENT));
        assert_eq!(result.record.ill_lent, None);
        assert_eq!(result.record.ill_borrowed, None);
        assert_eq!(result.record.door_count, Some(120));
    }
}

#[tokio::test]
async fn test_yesterday_is_complete_when_all_sources_answer() {
    let result = healthy_reconciler()
        .reconcile_at(ReconcileDate::Yesterday, date(2023, 1, 1))
        .await;

    assert!(result.is_complete());
    assert_eq!(result.record.date, date(2022, 12, 31));
    assert_eq!(result.record.ill_lent, Some(3));
    assert_eq!(result.record.holds, Some(0));
    assert_eq!(result.record.curb_appt, None);
    assert_eq!(result.record.comments, None);
}

#[tokio::test]
async fn test_every_source_failing_still_yields_dated_record() {
    let reconciler = reconciler(
        |_| Err(SourceError::Status(503)),
        |_| Err(query_error()),
        |_| Err(SourceError::PageStructure("no frameset".into())),
    );

    let result = reconciler
        .reconcile(ReconcileDate::On(date(2023, 3, 15)))
        .await;

    assert_eq!(result.record.date, date(2023, 3, 15));
    assert_eq!(result.record.door_count, None);
    assert_eq!(result.record.comments, None);
    assert_eq!(result.warnings.len(), 3);
}

#[tokio::test]
async fn test_each_source_queried_once() {
    let sensor = StubSource::new(|_| Ok(SensorFields::default()));
    let circulation = StubSource::new(|_| Err(query_error()));
    let interlibrary = StubSource::new(|_| Ok(IllFields::default()));
    let counters = [
        sensor.calls.clone(),
        circulation.calls.clone(),
        interlibrary.calls.clone(),
    ];

    let reconciler = Reconciler::new(Box::new(sensor), Box::new(circulation), Box::new(interlibrary));
    reconciler.reconcile(ReconcileDate::Yesterday).await;

    for calls in counters {
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

#[tokio::test]
async fn test_zero_counts_are_kept() {
    let reconciler = reconciler(
        |_| Ok(SensorFields { door_count: Some(0) }),
        |_| {
            Ok(CirculationFields {
                holds: Some(0),
                ..Default::default()
            })
        },
        |_| Ok(IllFields::default()),
    );

    let record = reconciler.reconcile(ReconcileDate::Yesterday).await.record;

    assert_eq!(record.door_count, Some(0));
    assert_eq!(record.holds, Some(0));
    assert_eq!(record.checked_out, None);
    assert_eq!(record.curb_appt, None);
}
