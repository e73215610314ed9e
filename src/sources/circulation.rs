//! Circulation counters from the integrated library system database
//!
//! Three read queries run on one connection that is opened and closed inside
//! [`CirculationAdapter::fetch`]:
//!
//! 1. circulation transactions of the day, bucketed by operation code
//! 2. new patron registrations of the day
//! 3. new patron registrations of the day for the sub-branch barcode prefix
//!
//! The adapter is all-or-nothing: any failure discards the whole contribution.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::{PgConnectOptions, PgRow};
use sqlx::{Connection, PgConnection, Row};
use tracing::{debug, instrument, warn};

use crate::config::DatabaseConfig;
use crate::record::{ReconcileDate, Record};

use super::error::{SourceError, SourceResult};
use super::{Fields, Source};

/// Date format of the day column returned by the circulation query
pub const DAY_FORMAT: &str = "%m/%d/%Y";

/// Circulation database contribution to the record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CirculationFields {
    /// Day the transactions belong to, as reported by the database
    pub date: Option<NaiveDate>,
    pub checked_out: Option<u64>,
    pub total_self_check: Option<u64>,
    pub desk_check_out: Option<u64>,
    pub renewed: Option<u64>,
    pub total_checked_in: Option<u64>,
    pub total_checked_out_reporting: Option<u64>,
    pub holds: Option<u64>,
    pub new_patrons: Option<u64>,
    pub new_canton_patrons: Option<u64>,
}

impl Fields for CirculationFields {
    fn apply_to(self, record: &mut Record) {
        if let Some(date) = self.date
            && date != record.date
        {
            warn!("database reported {date} for a record keyed on {}", record.date);
        }
        record.checked_out = self.checked_out;
        record.total_self_check = self.total_self_check;
        record.desk_check_out = self.desk_check_out;
        record.renewed = self.renewed;
        record.total_checked_in = self.total_checked_in;
        record.total_checked_out_reporting = self.total_checked_out_reporting;
        record.holds = self.holds;
        record.new_patrons = self.new_patrons;
        record.new_canton_patrons = self.new_canton_patrons;
    }
}

/// SQL expression selecting the reconciliation day
///
/// `Yesterday` stays relative to the database clock; a specific day is bound
/// as the first parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayClause {
    bound: Option<NaiveDate>,
}

impl DayClause {
    pub fn new(date: ReconcileDate) -> Self {
        match date {
            ReconcileDate::Yesterday => Self { bound: None },
            ReconcileDate::On(day) => Self { bound: Some(day) },
        }
    }

    pub fn expr(&self) -> &'static str {
        match self.bound {
            None => "(current_date - interval '1 day')::date",
            Some(_) => "$1::date",
        }
    }

    /// Placeholder for the first parameter after the day
    pub fn next_param(&self) -> &'static str {
        match self.bound {
            None => "$1",
            Some(_) => "$2",
        }
    }
}

pub fn circulation_sql(day: &DayClause) -> String {
    format!(
        r#"
        SELECT to_char(max(date(transaction_gmt)), 'MM/DD/YYYY') AS day,
            count(CASE WHEN op_code = 'o' THEN op_code END) AS checked_out,
            count(CASE WHEN op_code = 'o' AND application_name LIKE '%selfcheck' THEN op_code END) AS total_self_check,
            count(CASE WHEN op_code = 'o' AND application_name = 'sierra' THEN op_code END) AS desk_check_out,
            count(CASE WHEN op_code = 'r' THEN op_code END) AS renewed,
            count(CASE WHEN op_code = 'i' THEN op_code END) AS total_checked_in,
            count(CASE WHEN op_code = 'o' OR op_code = 'r' THEN op_code END) AS total_checked_out_reporting,
            count(CASE WHEN op_code LIKE 'n%' THEN op_code END) AS holds
        FROM sierra_view.circ_trans
        WHERE date(transaction_gmt) = {}
        "#,
        day.expr()
    )
}

pub fn new_patrons_sql(day: &DayClause) -> String {
    format!(
        r#"
        SELECT count(*) AS new_patrons
        FROM sierra_view.patron_view
        JOIN sierra_view.record_metadata
            ON sierra_view.patron_view.id = sierra_view.record_metadata.id
        WHERE sierra_view.record_metadata.record_type_code = 'p'
            AND date(creation_date_gmt) = {}
        "#,
        day.expr()
    )
}

pub fn branch_patrons_sql(day: &DayClause) -> String {
    format!(
        r#"
        SELECT count(*) AS new_patrons
        FROM sierra_view.patron_view
        JOIN sierra_view.record_metadata
            ON sierra_view.patron_view.id = sierra_view.record_metadata.id
        WHERE sierra_view.record_metadata.record_type_code = 'p'
            AND date(creation_date_gmt) = {}
            AND barcode LIKE {}
        "#,
        day.expr(),
        day.next_param()
    )
}

fn count(row: &PgRow, column: &str) -> SourceResult<Option<u64>> {
    let value: Option<i64> = row.try_get(column)?;
    Ok(value.and_then(|v| u64::try_from(v).ok()))
}

pub struct CirculationAdapter {
    config: DatabaseConfig,
}

impl CirculationAdapter {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }

    fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.config.host)
            .port(self.config.port)
            .database(&self.config.database)
            .username(&self.config.user)
            .password(&self.config.password)
    }

    async fn run_queries(
        &self,
        conn: &mut PgConnection,
        day: DayClause,
    ) -> SourceResult<CirculationFields> {
        let circulation_sql = circulation_sql(&day);
        let mut query = sqlx::query(&circulation_sql);
        if let Some(bound) = day.bound {
            query = query.bind(bound);
        }
        let circ = query.fetch_one(&mut *conn).await?;

        let new_patrons_sql = new_patrons_sql(&day);
        let mut query = sqlx::query(&new_patrons_sql);
        if let Some(bound) = day.bound {
            query = query.bind(bound);
        }
        let patrons = query.fetch_one(&mut *conn).await?;

        let branch_sql = branch_patrons_sql(&day);
        let mut query = sqlx::query(&branch_sql);
        if let Some(bound) = day.bound {
            query = query.bind(bound);
        }
        let branch = query
            .bind(format!("{}%", self.config.branch_barcode_prefix))
            .fetch_one(&mut *conn)
            .await?;

        let day_text: Option<String> = circ.try_get("day")?;
        let date = day_text
            .map(|text| NaiveDate::parse_from_str(&text, DAY_FORMAT))
            .transpose()
            .map_err(|e| SourceError::Decode(format!("day column: {e}")))?;

        Ok(CirculationFields {
            date,
            checked_out: count(&circ, "checked_out")?,
            total_self_check: count(&circ, "total_self_check")?,
            desk_check_out: count(&circ, "desk_check_out")?,
            renewed: count(&circ, "renewed")?,
            total_checked_in: count(&circ, "total_checked_in")?,
            total_checked_out_reporting: count(&circ, "total_checked_out_reporting")?,
            holds: count(&circ, "holds")?,
            new_patrons: count(&patrons, "new_patrons")?,
            new_canton_patrons: count(&branch, "new_patrons")?,
        })
    }
}

#[async_trait]
impl Source for CirculationAdapter {
    type Fields = CirculationFields;

    fn name(&self) -> &'static str {
        "circulation"
    }

    #[instrument(skip(self), fields(host = %self.config.host))]
    async fn fetch(&self, date: ReconcileDate) -> SourceResult<CirculationFields> {
        let mut conn = PgConnection::connect_with(&self.connect_options()).await?;

        let result = self.run_queries(&mut conn, DayClause::new(date)).await;

        if let Err(e) = conn.close().await {
            warn!("failed to close database connection: {e}");
        }

        let fields = result?;
        debug!("retrieved circulation counters");
        Ok(fields)
    }
}
