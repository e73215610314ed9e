//! Door traffic from the sensor API
//!
//! One authenticated query per run. The response lists every sensor; the door
//! count is the inbound total of the configured entity ("Main Entrance").

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveTime};
use serde::Deserialize;
use tracing::{debug, instrument, trace};

use crate::config::SensorConfig;
use crate::record::{ReconcileDate, Record};

use super::error::{SourceError, SourceResult};
use super::{Fields, Source, auth};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Sensor API contribution to the record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensorFields {
    /// `None` when the configured entity is absent from the results
    pub door_count: Option<u64>,
}

impl Fields for SensorFields {
    fn apply_to(self, record: &mut Record) {
        record.door_count = self.door_count;
    }
}

#[derive(Debug, Deserialize)]
struct TrafficResponse {
    results: Vec<TrafficEntity>,
}

#[derive(Debug, Deserialize)]
struct TrafficEntity {
    name: String,
    #[serde(default)]
    sumins: Option<f64>,
}

/// Query parameters for the traffic endpoint
///
/// `Yesterday` uses the API's relative date; a specific date becomes a
/// custom range from its midnight to the next midnight.
pub fn query_params(date: ReconcileDate) -> Vec<(&'static str, String)> {
    let mut params = match date {
        ReconcileDate::Yesterday => vec![("relativeDate", String::from("yesterday"))],
        ReconcileDate::On(day) => {
            let (start, end) = day_bounds(day);
            vec![
                ("relativeDate", String::from("custom")),
                ("startDate", start),
                ("endDate", end),
            ]
        }
    };
    params.extend([
        ("dateGroupings", String::from("day")),
        ("entityType", String::from("sensor")),
        ("metrics", String::from("ins")),
    ]);
    params
}

fn day_bounds(day: NaiveDate) -> (String, String) {
    let start = day.and_time(NaiveTime::default());
    let end = start + Duration::days(1);
    (
        start.format(TIMESTAMP_FORMAT).to_string(),
        end.format(TIMESTAMP_FORMAT).to_string(),
    )
}

fn door_count(results: &[TrafficEntity], entity: &str) -> Option<u64> {
    results
        .iter()
        .find(|item| item.name == entity)
        .and_then(|item| item.sumins)
        .filter(|ins| ins.is_finite() && *ins >= 0.0)
        .map(|ins| ins.round() as u64)
}

pub struct SensorAdapter {
    client: reqwest::Client,
    config: SensorConfig,
}

impl SensorAdapter {
    pub fn new(client: reqwest::Client, config: SensorConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl Source for SensorAdapter {
    type Fields = SensorFields;

    fn name(&self) -> &'static str {
        "sensor"
    }

    #[instrument(skip(self), fields(entity = %self.config.entity))]
    async fn fetch(&self, date: ReconcileDate) -> SourceResult<SensorFields> {
        let credential = auth::acquire(&self.client, &self.config).await?;

        trace!("requesting traffic data for {date}");

        let response = self
            .client
            .get(&self.config.url)
            .header("Authorization", credential.bearer())
            .header("Content-type", "application/json")
            .query(&query_params(date))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SourceError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        let traffic: TrafficResponse =
            serde_json::from_str(&body).map_err(|e| SourceError::Decode(e.to_string()))?;

        let door_count = door_count(&traffic.results, &self.config.entity);
        match door_count {
            Some(count) => debug!("door count {count}"),
            None => debug!("entity not present in {} results", traffic.results.len()),
        }

        Ok(SensorFields { door_count })
    }
}
