//! Data types used by the aggregation pipeline.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// A trip with its duration in (fractional) minutes. Negative when the
/// dropoff precedes the pickup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TripDuration {
    pub pickup: NaiveDateTime,
    pub dropoff: NaiveDateTime,
    pub duration_minutes: f64,
}

/// Total trip time for one pickup date, in hours rounded to one decimal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub hours: f64,
}

/// A [`DailyTotal`] with the trailing mean of `hours` up to and including it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RollingRow {
    pub date: NaiveDate,
    pub hours: f64,
    pub rolling_average: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateMode {
    Mean,
    Rolling,
}

/// Outcome of the selected aggregate; one variant per [`AggregateMode`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AggregateResult {
    /// Mean daily hours. `None` when there were no days to average.
    Mean(Option<f64>),
    Rolling(Vec<RollingRow>),
}

impl AggregateResult {
    pub fn mode(&self) -> AggregateMode {
        match self {
            AggregateResult::Mean(_) => AggregateMode::Mean,
            AggregateResult::Rolling(_) => AggregateMode::Rolling,
        }
    }

    /// The single figure a run reports: the mean, or the latest rolling value.
    pub fn headline(&self) -> Option<f64> {
        match self {
            AggregateResult::Mean(mean) => *mean,
            AggregateResult::Rolling(rows) => rows.last().map(|r| r.rolling_average),
        }
    }
}

/// Everything computed by one aggregation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Processed {
    pub durations: Vec<TripDuration>,
    pub daily: Vec<DailyTotal>,
    pub result: AggregateResult,
}
