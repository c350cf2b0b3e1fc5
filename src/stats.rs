use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::analyzers::{AggregateMode, Processed};
use crate::fetch::DateRange;

/// One row of the run history: what was fetched, how big the dataset grew,
/// and the headline figure of the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunStats {
    pub timestamp: DateTime<Utc>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub mode: AggregateMode,
    pub records_fetched: usize,
    pub dataset_records: usize,
    pub days: usize,
    pub result_hours: Option<f64>,
}

impl RunStats {
    pub fn from_run(
        range: Option<&DateRange>,
        records_fetched: usize,
        dataset_records: usize,
        processed: &Processed,
    ) -> Self {
        RunStats {
            timestamp: Utc::now(),
            start_date: range.map(|r| r.start),
            end_date: range.map(|r| r.end),
            mode: processed.result.mode(),
            records_fetched,
            dataset_records,
            days: processed.daily.len(),
            result_hours: processed.result.headline(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::process;
    use crate::trip::Trip;

    fn trip(day: u32, minutes: i64) -> Trip {
        let pickup = NaiveDate::from_ymd_opt(2023, 1, day)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        Trip::new(pickup, pickup + chrono::TimeDelta::minutes(minutes))
    }

    #[test]
    fn test_from_run_mean() {
        let processed = process(&[trip(1, 60), trip(2, 180)], AggregateMode::Mean);
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(),
        )
        .unwrap();

        let stats = RunStats::from_run(Some(&range), 2, 10, &processed);

        assert_eq!(stats.start_date, Some(range.start));
        assert_eq!(stats.end_date, Some(range.end));
        assert_eq!(stats.mode, AggregateMode::Mean);
        assert_eq!(stats.records_fetched, 2);
        assert_eq!(stats.dataset_records, 10);
        assert_eq!(stats.days, 2);
        assert_eq!(stats.result_hours, Some(2.0));
    }

    #[test]
    fn test_from_run_rolling_without_range() {
        let processed = process(&[trip(1, 30), trip(2, 90)], AggregateMode::Rolling);
        let stats = RunStats::from_run(None, 0, 2, &processed);

        assert_eq!(stats.start_date, None);
        assert_eq!(stats.mode, AggregateMode::Rolling);
        assert_eq!(stats.result_hours, Some(1.0));
    }
}
