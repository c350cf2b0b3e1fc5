//! Reporting of aggregation results.
//!
//! Results go to the log, to an optional daily-summary CSV, and to an
//! append-only CSV run history.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::analyzers::{AggregateResult, Processed};
use crate::stats::RunStats;
use csv::WriterBuilder;
use std::fs::{self, OpenOptions};
use std::path::Path;

/// Logs the daily summary and the selected aggregate.
pub fn log_summary(processed: &Processed) {
    for day in &processed.daily {
        debug!(date = %day.date, hours = day.hours, "Daily trip time");
    }

    match &processed.result {
        AggregateResult::Mean(Some(mean)) => {
            info!(
                days = processed.daily.len(),
                "Average daily trip time: {mean:.1} hours"
            );
        }
        AggregateResult::Mean(None) => {
            warn!("No trips available, average daily trip time is undefined");
        }
        AggregateResult::Rolling(rows) => {
            for row in rows {
                info!(
                    date = %row.date,
                    hours = row.hours,
                    rolling_average = row.rolling_average,
                    "Rolling average trip time"
                );
            }
        }
    }
}

/// Writes the daily summary as CSV, replacing any existing file.
///
/// Rolling runs include the `rolling_average` column.
pub fn write_summary_csv(path: impl AsRef<Path>, processed: &Processed) -> Result<()> {
    let path = path.as_ref();
    let written = match &processed.result {
        AggregateResult::Rolling(rows) => write_rows(path, rows),
        AggregateResult::Mean(_) => write_rows(path, &processed.daily),
    };
    written.with_context(|| format!("failed to write summary {}", path.display()))?;

    info!(path = %path.display(), days = processed.daily.len(), "Daily summary written");
    Ok(())
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    create_parent_dir(path)?;
    let mut writer = WriterBuilder::new().from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Appends a [`RunStats`] record as a row to a CSV file.
///
/// Creates the file (and its directory) with headers if it does not already
/// exist.
pub fn append_record(path: impl AsRef<Path>, stats: &RunStats) -> Result<()> {
    let path = path.as_ref();
    create_parent_dir(path)?;
    let file_exists = path.exists();
    debug!(path = %path.display(), file_exists, "Appending run history record");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    writer.serialize(stats)?;
    writer.flush()?;

    Ok(())
}

fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::{AggregateMode, process};
    use crate::trip::Trip;
    use chrono::{NaiveDate, TimeDelta};

    fn processed(mode: AggregateMode) -> Processed {
        let day1 = NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let trips = vec![
            Trip::new(day1, day1 + TimeDelta::minutes(90)),
            Trip::new(day1 + TimeDelta::days(1), day1 + TimeDelta::days(1) + TimeDelta::hours(3)),
        ];
        process(&trips, mode)
    }

    #[test]
    fn test_log_summary_does_not_panic() {
        log_summary(&processed(AggregateMode::Mean));
        log_summary(&processed(AggregateMode::Rolling));
        log_summary(&process(&[], AggregateMode::Mean));
    }

    #[test]
    fn test_write_summary_csv_mean() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");

        write_summary_csv(&path, &processed(AggregateMode::Mean)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines, vec!["date,hours", "2023-01-01,1.5", "2023-01-02,3.0"]);
    }

    #[test]
    fn test_write_summary_csv_rolling() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("summary.csv");

        write_summary_csv(&path, &processed(AggregateMode::Rolling)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "date,hours,rolling_average");
        assert_eq!(lines[2], "2023-01-02,3.0,2.2");
    }

    #[test]
    fn test_append_record_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs.csv");
        let stats = RunStats::from_run(None, 2, 2, &processed(AggregateMode::Mean));

        append_record(&path, &stats).unwrap();
        append_record(&path, &stats).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header_count = content.lines().filter(|l| l.contains("timestamp")).count();
        assert_eq!(header_count, 1);
        // 1 header + 2 data rows
        assert_eq!(content.lines().count(), 3);
        assert!(content.lines().nth(1).unwrap().contains(",mean,"));
    }

    #[test]
    fn test_append_record_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("history").join("runs.csv");
        let stats = RunStats::from_run(None, 2, 2, &processed(AggregateMode::Rolling));

        append_record(&path, &stats).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.lines().nth(1).unwrap().contains(",rolling,"));
    }
}
