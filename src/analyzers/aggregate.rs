use std::collections::BTreeMap;
use std::num::NonZeroUsize;

use chrono::NaiveDate;

use crate::analyzers::types::{DailyTotal, RollingRow, TripDuration};
use crate::analyzers::utility::{mean, round1};
use crate::trip::Trip;

/// Rows in the trailing window of the rolling aggregate.
pub const ROLLING_WINDOW: NonZeroUsize = NonZeroUsize::new(45).unwrap();

/// Attaches `(dropoff - pickup)` in minutes to every trip. Nothing is
/// filtered and negative durations are kept as they are.
pub fn trip_durations(trips: &[Trip]) -> Vec<TripDuration> {
    trips
        .iter()
        .map(|trip| {
            let delta = trip.dropoff - trip.pickup;
            let seconds = delta.num_seconds() as f64 + f64::from(delta.subsec_nanos()) / 1e9;
            TripDuration {
                pickup: trip.pickup,
                dropoff: trip.dropoff,
                duration_minutes: seconds / 60.0,
            }
        })
        .collect()
}

/// Sums durations per pickup date and converts them to hours.
///
/// One row per distinct date, ascending. Hours are rounded to one decimal.
pub fn daily_totals(durations: &[TripDuration]) -> Vec<DailyTotal> {
    let mut minutes_per_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for d in durations {
        *minutes_per_day.entry(d.pickup.date()).or_default() += d.duration_minutes;
    }

    minutes_per_day
        .into_iter()
        .map(|(date, minutes)| DailyTotal {
            date,
            hours: round1(minutes / 60.0),
        })
        .collect()
}

/// Unweighted mean of the daily hours. `None` for an empty summary.
pub fn overall_mean(daily: &[DailyTotal]) -> Option<f64> {
    let hours: Vec<f64> = daily.iter().map(|d| d.hours).collect();
    mean(&hours)
}

/// Trailing mean of `hours` over the last `window` rows, counting rows and
/// not calendar days. Early rows average whatever rows exist so far.
pub fn rolling_average(daily: &[DailyTotal], window: NonZeroUsize) -> Vec<RollingRow> {
    let hours: Vec<f64> = daily.iter().map(|d| d.hours).collect();

    daily
        .iter()
        .enumerate()
        .map(|(i, day)| {
            let start = (i + 1).saturating_sub(window.get());
            let avg = mean(&hours[start..=i]).unwrap_or(day.hours);
            RollingRow {
                date: day.date,
                hours: day.hours,
                rolling_average: round1(avg),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDateTime, TimeDelta};

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn daily(values: &[f64]) -> Vec<DailyTotal> {
        let first = date("2023-01-01");
        values
            .iter()
            .enumerate()
            .map(|(i, &hours)| DailyTotal {
                date: first + TimeDelta::days(i as i64),
                hours,
            })
            .collect()
    }

    fn window(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_trip_durations() {
        let trips = vec![
            Trip::new(dt("2023-01-01 12:00:00"), dt("2023-01-01 12:30:00")),
            Trip::new(dt("2023-01-01 13:00:00"), dt("2023-01-01 14:00:00")),
        ];
        let minutes: Vec<f64> = trip_durations(&trips)
            .iter()
            .map(|d| d.duration_minutes)
            .collect();
        assert_eq!(minutes, vec![30.0, 60.0]);
    }

    #[test]
    fn test_trip_durations_negative_and_fractional() {
        let pickup = dt("2023-01-01 12:30:00");
        let trips = vec![
            Trip::new(pickup, dt("2023-01-01 12:00:00")),
            Trip::new(pickup, pickup + TimeDelta::seconds(90)),
            Trip::new(pickup, pickup - TimeDelta::milliseconds(1500)),
        ];
        let minutes: Vec<f64> = trip_durations(&trips)
            .iter()
            .map(|d| d.duration_minutes)
            .collect();
        assert_eq!(minutes[0], -30.0);
        assert_eq!(minutes[1], 1.5);
        assert!((minutes[2] + 0.025).abs() < 1e-12);
    }

    #[test]
    fn test_daily_totals() {
        let trips = vec![
            Trip::new(dt("2023-01-01 12:00:00"), dt("2023-01-01 12:30:00")),
            Trip::new(dt("2023-01-01 13:00:00"), dt("2023-01-01 14:00:00")),
            Trip::new(dt("2023-01-02 12:00:00"), dt("2023-01-02 12:45:00")),
        ];
        let summary = daily_totals(&trip_durations(&trips));
        assert_eq!(
            summary,
            vec![
                DailyTotal { date: date("2023-01-01"), hours: 1.5 },
                DailyTotal { date: date("2023-01-02"), hours: 0.8 },
            ]
        );
    }

    #[test]
    fn test_daily_totals_sorted_and_grouped_by_pickup_date() {
        let trips = vec![
            Trip::new(dt("2023-01-03 23:30:00"), dt("2023-01-04 00:30:00")),
            Trip::new(dt("2023-01-01 10:00:00"), dt("2023-01-01 11:00:00")),
            Trip::new(dt("2023-01-03 01:00:00"), dt("2023-01-03 02:00:00")),
        ];
        let summary = daily_totals(&trip_durations(&trips));
        let dates: Vec<NaiveDate> = summary.iter().map(|d| d.date).collect();
        assert_eq!(dates, vec![date("2023-01-01"), date("2023-01-03")]);
        assert_eq!(summary[1].hours, 2.0);
    }

    #[test]
    fn test_daily_total_matches_raw_sum() {
        let base = dt("2023-01-01 00:00:00");
        let trips: Vec<Trip> = (0..37)
            .map(|i| {
                let pickup = base + TimeDelta::minutes(i * 37);
                Trip::new(pickup, pickup + TimeDelta::seconds(60 + i * 13))
            })
            .collect();
        let durations = trip_durations(&trips);
        let summary = daily_totals(&durations);

        for day in &summary {
            let raw_hours: f64 = durations
                .iter()
                .filter(|d| d.pickup.date() == day.date)
                .map(|d| d.duration_minutes)
                .sum::<f64>()
                / 60.0;
            assert!((day.hours - raw_hours).abs() <= 0.05 + 1e-9);
        }
        let grouped: usize = summary
            .iter()
            .map(|day| durations.iter().filter(|d| d.pickup.date() == day.date).count())
            .sum();
        assert_eq!(grouped, durations.len());
    }

    #[test]
    fn test_daily_totals_empty() {
        assert!(daily_totals(&[]).is_empty());
    }

    #[test]
    fn test_overall_mean() {
        let mean = overall_mean(&daily(&[1.5, 3.0, 3.0, 2.5, 3.0])).unwrap();
        assert!((mean - 2.6).abs() < 1e-9);
        assert_eq!(overall_mean(&[]), None);
    }

    #[test]
    fn test_rolling_average() {
        let rows = rolling_average(&daily(&[1.0, 2.0, 3.0, 4.0, 5.0]), window(3));
        let averages: Vec<f64> = rows.iter().map(|r| r.rolling_average).collect();
        assert_eq!(averages, vec![1.0, 1.5, 2.0, 3.0, 4.0]);
        assert_eq!(rows[2].hours, 3.0);
        assert_eq!(rows[2].date, date("2023-01-03"));
    }

    #[test]
    fn test_rolling_average_rounds_ties_to_even() {
        let rows = rolling_average(&daily(&[1.5, 3.0, 3.0, 2.5, 3.0]), ROLLING_WINDOW);
        let averages: Vec<f64> = rows.iter().map(|r| r.rolling_average).collect();
        assert_eq!(averages, vec![1.5, 2.2, 2.5, 2.5, 2.6]);
    }

    #[test]
    fn test_rolling_average_window_of_one_is_identity() {
        let values = [4.0, 0.5, 7.25];
        let rows = rolling_average(&daily(&values), window(1));
        for (row, value) in rows.iter().zip(values) {
            assert_eq!(row.rolling_average, round1(value));
        }
    }

    #[test]
    fn test_rolling_average_counts_rows_not_days() {
        let mut summary = daily(&[2.0, 4.0]);
        summary[1].date = date("2023-03-01");
        let rows = rolling_average(&summary, window(2));
        assert_eq!(rows[1].rolling_average, 3.0);
    }

    #[test]
    fn test_rolling_average_matches_window_mean() {
        let values: Vec<f64> = (0..60_i32).map(|i| f64::from(i % 7) + 0.5).collect();
        let rows = rolling_average(&daily(&values), window(10));

        assert_eq!(rows[0].rolling_average, values[0]);
        for (i, row) in rows.iter().enumerate() {
            let start = i.saturating_sub(9);
            let expected = values[start..=i].iter().sum::<f64>() / (i - start + 1) as f64;
            assert!((row.rolling_average - expected).abs() <= 0.05 + 1e-9);
        }
    }
}
