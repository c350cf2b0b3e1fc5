//! Trip-duration aggregation.
//!
//! A pure transform chain: trips are turned into per-trip durations, those
//! are summed per pickup date, and the daily series is reduced either to a
//! single mean or to a trailing rolling average.

pub mod aggregate;
pub mod analyzer;
pub mod types;
pub mod utility;

pub use aggregate::{ROLLING_WINDOW, daily_totals, overall_mean, rolling_average, trip_durations};
pub use analyzer::process;
pub use types::{AggregateMode, AggregateResult, DailyTotal, Processed, RollingRow, TripDuration};
