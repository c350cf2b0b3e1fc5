use std::fmt;

use anyhow::{Result, ensure};
use chrono::NaiveDate;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::client::TransportError;
use crate::trip::{DROPOFF_FIELD, PICKUP_FIELD};

/// Inclusive range of pickup dates to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        let range = Self { start, end };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.start <= self.end,
            "date range starts after it ends ({} > {})",
            self.start,
            self.end
        );
        Ok(())
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// Query parameters for one page: the fixed two-column projection, the
/// pickup-date predicate, pagination and pickup ordering.
///
/// Both bounds are sent as bare `YYYY-MM-DD` literals, which the server
/// reads as midnight. The end bound therefore only admits trips picked up
/// at exactly `00:00:00` on `range.end`; the rest of that day is not fetched.
pub fn page_params(range: &DateRange, limit: usize, offset: usize) -> Vec<(&'static str, String)> {
    vec![
        ("$select", format!("{PICKUP_FIELD}, {DROPOFF_FIELD}")),
        (
            "$where",
            format!(
                "{PICKUP_FIELD} >= '{}' AND {PICKUP_FIELD} <= '{}'",
                range.start.format("%Y-%m-%d"),
                range.end.format("%Y-%m-%d"),
            ),
        ),
        ("$limit", limit.to_string()),
        ("$offset", offset.to_string()),
        ("$order", PICKUP_FIELD.to_string()),
    ]
}

/// Builds the URL-encoded request URL for one page.
pub fn page_url(
    base_url: &str,
    range: &DateRange,
    limit: usize,
    offset: usize,
) -> Result<Url, TransportError> {
    Url::parse_with_params(base_url, page_params(range, limit, offset))
        .map_err(|e| TransportError::InvalidRequest(format!("{base_url}: {e}")))
}
