//! Conversion of raw API records into typed [`Trip`]s.

use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDateTime;
use serde_json::Value;

use crate::trip::{DROPOFF_FIELD, PICKUP_FIELD, Trip};

// `%.f` also matches an absent fractional part.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses a naive timestamp as served by the trip API (`2023-01-01T00:12:34.000`).
///
/// # Errors
///
/// Returns an error if `text` matches none of the accepted layouts.
pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime> {
    let text = text.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .ok_or_else(|| anyhow!("unrecognized timestamp `{text}`"))
}

/// Decodes one raw record object into a [`Trip`].
///
/// # Errors
///
/// Returns an error if the record is not an object, lacks either timestamp
/// field, or holds a value that is not a parseable timestamp string.
pub fn parse_trip(record: &Value) -> Result<Trip> {
    if !record.is_object() {
        bail!("expected a JSON object, got `{record}`");
    }
    let pickup = parse_timestamp(string_field(record, PICKUP_FIELD)?)
        .with_context(|| format!("invalid `{PICKUP_FIELD}`"))?;
    let dropoff = parse_timestamp(string_field(record, DROPOFF_FIELD)?)
        .with_context(|| format!("invalid `{DROPOFF_FIELD}`"))?;
    Ok(Trip::new(pickup, dropoff))
}

/// Decodes a batch of raw records, failing on the first malformed one.
pub fn parse_trips(records: &[Value]) -> Result<Vec<Trip>> {
    records
        .iter()
        .enumerate()
        .map(|(i, record)| parse_trip(record).with_context(|| format!("malformed record #{i}")))
        .collect()
}

fn string_field<'a>(record: &'a Value, field: &str) -> Result<&'a str> {
    match record.get(field) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => bail!("field `{field}` is not a string: {other}"),
        None => bail!("record is missing field `{field}`"),
    }
}
