//! On-disk trip store.
//!
//! The dataset lives in a single Parquet file holding the two raw timestamp
//! columns. It only grows by full replacement: the stored rows are loaded,
//! new rows are appended in memory, and the whole file is rewritten.

use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use arrow::array::{Array, ArrayRef, TimestampMicrosecondArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, NaiveDateTime};
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value;
use tracing::{debug, info};

use crate::parser::parse_trips;
use crate::trip::{DROPOFF_FIELD, PICKUP_FIELD, Trip};

const TIMESTAMP_TYPE: DataType = DataType::Timestamp(TimeUnit::Microsecond, None);

/// Ordered collection of trips, in insertion order.
///
/// Rows carry no identity, so merging overlapping fetches keeps duplicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripDataset {
    trips: Vec<Trip>,
}

impl TripDataset {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_trips(trips: Vec<Trip>) -> Self {
        Self { trips }
    }

    /// Builds a dataset from raw API records alone.
    pub fn from_records(records: &[Value]) -> Result<Self> {
        Self::empty().merge(records)
    }

    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }

    /// Reads the stored dataset at `path`, or an empty one if no file exists.
    ///
    /// # Errors
    ///
    /// Any failure other than a missing file is returned: unreadable or
    /// corrupt Parquet, missing columns, non-timestamp columns and null
    /// timestamps.
    pub fn load_or_empty(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "No stored dataset, starting empty");
                return Ok(Self::empty());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("failed to open dataset {}", path.display()));
            }
        };

        let reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .and_then(|builder| builder.build())
            .with_context(|| format!("failed to read parquet dataset {}", path.display()))?;

        let mut trips = Vec::new();
        for batch in reader {
            let batch =
                batch.with_context(|| format!("corrupt record batch in {}", path.display()))?;
            append_batch(&batch, &mut trips)
                .with_context(|| format!("unexpected dataset layout in {}", path.display()))?;
        }

        info!(path = %path.display(), records = trips.len(), "Loaded stored dataset");
        Ok(Self { trips })
    }

    /// Appends `new_records` after the existing rows.
    ///
    /// # Errors
    ///
    /// Fails if any record lacks a timestamp field or holds an unparseable
    /// timestamp. Nothing is appended in that case.
    pub fn merge(mut self, new_records: &[Value]) -> Result<Self> {
        let new_trips = parse_trips(new_records)?;
        debug!(
            existing = self.trips.len(),
            incoming = new_trips.len(),
            "Merging records into dataset"
        );
        self.trips.extend(new_trips);
        Ok(self)
    }

    /// Overwrites the file at `path` with the full dataset.
    ///
    /// The rows are written to a sibling `.tmp` file that is then renamed
    /// over `path`, so a failed write leaves the previous dataset intact.
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let staging = staging_path(path);
        if let Err(e) = self.write_parquet(&staging) {
            let _ = fs::remove_file(&staging);
            return Err(e);
        }
        fs::rename(&staging, path).with_context(|| {
            format!("failed to replace dataset {} with {}", path.display(), staging.display())
        })?;

        info!(path = %path.display(), records = self.trips.len(), "Dataset saved");
        Ok(())
    }

    fn write_parquet(&self, path: &Path) -> Result<()> {
        let schema = Arc::new(Schema::new(vec![
            Field::new(PICKUP_FIELD, TIMESTAMP_TYPE, false),
            Field::new(DROPOFF_FIELD, TIMESTAMP_TYPE, false),
        ]));

        let pickups: Vec<i64> = self.trips.iter().map(|t| to_micros(t.pickup)).collect();
        let dropoffs: Vec<i64> = self.trips.iter().map(|t| to_micros(t.dropoff)).collect();
        let arrays: Vec<ArrayRef> = vec![
            Arc::new(TimestampMicrosecondArray::from(pickups)),
            Arc::new(TimestampMicrosecondArray::from(dropoffs)),
        ];

        let batch = RecordBatch::try_new(schema.clone(), arrays)?;
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        let mut writer = ArrowWriter::try_new(file, schema, None)?;
        writer.write(&batch)?;
        writer.close()?;
        debug!(path = %path.display(), "Parquet file written");
        Ok(())
    }
}

/// `<path>.tmp`, beside the dataset.
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn append_batch(batch: &RecordBatch, trips: &mut Vec<Trip>) -> Result<()> {
    let pickups = timestamp_column(batch, PICKUP_FIELD)?;
    let dropoffs = timestamp_column(batch, DROPOFF_FIELD)?;

    trips.reserve(batch.num_rows());
    for (row, (pickup, dropoff)) in pickups.iter().zip(dropoffs.iter()).enumerate() {
        let (Some(pickup), Some(dropoff)) = (pickup, dropoff) else {
            bail!("null timestamp in row {row}");
        };
        trips.push(Trip::new(from_micros(pickup)?, from_micros(dropoff)?));
    }
    Ok(())
}

/// Fetches `name` as microsecond timestamps, whatever unit it was stored in.
fn timestamp_column(batch: &RecordBatch, name: &str) -> Result<TimestampMicrosecondArray> {
    let column = batch
        .column_by_name(name)
        .ok_or_else(|| anyhow!("missing column `{name}`"))?;

    if !matches!(column.data_type(), DataType::Timestamp(_, _)) {
        bail!(
            "column `{name}` has type {}, expected a timestamp",
            column.data_type()
        );
    }

    let micros = cast(column.as_ref(), &TIMESTAMP_TYPE)?;
    micros
        .as_any()
        .downcast_ref::<TimestampMicrosecondArray>()
        .cloned()
        .ok_or_else(|| anyhow!("column `{name}` could not be read as timestamps"))
}

fn to_micros(ts: NaiveDateTime) -> i64 {
    ts.and_utc().timestamp_micros()
}

fn from_micros(micros: i64) -> Result<NaiveDateTime> {
    DateTime::from_timestamp_micros(micros)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| anyhow!("timestamp {micros}us is out of range"))
}
