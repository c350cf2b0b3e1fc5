//! Run orchestration: fetch, merge into the stored dataset, persist,
//! aggregate.

use std::path::Path;

use anyhow::Result;
use tracing::info;

use crate::analyzers::{AggregateMode, Processed, process};
use crate::config::PipelineConfig;
use crate::dataset::TripDataset;
use crate::fetch::{DateRange, HttpClient, fetch_all};
use crate::stats::RunStats;

/// What a fetch run should do.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub range: DateRange,
    pub mode: AggregateMode,
    /// Replace the stored dataset with this run's records instead of
    /// extending it.
    pub fresh: bool,
}

/// Outcome of a run.
#[derive(Debug)]
pub struct RunReport {
    pub dataset: TripDataset,
    pub processed: Processed,
    pub stats: RunStats,
}

/// Fetches `options.range`, merges it into the stored dataset, saves the
/// result and aggregates the full dataset.
///
/// The fetch is best effort: a transport failure part-way through still
/// merges and saves the records gathered before it. Storage and record
/// parsing failures abort the run before anything is written.
#[tracing::instrument(skip(client, config, options), fields(range = %options.range, mode = ?options.mode))]
pub fn fetch_and_aggregate<C: HttpClient + ?Sized>(
    client: &C,
    config: &PipelineConfig,
    options: &RunOptions,
) -> Result<RunReport> {
    let path = config.storage.dataset_path.as_path();
    info!(
        base_url = %config.api.base_url,
        limit = config.api.limit,
        start = %options.range.start,
        end = %options.range.end,
        "Fetching trips"
    );

    let records = fetch_all(client, &config.api.base_url, &options.range, config.api.limit);
    info!(records = records.len(), "Total records fetched");

    let dataset = if options.fresh {
        info!("Fresh run, stored dataset will be replaced");
        TripDataset::from_records(&records)?
    } else {
        TripDataset::load_or_empty(path)?.merge(&records)?
    };
    info!(total = dataset.len(), "Records merged into dataset");
    dataset.persist(path)?;

    let processed = process(dataset.trips(), options.mode);
    let stats = RunStats::from_run(Some(&options.range), records.len(), dataset.len(), &processed);

    Ok(RunReport {
        dataset,
        processed,
        stats,
    })
}

/// Aggregates the stored dataset at `path` without fetching anything.
#[tracing::instrument(skip(path), fields(path = %path.as_ref().display()))]
pub fn summarize_stored(path: impl AsRef<Path>, mode: AggregateMode) -> Result<RunReport> {
    let dataset = TripDataset::load_or_empty(path)?;
    let processed = process(dataset.trips(), mode);
    let stats = RunStats::from_run(None, 0, dataset.len(), &processed);

    Ok(RunReport {
        dataset,
        processed,
        stats,
    })
}
