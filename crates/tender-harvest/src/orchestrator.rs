//! Whole-run driver: slice selection, per-location processing, merging and
//! snapshots, with the browser released on every exit path.

use crate::config::HarvestConfig;
use crate::dataset::Dataset;
use crate::error::HarvestResult;
use crate::navigation::Navigator;
use crate::renderer::{PageHandle, Renderer};
use crate::snapshot::SnapshotSink;
use crate::types::{other_tenderer_column, LocationRecord, OutcomeStatus, BID_COUNT_COLUMN};
use serde::Serialize;
use std::path::PathBuf;

/// Counts for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub processed: usize,
    pub succeeded: usize,
    /// Locations without search results or a tender-results section.
    pub no_results: usize,
    pub failed: usize,
    pub final_snapshot: Option<PathBuf>,
}

/// Rows to process: the `[start, end)` slice, clamped to the dataset, then
/// the pending-only filter when enabled. Rows without a location are skipped.
pub fn select_records(dataset: &Dataset, config: &HarvestConfig) -> Vec<LocationRecord> {
    let records = dataset.records();
    let end = config.end_index.unwrap_or(records.len()).min(records.len());
    let start = config.start_index.min(end);

    records[start..end]
        .iter()
        .filter(|r| {
            if r.location.is_empty() {
                tracing::warn!("row {} has no location, skipping", r.index);
                return false;
            }
            !config.pending_only || is_pending(r)
        })
        .cloned()
        .collect()
}

/// Several bids recorded but no other tenderer captured yet.
pub fn is_pending(record: &LocationRecord) -> bool {
    let bids = record
        .field(BID_COUNT_COLUMN)
        .and_then(|b| b.parse::<f64>().ok())
        .unwrap_or(0.0);
    bids > 1.0 && record.field(&other_tenderer_column(1)).is_none()
}

/// Process the selected locations of `dataset` with one page from `renderer`.
///
/// The page is closed and the renderer shut down whether or not the run
/// succeeds. The first error wins: a run error is reported ahead of any
/// release error.
pub async fn run(
    renderer: &mut dyn Renderer,
    mut dataset: Dataset,
    sink: &mut dyn SnapshotSink,
    config: &HarvestConfig,
) -> HarvestResult<RunReport> {
    let mut page = match renderer.new_page().await {
        Ok(page) => page,
        Err(e) => {
            if let Err(shutdown) = renderer.shutdown().await {
                tracing::warn!("renderer shutdown failed: {shutdown}");
            }
            return Err(e);
        }
    };

    let result = process_all(page.as_mut(), &mut dataset, sink, config).await;

    let closed = page.close().await;
    if let Err(e) = &closed {
        tracing::warn!("closing page failed: {e}");
    }
    let shutdown = renderer.shutdown().await;
    if let Err(e) = &shutdown {
        tracing::warn!("renderer shutdown failed: {e}");
    }

    let report = result?;
    closed?;
    shutdown?;
    Ok(report)
}

async fn process_all(
    page: &mut dyn PageHandle,
    dataset: &mut Dataset,
    sink: &mut dyn SnapshotSink,
    config: &HarvestConfig,
) -> HarvestResult<RunReport> {
    let records = select_records(dataset, config);
    let navigator = Navigator::new(config.clone());
    let mut report = RunReport::default();
    tracing::info!(
        "processing {} of {} location(s)",
        records.len(),
        dataset.len()
    );

    for (n, record) in records.iter().enumerate() {
        if n > 0 {
            page.settle(config.inter_location_delay()).await;
        }

        let outcome = navigator.process_location(page, record).await;
        report.processed += 1;
        match outcome.status {
            OutcomeStatus::Success => report.succeeded += 1,
            OutcomeStatus::NoResultsTab => report.no_results += 1,
            OutcomeStatus::Failed { .. } => report.failed += 1,
        }

        match dataset.apply_outcome(&outcome) {
            Some(row) => tracing::info!(
                "[{}] {}: {} ({} other tenderer(s))",
                row,
                outcome.location,
                outcome.status_label(),
                outcome.other_tenderers.len()
            ),
            None => tracing::warn!("no row for location {}, result dropped", outcome.location),
        }
        sink.write_interim(dataset)?;
    }

    report.final_snapshot = Some(sink.write_final(dataset)?);
    tracing::info!(
        "run complete: {} processed, {} succeeded, {} without results, {} failed",
        report.processed,
        report.succeeded,
        report.no_results,
        report.failed
    );
    Ok(report)
}
