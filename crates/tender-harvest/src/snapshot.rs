//! Interim and final result snapshots.

use crate::dataset::Dataset;
use crate::error::{HarvestError, HarvestResult};
use chrono::Local;
use std::path::{Path, PathBuf};

pub const INTERIM_FILE_NAME: &str = "tender_results_interim.csv";

/// Destination for dataset snapshots during a run.
pub trait SnapshotSink: Send {
    /// Overwrite the interim snapshot; called after every location.
    fn write_interim(&mut self, dataset: &Dataset) -> HarvestResult<PathBuf>;

    /// Write the final snapshot once the run completes.
    fn write_final(&mut self, dataset: &Dataset) -> HarvestResult<PathBuf>;
}

/// Writes CSV snapshots into an output directory.
#[derive(Debug, Clone)]
pub struct CsvSnapshotWriter {
    dir: PathBuf,
}

impl CsvSnapshotWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn interim_path(&self) -> PathBuf {
        self.dir.join(INTERIM_FILE_NAME)
    }

    pub fn final_path(&self, stamp: &str) -> PathBuf {
        self.dir.join(format!("tender_results_{stamp}.csv"))
    }

    fn write(&self, dataset: &Dataset, path: &Path) -> HarvestResult<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            HarvestError::Snapshot(format!("cannot create {}: {e}", self.dir.display()))
        })?;
        // Readers only ever see a complete file.
        let tmp = path.with_extension("csv.tmp");
        dataset
            .write_csv(&tmp)
            .map_err(|e| HarvestError::Snapshot(format!("{}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, path)
            .map_err(|e| HarvestError::Snapshot(format!("{}: {e}", path.display())))
    }
}

impl SnapshotSink for CsvSnapshotWriter {
    fn write_interim(&mut self, dataset: &Dataset) -> HarvestResult<PathBuf> {
        let path = self.interim_path();
        self.write(dataset, &path)?;
        tracing::debug!("interim snapshot written to {}", path.display());
        Ok(path)
    }

    fn write_final(&mut self, dataset: &Dataset) -> HarvestResult<PathBuf> {
        let path = self.final_path(&Local::now().format("%Y%m%d_%H%M%S").to_string());
        self.write(dataset, &path)?;
        tracing::info!("final snapshot written to {}", path.display());
        Ok(path)
    }
}
