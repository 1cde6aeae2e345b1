//! tender-harvest: batch collection of government land-sale tender results
//! from a dynamic map portal.

pub mod config;
pub mod dataset;
pub mod debug;
pub mod error;
pub mod extraction;
pub mod locator;
pub mod navigation;
pub mod normalize;
pub mod orchestrator;
pub mod renderer;
pub mod snapshot;
pub mod types;

pub use config::HarvestConfig;
pub use dataset::Dataset;
pub use error::{HarvestError, HarvestResult};
pub use navigation::{AttemptOutcome, NavState, Navigator};
pub use normalize::normalize;
pub use orchestrator::{run, RunReport};
pub use renderer::chromium::{ChromiumOptions, ChromiumRenderer};
pub use renderer::{PageHandle, Renderer};
pub use snapshot::{CsvSnapshotWriter, SnapshotSink};
pub use types::*;
