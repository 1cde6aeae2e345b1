//! Error taxonomy for the harvesting pipeline.

use std::time::Duration;

/// All errors that can occur while harvesting tender results.
#[derive(thiserror::Error, Debug)]
pub enum HarvestError {
    #[error("Navigation to {url} timed out after {}ms", timeout.as_millis())]
    NavigationTimeout { url: String, timeout: Duration },

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Timed out after {}ms waiting for {what}", timeout.as_millis())]
    WaitTimeout { what: String, timeout: Duration },

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Click failed on {selector}: {reason}")]
    Click { selector: String, reason: String },

    #[error("Input failed on {selector}: {reason}")]
    Input { selector: String, reason: String },

    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarvestError {
    /// Whether this failure may clear up on a fresh attempt.
    ///
    /// Transient failures feed the per-location retry loop. Any other failure
    /// inside an attempt fails the location without a retry; outside an
    /// attempt it aborts the run.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::NavigationTimeout { .. }
                | Self::Navigation(_)
                | Self::WaitTimeout { .. }
                | Self::ElementNotFound(_)
                | Self::Click { .. }
                | Self::Input { .. }
                | Self::Script(_)
        )
    }
}

/// Convenience result type.
pub type HarvestResult<T> = Result<T, HarvestError>;
