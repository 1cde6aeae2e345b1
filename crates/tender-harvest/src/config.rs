//! Run configuration.
//!
//! Defaults match the portal's observed timings. A JSON file can override
//! any subset of fields; `TENDER_HARVEST_BASE_URL` overrides the portal URL.

use crate::error::{HarvestError, HarvestResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding [`HarvestConfig::base_url`].
pub const BASE_URL_ENV: &str = "TENDER_HARVEST_BASE_URL";

pub const DEFAULT_BASE_URL: &str = "https://eservice.ura.gov.sg/maps/?service=GLSRELEASE";

/// Result-item selectors, most specific first.
pub const DEFAULT_RESULT_SELECTORS: &[&str] = &[
    "div.search-results-container > div > a > div:nth-child(2)",
    "div.search-results-container a",
    ".search-result-item",
    ".search-results li",
];

/// Close buttons of the site-detail popup.
pub const DEFAULT_CLOSE_SELECTORS: &[&str] =
    &["a.close-popup", "a[class*='close-popup']", "button.close", "button[class*='close']", "img[alt='Close']"];

/// Containers of the site-detail popup, read during award-date verification.
pub const DEFAULT_DETAIL_SELECTORS: &[&str] = &[".popup-content", ".info-window", ".details-panel"];

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Portal landing page.
    pub base_url: String,
    /// Query parameter used for the direct-URL search fallback.
    pub search_param: String,
    /// Attempts per location; values below 1 are treated as 1.
    pub retries: u32,
    /// First location index to process.
    pub start_index: usize,
    /// One past the last location index; `None` means the end of the dataset.
    pub end_index: Option<usize>,
    pub headless: bool,
    /// Write a screenshot and HTML dump at every step.
    pub debug: bool,
    pub debug_dir: PathBuf,
    pub output_dir: PathBuf,
    pub navigation_timeout_ms: u64,
    pub element_timeout_ms: u64,
    /// Pause after loading a page or submitting a search.
    pub settle_delay_ms: u64,
    /// Pause after each click.
    pub click_settle_ms: u64,
    /// Pause between attempts of the same location.
    pub retry_cooldown_ms: u64,
    /// Pause between locations.
    pub inter_location_delay_ms: u64,
    /// Pick the search result whose award date equals the row's `Date of Award`.
    pub verify_award_date: bool,
    /// Only process rows with several bids and no other tenderers recorded.
    pub pending_only: bool,
    pub max_other_tenderers: Option<usize>,
    pub result_selectors: Vec<String>,
    pub close_selectors: Vec<String>,
    pub detail_selectors: Vec<String>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            search_param: "query".to_string(),
            retries: 3,
            start_index: 0,
            end_index: None,
            headless: false,
            debug: false,
            debug_dir: PathBuf::from("debug"),
            output_dir: PathBuf::from("."),
            navigation_timeout_ms: 30_000,
            element_timeout_ms: 10_000,
            settle_delay_ms: 3_000,
            click_settle_ms: 2_000,
            retry_cooldown_ms: 5_000,
            inter_location_delay_ms: 2_000,
            verify_award_date: false,
            pending_only: false,
            max_other_tenderers: None,
            result_selectors: strings(DEFAULT_RESULT_SELECTORS),
            close_selectors: strings(DEFAULT_CLOSE_SELECTORS),
            detail_selectors: strings(DEFAULT_DETAIL_SELECTORS),
        }
    }
}

impl HarvestConfig {
    /// Load a JSON config file; missing fields keep their defaults.
    pub fn load(path: &Path) -> HarvestResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            HarvestError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                self.base_url = url.trim().to_string();
            }
        }
        self
    }

    pub fn validate(&self) -> HarvestResult<()> {
        url::Url::parse(&self.base_url)?;
        if self.search_param.trim().is_empty() {
            return Err(HarvestError::Config("search_param must not be empty".into()));
        }
        if self.result_selectors.is_empty() {
            return Err(HarvestError::Config("result_selectors must not be empty".into()));
        }
        Ok(())
    }

    /// Attempts per location, at least one.
    pub fn attempts(&self) -> u32 {
        self.retries.max(1)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn element_timeout(&self) -> Duration {
        Duration::from_millis(self.element_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn click_settle(&self) -> Duration {
        Duration::from_millis(self.click_settle_ms)
    }

    pub fn retry_cooldown(&self) -> Duration {
        Duration::from_millis(self.retry_cooldown_ms)
    }

    pub fn inter_location_delay(&self) -> Duration {
        Duration::from_millis(self.inter_location_delay_ms)
    }

    /// Zero every delay; for tests driving a scripted page.
    pub fn without_delays(mut self) -> Self {
        self.settle_delay_ms = 0;
        self.click_settle_ms = 0;
        self.retry_cooldown_ms = 0;
        self.inter_location_delay_ms = 0;
        self.element_timeout_ms = 0;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = HarvestConfig::default();
        assert_eq!(config.retries, 3);
        assert_eq!(config.navigation_timeout(), Duration::from_secs(30));
        assert_eq!(config.element_timeout(), Duration::from_secs(10));
        assert_eq!(config.inter_location_delay(), Duration::from_secs(2));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_retries_still_attempts_once() {
        let config = HarvestConfig {
            retries: 0,
            ..Default::default()
        };
        assert_eq!(config.attempts(), 1);
    }

    #[test]
    fn test_load_partial_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"retries": 5, "pending_only": true, "end_index": 7}}"#).unwrap();

        let config = HarvestConfig::load(file.path()).unwrap();
        assert_eq!(config.retries, 5);
        assert!(config.pending_only);
        assert_eq!(config.end_index, Some(7));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_load_rejects_bad_url() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"base_url": "not a url"}}"#).unwrap();
        assert!(matches!(
            HarvestConfig::load(file.path()),
            Err(HarvestError::Url(_))
        ));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = HarvestConfig::load(Path::new("/nonexistent/harvest.json")).unwrap_err();
        assert!(matches!(err, HarvestError::Config(_)));
    }
}
