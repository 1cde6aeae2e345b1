//! Per-step debug artifacts.
//!
//! When enabled, every navigation step writes `<index:03>_<step>.png` and
//! `<index:03>_<step>.html` into the debug directory. Failures to capture or
//! write are logged and never affect the run.

use crate::renderer::PageHandle;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct DebugRecorder {
    dir: Option<PathBuf>,
}

impl DebugRecorder {
    /// A recorder writing into `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    /// A recorder that does nothing.
    pub fn disabled() -> Self {
        Self { dir: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.dir.is_some()
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Artifact path stem for one step: `<dir>/<index:03>_<step>`.
    pub fn stem(dir: &Path, index: usize, step: &str) -> PathBuf {
        let step: String = step
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        dir.join(format!("{index:03}_{step}"))
    }

    /// Capture a screenshot and the page HTML for a step.
    pub async fn capture(&self, page: &mut dyn PageHandle, index: usize, step: &str) {
        let Some(dir) = &self.dir else {
            return;
        };
        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            tracing::warn!("debug dir {} unavailable: {e}", dir.display());
            return;
        }
        let stem = Self::stem(dir, index, step);

        match page.screenshot().await {
            Ok(png) => {
                if let Err(e) = tokio::fs::write(stem.with_extension("png"), png).await {
                    tracing::warn!("failed to write screenshot for {step}: {e}");
                }
            }
            Err(e) => tracing::warn!("screenshot for {step} failed: {e}"),
        }
        match page.content_html().await {
            Ok(html) => {
                if let Err(e) = tokio::fs::write(stem.with_extension("html"), html).await {
                    tracing::warn!("failed to write HTML dump for {step}: {e}");
                }
            }
            Err(e) => tracing::warn!("HTML dump for {step} failed: {e}"),
        }
        tracing::debug!("debug capture {}", stem.display());
    }
}
