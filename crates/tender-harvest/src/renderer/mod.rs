//! Browser abstraction for page interaction.
//!
//! The pipeline depends only on the `Renderer` and `PageHandle` traits; the
//! Chromium engine (via chromiumoxide) is one implementation. Every wait the
//! pipeline performs goes through `PageHandle::settle` or
//! `PageHandle::wait_for`, so readiness detection can change without
//! touching the navigation logic.

pub mod chromium;
pub mod script;
#[cfg(any(test, feature = "testing"))]
pub mod scripted;

use crate::error::HarvestResult;
use crate::types::DomElement;
use async_trait::async_trait;
use std::time::Duration;

/// A condition polled by [`PageHandle::wait_for`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitCondition {
    /// At least one visible element matches any of the selectors.
    AnySelectorVisible(Vec<String>),
    /// The visible page text contains any of the phrases (case-insensitive).
    TextContainsAny(Vec<String>),
}

impl WaitCondition {
    /// Short human-readable description for logs and timeout errors.
    pub fn describe(&self) -> String {
        match self {
            Self::AnySelectorVisible(selectors) => format!("any of [{}]", selectors.join(", ")),
            Self::TextContainsAny(phrases) => format!("text containing any of {phrases:?}"),
        }
    }
}

/// A browser engine that hands out pages.
#[async_trait]
pub trait Renderer: Send {
    /// Open a new page (tab).
    async fn new_page(&mut self) -> HarvestResult<Box<dyn PageHandle>>;
    /// Shut the engine down and release its process.
    async fn shutdown(&mut self) -> HarvestResult<()>;
}

/// A single browser page: the capability set the pipeline is written against.
#[async_trait]
pub trait PageHandle: Send {
    /// Navigate to a URL, failing with a timeout error after `timeout`.
    async fn navigate(&mut self, url: &str, timeout: Duration) -> HarvestResult<()>;

    /// Snapshot every element matching a CSS selector, in document order.
    async fn query(&mut self, selector: &str) -> HarvestResult<Vec<DomElement>>;

    /// Evaluate a JavaScript expression and return its JSON value.
    async fn evaluate(&mut self, script: &str) -> HarvestResult<serde_json::Value>;

    /// Click the element addressed by `selector`.
    async fn click(&mut self, selector: &str) -> HarvestResult<()>;

    /// Focus the element addressed by `selector` and type `text` into it,
    /// replacing its current value.
    async fn type_text(&mut self, selector: &str, text: &str) -> HarvestResult<()>;

    /// Press a named key ("Enter", "Escape") on the element.
    async fn press_key(&mut self, selector: &str, key: &str) -> HarvestResult<()>;

    /// Poll until `condition` holds or `timeout` elapses.
    async fn wait_for(&mut self, condition: &WaitCondition, timeout: Duration) -> HarvestResult<()>;

    /// The page's visible text (`document.body.innerText`).
    async fn page_text(&mut self) -> HarvestResult<String>;

    /// PNG screenshot of the full page.
    async fn screenshot(&mut self) -> HarvestResult<Vec<u8>>;

    /// Serialized DOM of the page.
    async fn content_html(&mut self) -> HarvestResult<String>;

    /// Fixed settling delay for asynchronous rendering.
    async fn settle(&mut self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }

    /// Close the page.
    async fn close(self: Box<Self>) -> HarvestResult<()>;
}
