//! Chromium-based renderer using chromiumoxide.

use super::script;
use super::{PageHandle, Renderer, WaitCondition};
use crate::error::{HarvestError, HarvestResult};
use crate::types::DomElement;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig, HeadlessMode};
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// Interval between polls in [`PageHandle::wait_for`].
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Find the Chromium binary path.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. TENDER_HARVEST_CHROMIUM_PATH env
    if let Ok(p) = std::env::var("TENDER_HARVEST_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. Chrome for Testing under ~/.cache/tender-harvest/
    if let Some(cache) = dirs::cache_dir() {
        let root = cache.join("tender-harvest/chromium");
        let candidates = if cfg!(target_os = "macos") {
            vec![
                root.join("chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                root.join("chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
            ]
        } else if cfg!(target_os = "windows") {
            vec![root.join("chrome-win64/chrome.exe")]
        } else {
            vec![root.join("chrome-linux64/chrome")]
        };
        if let Some(found) = candidates.into_iter().find(|c| c.exists()) {
            return Some(found);
        }
    }

    // 3. System PATH
    for name in ["google-chrome", "google-chrome-stable", "chromium", "chromium-browser", "chrome"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 4. Common install locations
    let common: &[&str] = if cfg!(target_os = "macos") {
        &["/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"]
    } else if cfg!(target_os = "windows") {
        &[
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
        ]
    } else {
        &[]
    };
    common.iter().map(PathBuf::from).find(|p| p.exists())
}

/// Launch options for [`ChromiumRenderer`].
#[derive(Debug, Clone)]
pub struct ChromiumOptions {
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
    /// Explicit executable; discovered with [`find_chromium`] when unset.
    pub executable: Option<PathBuf>,
}

impl Default for ChromiumOptions {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            executable: None,
        }
    }
}

impl ChromiumOptions {
    /// Headless runs use Chrome's new headless mode.
    pub fn headless_mode(&self) -> HeadlessMode {
        if self.headless {
            HeadlessMode::New
        } else {
            HeadlessMode::False
        }
    }
}

/// Chromium-based renderer.
pub struct ChromiumRenderer {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl ChromiumRenderer {
    /// Launch a Chromium instance.
    pub async fn launch(options: &ChromiumOptions) -> HarvestResult<Self> {
        let chrome_path = options
            .executable
            .clone()
            .or_else(find_chromium)
            .ok_or_else(|| {
                HarvestError::Browser(
                    "Chromium not found. Set TENDER_HARVEST_CHROMIUM_PATH or install Chrome."
                        .to_string(),
                )
            })?;

        tracing::debug!("Launching Chromium from {}", chrome_path.display());

        let config = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .window_size(options.window_width, options.window_height)
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-notifications")
            .arg("--disable-popup-blocking")
            .arg("--disable-extensions")
            .headless_mode(options.headless_mode())
            .build()
            .map_err(|e| HarvestError::Browser(format!("failed to build browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| HarvestError::Browser(format!("failed to launch Chromium: {e}")))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!("CDP handler event error: {e}");
                }
            }
        });

        Ok(Self { browser, handler })
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_page(&mut self) -> HarvestResult<Box<dyn PageHandle>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| HarvestError::Browser(format!("failed to create new page: {e}")))?;
        Ok(Box::new(ChromiumPage { page }))
    }

    async fn shutdown(&mut self) -> HarvestResult<()> {
        let closed = self.browser.close().await;
        let _ = self.browser.wait().await;
        self.handler.abort();
        closed
            .map(|_| ())
            .map_err(|e| HarvestError::Browser(format!("failed to close Chromium: {e}")))
    }
}

/// A single Chromium page.
pub struct ChromiumPage {
    page: Page,
}

impl ChromiumPage {
    async fn eval_bool(&self, js: &str) -> HarvestResult<bool> {
        let value = self
            .page
            .evaluate(js)
            .await
            .map_err(|e| HarvestError::Script(e.to_string()))?
            .into_value::<serde_json::Value>()
            .map_err(|e| HarvestError::Script(format!("failed to convert JS result: {e}")))?;
        Ok(value
            .as_bool()
            .or_else(|| value.get("success").and_then(|v| v.as_bool()))
            .unwrap_or(false))
    }
}

#[async_trait]
impl PageHandle for ChromiumPage {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> HarvestResult<()> {
        let start = Instant::now();
        let result = tokio::time::timeout(timeout, async {
            self.page.goto(url).await?;
            self.page.wait_for_navigation().await?;
            Ok::<_, chromiumoxide::error::CdpError>(())
        })
        .await;

        match result {
            Ok(Ok(())) => {
                tracing::debug!("Loaded {url} in {}ms", start.elapsed().as_millis());
                Ok(())
            }
            Ok(Err(e)) => Err(HarvestError::Navigation(format!("{url}: {e}"))),
            Err(_) => Err(HarvestError::NavigationTimeout {
                url: url.to_string(),
                timeout,
            }),
        }
    }

    async fn query(&mut self, selector: &str) -> HarvestResult<Vec<DomElement>> {
        let value = self.evaluate(&script::query_elements(selector)).await?;
        if let Some(err) = value.get("error").and_then(|e| e.as_str()) {
            return Err(HarvestError::Script(format!("query {selector}: {err}")));
        }
        Ok(serde_json::from_value(value)?)
    }

    async fn evaluate(&mut self, js: &str) -> HarvestResult<serde_json::Value> {
        let result = self
            .page
            .evaluate(js)
            .await
            .map_err(|e| HarvestError::Script(e.to_string()))?;
        result
            .into_value()
            .map_err(|e| HarvestError::Script(format!("failed to convert JS result: {e}")))
    }

    async fn click(&mut self, selector: &str) -> HarvestResult<()> {
        let native = match self.page.find_element(selector).await {
            Ok(element) => element.click().await.map(|_| ()).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        if let Err(reason) = native {
            tracing::debug!("Native click on {selector} failed ({reason}), using DOM click");
            if !self.eval_bool(&script::dom_click(selector)).await? {
                return Err(HarvestError::Click {
                    selector: selector.to_string(),
                    reason,
                });
            }
        }
        Ok(())
    }

    async fn type_text(&mut self, selector: &str, text: &str) -> HarvestResult<()> {
        let input_error = |reason: String| HarvestError::Input {
            selector: selector.to_string(),
            reason,
        };
        if !self.eval_bool(&script::clear_value(selector)).await? {
            return Err(HarvestError::ElementNotFound(selector.to_string()));
        }
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|e| input_error(e.to_string()))?;
        element
            .click()
            .await
            .map_err(|e| input_error(e.to_string()))?
            .type_str(text)
            .await
            .map_err(|e| input_error(e.to_string()))?;
        Ok(())
    }

    async fn press_key(&mut self, selector: &str, key: &str) -> HarvestResult<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| HarvestError::ElementNotFound(selector.to_string()))?;
        element.press_key(key).await.map_err(|e| HarvestError::Input {
            selector: selector.to_string(),
            reason: e.to_string(),
        })?;
        Ok(())
    }

    async fn wait_for(&mut self, condition: &WaitCondition, timeout: Duration) -> HarvestResult<()> {
        let js = match condition {
            WaitCondition::AnySelectorVisible(selectors) => script::any_selector_visible(selectors),
            WaitCondition::TextContainsAny(phrases) => script::text_contains_any(phrases),
        };
        let deadline = Instant::now() + timeout;
        loop {
            // The execution context may be torn down mid-navigation; keep polling.
            match self.eval_bool(&js).await {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(e) => tracing::trace!("wait_for poll failed: {e}"),
            }
            if Instant::now() >= deadline {
                return Err(HarvestError::WaitTimeout {
                    what: condition.describe(),
                    timeout,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn page_text(&mut self) -> HarvestResult<String> {
        let value = self.evaluate(script::PAGE_TEXT).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn screenshot(&mut self) -> HarvestResult<Vec<u8>> {
        self.page
            .screenshot(ScreenshotParams::builder().full_page(true).build())
            .await
            .map_err(|e| HarvestError::Browser(format!("screenshot failed: {e}")))
    }

    async fn content_html(&mut self) -> HarvestResult<String> {
        match self.page.content().await {
            Ok(html) => Ok(html),
            Err(_) => {
                let value = self.evaluate(script::OUTER_HTML).await?;
                Ok(value.as_str().unwrap_or_default().to_string())
            }
        }
    }

    async fn close(self: Box<Self>) -> HarvestResult<()> {
        self.page
            .close()
            .await
            .map_err(|e| HarvestError::Browser(format!("failed to close page: {e}")))
    }
}
