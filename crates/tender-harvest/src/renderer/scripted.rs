//! In-memory page driven by pre-built scenes.
//!
//! `ScriptedPage` implements [`PageHandle`] without a browser so the locator,
//! navigation and orchestration layers can be exercised deterministically.
//! A scene is a flat list of elements plus the page text. Elements match
//! queries by exact selector string; clicks apply scripted effects; typing a
//! query and pressing Enter, or navigating to a URL carrying the query
//! parameter, switches to the results scene registered for that query.
//! Settling delays and waits return immediately.

use super::{PageHandle, Renderer, WaitCondition};
use crate::error::{HarvestError, HarvestResult};
use crate::types::{DomElement, Rect};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

static NEXT_REF: AtomicUsize = AtomicUsize::new(1);

/// What happens when a scripted element is clicked.
#[derive(Debug, Clone)]
pub enum ClickEffect {
    /// Append a line to the page text.
    AppendText(String),
    /// Add elements to the current scene.
    Reveal(Vec<FakeElement>),
    /// The click itself fails.
    Fail,
}

/// One element of a scene.
#[derive(Debug, Clone)]
pub struct FakeElement {
    pub element: DomElement,
    selectors: Vec<String>,
    effects: Vec<ClickEffect>,
}

impl FakeElement {
    /// A visible element with a fresh handle.
    pub fn new(tag: &str, text: &str) -> Self {
        let n = NEXT_REF.fetch_add(1, Ordering::Relaxed);
        Self {
            element: DomElement {
                handle: Some(format!("[data-harvest-ref=\"fake-{n}\"]")),
                tag: tag.to_string(),
                text: text.to_string(),
                bounding_box: Some(Rect {
                    x: 0.0,
                    y: 0.0,
                    width: 120.0,
                    height: 24.0,
                }),
                ..Default::default()
            },
            selectors: Vec::new(),
            effects: Vec::new(),
        }
    }

    /// Selectors this element is returned for.
    pub fn matching<S: AsRef<str>>(mut self, selectors: &[S]) -> Self {
        self.selectors
            .extend(selectors.iter().map(|s| s.as_ref().to_string()));
        self
    }

    pub fn hidden(mut self) -> Self {
        self.element.bounding_box = None;
        self
    }

    pub fn id(mut self, id: &str) -> Self {
        self.element.id = id.to_string();
        self
    }

    pub fn class(mut self, class: &str) -> Self {
        self.element.class_name = class.to_string();
        self
    }

    pub fn placeholder(mut self, placeholder: &str) -> Self {
        self.element.placeholder = placeholder.to_string();
        self
    }

    pub fn parent_text(mut self, text: &str) -> Self {
        self.element.parent_text = text.to_string();
        self
    }

    pub fn on_click(mut self, effect: ClickEffect) -> Self {
        self.effects.push(effect);
        self
    }

    fn handle(&self) -> &str {
        self.element.handle.as_deref().unwrap_or_default()
    }

    fn addressed_by(&self, selector: &str) -> bool {
        self.handle() == selector || self.selectors.iter().any(|s| s == selector)
    }
}

/// A page state: elements plus visible text.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub text: String,
    pub elements: Vec<FakeElement>,
}

impl Scene {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            elements: Vec::new(),
        }
    }

    pub fn with(mut self, element: FakeElement) -> Self {
        self.elements.push(element);
        self
    }
}

/// Scenes for a whole portal.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSite {
    /// Scene shown after navigating to any URL without a query.
    pub home: Scene,
    /// Scene shown after searching for a given query.
    pub results: HashMap<String, Scene>,
    /// Scene for queries without an entry in `results`.
    pub default_results: Scene,
    /// URL parameter that carries a direct query.
    pub query_param: String,
    /// Number of upcoming navigations that time out.
    pub failing_navigations: usize,
    /// Every navigation fails with this browser error.
    pub crashed: Option<String>,
}

impl ScriptedSite {
    pub fn new(home: Scene) -> Self {
        Self {
            home,
            query_param: "query".to_string(),
            ..Default::default()
        }
    }

    pub fn results_for(mut self, query: &str, scene: Scene) -> Self {
        self.results.insert(query.to_string(), scene);
        self
    }

    pub fn default_results(mut self, scene: Scene) -> Self {
        self.default_results = scene;
        self
    }

    pub fn failing_navigations(mut self, count: usize) -> Self {
        self.failing_navigations = count;
        self
    }

    pub fn crashed(mut self, reason: &str) -> Self {
        self.crashed = Some(reason.to_string());
        self
    }

    fn scene_for(&self, query: &str) -> Scene {
        self.results
            .get(query)
            .cloned()
            .unwrap_or_else(|| self.default_results.clone())
    }
}

#[derive(Debug, Default)]
struct PageState {
    site: ScriptedSite,
    current: Scene,
    typed: HashMap<String, String>,
    navigations: Vec<String>,
    searches: Vec<String>,
    clicks: Vec<String>,
    settled: Duration,
    closed: bool,
}

/// In-memory [`PageHandle`]. Clones share state, so a test can keep one
/// clone for inspection while the pipeline owns another.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPage {
    state: Arc<Mutex<PageState>>,
}

impl ScriptedPage {
    /// A page that starts on `site.home`.
    pub fn new(site: ScriptedSite) -> Self {
        let current = site.home.clone();
        Self {
            state: Arc::new(Mutex::new(PageState {
                site,
                current,
                ..Default::default()
            })),
        }
    }

    /// A page showing a single scene; navigation returns to it.
    pub fn with_scene(scene: Scene) -> Self {
        Self::new(ScriptedSite::new(scene))
    }

    fn state(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state().navigations.clone()
    }

    /// Queries submitted through the search field or the query URL.
    pub fn searches(&self) -> Vec<String> {
        self.state().searches.clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.state().clicks.clone()
    }

    /// Total settling time requested.
    pub fn settled(&self) -> Duration {
        self.state().settled
    }

    pub fn is_closed(&self) -> bool {
        self.state().closed
    }
}

#[async_trait]
impl PageHandle for ScriptedPage {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> HarvestResult<()> {
        let mut state = self.state();
        state.navigations.push(url.to_string());
        if let Some(reason) = &state.site.crashed {
            return Err(HarvestError::Browser(reason.clone()));
        }
        if state.site.failing_navigations > 0 {
            state.site.failing_navigations -= 1;
            return Err(HarvestError::NavigationTimeout {
                url: url.to_string(),
                timeout,
            });
        }
        let query = url::Url::parse(url).ok().and_then(|u| {
            u.query_pairs()
                .find(|(k, _)| k == state.site.query_param.as_str())
                .map(|(_, v)| v.into_owned())
        });
        let next = match query {
            Some(q) => {
                state.searches.push(q.clone());
                state.site.scene_for(&q)
            }
            None => state.site.home.clone(),
        };
        state.current = next;
        Ok(())
    }

    async fn query(&mut self, selector: &str) -> HarvestResult<Vec<DomElement>> {
        Ok(self
            .state()
            .current
            .elements
            .iter()
            .filter(|e| e.selectors.iter().any(|s| s == selector))
            .map(|e| e.element.clone())
            .collect())
    }

    async fn evaluate(&mut self, script: &str) -> HarvestResult<serde_json::Value> {
        Err(HarvestError::Script(format!(
            "scripted page cannot evaluate: {}",
            script.chars().take(40).collect::<String>()
        )))
    }

    async fn click(&mut self, selector: &str) -> HarvestResult<()> {
        let mut state = self.state();
        let Some(target) = state
            .current
            .elements
            .iter()
            .find(|e| e.addressed_by(selector))
            .cloned()
        else {
            return Err(HarvestError::ElementNotFound(selector.to_string()));
        };
        if !target.element.is_visible() {
            return Err(HarvestError::Click {
                selector: selector.to_string(),
                reason: "element is not visible".to_string(),
            });
        }
        state.clicks.push(selector.to_string());
        for effect in &target.effects {
            match effect {
                ClickEffect::AppendText(text) => {
                    state.current.text.push('\n');
                    state.current.text.push_str(text);
                }
                ClickEffect::Reveal(elements) => {
                    state.current.elements.extend(elements.iter().cloned());
                }
                ClickEffect::Fail => {
                    return Err(HarvestError::Click {
                        selector: selector.to_string(),
                        reason: "scripted failure".to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    async fn type_text(&mut self, selector: &str, text: &str) -> HarvestResult<()> {
        let mut state = self.state();
        if !state.current.elements.iter().any(|e| e.addressed_by(selector)) {
            return Err(HarvestError::ElementNotFound(selector.to_string()));
        }
        state.typed.insert(selector.to_string(), text.to_string());
        Ok(())
    }

    async fn press_key(&mut self, selector: &str, key: &str) -> HarvestResult<()> {
        let mut state = self.state();
        if key == "Enter" {
            if let Some(query) = state.typed.get(selector).cloned() {
                state.searches.push(query.clone());
                let next = state.site.scene_for(&query);
                state.current = next;
            }
        }
        Ok(())
    }

    async fn wait_for(&mut self, condition: &WaitCondition, timeout: Duration) -> HarvestResult<()> {
        let state = self.state();
        let holds = match condition {
            WaitCondition::AnySelectorVisible(selectors) => state.current.elements.iter().any(|e| {
                e.element.is_visible() && selectors.iter().any(|s| e.selectors.contains(s))
            }),
            WaitCondition::TextContainsAny(phrases) => {
                let text = state.current.text.to_lowercase();
                phrases.iter().any(|p| text.contains(&p.to_lowercase()))
            }
        };
        if holds {
            Ok(())
        } else {
            Err(HarvestError::WaitTimeout {
                what: condition.describe(),
                timeout,
            })
        }
    }

    async fn page_text(&mut self) -> HarvestResult<String> {
        Ok(self.state().current.text.clone())
    }

    async fn screenshot(&mut self) -> HarvestResult<Vec<u8>> {
        Ok(b"\x89PNG\r\n\x1a\n".to_vec())
    }

    async fn content_html(&mut self) -> HarvestResult<String> {
        let state = self.state();
        let body = state
            .current
            .elements
            .iter()
            .map(|e| format!("<{0}>{1}</{0}>", e.element.tag, e.element.text))
            .collect::<String>();
        Ok(format!("<html><body>{body}<pre>{}</pre></body></html>", state.current.text))
    }

    async fn settle(&mut self, delay: Duration) {
        self.state().settled += delay;
    }

    async fn close(self: Box<Self>) -> HarvestResult<()> {
        self.state().closed = true;
        Ok(())
    }
}

/// Renderer handing out clones of one scripted page.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRenderer {
    page: ScriptedPage,
    shutdowns: Arc<AtomicUsize>,
}

impl ScriptedRenderer {
    pub fn new(page: ScriptedPage) -> Self {
        Self {
            page,
            shutdowns: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn shutdown_count(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Renderer for ScriptedRenderer {
    async fn new_page(&mut self) -> HarvestResult<Box<dyn PageHandle>> {
        Ok(Box::new(self.page.clone()))
    }

    async fn shutdown(&mut self) -> HarvestResult<()> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
