//! Per-location navigation state machine.
//!
//! One attempt walks `Idle → Searching → ResultSelected → TabActivated →
//! Extracted → Done`. Any error aborts the attempt as `Failed`.
//! [`Navigator::process_location`] owns the retry loop around attempts.

use crate::config::HarvestConfig;
use crate::debug::DebugRecorder;
use crate::error::{HarvestError, HarvestResult};
use crate::extraction::ExtractionAggregator;
use crate::locator::{LocatorChain, TargetConcept};
use crate::renderer::{PageHandle, WaitCondition};
use crate::types::{
    DomElement, ExtractionResult, LocationRecord, OutcomeStatus, ProcessingOutcome,
    TenderResult, AWARD_DATE_COLUMN,
};
use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

/// Terminal result of one successful attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Extracted(TenderResult),
    /// The search produced no (matching) result.
    NoSearchResults,
    /// The selected site has no tender-results section.
    NoResultsTab,
}

/// States of one attempt.
#[derive(Debug)]
pub enum NavState {
    Idle,
    Searching,
    ResultSelected,
    TabActivated,
    Extracted(ExtractionResult),
    Done(AttemptOutcome),
    Failed(HarvestError),
}

impl NavState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Searching => "searching",
            Self::ResultSelected => "result_selected",
            Self::TabActivated => "tab_activated",
            Self::Extracted(_) => "extracted",
            Self::Done(_) => "done",
            Self::Failed(_) => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done(_) | Self::Failed(_))
    }
}

/// Drives attempts for one location at a time.
pub struct Navigator {
    config: HarvestConfig,
    locator: LocatorChain,
    extractor: ExtractionAggregator,
    debug: DebugRecorder,
}

impl Navigator {
    pub fn new(config: HarvestConfig) -> Self {
        let locator = LocatorChain::standard(config.click_settle(), config.element_timeout());
        let debug = if config.debug {
            DebugRecorder::new(config.debug_dir.clone())
        } else {
            DebugRecorder::disabled()
        };
        Self {
            config,
            locator,
            extractor: ExtractionAggregator::standard(),
            debug,
        }
    }

    pub fn with_debug(mut self, debug: DebugRecorder) -> Self {
        self.debug = debug;
        self
    }

    /// Process one location with bounded retries.
    ///
    /// Every error raised inside an attempt ends in a `Failed` outcome; it
    /// never reaches the caller. Transient failures are retried after a
    /// cool-down, anything else gives up on the location at once.
    pub async fn process_location(
        &self,
        page: &mut dyn PageHandle,
        record: &LocationRecord,
    ) -> ProcessingOutcome {
        let attempts = self.config.attempts();
        let mut last_error = String::new();
        let mut made = 0;

        for attempt in 1..=attempts {
            made = attempt;
            tracing::info!(
                "[{}] {} (attempt {attempt}/{attempts})",
                record.index,
                record.location
            );
            match self.attempt(page, record).await {
                Ok(outcome) => {
                    self.dismiss_popup(page).await;
                    return self.finish(record, outcome, attempt);
                }
                Err(e) => {
                    tracing::warn!(
                        "[{}] attempt {attempt}/{attempts} for {} failed: {e}",
                        record.index,
                        record.location
                    );
                    last_error = e.to_string();
                    self.dismiss_popup(page).await;
                    if !e.is_transient() {
                        break;
                    }
                    if attempt < attempts {
                        page.settle(self.config.retry_cooldown()).await;
                    }
                }
            }
        }

        tracing::error!(
            "[{}] {} failed after {made} attempt(s): {last_error}",
            record.index,
            record.location
        );
        ProcessingOutcome {
            location: record.location.clone(),
            status: OutcomeStatus::Failed { reason: last_error },
            successful_tenderer: None,
            other_tenderers: Vec::new(),
            attempts: made,
        }
    }

    fn finish(
        &self,
        record: &LocationRecord,
        outcome: AttemptOutcome,
        attempts: u32,
    ) -> ProcessingOutcome {
        let (status, result) = match outcome {
            AttemptOutcome::Extracted(result) => (OutcomeStatus::Success, result),
            AttemptOutcome::NoSearchResults => {
                tracing::info!("[{}] no search results for {}", record.index, record.location);
                (OutcomeStatus::NoResultsTab, TenderResult::default())
            }
            AttemptOutcome::NoResultsTab => {
                tracing::info!("[{}] no tender results for {}", record.index, record.location);
                (OutcomeStatus::NoResultsTab, TenderResult::default())
            }
        };
        ProcessingOutcome {
            location: record.location.clone(),
            status,
            successful_tenderer: result.successful,
            other_tenderers: result.others,
            attempts,
        }
    }

    /// Run one attempt from `Idle` to a terminal state.
    pub async fn attempt(
        &self,
        page: &mut dyn PageHandle,
        record: &LocationRecord,
    ) -> HarvestResult<AttemptOutcome> {
        let mut state = NavState::Idle;
        loop {
            state = match self.transition(state, page, record).await {
                Ok(next) => next,
                Err(e) => NavState::Failed(e),
            };
            tracing::debug!("[{}] -> {}", record.index, state.name());
            self.debug.capture(page, record.index, state.name()).await;

            match state {
                NavState::Done(outcome) => return Ok(outcome),
                NavState::Failed(e) => return Err(e),
                _ => {}
            }
        }
    }

    async fn transition(
        &self,
        state: NavState,
        page: &mut dyn PageHandle,
        record: &LocationRecord,
    ) -> HarvestResult<NavState> {
        Ok(match state {
            NavState::Idle => {
                self.search(page, &record.location).await?;
                NavState::Searching
            }
            NavState::Searching => {
                if self.select_result(page, record).await? {
                    NavState::ResultSelected
                } else {
                    NavState::Done(AttemptOutcome::NoSearchResults)
                }
            }
            NavState::ResultSelected => {
                let concept = TargetConcept::tender_results_tab();
                match self.locator.locate(&concept, page).await? {
                    Some(_) => NavState::TabActivated,
                    None => NavState::Done(AttemptOutcome::NoResultsTab),
                }
            }
            NavState::TabActivated => NavState::Extracted(self.extractor.extract(page).await),
            NavState::Extracted(raw) => {
                tracing::debug!(
                    "[{}] {} raw line(s) via {}",
                    record.index,
                    raw.items.len(),
                    raw.strategy_name
                );
                NavState::Done(AttemptOutcome::Extracted(TenderResult::from_raw_lines(
                    &raw.items,
                    self.config.max_other_tenderers,
                )))
            }
            terminal @ (NavState::Done(_) | NavState::Failed(_)) => terminal,
        })
    }

    /// Load the portal and submit the query, falling back to a direct URL.
    async fn search(&self, page: &mut dyn PageHandle, location: &str) -> HarvestResult<()> {
        page.navigate(&self.config.base_url, self.config.navigation_timeout())
            .await?;
        page.settle(self.config.settle_delay()).await;

        match self.type_query(page, location).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::info!("search input not found, using direct query URL");
                self.navigate_query_url(page, location).await?;
            }
            Err(e) => {
                tracing::info!("search input unusable ({e}), using direct query URL");
                self.navigate_query_url(page, location).await?;
            }
        }
        page.settle(self.config.settle_delay()).await;
        Ok(())
    }

    async fn type_query(&self, page: &mut dyn PageHandle, location: &str) -> HarvestResult<bool> {
        let concept = TargetConcept::search_input();
        let Some(input) = self.locator.locate(&concept, page).await? else {
            return Ok(false);
        };
        let Some(selector) = input.identity_selector else {
            return Ok(false);
        };
        page.type_text(&selector, location).await?;
        page.press_key(&selector, "Enter").await?;
        Ok(true)
    }

    async fn navigate_query_url(&self, page: &mut dyn PageHandle, location: &str) -> HarvestResult<()> {
        let url = query_url(&self.config.base_url, &self.config.search_param, location)?;
        page.navigate(&url, self.config.navigation_timeout()).await
    }

    /// Visible result items from the first selector that has any.
    async fn result_items(&self, page: &mut dyn PageHandle) -> Vec<(String, DomElement)> {
        let selectors = self.config.result_selectors.clone();
        if let Err(e) = page
            .wait_for(
                &WaitCondition::AnySelectorVisible(selectors.clone()),
                self.config.element_timeout(),
            )
            .await
        {
            tracing::debug!("no search results appeared: {e}");
        }

        for selector in &selectors {
            let items: Vec<(String, DomElement)> = match page.query(selector).await {
                Ok(elements) => elements
                    .into_iter()
                    .filter(DomElement::is_visible)
                    .map(|el| (el.handle.clone().unwrap_or_else(|| selector.clone()), el))
                    .collect(),
                Err(e) => {
                    tracing::debug!("result selector {selector} failed: {e}");
                    continue;
                }
            };
            if !items.is_empty() {
                tracing::info!("{} search result(s) via {selector}", items.len());
                return items;
            }
        }
        Vec::new()
    }

    /// Click the search result for `record`; `false` when there is none.
    async fn select_result(
        &self,
        page: &mut dyn PageHandle,
        record: &LocationRecord,
    ) -> HarvestResult<bool> {
        let items = self.result_items(page).await;
        if items.is_empty() {
            return Ok(false);
        }

        let expected = if self.config.verify_award_date {
            record.field(AWARD_DATE_COLUMN).and_then(parse_date_cell)
        } else {
            None
        };
        let Some(expected) = expected else {
            let (selector, _) = &items[0];
            page.click(selector).await?;
            page.settle(self.config.click_settle()).await;
            return Ok(true);
        };

        for (i, (selector, item)) in items.iter().enumerate() {
            tracing::info!("checking result {}/{}: {}", i + 1, items.len(), item.text.trim());
            if let Err(e) = page.click(selector).await {
                tracing::warn!("result {} not clickable: {e}", i + 1);
                continue;
            }
            page.settle(self.config.click_settle()).await;

            let details = self.detail_text(page).await?;
            let found = award_dates_in(&details);
            if found.contains(&expected) {
                tracing::info!("result {} matches award date {expected}", i + 1);
                return Ok(true);
            }
            tracing::info!("result {} award date {found:?} != {expected}", i + 1);
            self.dismiss_popup(page).await;
        }
        tracing::warn!(
            "no result for {} has award date {expected}",
            record.location
        );
        Ok(false)
    }

    /// Text of the detail popup, or the whole page when no popup is found.
    async fn detail_text(&self, page: &mut dyn PageHandle) -> HarvestResult<String> {
        let mut parts = Vec::new();
        for selector in &self.config.detail_selectors {
            if let Ok(elements) = page.query(selector).await {
                parts.extend(
                    elements
                        .into_iter()
                        .filter(DomElement::is_visible)
                        .map(|el| el.text),
                );
            }
        }
        if parts.is_empty() {
            page.page_text().await
        } else {
            Ok(parts.join("\n"))
        }
    }

    /// Best-effort close of the site-detail popup.
    pub async fn dismiss_popup(&self, page: &mut dyn PageHandle) {
        for selector in &self.config.close_selectors {
            let Ok(elements) = page.query(selector).await else {
                continue;
            };
            let Some(target) = elements.into_iter().find(DomElement::is_visible) else {
                continue;
            };
            let handle = target.handle.unwrap_or_else(|| selector.clone());
            match page.click(&handle).await {
                Ok(()) => {
                    page.settle(self.config.click_settle()).await;
                    return;
                }
                Err(e) => tracing::debug!("closing popup via {selector} failed: {e}"),
            }
        }
        if let Err(e) = page.press_key("body", "Escape").await {
            tracing::debug!("escape to close popup failed: {e}");
        }
    }
}

/// The base URL with `param=location` appended, URL-encoded.
pub fn query_url(base_url: &str, param: &str, location: &str) -> HarvestResult<String> {
    let mut url = url::Url::parse(base_url)?;
    url.query_pairs_mut().append_pair(param, location);
    Ok(url.to_string())
}

fn award_label_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)DATE\s+OF\s+AWARD[^\d]*(\d{1,2})[-\s]+([A-Za-z]+)[-\s]+(\d{4})")
            .expect("award label date regex is valid")
    })
}

fn long_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(\d{1,2})[-\s]+([A-Za-z]+)[-\s]+(\d{4})\b").expect("long date regex is valid")
    })
}

fn short_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(\d{1,2})-([A-Za-z]{3})-(\d{2})\b").expect("short date regex is valid")
    })
}

fn date_from_parts(day: &str, month: &str, year: &str) -> Option<NaiveDate> {
    let year = if year.len() == 2 {
        format!("20{year}")
    } else {
        year.to_string()
    };
    // %B also accepts the three-letter abbreviation when parsing.
    NaiveDate::parse_from_str(&format!("{day} {month} {year}"), "%d %B %Y").ok()
}

/// Award dates mentioned in `text`.
///
/// A date labelled `DATE OF AWARD` takes precedence; otherwise every
/// `7 August 2024`, `7 Aug 2024` or `7-Aug-24` style date counts.
pub fn award_dates_in(text: &str) -> Vec<NaiveDate> {
    for re in [award_label_date_re(), long_date_re(), short_date_re()] {
        let dates: Vec<NaiveDate> = re
            .captures_iter(text)
            .filter_map(|c| date_from_parts(&c[1], &c[2], &c[3]))
            .collect();
        if !dates.is_empty() {
            return dates;
        }
    }
    Vec::new()
}

/// Parse a `Date of Award` cell as read from the input dataset.
pub fn parse_date_cell(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    const FORMATS: &[&str] = &["%Y-%m-%d", "%d-%b-%y", "%d-%b-%Y", "%d %B %Y", "%d/%m/%Y"];
    let first_token = raw.split_whitespace().next().unwrap_or(raw);
    FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
        .or_else(|| NaiveDate::parse_from_str(first_token, "%Y-%m-%d").ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::strategies::scoped_selector;
    use crate::renderer::scripted::{ClickEffect, FakeElement, Scene, ScriptedPage, ScriptedSite};
    use std::collections::HashMap;

    const RESULT: &str = "div.search-results-container a";

    fn config() -> HarvestConfig {
        HarvestConfig::default().without_delays()
    }

    fn record(location: &str) -> LocationRecord {
        LocationRecord {
            index: 0,
            location: location.to_string(),
            raw_row: HashMap::new(),
        }
    }

    fn search_box() -> FakeElement {
        FakeElement::new("input", "")
            .placeholder("Search")
            .id("us-s-txt")
            .matching(&[TargetConcept::search_input().text_scope])
    }

    fn tab_with(text: &str) -> FakeElement {
        FakeElement::new("a", "Tender Results")
            .matching(&[TargetConcept::tender_results_tab().text_scope])
            .on_click(ClickEffect::AppendText(text.to_string()))
    }

    fn results_scene(tab_text: &str) -> Scene {
        Scene::new("1 result").with(
            FakeElement::new("a", "Jalan Anak Bukit")
                .matching(&[RESULT])
                .on_click(ClickEffect::Reveal(vec![tab_with(tab_text)])),
        )
    }

    #[test]
    fn test_query_url_encodes_location() {
        let url = query_url(
            "https://eservice.ura.gov.sg/maps/?service=GLSRELEASE",
            "query",
            "Jalan Anak Bukit & Co",
        )
        .unwrap();
        assert_eq!(
            url,
            "https://eservice.ura.gov.sg/maps/?service=GLSRELEASE&query=Jalan+Anak+Bukit+%26+Co"
        );
    }

    #[test]
    fn test_award_dates_in_supported_forms() {
        let expected = NaiveDate::from_ymd_opt(2024, 8, 7).unwrap();
        assert_eq!(award_dates_in("DATE OF AWARD 7 August 2024"), vec![expected]);
        assert_eq!(award_dates_in("Awarded on 7 Aug 2024."), vec![expected]);
        assert_eq!(award_dates_in("7-Aug-24"), vec![expected]);
        assert_eq!(
            award_dates_in("Launched 1 March 2024\nDate of Award: 07 Aug 2024"),
            vec![expected]
        );
        assert!(award_dates_in("Site area 12 ha").is_empty());
    }

    #[test]
    fn test_parse_date_cell_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 8, 7);
        assert_eq!(parse_date_cell("2024-08-07"), expected);
        assert_eq!(parse_date_cell("2024-08-07 00:00:00"), expected);
        assert_eq!(parse_date_cell("7-Aug-24"), expected);
        assert_eq!(parse_date_cell("07/08/2024"), expected);
        assert_eq!(parse_date_cell("soon"), None);
    }

    #[tokio::test]
    async fn test_full_attempt_via_search_box() {
        let site = ScriptedSite::new(Scene::new("Government Land Sales").with(search_box()))
            .results_for(
                "Jalan Anak Bukit",
                results_scene("Successful Tenderer: ABC Pte Ltd\nTenderer: XYZ Pte Ltd"),
            );
        let mut page = ScriptedPage::new(site);
        let navigator = Navigator::new(config());

        let outcome = navigator
            .process_location(&mut page, &record("Jalan Anak Bukit"))
            .await;

        assert_eq!(outcome.status, OutcomeStatus::Success);
        assert_eq!(outcome.successful_tenderer.as_deref(), Some("ABC Pte. Ltd."));
        assert_eq!(outcome.other_tenderers, vec!["XYZ Pte. Ltd.".to_string()]);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(page.searches(), vec!["Jalan Anak Bukit".to_string()]);
    }

    #[tokio::test]
    async fn test_falls_back_to_query_url_without_search_box() {
        let site = ScriptedSite::new(Scene::new("Government Land Sales"))
            .results_for("Holland Road", results_scene("Successful Tenderer: Q Ltd"));
        let mut page = ScriptedPage::new(site);

        let outcome = Navigator::new(config())
            .process_location(&mut page, &record("Holland Road"))
            .await;

        assert_eq!(outcome.successful_tenderer.as_deref(), Some("Q Ltd."));
        assert!(page.navigations()[1].ends_with("&query=Holland+Road"));
    }

    #[tokio::test]
    async fn test_no_search_results_is_success_without_retry() {
        let site = ScriptedSite::new(Scene::new("home").with(search_box()));
        let mut page = ScriptedPage::new(site);

        let outcome = Navigator::new(config())
            .process_location(&mut page, &record("Nowhere"))
            .await;

        assert_eq!(outcome.status, OutcomeStatus::NoResultsTab);
        assert_eq!(outcome.status_label(), "Success");
        assert!(outcome.other_tenderers.is_empty());
        assert_eq!(page.searches().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_tab_is_no_results_tab() {
        let scene = Scene::new("1 result").with(FakeElement::new("a", "Site").matching(&[RESULT]));
        let site = ScriptedSite::new(Scene::new("home").with(search_box())).default_results(scene);
        let mut page = ScriptedPage::new(site);

        let outcome = Navigator::new(config())
            .process_location(&mut page, &record("Site"))
            .await;
        assert_eq!(outcome.status, OutcomeStatus::NoResultsTab);
    }

    #[tokio::test]
    async fn test_transient_failures_exhaust_retries() {
        let site = ScriptedSite::new(Scene::new("home")).failing_navigations(usize::MAX);
        let mut page = ScriptedPage::new(site);
        let navigator = Navigator::new(HarvestConfig {
            retries: 3,
            retry_cooldown_ms: 5_000,
            ..config()
        });

        let outcome = navigator
            .process_location(&mut page, &record("Anywhere"))
            .await;

        assert!(outcome.is_failed());
        assert_eq!(outcome.status_label(), "Failed after 3 attempts");
        assert_eq!(page.navigations().len(), 3);
        // Cool-down only between attempts.
        assert_eq!(page.settled(), std::time::Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_award_date_picks_matching_result() {
        let detail = |date: &str| {
            ClickEffect::Reveal(vec![
                FakeElement::new("div", &format!("DATE OF AWARD {date}")).matching(&[".popup-content"]),
                tab_with("Successful Tenderer: Matched Pte Ltd"),
            ])
        };
        let results = Scene::new("2 results")
            .with(FakeElement::new("a", "Old parcel").matching(&[RESULT]).on_click(detail("1 March 2019")))
            .with(FakeElement::new("a", "New parcel").matching(&[RESULT]).on_click(detail("7 August 2024")));
        let site = ScriptedSite::new(Scene::new("home").with(search_box())).default_results(results);
        let mut page = ScriptedPage::new(site);

        let mut row = record("Parcel");
        row.raw_row.insert(AWARD_DATE_COLUMN.to_string(), "7-Aug-24".to_string());
        let navigator = Navigator::new(HarvestConfig {
            verify_award_date: true,
            ..config()
        });

        let outcome = navigator.process_location(&mut page, &row)
            .await;
        assert_eq!(outcome.successful_tenderer.as_deref(), Some("Matched Pte. Ltd."));
        assert!(page.clicks().len() >= 3);
    }

    #[tokio::test]
    async fn test_award_date_without_match_is_no_search_results() {
        let results = Scene::new("1 result").with(
            FakeElement::new("a", "Old parcel")
                .matching(&[RESULT])
                .on_click(ClickEffect::AppendText("DATE OF AWARD 1 March 2019".into())),
        );
        let site = ScriptedSite::new(Scene::new("home").with(search_box())).default_results(results);
        let mut page = ScriptedPage::new(site);

        let mut row = record("Parcel");
        row.raw_row.insert(AWARD_DATE_COLUMN.to_string(), "2024-08-07".to_string());
        let navigator = Navigator::new(HarvestConfig {
            verify_award_date: true,
            ..config()
        });

        let outcome = navigator.process_location(&mut page, &row)
            .await;
        assert_eq!(outcome.status, OutcomeStatus::NoResultsTab);
    }

    #[tokio::test]
    async fn test_dismiss_popup_clicks_visible_close_button() {
        let scene = Scene::new("popup").with(FakeElement::new("button", "x").matching(&["button.close"]));
        let mut page = ScriptedPage::with_scene(scene);
        Navigator::new(config()).dismiss_popup(&mut page).await;
        assert_eq!(page.clicks().len(), 1);
    }

    #[tokio::test]
    async fn test_structural_tab_is_used_when_labels_change() {
        let tabs = scoped_selector("[role='tablist']", &TargetConcept::tender_results_tab().clickable);
        let results = Scene::new("1 result").with(
            FakeElement::new("a", "Site").matching(&[RESULT]).on_click(ClickEffect::Reveal(vec![
                FakeElement::new("a", "Outcome")
                    .matching(&[&tabs])
                    .on_click(ClickEffect::AppendText("Name of Tenderer\nLion Pte Ltd".into())),
            ])),
        );
        let site = ScriptedSite::new(Scene::new("home").with(search_box())).default_results(results);
        let mut page = ScriptedPage::new(site);

        let outcome = Navigator::new(config())
            .process_location(&mut page, &record("Site"))
            .await;
        assert_eq!(outcome.status, OutcomeStatus::Success);
        assert_eq!(outcome.other_tenderers, vec!["Lion Pte. Ltd.".to_string()]);
    }

    #[tokio::test]
    async fn test_award_date_in_popup_does_not_count_as_results_tab() {
        let tabs = scoped_selector("[role='tablist']", &TargetConcept::tender_results_tab().clickable);
        let results = Scene::new("1 result").with(
            FakeElement::new("a", "Site")
                .matching(&[RESULT])
                .on_click(ClickEffect::AppendText("Date of Award: 7 Aug 2024".into()))
                .on_click(ClickEffect::Reveal(vec![
                    FakeElement::new("a", "Overview").matching(&[&tabs])
                ])),
        );
        let site = ScriptedSite::new(Scene::new("home").with(search_box())).default_results(results);
        let mut page = ScriptedPage::new(site);

        let outcome = Navigator::new(config())
            .process_location(&mut page, &record("Site"))
            .await;

        assert_eq!(outcome.status, OutcomeStatus::NoResultsTab);
        assert!(outcome.successful_tenderer.is_none());
    }

    #[tokio::test]
    async fn test_browser_fault_fails_location_without_retry() {
        let site = ScriptedSite::new(Scene::new("home")).crashed("target crashed");
        let mut page = ScriptedPage::new(site);
        let navigator = Navigator::new(HarvestConfig {
            retries: 3,
            ..config()
        });

        let outcome = navigator.process_location(&mut page, &record("Anywhere")).await;

        assert_eq!(
            outcome.status,
            OutcomeStatus::Failed {
                reason: "Browser error: target crashed".to_string()
            }
        );
        assert_eq!(outcome.status_label(), "Failed after 1 attempts");
        assert_eq!(page.navigations().len(), 1);
    }
}
