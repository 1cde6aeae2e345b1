//! Layered element location for pages whose markup is unstable.
//!
//! A [`TargetConcept`] describes what we are looking for in semantic terms
//! (labels, attribute keywords, container roles). The [`LocatorChain`] tries
//! an ordered list of [`LocatorStrategy`] tiers, clicks each candidate and
//! keeps the first one whose concept-specific verification succeeds.

pub mod strategies;

use crate::error::HarvestResult;
use crate::renderer::{PageHandle, WaitCondition};
use crate::types::{LocatorCandidate, LocatorTier};
use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;

pub use strategies::{
    AttributeHeuristicStrategy, ExactTextStrategy, PartialTextStrategy, StructuralFallbackStrategy,
};

/// Default cap on candidates tried per tier.
pub const DEFAULT_MAX_CANDIDATES_PER_TIER: usize = 12;

/// How to confirm that clicking a candidate reached the intended target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// A successful click is enough.
    Clicked,
    /// The click must make one of these phrases appear in the page text.
    /// Phrases already showing before the click do not count.
    PageTextGainsAny(Vec<String>),
}

/// A semantic target on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetConcept {
    pub name: String,
    /// Visible labels, matched exactly then as substrings.
    pub labels: Vec<String>,
    /// Elements considered by the text tiers.
    pub text_scope: String,
    /// Lowercase keywords looked for in id/class/name attributes.
    pub attribute_keywords: Vec<String>,
    /// Elements considered by the attribute tier.
    pub attribute_scope: String,
    /// Containers scanned by the structural tier, in priority order.
    pub containers: Vec<String>,
    /// Clickable descendants of a container.
    pub clickable: String,
    pub verification: Verification,
}

impl TargetConcept {
    /// The portal's free-text search field.
    pub fn search_input() -> Self {
        Self {
            name: "search-input".to_string(),
            labels: vec![
                "Search".to_string(),
                "Search address".to_string(),
                "Search for a location".to_string(),
                "Enter location".to_string(),
            ],
            text_scope: "input[type='text'], input[type='search'], input:not([type]), textarea"
                .to_string(),
            attribute_keywords: vec![
                "us-s-txt".to_string(),
                "search".to_string(),
                "query".to_string(),
                "keyword".to_string(),
            ],
            attribute_scope: "input, textarea".to_string(),
            containers: vec![
                "form".to_string(),
                "header".to_string(),
                "[role='search']".to_string(),
                "nav".to_string(),
                ".sidebar".to_string(),
            ],
            clickable: "input[type='text'], input[type='search'], input:not([type])".to_string(),
            verification: Verification::Clicked,
        }
    }

    /// The tab or link that reveals tender results for a selected site.
    pub fn tender_results_tab() -> Self {
        Self {
            name: "tender-results-tab".to_string(),
            labels: vec![
                "Tender Results".to_string(),
                "Tender Result".to_string(),
                "Award".to_string(),
                "Results".to_string(),
            ],
            text_scope: "a, button, li, [role='tab'], span, div".to_string(),
            attribute_keywords: vec![
                "tender".to_string(),
                "result".to_string(),
                "award".to_string(),
            ],
            attribute_scope: "a, button, li, [role='tab'], span, div".to_string(),
            containers: vec![
                "[role='tablist']".to_string(),
                ".nav-tabs".to_string(),
                ".tabs".to_string(),
                "ul.nav".to_string(),
                "nav".to_string(),
                ".sidebar".to_string(),
                "aside".to_string(),
            ],
            clickable: "a, button, [role='tab'], li".to_string(),
            verification: Verification::PageTextGainsAny(
                TENDER_RESULT_MARKERS.iter().map(|s| s.to_string()).collect(),
            ),
        }
    }
}

/// Phrases that only appear once a tender-results view is showing.
pub const TENDER_RESULT_MARKERS: &[&str] = &[
    "successful tenderer",
    "name of tenderer",
    "tenderers",
    "tender price",
    "tendered price",
];

/// One tier of the chain.
#[async_trait]
pub trait LocatorStrategy: Send + Sync {
    fn tier(&self) -> LocatorTier;

    /// Propose visible candidates for `concept`, best first.
    async fn try_locate(
        &self,
        concept: &TargetConcept,
        page: &mut dyn PageHandle,
    ) -> HarvestResult<Vec<LocatorCandidate>>;
}

/// Ordered fallback over locator tiers.
pub struct LocatorChain {
    strategies: Vec<Box<dyn LocatorStrategy>>,
    max_candidates_per_tier: usize,
    click_settle: Duration,
    verify_timeout: Duration,
}

impl LocatorChain {
    /// Chain with the four standard tiers: exact, partial, attribute, structural.
    pub fn standard(click_settle: Duration, verify_timeout: Duration) -> Self {
        Self::with_strategies(
            vec![
                Box::new(ExactTextStrategy),
                Box::new(PartialTextStrategy),
                Box::new(AttributeHeuristicStrategy),
                Box::new(StructuralFallbackStrategy),
            ],
            click_settle,
            verify_timeout,
        )
    }

    pub fn with_strategies(
        strategies: Vec<Box<dyn LocatorStrategy>>,
        click_settle: Duration,
        verify_timeout: Duration,
    ) -> Self {
        Self {
            strategies,
            max_candidates_per_tier: DEFAULT_MAX_CANDIDATES_PER_TIER,
            click_settle,
            verify_timeout,
        }
    }

    pub fn max_candidates_per_tier(mut self, max: usize) -> Self {
        self.max_candidates_per_tier = max.max(1);
        self
    }

    /// Find, click and verify `concept`.
    ///
    /// Returns `Ok(None)` when every tier is exhausted; that means the page
    /// does not offer the feature, not that something broke. Query failures
    /// inside a tier only skip that tier.
    pub async fn locate(
        &self,
        concept: &TargetConcept,
        page: &mut dyn PageHandle,
    ) -> HarvestResult<Option<LocatorCandidate>> {
        let mut tried: HashSet<String> = HashSet::new();

        for strategy in &self.strategies {
            let tier = strategy.tier();
            let candidates = match strategy.try_locate(concept, page).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    tracing::debug!("{}: tier {} failed: {e}", concept.name, tier.as_str());
                    continue;
                }
            };
            tracing::debug!(
                "{}: tier {} proposed {} candidate(s)",
                concept.name,
                tier.as_str(),
                candidates.len()
            );

            for candidate in candidates
                .into_iter()
                .filter(|c| c.is_visible)
                .take(self.max_candidates_per_tier)
            {
                let Some(selector) = candidate.identity_selector.clone() else {
                    continue;
                };
                if !tried.insert(selector.clone()) {
                    continue;
                }
                let Some(expected) = self.expected_change(concept, page).await else {
                    tracing::debug!("{}: every marker already showing", concept.name);
                    return Ok(None);
                };
                if let Err(e) = page.click(&selector).await {
                    tracing::debug!("{}: click on {selector} failed: {e}", concept.name);
                    continue;
                }
                page.settle(self.click_settle).await;

                if self.verify(&expected, page).await {
                    tracing::info!(
                        "{}: located <{}> \"{}\" via {}",
                        concept.name,
                        candidate.element_tag,
                        candidate.matched_text,
                        tier.as_str()
                    );
                    return Ok(Some(candidate));
                }
                tracing::debug!(
                    "{}: candidate \"{}\" failed verification",
                    concept.name,
                    candidate.matched_text
                );
            }
        }

        tracing::info!("{}: not found after {} tier(s)", concept.name, self.strategies.len());
        Ok(None)
    }

    /// Phrases the next click has to reveal; `None` when nothing is left
    /// that could change.
    async fn expected_change(
        &self,
        concept: &TargetConcept,
        page: &mut dyn PageHandle,
    ) -> Option<Verification> {
        match &concept.verification {
            Verification::Clicked => Some(Verification::Clicked),
            Verification::PageTextGainsAny(phrases) => {
                let before = match page.page_text().await {
                    Ok(text) => text.to_lowercase(),
                    Err(e) => {
                        tracing::debug!("{}: reading page text failed: {e}", concept.name);
                        String::new()
                    }
                };
                let absent: Vec<String> = phrases
                    .iter()
                    .filter(|p| !before.contains(&p.to_lowercase()))
                    .cloned()
                    .collect();
                if absent.is_empty() {
                    None
                } else {
                    Some(Verification::PageTextGainsAny(absent))
                }
            }
        }
    }

    async fn verify(&self, expected: &Verification, page: &mut dyn PageHandle) -> bool {
        match expected {
            Verification::Clicked => true,
            Verification::PageTextGainsAny(phrases) => page
                .wait_for(
                    &WaitCondition::TextContainsAny(phrases.clone()),
                    self.verify_timeout,
                )
                .await
                .is_ok(),
        }
    }
}
