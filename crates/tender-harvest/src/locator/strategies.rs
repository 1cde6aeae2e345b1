//! The four locator tiers, from most to least specific.

use super::{LocatorStrategy, TargetConcept};
use crate::error::HarvestResult;
use crate::renderer::PageHandle;
use crate::types::{DomElement, LocatorCandidate, LocatorTier};
use async_trait::async_trait;

/// Element whose whole label equals one of the concept's labels.
pub struct ExactTextStrategy;

/// Element whose label contains one of the concept's labels.
pub struct PartialTextStrategy;

/// Element whose id, class or name mentions a domain keyword.
pub struct AttributeHeuristicStrategy;

/// Any clickable child of a known container role (tab bar, nav, sidebar).
pub struct StructuralFallbackStrategy;

fn canonical(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

fn visible(elements: Vec<DomElement>) -> Vec<DomElement> {
    elements.into_iter().filter(DomElement::is_visible).collect()
}

/// Apply `container` as an ancestor to every part of a selector list.
///
/// `scoped_selector("nav", "a, button")` is `"nav a, nav button"`.
pub fn scoped_selector(container: &str, clickable: &str) -> String {
    clickable
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| format!("{container} {part}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[async_trait]
impl LocatorStrategy for ExactTextStrategy {
    fn tier(&self) -> LocatorTier {
        LocatorTier::ExactText
    }

    async fn try_locate(
        &self,
        concept: &TargetConcept,
        page: &mut dyn PageHandle,
    ) -> HarvestResult<Vec<LocatorCandidate>> {
        let elements = visible(page.query(&concept.text_scope).await?);
        let mut found = Vec::new();
        for label in &concept.labels {
            let wanted = canonical(label);
            found.extend(
                elements
                    .iter()
                    .filter(|el| canonical(el.label_text()) == wanted)
                    .map(|el| LocatorCandidate::from_element(el, self.tier())),
            );
        }
        Ok(found)
    }
}

#[async_trait]
impl LocatorStrategy for PartialTextStrategy {
    fn tier(&self) -> LocatorTier {
        LocatorTier::PartialText
    }

    async fn try_locate(
        &self,
        concept: &TargetConcept,
        page: &mut dyn PageHandle,
    ) -> HarvestResult<Vec<LocatorCandidate>> {
        let elements = visible(page.query(&concept.text_scope).await?);
        let mut found = Vec::new();
        for label in &concept.labels {
            let wanted = canonical(label);
            let mut matches: Vec<&DomElement> = elements
                .iter()
                .filter(|el| canonical(el.label_text()).contains(&wanted))
                .collect();
            // Containers repeat their children's text; the tightest match is the control.
            matches.sort_by_key(|el| el.label_text().len());
            found.extend(
                matches
                    .into_iter()
                    .map(|el| LocatorCandidate::from_element(el, self.tier())),
            );
        }
        Ok(found)
    }
}

#[async_trait]
impl LocatorStrategy for AttributeHeuristicStrategy {
    fn tier(&self) -> LocatorTier {
        LocatorTier::AttributeHeuristic
    }

    async fn try_locate(
        &self,
        concept: &TargetConcept,
        page: &mut dyn PageHandle,
    ) -> HarvestResult<Vec<LocatorCandidate>> {
        let elements = visible(page.query(&concept.attribute_scope).await?);
        let mut found = Vec::new();
        for keyword in &concept.attribute_keywords {
            let keyword = keyword.to_lowercase();
            found.extend(
                elements
                    .iter()
                    .filter(|el| {
                        [&el.id, &el.class_name, &el.name]
                            .iter()
                            .any(|attr| attr.to_lowercase().contains(&keyword))
                    })
                    .map(|el| LocatorCandidate::from_element(el, self.tier())),
            );
        }
        Ok(found)
    }
}

#[async_trait]
impl LocatorStrategy for StructuralFallbackStrategy {
    fn tier(&self) -> LocatorTier {
        LocatorTier::StructuralFallback
    }

    async fn try_locate(
        &self,
        concept: &TargetConcept,
        page: &mut dyn PageHandle,
    ) -> HarvestResult<Vec<LocatorCandidate>> {
        let mut found = Vec::new();
        for container in &concept.containers {
            let selector = scoped_selector(container, &concept.clickable);
            let elements = match page.query(&selector).await {
                Ok(elements) => elements,
                Err(e) => {
                    tracing::debug!("structural scan of {container} failed: {e}");
                    continue;
                }
            };
            found.extend(
                visible(elements)
                    .iter()
                    .map(|el| LocatorCandidate::from_element(el, self.tier())),
            );
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::{LocatorChain, Verification};
    use crate::renderer::scripted::{ClickEffect, FakeElement, Scene, ScriptedPage};
    use std::time::Duration;

    fn tab_concept() -> TargetConcept {
        TargetConcept::tender_results_tab()
    }

    fn chain() -> LocatorChain {
        LocatorChain::standard(Duration::ZERO, Duration::ZERO)
    }

    #[test]
    fn test_scoped_selector_distributes_container() {
        assert_eq!(
            scoped_selector("[role='tablist']", "a, button , li"),
            "[role='tablist'] a, [role='tablist'] button, [role='tablist'] li"
        );
    }

    #[tokio::test]
    async fn test_exact_text_ignores_case_and_whitespace() {
        let concept = tab_concept();
        let scene = Scene::new("").with(
            FakeElement::new("a", "  tender\n results ").matching(&[&concept.text_scope]),
        );
        let mut page = ScriptedPage::with_scene(scene);

        let found = ExactTextStrategy.try_locate(&concept, &mut page).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].tier, LocatorTier::ExactText);
    }

    #[tokio::test]
    async fn test_partial_text_prefers_tightest_element() {
        let concept = tab_concept();
        let scope = concept.text_scope.clone();
        let scene = Scene::new("")
            .with(FakeElement::new("div", "Overview Tender Results Documents").matching(&[&scope]))
            .with(FakeElement::new("span", "View Tender Results").matching(&[&scope]));
        let mut page = ScriptedPage::with_scene(scene);

        let found = PartialTextStrategy.try_locate(&concept, &mut page).await.unwrap();
        assert_eq!(found[0].element_tag, "span");
        assert_eq!(found[1].element_tag, "div");
    }

    #[tokio::test]
    async fn test_hidden_elements_are_filtered() {
        let concept = tab_concept();
        let scene = Scene::new("").with(
            FakeElement::new("a", "Tender Results")
                .matching(&[&concept.text_scope])
                .hidden(),
        );
        let mut page = ScriptedPage::with_scene(scene);

        let found = ExactTextStrategy.try_locate(&concept, &mut page).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_attribute_heuristic_matches_class() {
        let concept = tab_concept();
        let scene = Scene::new("")
            .with(FakeElement::new("a", "Info").matching(&[&concept.attribute_scope]))
            .with(
                FakeElement::new("a", "")
                    .class("tab-tender-outcome")
                    .matching(&[&concept.attribute_scope]),
            );
        let mut page = ScriptedPage::with_scene(scene);

        let found = AttributeHeuristicStrategy
            .try_locate(&concept, &mut page)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].tier, LocatorTier::AttributeHeuristic);
    }

    #[tokio::test]
    async fn test_chain_falls_through_to_structural_tier() {
        let concept = tab_concept();
        let tabs = scoped_selector("[role='tablist']", &concept.clickable);
        let scene = Scene::new("Site details")
            .with(FakeElement::new("a", "Overview").matching(&[&tabs]))
            .with(
                FakeElement::new("a", "Outcome")
                    .matching(&[&tabs])
                    .on_click(ClickEffect::AppendText("Successful Tenderer: ABC".into())),
            );
        let mut page = ScriptedPage::with_scene(scene);

        let found = chain().locate(&concept, &mut page).await.unwrap();
        let candidate = found.expect("structural tier should locate the tab");
        assert_eq!(candidate.matched_text, "Outcome");
        assert_eq!(candidate.tier, LocatorTier::StructuralFallback);
        // "Overview" was clicked first and failed verification.
        assert_eq!(page.clicks().len(), 2);
    }

    #[tokio::test]
    async fn test_chain_skips_failed_click_and_tries_next_candidate() {
        let concept = tab_concept();
        let scene = Scene::new("")
            .with(
                FakeElement::new("a", "Tender Results")
                    .matching(&[&concept.text_scope])
                    .on_click(ClickEffect::Fail),
            )
            .with(
                FakeElement::new("button", "Tender Results")
                    .matching(&[&concept.text_scope])
                    .on_click(ClickEffect::AppendText("Name of Tenderer".into())),
            );
        let mut page = ScriptedPage::with_scene(scene);

        let candidate = chain().locate(&concept, &mut page).await.unwrap().unwrap();
        assert_eq!(candidate.element_tag, "button");
    }

    #[tokio::test]
    async fn test_chain_not_found_is_ok_none() {
        let concept = tab_concept();
        let mut page = ScriptedPage::with_scene(Scene::new("nothing here"));
        assert!(chain().locate(&concept, &mut page).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_candidate_is_not_retried_across_tiers() {
        let mut concept = tab_concept();
        concept.verification = Verification::PageTextGainsAny(vec!["never".into()]);
        let scope = concept.text_scope.clone();
        let scene = Scene::new("").with(
            FakeElement::new("a", "Tender Results")
                .id("tender-tab")
                .matching(&[&scope]),
        );
        let mut page = ScriptedPage::with_scene(scene);

        assert!(chain().locate(&concept, &mut page).await.unwrap().is_none());
        // Exact, partial and attribute tiers all propose it; it is clicked once.
        assert_eq!(page.clicks().len(), 1);
    }

    #[tokio::test]
    async fn test_markers_showing_before_the_click_do_not_verify() {
        let concept = tab_concept();
        let tabs = scoped_selector("[role='tablist']", &concept.clickable);
        let scene = Scene::new("Tenderers: 3\nTendered price: $100m")
            .with(FakeElement::new("a", "Overview").matching(&[&tabs]));
        let mut page = ScriptedPage::with_scene(scene);

        assert!(chain().locate(&concept, &mut page).await.unwrap().is_none());
        assert_eq!(page.clicks().len(), 1);
    }

    #[tokio::test]
    async fn test_marker_new_after_click_verifies_despite_others_showing() {
        let concept = tab_concept();
        let tabs = scoped_selector("[role='tablist']", &concept.clickable);
        let scene = Scene::new("Tenderers: 3")
            .with(FakeElement::new("a", "Overview").matching(&[&tabs]))
            .with(
                FakeElement::new("a", "Outcome")
                    .matching(&[&tabs])
                    .on_click(ClickEffect::AppendText("Successful Tenderer: ABC".into())),
            );
        let mut page = ScriptedPage::with_scene(scene);

        let candidate = chain().locate(&concept, &mut page).await.unwrap().unwrap();
        assert_eq!(candidate.matched_text, "Outcome");
    }
}
