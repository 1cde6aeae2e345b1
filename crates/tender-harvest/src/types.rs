//! Core data types shared by the locator, navigation and orchestration layers.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Column holding the site name used as the search query.
pub const LOCATION_COLUMN: &str = "Location";
/// Column set on every processed row.
pub const STATUS_COLUMN: &str = "Processing Status";
/// Column holding the winning tenderer.
pub const SUCCESSFUL_TENDERER_COLUMN: &str = "Name of Successful Tenderer";
/// Prefix of the numbered columns holding the remaining tenderers.
pub const OTHER_TENDERER_PREFIX: &str = "Name of Other Participating Tenderer";
/// Optional column with the award date, used for result verification.
pub const AWARD_DATE_COLUMN: &str = "Date of Award";
/// Optional column with the bid count, used by the pending-only filter.
pub const BID_COUNT_COLUMN: &str = "Number of Bids";

/// Name of the `n`th (1-based) other-tenderer column.
pub fn other_tenderer_column(n: usize) -> String {
    format!("{OTHER_TENDERER_PREFIX} {n}")
}

/// One input row, keyed by its location string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    /// Position of the row in the source dataset.
    pub index: usize,
    pub location: String,
    pub raw_row: HashMap<String, String>,
}

impl LocationRecord {
    /// Look up a raw cell, treating blank cells as absent.
    pub fn field(&self, column: &str) -> Option<&str> {
        self.raw_row
            .get(column)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// Final status of one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Tender data was extracted (possibly empty).
    Success,
    /// The page had no search hit or no tender-results section.
    NoResultsTab,
    /// Every attempt failed with a transient fault.
    Failed { reason: String },
}

/// Result of processing one location, produced once by the state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingOutcome {
    pub location: String,
    pub status: OutcomeStatus,
    pub successful_tenderer: Option<String>,
    pub other_tenderers: Vec<String>,
    pub attempts: u32,
}

impl ProcessingOutcome {
    /// Text written to the status column.
    ///
    /// Expected terminal outcomes without tender data still read `Success`.
    pub fn status_label(&self) -> String {
        match &self.status {
            OutcomeStatus::Success | OutcomeStatus::NoResultsTab => "Success".to_string(),
            OutcomeStatus::Failed { .. } => format!("Failed after {} attempts", self.attempts),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, OutcomeStatus::Failed { .. })
    }
}

/// A layout box in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Snapshot of a DOM element as returned by [`crate::renderer::PageHandle::query`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DomElement {
    /// Selector that addresses exactly this element for follow-up actions.
    pub handle: Option<String>,
    pub tag: String,
    /// Rendered text (`innerText`), or the value of a form control.
    pub text: String,
    pub id: String,
    pub class_name: String,
    pub name: String,
    pub placeholder: String,
    pub aria_label: String,
    pub role: String,
    pub bounding_box: Option<Rect>,
    /// Rendered text of the parent element.
    pub parent_text: String,
}

impl DomElement {
    /// Visible means rendered with a non-empty layout box.
    pub fn is_visible(&self) -> bool {
        self.bounding_box.is_some_and(|b| !b.is_empty())
    }

    /// Text a user would associate with the element: its content, or the
    /// accessible label / placeholder of an empty control.
    pub fn label_text(&self) -> &str {
        [
            self.text.as_str(),
            self.aria_label.as_str(),
            self.placeholder.as_str(),
        ]
        .into_iter()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or("")
    }
}

/// Which locator tier produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocatorTier {
    ExactText,
    PartialText,
    AttributeHeuristic,
    StructuralFallback,
}

impl LocatorTier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ExactText => "exact_text",
            Self::PartialText => "partial_text",
            Self::AttributeHeuristic => "attribute_heuristic",
            Self::StructuralFallback => "structural_fallback",
        }
    }
}

/// An element proposed by a locator strategy, consumed by one click attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatorCandidate {
    pub identity_selector: Option<String>,
    pub element_tag: String,
    pub is_visible: bool,
    pub bounding_box: Rect,
    pub matched_text: String,
    pub tier: LocatorTier,
}

impl LocatorCandidate {
    pub fn from_element(element: &DomElement, tier: LocatorTier) -> Self {
        Self {
            identity_selector: element.handle.clone(),
            element_tag: element.tag.clone(),
            is_visible: element.is_visible(),
            bounding_box: element.bounding_box.unwrap_or_default(),
            matched_text: element.label_text().to_string(),
            tier,
        }
    }
}

/// Raw lines gathered by one extraction strategy.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub strategy_name: String,
    pub items: Vec<String>,
}

/// Normalized tenderer names for one site.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TenderResult {
    pub successful: Option<String>,
    pub others: Vec<String>,
}

impl TenderResult {
    pub fn is_empty(&self) -> bool {
        self.successful.is_none() && self.others.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(text: &str, bbox: Option<Rect>) -> DomElement {
        DomElement {
            handle: Some("[data-harvest-ref=\"1\"]".into()),
            tag: "a".into(),
            text: text.into(),
            bounding_box: bbox,
            ..Default::default()
        }
    }

    #[test]
    fn test_visibility_requires_layout_box() {
        let shown = Rect {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 4.0,
        };
        assert!(element("a", Some(shown)).is_visible());
        assert!(!element("a", None).is_visible());
        assert!(!element("a", Some(Rect::default())).is_visible());
    }

    #[test]
    fn test_label_text_falls_back_to_placeholder() {
        let mut input = element("", None);
        input.placeholder = "Search address".into();
        assert_eq!(input.label_text(), "Search address");
        input.aria_label = "Search".into();
        assert_eq!(input.label_text(), "Search");
    }

    #[test]
    fn test_status_label() {
        let mut outcome = ProcessingOutcome {
            location: "Site A".into(),
            status: OutcomeStatus::NoResultsTab,
            successful_tenderer: None,
            other_tenderers: Vec::new(),
            attempts: 1,
        };
        assert_eq!(outcome.status_label(), "Success");
        outcome.status = OutcomeStatus::Failed {
            reason: "timeout".into(),
        };
        outcome.attempts = 3;
        assert_eq!(outcome.status_label(), "Failed after 3 attempts");
    }

    #[test]
    fn test_other_tenderer_column_numbering() {
        assert_eq!(
            other_tenderer_column(2),
            "Name of Other Participating Tenderer 2"
        );
    }
}
