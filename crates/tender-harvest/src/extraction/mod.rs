//! Tender-results extraction.
//!
//! Five strategies run in fixed priority order against the activated
//! tender-results view; the first one that yields any raw line wins.
//! [`TenderResult::from_raw_lines`] turns those lines into normalized names.

pub mod strategies;

use crate::error::HarvestResult;
use crate::normalize::{dedupe_preserving_order, is_bare_label, normalize, strip_role_label};
use crate::renderer::PageHandle;
use crate::types::{ExtractionResult, TenderResult};
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;

pub use strategies::{
    FreeTextStrategy, ListScanStrategy, SelectorStrategy, StructuredDataStrategy,
    TableScanStrategy,
};

/// Keywords that mark a line as tenderer-related.
pub const TENDERER_KEYWORDS: &[&str] = &["tenderer", "bidder", "participant"];

/// One way of reading raw tenderer lines off a page.
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn extract(&self, page: &mut dyn PageHandle) -> HarvestResult<Vec<String>>;
}

/// Runs the strategies in order and keeps the first non-empty result.
pub struct ExtractionAggregator {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl Default for ExtractionAggregator {
    fn default() -> Self {
        Self::standard()
    }
}

impl ExtractionAggregator {
    /// Selector, table, list, structured-data and free-text strategies.
    pub fn standard() -> Self {
        Self::with_strategies(vec![
            Box::new(SelectorStrategy::default()),
            Box::new(TableScanStrategy),
            Box::new(ListScanStrategy),
            Box::new(StructuredDataStrategy),
            Box::new(FreeTextStrategy),
        ])
    }

    pub fn with_strategies(strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self { strategies }
    }

    /// Run every strategy until one produces lines.
    ///
    /// Never fails: a strategy whose page access errors counts as empty. When
    /// nothing is found the result has no items and strategy name `none`.
    pub async fn extract(&self, page: &mut dyn PageHandle) -> ExtractionResult {
        for strategy in &self.strategies {
            let items = match strategy.extract(page).await {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!("extraction strategy {} failed: {e}", strategy.name());
                    Vec::new()
                }
            };
            let items: Vec<String> = items
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            tracing::debug!("extraction strategy {} found {} item(s)", strategy.name(), items.len());
            if !items.is_empty() {
                return ExtractionResult {
                    strategy_name: strategy.name().to_string(),
                    items,
                };
            }
        }
        ExtractionResult {
            strategy_name: "none".to_string(),
            items: Vec::new(),
        }
    }
}

fn successful_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:successful|winner|winning|awarded)\b")
            .expect("successful marker regex is valid")
    })
}

fn awarded_to_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*awarded\s+to\s*[:\-]?\s*").expect("awarded-to regex is valid")
    })
}

fn rank_row_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,3})[.)]?\s+(.+)$").expect("rank row regex is valid"))
}

fn trailing_price_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\s+(?:S\$|SGD|\$)\s*[\d,]+(?:\.\d+)?\s*(?:m|mil|million|b|billion)?\.?\s*$")
            .expect("trailing price regex is valid")
    })
}

/// Header row of a ranked tender table ("Ranking | Name of Tenderer | ...").
pub fn is_ranking_header(line: &str) -> bool {
    let upper = line.to_uppercase();
    upper.contains("RANKING") && upper.contains("NAME OF TENDERER")
}

/// Whether `line` reads as a ranked row ("1  ABC Pte Ltd  $100m").
pub fn is_rank_row(line: &str) -> bool {
    rank_row_re().is_match(line.trim())
}

/// Ranked names following the first ranking header, in table order.
fn ranking_table(lines: &[&str]) -> Vec<(u32, String)> {
    let Some(header) = lines.iter().position(|l| is_ranking_header(l)) else {
        return Vec::new();
    };
    lines[header + 1..]
        .iter()
        .map_while(|line| {
            let caps = rank_row_re().captures(line)?;
            let rank = caps[1].parse::<u32>().ok()?;
            Some((rank, trailing_price_re().replace(&caps[2], "").to_string()))
        })
        .filter_map(|(rank, name)| clean_name(&name).map(|name| (rank, name)))
        .collect()
}

/// Strip labels and normalize; `None` for lines that carry no name.
fn clean_name(line: &str) -> Option<String> {
    let stripped = strip_role_label(&awarded_to_re().replace(line, ""));
    let name = normalize(&stripped);
    if name.is_empty() || is_bare_label(&name) {
        None
    } else {
        Some(name)
    }
}

impl TenderResult {
    /// Build a result from raw extracted lines.
    ///
    /// Items are split into lines. A ranking table (a `Ranking ... Name of
    /// Tenderer` header followed by numbered rows) takes precedence: rank 1
    /// is the successful tenderer and the other ranks are the others, with
    /// trailing prices dropped. Without one, the first line mentioning a
    /// successful, winning or awarded party names the successful tenderer;
    /// when that line is only a label the name is taken from the line after
    /// it, and the rest become other tenderers. Either way names are
    /// label-stripped, normalized and de-duplicated, minus the successful
    /// tenderer itself.
    pub fn from_raw_lines(items: &[String], max_others: Option<usize>) -> Self {
        let lines: Vec<&str> = items
            .iter()
            .flat_map(|item| item.lines())
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        let ranked = ranking_table(&lines);
        let (successful, others) = if ranked.is_empty() {
            Self::from_labelled_lines(&lines)
        } else {
            let successful = ranked
                .iter()
                .find(|(rank, _)| *rank == 1)
                .map(|(_, name)| name.clone())
                .or_else(|| Self::from_labelled_lines(&lines).0);
            let others = ranked
                .into_iter()
                .filter(|(rank, _)| *rank != 1)
                .map(|(_, name)| name)
                .collect();
            (successful, others)
        };

        let mut others = dedupe_preserving_order(others);
        if let Some(name) = &successful {
            others.retain(|o| !o.eq_ignore_ascii_case(name));
        }
        if let Some(max) = max_others {
            others.truncate(max);
        }

        Self { successful, others }
    }

    fn from_labelled_lines(lines: &[&str]) -> (Option<String>, Vec<String>) {
        let mut successful = None;
        let mut consumed = Vec::new();
        if let Some(pos) = lines.iter().position(|l| successful_marker_re().is_match(l)) {
            consumed.push(pos);
            successful = clean_name(lines[pos]);
            if successful.is_none() {
                if let Some(next) = lines.get(pos + 1) {
                    successful = clean_name(next);
                    if successful.is_some() {
                        consumed.push(pos + 1);
                    }
                }
            }
        }

        let others = lines
            .iter()
            .enumerate()
            .filter(|(i, _)| !consumed.contains(i))
            .filter_map(|(_, l)| clean_name(l))
            .collect();
        (successful, others)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::scripted::{FakeElement, Scene, ScriptedPage};

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_successful_and_deduplicated_others() {
        let result = TenderResult::from_raw_lines(
            &lines(&[
                "Successful Tenderer: ABC Pte Ltd",
                "Bidder: XYZ Pte Ltd",
                "Bidder: XYZ Pte Ltd",
            ]),
            None,
        );
        assert_eq!(result.successful.as_deref(), Some("ABC Pte. Ltd."));
        assert_eq!(result.others, vec!["XYZ Pte. Ltd.".to_string()]);
    }

    #[test]
    fn test_label_on_its_own_line() {
        let result = TenderResult::from_raw_lines(
            &lines(&["SUCCESSFUL TENDERER\nLion Holdings Pte Ltd\n2. Other Co Ltd"]),
            None,
        );
        assert_eq!(result.successful.as_deref(), Some("Lion Holdings Pte. Ltd."));
        assert_eq!(result.others, vec!["Other Co Ltd.".to_string()]);
    }

    #[test]
    fn test_successful_removed_from_others() {
        let result = TenderResult::from_raw_lines(
            &lines(&["Awarded to: ABC Pte Ltd", "1. ABC Pte Ltd", "2. DEF Ltd"]),
            None,
        );
        assert_eq!(result.successful.as_deref(), Some("ABC Pte. Ltd."));
        assert_eq!(result.others, vec!["DEF Ltd.".to_string()]);
    }

    #[test]
    fn test_bare_labels_dropped_and_cap_applied() {
        let result = TenderResult::from_raw_lines(
            &lines(&["Tenderers:", "A Ltd", "B Ltd", "C Ltd"]),
            Some(2),
        );
        assert!(result.successful.is_none());
        assert_eq!(result.others, vec!["A Ltd.".to_string(), "B Ltd.".to_string()]);
    }

    #[test]
    fn test_ranking_table_orders_tenderers() {
        let result = TenderResult::from_raw_lines(
            &lines(&[
                "RANKING NAME OF TENDERER TENDERED PRICE",
                "1 ABC Pte Ltd $100m",
                "2 XYZ Ltd $90m",
                "3\tLion Holdings Pte Ltd\tS$ 85,500,000.00",
            ]),
            None,
        );
        assert_eq!(result.successful.as_deref(), Some("ABC Pte. Ltd."));
        assert_eq!(
            result.others,
            vec!["XYZ Ltd.".to_string(), "Lion Holdings Pte. Ltd.".to_string()]
        );
    }

    #[test]
    fn test_ranking_table_ends_at_first_unranked_line() {
        let result = TenderResult::from_raw_lines(
            &lines(&[
                "Site: Jalan Anak Bukit",
                "Ranking | Name of Tenderer",
                "1 ABC Pte Ltd",
                "2 XYZ Ltd",
                "Note: prices exclude GST",
                "3 Not A Tenderer Ltd",
            ]),
            Some(5),
        );
        assert_eq!(result.successful.as_deref(), Some("ABC Pte. Ltd."));
        assert_eq!(result.others, vec!["XYZ Ltd.".to_string()]);
    }

    #[test]
    fn test_ranking_without_rank_one_uses_successful_label() {
        let result = TenderResult::from_raw_lines(
            &lines(&[
                "Successful Tenderer: ABC Pte Ltd",
                "RANKING NAME OF TENDERER",
                "2 XYZ Ltd",
            ]),
            None,
        );
        assert_eq!(result.successful.as_deref(), Some("ABC Pte. Ltd."));
        assert_eq!(result.others, vec!["XYZ Ltd.".to_string()]);
    }

    #[test]
    fn test_empty_input() {
        assert!(TenderResult::from_raw_lines(&[], None).is_empty());
    }

    #[tokio::test]
    async fn test_aggregator_first_non_empty_wins() {
        let scene = Scene::new("Successful Tenderer: Free Text Pte Ltd")
            .with(FakeElement::new("tr", "Tenderer\tPrice").matching(&["tr"]))
            .with(FakeElement::new("tr", "Park Lane").matching(&["tr"]));
        let mut page = ScriptedPage::with_scene(scene);

        let result = ExtractionAggregator::standard().extract(&mut page).await;
        assert_eq!(result.strategy_name, "table_scan");
        assert_eq!(result.items, vec!["Tenderer\tPrice".to_string()]);
    }

    #[tokio::test]
    async fn test_aggregator_falls_back_to_free_text() {
        let mut page = ScriptedPage::with_scene(Scene::new(
            "Site details\nSuccessful Tenderer: Free Text Pte Ltd\nArea 1.2 ha",
        ));
        let result = ExtractionAggregator::standard().extract(&mut page).await;
        assert_eq!(result.strategy_name, "free_text");
        assert_eq!(result.items, vec!["Successful Tenderer: Free Text Pte Ltd".to_string()]);
    }

    #[tokio::test]
    async fn test_aggregator_nothing_found() {
        let mut page = ScriptedPage::with_scene(Scene::new("Site details"));
        let result = ExtractionAggregator::standard().extract(&mut page).await;
        assert_eq!(result.strategy_name, "none");
        assert!(result.items.is_empty());
    }
}
