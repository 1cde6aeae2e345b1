//! The five extraction strategies, in priority order.

use super::{is_rank_row, is_ranking_header, ExtractionStrategy, TENDERER_KEYWORDS};
use crate::error::HarvestResult;
use crate::renderer::PageHandle;
use crate::types::DomElement;
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;

/// CSS selectors that commonly wrap tenderer names on results pages.
pub const TENDERER_SELECTORS: &[&str] = &[
    "[class*='tenderer']",
    "[id*='tenderer']",
    "[class*='bidder']",
    "[class*='participant']",
    "[class*='award'] li",
    ".tender-results td",
    ".tender-result-item",
];

/// Elements scanned for a "successful tenderer" marker.
pub const STRUCTURED_SCOPE: &str = "strong, b, th, td, dt, dd, label, span, p, div";

fn company_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:pte|ltd|limited|llp|inc|corporation)\b")
            .expect("company suffix regex is valid")
    })
}

fn mentions_tenderer(text: &str) -> bool {
    let lower = text.to_lowercase();
    TENDERER_KEYWORDS.iter().any(|k| lower.contains(k))
}

fn visible_texts(elements: Vec<DomElement>) -> impl Iterator<Item = String> {
    elements
        .into_iter()
        .filter(DomElement::is_visible)
        .map(|el| el.text.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Known tenderer-related selectors.
pub struct SelectorStrategy {
    selectors: Vec<String>,
}

impl Default for SelectorStrategy {
    fn default() -> Self {
        Self::new(TENDERER_SELECTORS.iter().map(|s| s.to_string()).collect())
    }
}

impl SelectorStrategy {
    pub fn new(selectors: Vec<String>) -> Self {
        Self { selectors }
    }
}

#[async_trait]
impl ExtractionStrategy for SelectorStrategy {
    fn name(&self) -> &'static str {
        "selector"
    }

    async fn extract(&self, page: &mut dyn PageHandle) -> HarvestResult<Vec<String>> {
        let mut items = Vec::new();
        for selector in &self.selectors {
            items.extend(visible_texts(page.query(selector).await?));
        }
        Ok(items)
    }
}

/// A ranking header and the ranked lines right after it.
fn ranking_block<'a>(lines: &[&'a str]) -> Vec<&'a str> {
    let Some(header) = lines.iter().position(|l| is_ranking_header(l)) else {
        return Vec::new();
    };
    let rows = lines[header + 1..].iter().take_while(|l| is_rank_row(l));
    std::iter::once(lines[header]).chain(rows.copied()).collect()
}

/// Table rows mentioning a tenderer, bidder or participant, plus the ranked
/// rows under a ranking header.
pub struct TableScanStrategy;

#[async_trait]
impl ExtractionStrategy for TableScanStrategy {
    fn name(&self) -> &'static str {
        "table_scan"
    }

    async fn extract(&self, page: &mut dyn PageHandle) -> HarvestResult<Vec<String>> {
        let rows: Vec<String> = visible_texts(page.query("tr").await?).collect();
        let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
        let ranked = ranking_block(&refs);
        Ok(rows
            .iter()
            .filter(|t| mentions_tenderer(t) || ranked.contains(&t.as_str()))
            .cloned()
            .collect())
    }
}

/// List items mentioning a tenderer or carrying a company suffix.
pub struct ListScanStrategy;

#[async_trait]
impl ExtractionStrategy for ListScanStrategy {
    fn name(&self) -> &'static str {
        "list_scan"
    }

    async fn extract(&self, page: &mut dyn PageHandle) -> HarvestResult<Vec<String>> {
        Ok(visible_texts(page.query("li").await?)
            .filter(|t| {
                let lower = t.to_lowercase();
                mentions_tenderer(t) || lower.contains("ltd") || lower.contains("pte")
            })
            .collect())
    }
}

/// The container around a "successful tenderer" marker, as one item.
pub struct StructuredDataStrategy;

#[async_trait]
impl ExtractionStrategy for StructuredDataStrategy {
    fn name(&self) -> &'static str {
        "structured_data"
    }

    async fn extract(&self, page: &mut dyn PageHandle) -> HarvestResult<Vec<String>> {
        let marker = page
            .query(STRUCTURED_SCOPE)
            .await?
            .into_iter()
            .filter(|el| el.text.to_lowercase().contains("successful tenderer"))
            .min_by_key(|el| el.text.len());
        Ok(marker
            .map(|el| {
                if el.parent_text.trim().is_empty() {
                    el.text
                } else {
                    el.parent_text
                }
            })
            .into_iter()
            .collect())
    }
}

/// A ranking block when the text has one; otherwise page text lines with
/// tenderer keywords, then company-suffix lines.
pub struct FreeTextStrategy;

#[async_trait]
impl ExtractionStrategy for FreeTextStrategy {
    fn name(&self) -> &'static str {
        "free_text"
    }

    async fn extract(&self, page: &mut dyn PageHandle) -> HarvestResult<Vec<String>> {
        let text = page.page_text().await?;
        let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

        let ranked = ranking_block(&lines);
        if ranked.len() > 1 {
            return Ok(ranked.into_iter().map(str::to_string).collect());
        }

        let mut items: Vec<String> = lines
            .iter()
            .filter(|l| mentions_tenderer(l))
            .map(|l| l.to_string())
            .collect();
        for line in &lines {
            if company_suffix_re().is_match(line) && !items.iter().any(|i| i == line) {
                items.push(line.to_string());
            }
        }
        Ok(items)
    }
}
