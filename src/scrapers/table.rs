//! Question page extraction.
//!
//! A question page has its question in `h1.blog-post-title` and its
//! answers in a `.table.table-striped` table. The table markup on the
//! site is unbalanced (rows and cells are often left open), so the rows
//! are not walked through the DOM. Instead the table's serialized inner
//! markup is handed to a list of [`VariantStrategy`] implementations,
//! tried in order until one of them returns variants:
//!
//! 1. [`ScoredPairs`]: `<td>answer</td><td>points</td>` pairs.
//! 2. [`RankedRows`]: first cell of each row (or any cell, as a last
//!    resort) with points synthesized from row order.
//!
//! # Known limitation
//!
//! [`RankedRows`] assumes the site lists answers from most to least
//! popular. If a table without a points column is in some other order,
//! the synthesized scores are wrong and nothing here can tell.

use crate::models::{QuestionRecord, VariantRecord};
use crate::utils::truncate_for_log;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

const TITLE_SELECTOR: &str = "h1.blog-post-title";
const TABLE_SELECTOR: &str = ".table.table-striped";

static SCORED_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<td(?:\s[^>]*)?>([^<]+)</td\s*>\s*<td(?:\s[^>]*)?>\s*(\d+)\s*</td\s*>")
        .expect("valid scored pair pattern")
});
static ROW_FIRST_CELL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<tr(?:\s[^>]*)?>\s*<td(?:\s[^>]*)?>([^<]+)(?:</td\s*>)?")
        .expect("valid row pattern")
});
static ANY_CELL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<td(?:\s[^>]*)?>([^<]+)</?td").expect("valid cell pattern"));
static HEADER_ARTIFACT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(answer|points)$").expect("valid header pattern"));

/// One way of reading answer variants out of raw table markup.
pub trait VariantStrategy: Sync {
    fn name(&self) -> &'static str;

    /// Variants found in `table_html`, in table order. Empty when the strategy does not apply.
    fn extract(&self, table_html: &str) -> Vec<VariantRecord>;
}

/// Tables with an explicit points column.
///
/// Pairs whose answer is blank or whose points do not fit a `u32` are
/// skipped, as are repeats of an identical (answer, points) pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoredPairs;

impl VariantStrategy for ScoredPairs {
    fn name(&self) -> &'static str {
        "scored-pairs"
    }

    fn extract(&self, table_html: &str) -> Vec<VariantRecord> {
        let mut seen = HashSet::new();
        let mut variants = Vec::new();

        for (idx, caps) in SCORED_PAIR.captures_iter(table_html).enumerate() {
            let variant = cell_text(&caps[1]);
            let points_text = caps[2].trim();
            debug!(pair = idx + 1, %variant, points = %points_text, "Candidate pair");

            if variant.is_empty() || points_text.is_empty() {
                debug!(pair = idx + 1, "Skipped pair with an empty side");
                continue;
            }
            let Ok(points) = points_text.parse::<u32>() else {
                debug!(pair = idx + 1, points = %points_text, "Skipped pair with unparseable points");
                continue;
            };
            if !seen.insert((variant.clone(), points)) {
                debug!(%variant, points, "Skipped duplicate pair");
                continue;
            }
            variants.push(VariantRecord { variant, points });
        }
        variants
    }
}

/// Tables without a points column.
///
/// Takes the first cell of every row; if the markup has no recognizable
/// rows, takes every cell instead. Header cells ("Answer", "Points") are
/// dropped, repeated answers keep their first position, and the `n`
/// remaining answers are scored `n, n-1, ..., 1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RankedRows;

impl RankedRows {
    fn candidates(pattern: &Regex, table_html: &str) -> Vec<String> {
        pattern
            .captures_iter(table_html)
            .map(|caps| cell_text(&caps[1]))
            .filter(|text| !text.is_empty() && !HEADER_ARTIFACT.is_match(text))
            .collect()
    }
}

impl VariantStrategy for RankedRows {
    fn name(&self) -> &'static str {
        "ranked-rows"
    }

    fn extract(&self, table_html: &str) -> Vec<VariantRecord> {
        let mut texts = Self::candidates(&ROW_FIRST_CELL, table_html);
        if texts.is_empty() {
            debug!("No row-leading cells; falling back to any cell");
            texts = Self::candidates(&ANY_CELL, table_html);
        }

        let found = texts.len();
        let unique: Vec<String> = texts.into_iter().unique().collect();
        if unique.len() < found {
            debug!(duplicates = found - unique.len(), "Skipped duplicate answers");
        }

        let total = unique.len() as u32;
        unique
            .into_iter()
            .zip(0u32..)
            .map(|(variant, idx)| VariantRecord {
                variant,
                points: total - idx,
            })
            .collect()
    }
}

/// Strategies in the order they are tried.
pub static STRATEGIES: &[&dyn VariantStrategy] = &[&ScoredPairs, &RankedRows];

/// Run [`STRATEGIES`] over `table_html` and return the first non-empty result.
pub fn extract_variants(table_html: &str) -> Vec<VariantRecord> {
    for strategy in STRATEGIES {
        let variants = strategy.extract(table_html);
        debug!(strategy = strategy.name(), count = variants.len(), "Strategy finished");
        if !variants.is_empty() {
            return variants;
        }
    }
    Vec::new()
}

/// Extract a question and its answer variants from a question page.
///
/// Returns `None` when the page lacks the title heading, lacks the answer
/// table, or no strategy finds a single variant.
#[instrument(level = "info", skip(document))]
pub fn extract_question(document: &Html, url: &str) -> Option<QuestionRecord> {
    let title_selector = Selector::parse(TITLE_SELECTOR).unwrap();
    let table_selector = Selector::parse(TABLE_SELECTOR).unwrap();

    let Some(title) = document.select(&title_selector).next() else {
        warn!("Question heading not found");
        return None;
    };
    let question_en = title.text().collect::<String>().trim().to_string();

    let Some(table) = document.select(&table_selector).next() else {
        warn!("Answer table not found");
        return None;
    };
    let table_html = table.inner_html();
    debug!(table_html = %truncate_for_log(&table_html, 500), "Answer table found");

    let variants_en = extract_variants(&table_html);
    if variants_en.is_empty() {
        warn!("No answer variants found");
        return None;
    }

    info!(question = %question_en, variants = variants_en.len(), "Extracted question");
    Some(QuestionRecord {
        url: url.to_string(),
        question_en,
        variants_en,
    })
}

fn cell_text(raw: &str) -> String {
    html_escape::decode_html_entities(raw).trim().to_string()
}
