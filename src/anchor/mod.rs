//! HTML anchor engine.
//!
//! Locates candidate quotes inside the filing HTML's normalized text and
//! splices uniquely identified `<span>` markers around the matched runs. The
//! corpus is built once per document and reused across all candidates.
//! Individual unmatched quotes are never errors; only a document the scanner
//! cannot process at all raises [`AnalysisError::UnparsableDocument`].

mod corpus;

use crate::error::Result;
use corpus::{normalize_text, Corpus};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A resolved excerpt location: the generated anchor id plus the byte span of
/// the match in the document's normalized text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorEntry {
    pub id: String,
    pub start: usize,
    pub end: usize,
}

/// Tunables for the matching heuristics.
#[derive(Debug, Clone)]
pub struct AnchorConfig {
    /// When a full quote has no exact match, retry with its first N
    /// normalized characters. Handles models appending trailing commentary
    /// to an otherwise verbatim quote.
    pub fallback_prefix_chars: usize,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            fallback_prefix_chars: 70,
        }
    }
}

/// One engine per filing-analysis request: the id counter and claimed spans
/// are request-local state.
#[derive(Debug, Default)]
pub struct AnchorEngine {
    config: AnchorConfig,
    next_id: usize,
}

#[derive(Debug)]
struct Insertion {
    pos: usize,
    // Closes sort before opens at the same byte, so adjacent markers come
    // out as `</span><span ...>`.
    rank: u8,
    markup: String,
}

impl AnchorEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AnchorConfig) -> Self {
        Self { config, next_id: 0 }
    }

    /// Finds each candidate in the document and wraps its matched text in
    /// anchor markers. Returns the annotated HTML and the quote-to-entry map;
    /// candidates that cannot be located simply have no map entry.
    pub fn annotate(
        &mut self,
        html: &str,
        candidates: &[String],
    ) -> Result<(String, BTreeMap<String, AnchorEntry>)> {
        let corpus = Corpus::build(html)?;
        debug!(
            "built search corpus: {} bytes of text from {} bytes of HTML",
            corpus.text().len(),
            html.len()
        );

        let mut entries: BTreeMap<String, AnchorEntry> = BTreeMap::new();
        let mut claimed: Vec<(usize, usize)> = Vec::new();
        let mut insertions: Vec<Insertion> = Vec::new();

        for candidate in candidates {
            if entries.contains_key(candidate) {
                continue;
            }
            let normalized = normalize_text(candidate);
            if normalized.is_empty() {
                continue;
            }

            let span = self
                .claim_span(&corpus, &normalized, &claimed)
                .or_else(|| {
                    self.prefix_fallback(&normalized)
                        .and_then(|prefix| self.claim_span(&corpus, &prefix, &claimed))
                });

            let Some((start, end)) = span else {
                debug!("no match for excerpt: {:.60}...", candidate);
                continue;
            };

            let id = format!("excerpt-anchor-{}", self.next_id);
            self.next_id += 1;
            claimed.push((start, end));

            for (index, (raw_a, raw_b)) in corpus.fragments(start, end).into_iter().enumerate() {
                let open = if index == 0 {
                    format!(
                        "<span id=\"{id}\" class=\"excerpt-anchor\" data-anchor-id=\"{id}\">"
                    )
                } else {
                    // Later fragments share the anchor id as data only; DOM
                    // ids must stay unique.
                    format!("<span class=\"excerpt-anchor\" data-anchor-id=\"{id}\">")
                };
                insertions.push(Insertion {
                    pos: raw_a,
                    rank: 1,
                    markup: open,
                });
                insertions.push(Insertion {
                    pos: raw_b,
                    rank: 0,
                    markup: "</span>".to_string(),
                });
            }

            entries.insert(candidate.clone(), AnchorEntry { id, start, end });
        }

        Ok((splice(html, insertions), entries))
    }

    /// First occurrence of `needle` that does not overlap an already-claimed
    /// span. A candidate whose every occurrence collides stays unresolved,
    /// which keeps inserted markers from ever nesting.
    fn claim_span(
        &self,
        corpus: &Corpus,
        needle: &str,
        claimed: &[(usize, usize)],
    ) -> Option<(usize, usize)> {
        let mut from = 0;
        while let Some((start, end)) = corpus.find_from(needle, from) {
            let collides = claimed
                .iter()
                .any(|&(a, b)| start < b && a < end);
            if !collides {
                return Some((start, end));
            }
            // Step past the match head on a char boundary.
            let head = needle.chars().next().map_or(1, |c| c.len_utf8());
            from = start + head;
        }
        None
    }

    fn prefix_fallback(&self, normalized: &str) -> Option<String> {
        let limit = self.config.fallback_prefix_chars;
        if limit == 0 || normalized.chars().count() <= limit {
            return None;
        }
        let prefix: String = normalized.chars().take(limit).collect();
        let trimmed = prefix.trim_end().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    }
}

/// Applies all insertions in one left-to-right rebuild, so raw offsets stay
/// valid and markup ordering at shared positions is deterministic.
fn splice(html: &str, mut insertions: Vec<Insertion>) -> String {
    if insertions.is_empty() {
        return html.to_string();
    }
    insertions.sort_by_key(|ins| (ins.pos, ins.rank));

    let mut out = String::with_capacity(html.len() + insertions.len() * 64);
    let mut last = 0;
    for ins in insertions {
        out.push_str(&html[last..ins.pos]);
        out.push_str(&ins.markup);
        last = ins.pos;
    }
    out.push_str(&html[last..]);
    out
}
