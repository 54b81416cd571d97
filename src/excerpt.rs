//! Excerpt collection and anchor-id propagation.
//!
//! Both passes run through the exact same per-topic `visit_excerpts`
//! traversal, so any excerpt field the collector sees is revisited identically
//! when ids are written back. The symmetry the reconciliation depends on is
//! enforced by sharing the traversal, not by keeping two walks in sync.

use crate::anchor::AnchorEntry;
use crate::coerce::is_placeholder;
use crate::topics::FilingAnalysis;
use std::collections::{BTreeMap, HashSet};

/// Visitor over every excerpt-bearing field of an analysis tree. Each call
/// receives the excerpt string and a mutable handle on its sibling id slot.
pub trait ExcerptVisitor {
    fn visit(&mut self, excerpt: &str, id_slot: &mut Option<String>);
}

/// Gathers the deduplicated worklist of quotes that need locating in the
/// filing HTML. First-occurrence order, exact-string dedup, placeholders
/// filtered out. Never writes to the id slots.
#[derive(Debug, Default)]
pub struct ExcerptCollector {
    seen: HashSet<String>,
    ordered: Vec<String>,
}

impl ExcerptCollector {
    pub fn into_ordered(self) -> Vec<String> {
        self.ordered
    }
}

impl ExcerptVisitor for ExcerptCollector {
    fn visit(&mut self, excerpt: &str, _id_slot: &mut Option<String>) {
        if is_placeholder(excerpt) {
            return;
        }
        if self.seen.insert(excerpt.to_string()) {
            self.ordered.push(excerpt.to_string());
        }
    }
}

/// Writes resolved anchor ids into the sibling id slots. A quote missing from
/// the map leaves its slot `None`; consumers treat absence as "no jump
/// target".
pub struct AnchorPropagator<'a> {
    anchors: &'a BTreeMap<String, AnchorEntry>,
}

impl<'a> AnchorPropagator<'a> {
    pub fn new(anchors: &'a BTreeMap<String, AnchorEntry>) -> Self {
        Self { anchors }
    }
}

impl ExcerptVisitor for AnchorPropagator<'_> {
    fn visit(&mut self, excerpt: &str, id_slot: &mut Option<String>) {
        if let Some(entry) = self.anchors.get(excerpt) {
            *id_slot = Some(entry.id.clone());
        }
    }
}

/// Collects the ordered quote worklist from an analysis tree without
/// mutating it.
pub fn collect_excerpts(analysis: &FilingAnalysis) -> Vec<String> {
    let mut scratch = analysis.clone();
    let mut collector = ExcerptCollector::default();
    scratch.visit_excerpts(&mut collector);
    collector.into_ordered()
}

/// Attaches resolved anchor ids onto the analysis tree in place. Excerpt
/// strings, list ordering, and non-excerpt fields are untouched.
pub fn propagate_anchor_ids(analysis: &mut FilingAnalysis, anchors: &BTreeMap<String, AnchorEntry>) {
    let mut propagator = AnchorPropagator::new(anchors);
    analysis.visit_excerpts(&mut propagator);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PathRecorder {
        visited: Vec<String>,
    }

    impl ExcerptVisitor for PathRecorder {
        fn visit(&mut self, excerpt: &str, _id_slot: &mut Option<String>) {
            self.visited.push(excerpt.to_string());
        }
    }

    #[test]
    fn test_collector_dedupes_and_keeps_first_occurrence_order() {
        let mut collector = ExcerptCollector::default();
        let mut slot = None;
        collector.visit("alpha", &mut slot);
        collector.visit("beta", &mut slot);
        collector.visit("alpha", &mut slot);
        collector.visit("No excerpt available.", &mut slot);
        collector.visit("", &mut slot);
        assert_eq!(collector.into_ordered(), vec!["alpha", "beta"]);
        assert_eq!(slot, None);
    }

    #[test]
    fn test_propagator_leaves_unmatched_slots_unset() {
        let mut anchors = BTreeMap::new();
        anchors.insert(
            "alpha".to_string(),
            AnchorEntry {
                id: "excerpt-anchor-0".to_string(),
                start: 0,
                end: 5,
            },
        );
        let mut propagator = AnchorPropagator::new(&anchors);

        let mut matched = None;
        propagator.visit("alpha", &mut matched);
        assert_eq!(matched.as_deref(), Some("excerpt-anchor-0"));

        let mut unmatched = None;
        propagator.visit("beta", &mut unmatched);
        assert_eq!(unmatched, None);
    }

    #[test]
    fn test_collector_and_propagator_share_the_traversal() {
        // Both passes are driven by the same visit_excerpts call, so the
        // visited sets must be identical for any tree.
        let value = serde_json::json!({
            "summary": "Risks exist.",
            "summaryExcerpt": "The company faces supply risk.",
            "risks": [
                {"title": "Supply", "excerpt": "Suppliers are concentrated."},
                {"title": "FX", "excerpt": "No excerpt available."}
            ]
        });
        let mut analysis = FilingAnalysis::default();
        analysis
            .apply_section(crate::topics::Topic::Risk, &value)
            .unwrap();

        let mut first = PathRecorder { visited: vec![] };
        let mut second = PathRecorder { visited: vec![] };
        analysis.visit_excerpts(&mut first);
        analysis.visit_excerpts(&mut second);
        assert_eq!(first.visited, second.visited);
        // The recorder sees every excerpt slot, placeholders included; the
        // collector's filtering happens on top of the same walk.
        assert_eq!(first.visited.len(), 3);
    }
}
