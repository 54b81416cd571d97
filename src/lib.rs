//! # Filing Excerpt Linker
//!
//! A library for turning untrusted LLM analyses of SEC filings (10-K/10-Q)
//! into validated, source-linked results.
//!
//! ## Core Concepts
//!
//! - **Topic schemas**: one strict extraction contract per analysis topic
//!   (financials, risk, directors, MD&A, market risk); every field defaults,
//!   malformed enums and amounts fall back to safe values, and `{}` always
//!   validates.
//! - **Excerpts**: verbatim quotes the model claims support each finding,
//!   collected from the validated tree as a deduplicated worklist.
//! - **Anchors**: uniquely identified `<span>` markers spliced into the
//!   filing HTML wherever a claimed quote is actually found.
//! - **Propagation**: resolved anchor ids are written back onto the analysis
//!   tree as `<field>Id` siblings, so a UI can jump from insight to source.
//!
//! ## Example
//!
//! ```rust,ignore
//! use filing_excerpt_linker::*;
//!
//! let request = AnalysisRequest {
//!     filing_html: filing_html.to_string(),
//!     sections: vec![
//!         (Topic::Risk, risk_json),
//!         (Topic::Financials, financials_json),
//!     ],
//! };
//!
//! let outcome = analyze_filing(request)?;
//! // outcome.analysis      — validated tree with anchor ids attached
//! // outcome.annotated_html — filing HTML with excerpt markers
//! // outcome.anchors       — quote -> anchor entry map
//! ```

pub mod anchor;
pub mod coerce;
pub mod document;
pub mod error;
pub mod excerpt;
pub mod topics;

pub use anchor::{AnchorConfig, AnchorEngine, AnchorEntry};
pub use document::{document_blocks, document_text};
pub use error::{AnalysisError, Result};
pub use excerpt::{collect_excerpts, propagate_anchor_ids, ExcerptVisitor};
pub use topics::*;

use log::{debug, info, warn};
use serde_json::Value;
use std::collections::BTreeMap;

/// One filing-analysis request: the raw filing HTML plus the per-topic LLM
/// JSON payloads that completed upstream. Topics that were retried or
/// abandoned simply do not appear; a partial request is valid.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub filing_html: String,
    pub sections: Vec<(Topic, Value)>,
}

/// The assembled result handed to the rendering layer.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    /// Validated analysis tree with anchor ids attached.
    pub analysis: FilingAnalysis,
    /// Filing HTML with excerpt markers spliced in. Equal to the input HTML
    /// when annotation was not possible.
    pub annotated_html: String,
    /// Excerpt string to anchor entry, for every quote that was located.
    pub anchors: BTreeMap<String, AnchorEntry>,
    /// Topics dropped by validation, with the reason. Degradation, not
    /// failure: the rest of the analysis still renders.
    pub skipped: Vec<(Topic, String)>,
}

pub struct FilingAnalysisPipeline {
    anchor_config: AnchorConfig,
}

impl FilingAnalysisPipeline {
    pub fn new() -> Self {
        Self {
            anchor_config: AnchorConfig::default(),
        }
    }

    pub fn with_anchor_config(anchor_config: AnchorConfig) -> Self {
        Self { anchor_config }
    }

    /// Runs validation, excerpt collection, HTML annotation, and id
    /// propagation for one filing.
    pub fn process(&self, request: AnalysisRequest) -> Result<AnalysisOutcome> {
        info!(
            "Processing filing analysis: {} sections, {} bytes of HTML",
            request.sections.len(),
            request.filing_html.len()
        );

        let mut analysis = FilingAnalysis::default();
        let mut skipped = Vec::new();
        for (topic, raw) in &request.sections {
            match analysis.apply_section(*topic, raw) {
                Ok(()) => debug!("validated section '{}'", topic),
                Err(e) => {
                    warn!("dropping section '{}': {}", topic, e);
                    skipped.push((*topic, e.to_string()));
                }
            }
        }

        let excerpts = collect_excerpts(&analysis);
        debug!("collected {} excerpt candidates", excerpts.len());

        let mut engine = AnchorEngine::with_config(self.anchor_config.clone());
        let (annotated_html, anchors) = match engine.annotate(&request.filing_html, &excerpts) {
            Ok(result) => result,
            Err(AnalysisError::UnparsableDocument(reason)) => {
                // Filing viewing must survive without excerpt linking.
                warn!("skipping annotation, HTML unparsable: {}", reason);
                (request.filing_html.clone(), BTreeMap::new())
            }
            Err(e) => return Err(e),
        };
        debug!(
            "resolved {} of {} excerpts to anchors",
            anchors.len(),
            excerpts.len()
        );

        propagate_anchor_ids(&mut analysis, &anchors);

        Ok(AnalysisOutcome {
            analysis,
            annotated_html,
            anchors,
            skipped,
        })
    }
}

impl Default for FilingAnalysisPipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience wrapper around [`FilingAnalysisPipeline::process`] with
/// default configuration.
pub fn analyze_filing(request: AnalysisRequest) -> Result<AnalysisOutcome> {
    FilingAnalysisPipeline::new().process(request)
}
