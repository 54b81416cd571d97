//! Per-topic extraction contracts.
//!
//! One validated record type per analysis topic. Each topic owns a
//! `from_llm_json` constructor that turns untrusted LLM JSON into a fully
//! defaulted structure (the only raise is a non-object top level), a
//! schemars-generated JSON schema for prompt embedding, and the single
//! `visit_excerpts` traversal both reconciliation passes run through.

pub mod directors;
pub mod financials;
pub mod market_risk;
pub mod mdna;
pub mod risk;

pub use directors::{ChangeType, DirectorChange, DirectorsAnalysis};
pub use financials::{FinancialRatio, FinancialsAnalysis, MetricTrend, TrendDirection};
pub use market_risk::{ExposureType, MarketRiskAnalysis, RiskExposure};
pub use mdna::{MdnaAnalysis, NoteworthyItem, NoteworthyType};
pub use risk::{RiskAnalysis, RiskCategory, RiskItem, Severity};

use crate::coerce::TEXT_DEFAULT;
use crate::error::{AnalysisError, Result};
use crate::excerpt::ExcerptVisitor;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum Topic {
    Financials,
    Risk,
    Directors,
    Mdna,
    MarketRisk,
}

impl Topic {
    pub const ALL: [Topic; 5] = [
        Topic::Financials,
        Topic::Risk,
        Topic::Directors,
        Topic::Mdna,
        Topic::MarketRisk,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Financials => "financials",
            Topic::Risk => "risk",
            Topic::Directors => "directors",
            Topic::Mdna => "mdna",
            Topic::MarketRisk => "marketRisk",
        }
    }

    /// JSON schema for this topic's extraction contract, for embedding in the
    /// LLM prompt.
    pub fn schema_as_json(&self) -> Result<String> {
        let schema = match self {
            Topic::Financials => schemars::schema_for!(FinancialsAnalysis),
            Topic::Risk => schemars::schema_for!(RiskAnalysis),
            Topic::Directors => schemars::schema_for!(DirectorsAnalysis),
            Topic::Mdna => schemars::schema_for!(MdnaAnalysis),
            Topic::MarketRisk => schemars::schema_for!(MarketRiskAnalysis),
        };
        Ok(serde_json::to_string_pretty(&schema)?)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The composite analysis for one filing. Topics whose extraction never
/// completed (or failed validation) stay `None`; a partial tree is a valid
/// input to every downstream pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilingAnalysis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financials: Option<FinancialsAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directors: Option<DirectorsAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mdna: Option<MdnaAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_risk: Option<MarketRiskAnalysis>,
}

impl FilingAnalysis {
    /// Validates one topic's raw LLM JSON and stores the normalized result.
    pub fn apply_section(&mut self, topic: Topic, raw: &Value) -> Result<()> {
        match topic {
            Topic::Financials => self.financials = Some(FinancialsAnalysis::from_llm_json(raw)?),
            Topic::Risk => self.risk = Some(RiskAnalysis::from_llm_json(raw)?),
            Topic::Directors => self.directors = Some(DirectorsAnalysis::from_llm_json(raw)?),
            Topic::Mdna => self.mdna = Some(MdnaAnalysis::from_llm_json(raw)?),
            Topic::MarketRisk => self.market_risk = Some(MarketRiskAnalysis::from_llm_json(raw)?),
        }
        Ok(())
    }

    /// Drives the visitor over every excerpt-bearing field, in fixed topic
    /// order so repeated runs assign anchors identically.
    pub fn visit_excerpts(&mut self, visitor: &mut dyn ExcerptVisitor) {
        if let Some(financials) = &mut self.financials {
            financials.visit_excerpts(visitor);
        }
        if let Some(risk) = &mut self.risk {
            risk.visit_excerpts(visitor);
        }
        if let Some(directors) = &mut self.directors {
            directors.visit_excerpts(visitor);
        }
        if let Some(mdna) = &mut self.mdna {
            mdna.visit_excerpts(visitor);
        }
        if let Some(market_risk) = &mut self.market_risk {
            market_risk.visit_excerpts(visitor);
        }
    }
}

/// Ensures a topic payload is a JSON object. The one structural constraint
/// with no default path: everything below the top level is defaultable.
pub(crate) fn require_object(topic: Topic, value: &Value) -> Result<&Value> {
    if value.is_object() {
        Ok(value)
    } else {
        Err(AnalysisError::ValidationError {
            topic: topic.to_string(),
            details: format!("expected a JSON object, got {}", json_type_name(value)),
        })
    }
}

/// Rewrites a field still holding the generic unset marker to its
/// section-specific canonical phrase.
pub(crate) fn canonical_or(text: String, phrase: &str) -> String {
    if text == TEXT_DEFAULT {
        phrase.to_string()
    } else {
        text
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
