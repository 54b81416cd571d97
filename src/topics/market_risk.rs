use crate::coerce::{
    coerce_enum, coerce_excerpt, coerce_text, field, is_placeholder, object_entries, NO_EXCERPT,
    TEXT_DEFAULT,
};
use crate::error::Result;
use crate::excerpt::ExcerptVisitor;
use crate::topics::{canonical_or, require_object, Topic};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum ExposureType {
    InterestRate,
    Currency,
    Commodity,
    Equity,
    #[schemars(description = "Use when no listed exposure type fits")]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RiskExposure {
    #[schemars(description = "Kind of market risk exposure")]
    pub exposure_type: ExposureType,

    #[schemars(description = "How the company is exposed")]
    pub description: String,

    #[schemars(description = "Hedging or mitigation in place, or 'Not applicable.'")]
    pub hedging: String,

    #[schemars(description = "EXACT verbatim quote from the filing describing this exposure")]
    pub excerpt: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(skip)]
    pub excerpt_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarketRiskAnalysis {
    #[schemars(description = "Summary of quantitative and qualitative market risk disclosures")]
    pub summary: String,

    #[schemars(description = "EXACT verbatim quote supporting the summary")]
    pub summary_excerpt: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(skip)]
    pub summary_excerpt_id: Option<String>,

    #[schemars(description = "Individual market risk exposures. Empty if none disclosed.")]
    pub exposures: Vec<RiskExposure>,
}

impl MarketRiskAnalysis {
    pub fn from_llm_json(raw: &Value) -> Result<Self> {
        let v = require_object(Topic::MarketRisk, raw)?;

        let exposures = object_entries(v, "exposures")
            .into_iter()
            .filter_map(|entry| {
                let description = coerce_text(field(entry, "description"), "");
                if is_placeholder(&description) {
                    return None;
                }
                Some(RiskExposure {
                    exposure_type: coerce_enum(field(entry, "exposureType"), ExposureType::Other),
                    description,
                    hedging: canonical_or(
                        coerce_text(field(entry, "hedging"), TEXT_DEFAULT),
                        "Not applicable.",
                    ),
                    excerpt: coerce_excerpt(field(entry, "excerpt"), NO_EXCERPT),
                    excerpt_id: None,
                })
            })
            .collect();

        Ok(Self {
            summary: coerce_text(field(v, "summary"), TEXT_DEFAULT),
            summary_excerpt: coerce_excerpt(field(v, "summaryExcerpt"), NO_EXCERPT),
            summary_excerpt_id: None,
            exposures,
        })
    }

    pub fn visit_excerpts(&mut self, visitor: &mut dyn ExcerptVisitor) {
        visitor.visit(&self.summary_excerpt, &mut self.summary_excerpt_id);
        for exposure in &mut self.exposures {
            visitor.visit(&exposure.excerpt, &mut exposure.excerpt_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_input_is_fully_defaulted() {
        let analysis = MarketRiskAnalysis::from_llm_json(&json!({})).unwrap();
        assert_eq!(analysis.summary, TEXT_DEFAULT);
        assert!(analysis.exposures.is_empty());
    }

    #[test]
    fn test_hedging_canonicalizes_when_unset() {
        let analysis = MarketRiskAnalysis::from_llm_json(&json!({
            "exposures": [
                {"exposureType": "interestRate", "description": "Floating-rate debt."},
                {"exposureType": "currency", "description": "Euro receivables.",
                 "hedging": "Forward contracts cover 80% of exposure."}
            ]
        }))
        .unwrap();
        assert_eq!(analysis.exposures[0].hedging, "Not applicable.");
        assert_eq!(
            analysis.exposures[1].hedging,
            "Forward contracts cover 80% of exposure."
        );
        assert_eq!(analysis.exposures[0].exposure_type, ExposureType::InterestRate);
    }
}
