use crate::coerce::{
    coerce_enum, coerce_excerpt, coerce_text, field, is_placeholder, object_entries, NO_EXCERPT,
    TEXT_DEFAULT,
};
use crate::error::Result;
use crate::excerpt::ExcerptVisitor;
use crate::topics::{require_object, Topic};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum RiskCategory {
    Market,
    Operational,
    Financial,
    Legal,
    Regulatory,
    Cybersecurity,
    #[schemars(description = "Use when no listed category fits")]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RiskItem {
    #[schemars(description = "Short name for the risk, e.g. 'Customer concentration'")]
    pub title: String,

    #[schemars(description = "What the risk is and why it matters")]
    pub description: String,

    #[schemars(description = "Risk category")]
    pub category: RiskCategory,

    #[schemars(description = "Assessed severity")]
    pub severity: Severity,

    #[schemars(
        description = "EXACT verbatim quote from the risk factors section supporting this item"
    )]
    pub excerpt: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(skip)]
    pub excerpt_id: Option<String>,
}

impl RiskItem {
    /// Canonical record emitted when the filing details no specific risks.
    fn none_detailed() -> Self {
        Self {
            title: "No specific risks detailed".to_string(),
            description: "The filing did not detail specific risk factors.".to_string(),
            category: RiskCategory::Other,
            severity: Severity::Low,
            excerpt: NO_EXCERPT.to_string(),
            excerpt_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RiskAnalysis {
    #[schemars(description = "Summary of the filing's overall risk posture")]
    pub summary: String,

    #[schemars(description = "EXACT verbatim quote supporting the summary")]
    pub summary_excerpt: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(skip)]
    pub summary_excerpt_id: Option<String>,

    #[schemars(description = "Individually identified risk factors. Never empty.")]
    pub risks: Vec<RiskItem>,
}

impl RiskAnalysis {
    pub fn from_llm_json(raw: &Value) -> Result<Self> {
        let v = require_object(Topic::Risk, raw)?;

        let mut risks: Vec<RiskItem> = object_entries(v, "risks")
            .into_iter()
            .filter_map(|entry| {
                let title = coerce_text(field(entry, "title"), "");
                let description = coerce_text(field(entry, "description"), "");
                // An entry with neither a real title nor a real description is
                // a sentinel row, not a risk.
                if is_placeholder(&title) && is_placeholder(&description) {
                    return None;
                }
                Some(RiskItem {
                    title: if title.is_empty() { "Untitled risk".to_string() } else { title },
                    description: if description.is_empty() {
                        TEXT_DEFAULT.to_string()
                    } else {
                        description
                    },
                    category: coerce_enum(field(entry, "category"), RiskCategory::Other),
                    severity: coerce_enum(field(entry, "severity"), Severity::Medium),
                    excerpt: coerce_excerpt(field(entry, "excerpt"), NO_EXCERPT),
                    excerpt_id: None,
                })
            })
            .collect();

        if risks.is_empty() {
            risks.push(RiskItem::none_detailed());
        }

        Ok(Self {
            summary: coerce_text(field(v, "summary"), TEXT_DEFAULT),
            summary_excerpt: coerce_excerpt(field(v, "summaryExcerpt"), NO_EXCERPT),
            summary_excerpt_id: None,
            risks,
        })
    }

    pub fn visit_excerpts(&mut self, visitor: &mut dyn ExcerptVisitor) {
        visitor.visit(&self.summary_excerpt, &mut self.summary_excerpt_id);
        for item in &mut self.risks {
            visitor.visit(&item.excerpt, &mut item.excerpt_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_input_yields_single_canonical_risk() {
        let analysis = RiskAnalysis::from_llm_json(&json!({})).unwrap();
        assert_eq!(analysis.risks.len(), 1);
        let item = &analysis.risks[0];
        assert_eq!(item.title, "No specific risks detailed");
        assert_eq!(item.category, RiskCategory::Other);
        assert_eq!(item.severity, Severity::Low);
    }

    #[test]
    fn test_placeholder_only_list_collapses_to_canonical_risk() {
        let analysis = RiskAnalysis::from_llm_json(&json!({
            "risks": [{"title": "None reported", "description": "N/A"}]
        }))
        .unwrap();
        assert_eq!(analysis.risks.len(), 1);
        assert_eq!(analysis.risks[0].title, "No specific risks detailed");
    }

    #[test]
    fn test_unrecognized_enums_fall_back() {
        let analysis = RiskAnalysis::from_llm_json(&json!({
            "risks": [{
                "title": "Tariffs",
                "description": "Import duties may rise.",
                "category": "geopolitical-ish",
                "severity": "catastrophic"
            }]
        }))
        .unwrap();
        assert_eq!(analysis.risks[0].category, RiskCategory::Other);
        assert_eq!(analysis.risks[0].severity, Severity::Medium);
    }

    #[test]
    fn test_real_items_survive_alongside_sentinels() {
        let analysis = RiskAnalysis::from_llm_json(&json!({
            "summary": "Two material risks.",
            "risks": [
                {"title": "FX", "description": "Currency swings.", "category": "market",
                 "severity": "high", "excerpt": "Our results are exposed to currency fluctuations."},
                {"title": "", "description": ""},
            ]
        }))
        .unwrap();
        assert_eq!(analysis.risks.len(), 1);
        assert_eq!(analysis.risks[0].severity, Severity::High);
        assert_eq!(
            analysis.risks[0].excerpt,
            "Our results are exposed to currency fluctuations."
        );
    }
}
