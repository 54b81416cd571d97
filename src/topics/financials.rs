use crate::coerce::{
    coerce_enum, coerce_excerpt, coerce_monetary, coerce_number, coerce_percentage, coerce_text,
    field, is_placeholder, object_entries, NO_EXCERPT, TEXT_DEFAULT,
};
use crate::error::Result;
use crate::excerpt::ExcerptVisitor;
use crate::topics::{require_object, Topic};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum TrendDirection {
    #[schemars(description = "The metric increased versus the comparison period")]
    Increased,
    #[schemars(description = "The metric decreased versus the comparison period")]
    Decreased,
    #[schemars(description = "The metric was roughly unchanged")]
    Flat,
    #[schemars(description = "The filing does not state a direction for this metric")]
    NotDisclosed,
}

/// One headline income-statement metric with its supporting quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetricTrend {
    #[schemars(
        description = "Reported amount as written in the filing, e.g. '$7.8 billion'. Use 'N/A' if not stated."
    )]
    pub amount: String,

    #[schemars(description = "Percentage change versus the prior period, e.g. '2%'. 'N/A' if not stated.")]
    pub change_percent: String,

    #[schemars(description = "Direction of the change")]
    pub direction: TrendDirection,

    #[schemars(description = "One or two sentences of analysis for this metric")]
    pub commentary: String,

    #[schemars(
        description = "EXACT verbatim quote from the filing supporting this metric. Do not paraphrase."
    )]
    pub excerpt: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(skip)]
    pub excerpt_id: Option<String>,
}

impl MetricTrend {
    fn from_llm_json(value: Option<&Value>) -> Self {
        let empty = Value::Object(Default::default());
        let v = match value {
            Some(v) if v.is_object() => v,
            _ => &empty,
        };
        Self {
            amount: coerce_monetary(field(v, "amount")),
            change_percent: coerce_percentage(field(v, "changePercent")),
            direction: coerce_enum(field(v, "direction"), TrendDirection::NotDisclosed),
            commentary: coerce_text(field(v, "commentary"), TEXT_DEFAULT),
            excerpt: coerce_excerpt(field(v, "excerpt"), NO_EXCERPT),
            excerpt_id: None,
        }
    }
}

/// A purely numeric ratio row. Intentionally carries no excerpt field: ratio
/// tables are exempt from source linking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinancialRatio {
    #[schemars(description = "Ratio name, e.g. 'Current ratio'")]
    pub name: String,

    #[schemars(description = "Computed value as a decimal number")]
    pub value: f64,

    #[schemars(description = "Short interpretation of the ratio")]
    pub commentary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinancialsAnalysis {
    #[schemars(description = "Overall summary of the company's financial performance")]
    pub overview: String,

    #[schemars(description = "EXACT verbatim quote from the filing supporting the overview")]
    pub overview_excerpt: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(skip)]
    pub overview_excerpt_id: Option<String>,

    #[schemars(description = "Revenue for the period")]
    pub revenue: MetricTrend,

    #[schemars(description = "Net income for the period")]
    pub net_income: MetricTrend,

    #[schemars(description = "The most decision-relevant findings, as prose")]
    pub key_insights: String,

    #[schemars(description = "EXACT verbatim quote from the filing supporting the key insights")]
    pub key_insights_excerpt: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(skip)]
    pub key_insights_excerpt_id: Option<String>,

    #[schemars(description = "Financial ratios computed from the statements. Empty if none.")]
    pub ratios: Vec<FinancialRatio>,
}

impl FinancialsAnalysis {
    pub fn from_llm_json(raw: &Value) -> Result<Self> {
        let v = require_object(Topic::Financials, raw)?;

        let ratios = object_entries(v, "ratios")
            .into_iter()
            .filter_map(|entry| {
                let name = coerce_text(field(entry, "name"), "");
                if is_placeholder(&name) {
                    return None;
                }
                Some(FinancialRatio {
                    name,
                    value: coerce_number(field(entry, "value"), 0.0),
                    commentary: coerce_text(field(entry, "commentary"), TEXT_DEFAULT),
                })
            })
            .collect();

        Ok(Self {
            overview: coerce_text(field(v, "overview"), TEXT_DEFAULT),
            overview_excerpt: coerce_excerpt(field(v, "overviewExcerpt"), NO_EXCERPT),
            overview_excerpt_id: None,
            revenue: MetricTrend::from_llm_json(field(v, "revenue")),
            net_income: MetricTrend::from_llm_json(field(v, "netIncome")),
            key_insights: coerce_text(field(v, "keyInsights"), TEXT_DEFAULT),
            key_insights_excerpt: coerce_excerpt(field(v, "keyInsightsExcerpt"), NO_EXCERPT),
            key_insights_excerpt_id: None,
            ratios,
        })
    }

    /// Ratio rows are deliberately not visited: they carry no excerpts.
    pub fn visit_excerpts(&mut self, visitor: &mut dyn ExcerptVisitor) {
        visitor.visit(&self.overview_excerpt, &mut self.overview_excerpt_id);
        visitor.visit(&self.revenue.excerpt, &mut self.revenue.excerpt_id);
        visitor.visit(&self.net_income.excerpt, &mut self.net_income.excerpt_id);
        visitor.visit(&self.key_insights_excerpt, &mut self.key_insights_excerpt_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_input_is_fully_defaulted() {
        let analysis = FinancialsAnalysis::from_llm_json(&json!({})).unwrap();
        assert_eq!(analysis.overview, TEXT_DEFAULT);
        assert_eq!(analysis.overview_excerpt, NO_EXCERPT);
        assert_eq!(analysis.revenue.amount, "N/A");
        assert_eq!(analysis.revenue.direction, TrendDirection::NotDisclosed);
        assert_eq!(analysis.net_income.change_percent, "N/A");
        assert!(analysis.ratios.is_empty());
        assert!(analysis.overview_excerpt_id.is_none());
    }

    #[test]
    fn test_malformed_monetary_field_coerces_to_na() {
        let analysis = FinancialsAnalysis::from_llm_json(&json!({
            "revenue": {"amount": "seven million dollars", "direction": "increased"}
        }))
        .unwrap();
        assert_eq!(analysis.revenue.amount, "N/A");
        assert_eq!(analysis.revenue.direction, TrendDirection::Increased);
    }

    #[test]
    fn test_unrecognized_direction_falls_back() {
        let analysis = FinancialsAnalysis::from_llm_json(&json!({
            "revenue": {"amount": "$7.8 billion", "direction": "skyrocketed"}
        }))
        .unwrap();
        assert_eq!(analysis.revenue.direction, TrendDirection::NotDisclosed);
        assert_eq!(analysis.revenue.amount, "$7.8 billion");
    }

    #[test]
    fn test_placeholder_ratio_rows_are_dropped() {
        let analysis = FinancialsAnalysis::from_llm_json(&json!({
            "ratios": [
                {"name": "Current ratio", "value": 1.8},
                {"name": "None reported", "value": 0},
                "None reported"
            ]
        }))
        .unwrap();
        assert_eq!(analysis.ratios.len(), 1);
        assert_eq!(analysis.ratios[0].name, "Current ratio");
        assert_eq!(analysis.ratios[0].value, 1.8);
    }

    #[test]
    fn test_validation_is_idempotent() {
        let first = FinancialsAnalysis::from_llm_json(&json!({
            "overview": "Strong year.",
            "overviewExcerpt": "Revenue increased 2% to $7.8 billion.",
            "revenue": {"amount": "$7.8 billion", "changePercent": "2%", "direction": "increased"}
        }))
        .unwrap();
        let reserialized = serde_json::to_value(&first).unwrap();
        let second = FinancialsAnalysis::from_llm_json(&reserialized).unwrap();
        assert_eq!(first, second);
    }
}
