use crate::coerce::{
    coerce_enum, coerce_excerpt, coerce_monetary, coerce_text, field, is_placeholder,
    object_entries, NO_DIRECT_EXCERPT, NO_EXCERPT, TEXT_DEFAULT,
};
use crate::error::Result;
use crate::excerpt::ExcerptVisitor;
use crate::topics::{canonical_or, require_object, Topic};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum NoteworthyType {
    OneTimeCharge,
    AccountingChange,
    LegalMatter,
    Acquisition,
    #[schemars(description = "Use when no listed type fits")]
    Other,
}

/// One unusual item called out in management's discussion. Each item carries
/// its own excerpt, so source linking works per item, not once per list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoteworthyItem {
    #[schemars(description = "What happened, in one or two sentences")]
    pub description: String,

    #[schemars(description = "Kind of item")]
    pub item_type: NoteworthyType,

    #[schemars(description = "Monetary impact as written in the filing, or 'N/A'")]
    pub monetary_impact: String,

    #[schemars(
        description = "EXACT verbatim quote from the MD&A describing this item, or 'No direct excerpt found.'"
    )]
    pub excerpt: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(skip)]
    pub excerpt_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MdnaAnalysis {
    #[schemars(description = "Summary of management's discussion and analysis")]
    pub summary: String,

    #[schemars(description = "EXACT verbatim quote supporting the summary")]
    pub summary_excerpt: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(skip)]
    pub summary_excerpt_id: Option<String>,

    #[schemars(description = "Management's stated outlook for coming periods")]
    pub outlook: String,

    #[schemars(description = "EXACT verbatim quote supporting the outlook")]
    pub outlook_excerpt: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(skip)]
    pub outlook_excerpt_id: Option<String>,

    #[schemars(description = "Discussion of liquidity and capital resources, or 'Not discussed.'")]
    pub liquidity_discussion: String,

    #[schemars(description = "Unusual or one-off items management highlighted. Empty if none.")]
    pub noteworthy_items: Vec<NoteworthyItem>,
}

impl MdnaAnalysis {
    pub fn from_llm_json(raw: &Value) -> Result<Self> {
        let v = require_object(Topic::Mdna, raw)?;

        let noteworthy_items = object_entries(v, "noteworthyItems")
            .into_iter()
            .filter_map(|entry| {
                let description = coerce_text(field(entry, "description"), "");
                if is_placeholder(&description) {
                    return None;
                }
                Some(NoteworthyItem {
                    description,
                    item_type: coerce_enum(field(entry, "itemType"), NoteworthyType::Other),
                    monetary_impact: coerce_monetary(field(entry, "monetaryImpact")),
                    excerpt: coerce_excerpt(field(entry, "excerpt"), NO_DIRECT_EXCERPT),
                    excerpt_id: None,
                })
            })
            .collect();

        Ok(Self {
            summary: coerce_text(field(v, "summary"), TEXT_DEFAULT),
            summary_excerpt: coerce_excerpt(field(v, "summaryExcerpt"), NO_EXCERPT),
            summary_excerpt_id: None,
            outlook: coerce_text(field(v, "outlook"), TEXT_DEFAULT),
            outlook_excerpt: coerce_excerpt(field(v, "outlookExcerpt"), NO_EXCERPT),
            outlook_excerpt_id: None,
            liquidity_discussion: canonical_or(
                coerce_text(field(v, "liquidityDiscussion"), TEXT_DEFAULT),
                "Not discussed.",
            ),
            noteworthy_items,
        })
    }

    pub fn visit_excerpts(&mut self, visitor: &mut dyn ExcerptVisitor) {
        visitor.visit(&self.summary_excerpt, &mut self.summary_excerpt_id);
        visitor.visit(&self.outlook_excerpt, &mut self.outlook_excerpt_id);
        for item in &mut self.noteworthy_items {
            visitor.visit(&item.excerpt, &mut item.excerpt_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_input_uses_canonical_phrases() {
        let analysis = MdnaAnalysis::from_llm_json(&json!({})).unwrap();
        assert_eq!(analysis.liquidity_discussion, "Not discussed.");
        assert_eq!(analysis.summary_excerpt, NO_EXCERPT);
        assert!(analysis.noteworthy_items.is_empty());
    }

    #[test]
    fn test_noteworthy_item_excerpt_defaults_per_item() {
        let analysis = MdnaAnalysis::from_llm_json(&json!({
            "noteworthyItems": [
                {"description": "Goodwill impairment.", "itemType": "oneTimeCharge",
                 "monetaryImpact": "$120 million", "excerpt": "We recorded a goodwill impairment charge."},
                {"description": "Restated lease accounting.", "itemType": "accountingChange",
                 "excerpt": ""},
                {"description": "None reported"}
            ]
        }))
        .unwrap();
        assert_eq!(analysis.noteworthy_items.len(), 2);
        assert_eq!(
            analysis.noteworthy_items[0].excerpt,
            "We recorded a goodwill impairment charge."
        );
        assert_eq!(analysis.noteworthy_items[1].excerpt, NO_DIRECT_EXCERPT);
        assert_eq!(analysis.noteworthy_items[1].monetary_impact, "N/A");
    }

    #[test]
    fn test_unknown_item_type_falls_back_to_other() {
        let analysis = MdnaAnalysis::from_llm_json(&json!({
            "noteworthyItems": [{"description": "Spin-off.", "itemType": "divestiture"}]
        }))
        .unwrap();
        assert_eq!(analysis.noteworthy_items[0].item_type, NoteworthyType::Other);
    }
}
