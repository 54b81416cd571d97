use crate::coerce::{
    coerce_date, coerce_enum, coerce_excerpt, coerce_text, field, is_placeholder, object_entries,
    NO_EXCERPT, TEXT_DEFAULT,
};
use crate::error::Result;
use crate::excerpt::ExcerptVisitor;
use crate::topics::{canonical_or, require_object, Topic};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum ChangeType {
    Appointed,
    Resigned,
    Retired,
    #[schemars(description = "Use for any other board or officer change")]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DirectorChange {
    #[schemars(description = "Full name of the director or officer")]
    pub name: String,

    #[schemars(description = "Board or officer role, e.g. 'Chief Financial Officer'")]
    pub role: String,

    #[schemars(description = "Nature of the change")]
    pub change_type: ChangeType,

    #[schemars(description = "Effective date in YYYY-MM-DD form, or 'N/A' if not stated")]
    pub effective_date: String,

    #[schemars(description = "EXACT verbatim quote from the filing describing this change")]
    pub excerpt: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(skip)]
    pub excerpt_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DirectorsAnalysis {
    #[schemars(description = "Summary of board composition and governance changes")]
    pub summary: String,

    #[schemars(description = "EXACT verbatim quote supporting the summary")]
    pub summary_excerpt: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(skip)]
    pub summary_excerpt_id: Option<String>,

    #[schemars(description = "Individual board/officer changes. Empty if none occurred.")]
    pub changes: Vec<DirectorChange>,

    #[schemars(description = "Notable compensation disclosures, or 'None reported.'")]
    pub compensation_notes: String,
}

impl DirectorsAnalysis {
    pub fn from_llm_json(raw: &Value) -> Result<Self> {
        let v = require_object(Topic::Directors, raw)?;

        let changes = object_entries(v, "changes")
            .into_iter()
            .filter_map(|entry| {
                let name = coerce_text(field(entry, "name"), "");
                if is_placeholder(&name) {
                    return None;
                }
                Some(DirectorChange {
                    name,
                    role: coerce_text(field(entry, "role"), TEXT_DEFAULT),
                    change_type: coerce_enum(field(entry, "changeType"), ChangeType::Other),
                    effective_date: coerce_date(field(entry, "effectiveDate")),
                    excerpt: coerce_excerpt(field(entry, "excerpt"), NO_EXCERPT),
                    excerpt_id: None,
                })
            })
            .collect();

        Ok(Self {
            summary: coerce_text(field(v, "summary"), TEXT_DEFAULT),
            summary_excerpt: coerce_excerpt(field(v, "summaryExcerpt"), NO_EXCERPT),
            summary_excerpt_id: None,
            changes,
            compensation_notes: canonical_or(
                coerce_text(field(v, "compensationNotes"), TEXT_DEFAULT),
                "None reported.",
            ),
        })
    }

    pub fn visit_excerpts(&mut self, visitor: &mut dyn ExcerptVisitor) {
        visitor.visit(&self.summary_excerpt, &mut self.summary_excerpt_id);
        for change in &mut self.changes {
            visitor.visit(&change.excerpt, &mut change.excerpt_id);
        }
    }
}
