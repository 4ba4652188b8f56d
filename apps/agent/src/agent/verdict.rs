//! The normalized final verdict. Normalization is total: whatever the model
//! returned — wrong types, missing fields, junk enum values — every field ends
//! up populated with a deterministic fallback.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Cap on list-typed verdict fields.
pub const MAX_LIST_ITEMS: usize = 6;

const FALLBACK_SUMMARY: &str = "The model did not produce a reliable summary for this review.";
const FALLBACK_STRENGTH: &str = "The resume has a usable foundation to build on.";
const FALLBACK_WEAKNESS: &str = "There is room to improve alignment with the target job.";
const FALLBACK_ACTION: &str = "Revise the resume with ATS screening in mind.";
const FALLBACK_STRUCTURE_REWRITE: &str =
    "Tighten the professional summary around a clear objective and role keywords.";
const FALLBACK_EXPERIENCE_REWRITE: &str =
    "Rewrite experience entries with action verbs and measurable results.";
const FALLBACK_SKILLS_REWRITE: &str =
    "Prioritize skills that match the target job and remove redundant ones.";

/// How likely the resume is to be filtered out by an applicant tracking
/// system. Unknown raw values normalize to `Medium`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl RiskLevel {
    fn from_raw(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "low" => Self::Low,
            "medium" => Self::Medium,
            "high" => Self::High,
            _ => Self::Medium,
        }
    }
}

/// One rewrite suggestion per fixed resume section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionRewrites {
    pub structure: String,
    pub experience: String,
    pub skills: String,
}

/// The fully-populated review verdict handed back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalVerdict {
    pub summary: String,
    pub ats_risk: RiskLevel,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub section_rewrites: SectionRewrites,
    pub next_actions: Vec<String>,
}

impl FinalVerdict {
    /// Coerces the loosely-typed model output into a complete verdict.
    /// `fallback_actions` come from the `prioritize_actions` tool result and
    /// back the `next_actions` field when the model supplied nothing usable.
    pub fn from_model_output(raw: &Map<String, Value>, fallback_actions: &[String]) -> Self {
        let summary =
            string_field(raw, "summary").unwrap_or_else(|| FALLBACK_SUMMARY.to_string());

        let ats_risk = raw
            .get("ats_risk")
            .and_then(Value::as_str)
            .map(RiskLevel::from_raw)
            .unwrap_or_default();

        let strengths = string_list(raw.get("strengths"), || vec![FALLBACK_STRENGTH.to_string()]);
        let weaknesses =
            string_list(raw.get("weaknesses"), || vec![FALLBACK_WEAKNESS.to_string()]);
        let next_actions = string_list(raw.get("next_actions"), || {
            if fallback_actions.is_empty() {
                vec![FALLBACK_ACTION.to_string()]
            } else {
                fallback_actions
                    .iter()
                    .take(MAX_LIST_ITEMS)
                    .cloned()
                    .collect()
            }
        });

        let rewrites = match raw.get("section_rewrites") {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        };
        let section_rewrites = SectionRewrites {
            structure: string_field(&rewrites, "structure")
                .unwrap_or_else(|| FALLBACK_STRUCTURE_REWRITE.to_string()),
            experience: string_field(&rewrites, "experience")
                .unwrap_or_else(|| FALLBACK_EXPERIENCE_REWRITE.to_string()),
            skills: string_field(&rewrites, "skills")
                .unwrap_or_else(|| FALLBACK_SKILLS_REWRITE.to_string()),
        };

        Self {
            summary,
            ats_risk,
            strengths,
            weaknesses,
            section_rewrites,
            next_actions,
        }
    }
}

/// A trimmed, non-blank string field, if present.
fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Filters an optional array down to non-empty strings, capped at
/// [`MAX_LIST_ITEMS`]; anything else (or an empty result) takes the fallback.
fn string_list(value: Option<&Value>, fallback: impl FnOnce() -> Vec<String>) -> Vec<String> {
    let items = match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .take(MAX_LIST_ITEMS)
            .collect::<Vec<_>>(),
        _ => Vec::new(),
    };
    if items.is_empty() {
        fallback()
    } else {
        items
    }
}
