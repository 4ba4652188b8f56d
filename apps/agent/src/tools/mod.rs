//! The four fixed resume-analysis tools, their machine-readable specs, and
//! the closed-enum dispatch the orchestrator drives.
//!
//! Tools are pure and deterministic: same arguments, same output, no side
//! effects. The set is fixed and small, so dispatch is an explicit `match` on
//! [`ToolKind`] rather than an open name→callable registry.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Default keyword budget when the planner does not specify one.
pub const DEFAULT_MAX_KEYWORDS: usize = 20;
/// Sections scoring below this get a rewrite recommendation.
const LOW_SECTION_THRESHOLD: i64 = 70;
/// At most this many missing keywords are bundled into one action.
const MAX_BUNDLED_KEYWORDS: usize = 8;
/// Hard cap on the action plan.
const MAX_ACTIONS: usize = 5;

/// Domain vocabulary that jumps the queue in keyword extraction: technology
/// and process terms recruiters actually filter on.
const PRIORITY_TERMS: &[&str] = &[
    "python",
    "sql",
    "etl",
    "aws",
    "azure",
    "power",
    "tableau",
    "excel",
    "crm",
    "analytics",
    "dashboard",
    "machine",
    "learning",
    "seo",
    "campaigns",
    "prospecting",
    "negotiation",
    "pipeline",
];

/// One row of the resume section-metric table: a labelled score with a
/// qualitative rating and a reviewer comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricRow {
    pub label: String,
    pub score: i64,
    pub rating: String,
    pub comment: String,
}

/// Section name → metric rows. `BTreeMap` keeps iteration (and therefore
/// action ordering and prompt serialization) deterministic.
pub type SectionMetrics = BTreeMap<String, Vec<MetricRow>>;

/// Static descriptor advertised verbatim to the model in the planning prompt.
#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    /// Parameter name → type label, as the model sees it.
    pub input_schema: &'static [(&'static str, &'static str)],
}

pub const TOOL_SPECS: [ToolSpec; 4] = [
    ToolSpec {
        name: "extract_keywords",
        description: "Extracts the most relevant keywords from the job description",
        input_schema: &[("job_description", "string"), ("max_keywords", "integer")],
    },
    ToolSpec {
        name: "keyword_gap_analysis",
        description: "Compares resume skills against job keywords and computes a compatibility score",
        input_schema: &[
            ("resume_skills", "list[string]"),
            ("job_keywords", "list[string]"),
        ],
    },
    ToolSpec {
        name: "section_score_summary",
        description: "Summarizes per-section scores from the resume metrics table",
        input_schema: &[("section_metrics", "dict")],
    },
    ToolSpec {
        name: "prioritize_actions",
        description: "Prioritizes recommendations from keyword gaps and per-section scores",
        input_schema: &[
            ("missing_keywords", "list[string]"),
            ("section_scores", "dict[string,int]"),
        ],
    },
];

/// Renders the tool catalogue block of the planning prompt.
pub fn tool_catalog() -> String {
    TOOL_SPECS
        .iter()
        .map(|spec| {
            let schema: Map<String, Value> = spec
                .input_schema
                .iter()
                .map(|(name, label)| (name.to_string(), Value::String(label.to_string())))
                .collect();
            format!(
                "- {}: {}. Inputs: {}",
                spec.name,
                spec.description,
                Value::Object(schema)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The closed set of analysis tools. All four are mandatory: the orchestrator
/// guarantees each has a successful result before final synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    ExtractKeywords,
    KeywordGapAnalysis,
    SectionScoreSummary,
    PrioritizeActions,
}

impl ToolKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "extract_keywords" => Some(Self::ExtractKeywords),
            "keyword_gap_analysis" => Some(Self::KeywordGapAnalysis),
            "section_score_summary" => Some(Self::SectionScoreSummary),
            "prioritize_actions" => Some(Self::PrioritizeActions),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::ExtractKeywords => "extract_keywords",
            Self::KeywordGapAnalysis => "keyword_gap_analysis",
            Self::SectionScoreSummary => "section_score_summary",
            Self::PrioritizeActions => "prioritize_actions",
        }
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid arguments for tool '{tool}': {source}")]
    InvalidArguments {
        tool: &'static str,
        source: serde_json::Error,
    },
}

/// A model-proposed tool invocation, unvalidated until dispatched.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

/// The outcome half of a [`ToolResult`]: exactly one of `output` or `error`,
/// enforced structurally.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolOutcome {
    Output(Map<String, Value>),
    Error(String),
}

/// A recorded tool execution: the tool name, the arguments actually used, and
/// either its output object or an error string. Serializes to
/// `{"tool": ..., "arguments": ..., "output"|"error": ...}` for the final
/// synthesis prompt.
#[derive(Debug, Clone, Serialize)]
pub struct ToolResult {
    pub tool: String,
    pub arguments: Value,
    #[serde(flatten)]
    pub outcome: ToolOutcome,
}

impl ToolResult {
    pub fn ok(tool: impl Into<String>, arguments: Value, output: Map<String, Value>) -> Self {
        Self {
            tool: tool.into(),
            arguments,
            outcome: ToolOutcome::Output(output),
        }
    }

    pub fn err(tool: impl Into<String>, arguments: Value, error: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            arguments,
            outcome: ToolOutcome::Error(error.into()),
        }
    }

    /// The output object, if this execution succeeded.
    pub fn output(&self) -> Option<&Map<String, Value>> {
        match &self.outcome {
            ToolOutcome::Output(map) => Some(map),
            ToolOutcome::Error(_) => None,
        }
    }
}

/// Executes one model-proposed call. Unknown names and bad arguments are
/// recorded as error results, never propagated — the pipeline must keep going.
pub fn execute(call: &ToolCall) -> ToolResult {
    let arguments = Value::Object(call.arguments.clone());
    let Some(kind) = ToolKind::from_name(&call.name) else {
        return ToolResult::err(&call.name, arguments, "tool_not_found");
    };
    match invoke(kind, &call.arguments) {
        Ok(output) => ToolResult::ok(&call.name, arguments, output),
        Err(e) => ToolResult::err(&call.name, arguments, e.to_string()),
    }
}

/// Dispatches on the closed tool enum with JSON arguments.
pub fn invoke(kind: ToolKind, arguments: &Map<String, Value>) -> Result<Map<String, Value>, ToolError> {
    let args = Value::Object(arguments.clone());
    let output = match kind {
        ToolKind::ExtractKeywords => {
            let args: ExtractKeywordsArgs = parse_args(kind, args)?;
            to_output(&extract_keywords(&args.job_description, args.max_keywords))
        }
        ToolKind::KeywordGapAnalysis => {
            let args: KeywordGapArgs = parse_args(kind, args)?;
            to_output(&keyword_gap_analysis(&args.resume_skills, &args.job_keywords))
        }
        ToolKind::SectionScoreSummary => {
            let args: SectionScoreArgs = parse_args(kind, args)?;
            to_output(&section_score_summary(&args.section_metrics))
        }
        ToolKind::PrioritizeActions => {
            let args: PrioritizeActionsArgs = parse_args(kind, args)?;
            to_output(&prioritize_actions(&args.missing_keywords, &args.section_scores))
        }
    };
    Ok(output)
}

fn parse_args<T: serde::de::DeserializeOwned>(kind: ToolKind, args: Value) -> Result<T, ToolError> {
    serde_json::from_value(args).map_err(|source| ToolError::InvalidArguments {
        tool: kind.name(),
        source,
    })
}

/// Serializes a typed tool report into the output object of a [`ToolResult`].
pub fn to_output<T: Serialize>(report: &T) -> Map<String, Value> {
    match serde_json::to_value(report) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

#[derive(Debug, Deserialize)]
struct ExtractKeywordsArgs {
    job_description: String,
    #[serde(default = "default_max_keywords")]
    max_keywords: usize,
}

fn default_max_keywords() -> usize {
    DEFAULT_MAX_KEYWORDS
}

#[derive(Debug, Deserialize)]
struct KeywordGapArgs {
    resume_skills: Vec<String>,
    job_keywords: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SectionScoreArgs {
    section_metrics: SectionMetrics,
}

#[derive(Debug, Deserialize)]
struct PrioritizeActionsArgs {
    missing_keywords: Vec<String>,
    section_scores: BTreeMap<String, i64>,
}

/// Keywords pulled from a job description, priority vocabulary first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordReport {
    pub keywords: Vec<String>,
}

/// Present/missing partition of job keywords against the resume skill set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GapReport {
    pub present: Vec<String>,
    pub missing: Vec<String>,
    /// `round(100 * |present| / |job_keywords|)`, 0 when there are no keywords.
    pub compatibility: i64,
}

/// Integer-averaged score per resume section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionScores {
    pub section_scores: BTreeMap<String, i64>,
}

/// Ordered, capped list of recommended next actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionPlan {
    pub actions: Vec<String>,
}

/// Lowercase words over `[a-z0-9+-]` longer than two characters, de-duplicated
/// into sorted order.
fn normalize_words(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let words: std::collections::BTreeSet<&str> = lower
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '+' || c == '-'))
        .filter(|w| w.chars().count() > 2)
        .collect();
    words.into_iter().map(str::to_string).collect()
}

/// Tokenizes the job description and reorders so the curated priority terms
/// come first, preserving relative order within each partition, truncated to
/// `max_keywords`.
pub fn extract_keywords(job_description: &str, max_keywords: usize) -> KeywordReport {
    let (mut keywords, rest): (Vec<String>, Vec<String>) = normalize_words(job_description)
        .into_iter()
        .partition(|w| PRIORITY_TERMS.contains(&w.as_str()));
    keywords.extend(rest);
    keywords.truncate(max_keywords);
    KeywordReport { keywords }
}

/// Case-insensitive membership of each job keyword in the resume skill set.
/// Partition order and keyword casing follow `job_keywords`.
pub fn keyword_gap_analysis(resume_skills: &[String], job_keywords: &[String]) -> GapReport {
    let resume_set: HashSet<String> = resume_skills
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    let mut present = Vec::new();
    let mut missing = Vec::new();
    for keyword in job_keywords {
        if resume_set.contains(&keyword.trim().to_lowercase()) {
            present.push(keyword.clone());
        } else {
            missing.push(keyword.clone());
        }
    }

    let compatibility = if job_keywords.is_empty() {
        0
    } else {
        ((present.len() * 100) as f64 / job_keywords.len() as f64).round() as i64
    };

    GapReport {
        present,
        missing,
        compatibility,
    }
}

/// Integer-truncated average of the score column per section, 0 for sections
/// with no rows.
pub fn section_score_summary(section_metrics: &SectionMetrics) -> SectionScores {
    let section_scores = section_metrics
        .iter()
        .map(|(section, rows)| {
            let average = if rows.is_empty() {
                0
            } else {
                rows.iter().map(|row| row.score).sum::<i64>() / rows.len() as i64
            };
            (section.clone(), average)
        })
        .collect();
    SectionScores { section_scores }
}

/// Builds the action plan: rewrite instructions for low-scoring sections
/// first, then one keyword-gap instruction, then a generic maintenance
/// instruction if nothing else fired. Capped at [`MAX_ACTIONS`].
pub fn prioritize_actions(
    missing_keywords: &[String],
    section_scores: &BTreeMap<String, i64>,
) -> ActionPlan {
    let mut actions: Vec<String> = section_scores
        .iter()
        .filter(|(_, score)| **score < LOW_SECTION_THRESHOLD)
        .map(|(section, _)| {
            format!("Rewrite the '{section}' section with a focus on impact and clarity.")
        })
        .collect();

    if !missing_keywords.is_empty() {
        let bundle = missing_keywords
            .iter()
            .take(MAX_BUNDLED_KEYWORDS)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        actions.push(format!("Naturally work in the missing keywords: {bundle}."));
    }

    if actions.is_empty() {
        actions.push(
            "Keep the current structure and fine-tune the wording for the target job.".to_string(),
        );
    }

    actions.truncate(MAX_ACTIONS);
    ActionPlan { actions }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_extract_keywords_priority_terms_come_first() {
        let report = extract_keywords("Python SQL ETL Dashboard", 3);
        assert_eq!(report.keywords, vec!["dashboard", "etl", "python"]);
    }

    #[test]
    fn test_extract_keywords_respects_max() {
        let report = extract_keywords("Build reliable data pipelines with python and airflow", 4);
        assert_eq!(report.keywords.len(), 4);
    }

    #[test]
    fn test_extract_keywords_priority_before_rest() {
        let report = extract_keywords("zeppelin workshop python", 10);
        assert_eq!(report.keywords[0], "python");
        assert!(report.keywords.contains(&"workshop".to_string()));
        assert!(report.keywords.contains(&"zeppelin".to_string()));
    }

    #[test]
    fn test_extract_keywords_drops_short_tokens_and_dedups() {
        let report = extract_keywords("go go SQL sql a b c", 10);
        assert_eq!(report.keywords, vec!["sql"]);
    }

    #[test]
    fn test_extract_keywords_is_deterministic() {
        let a = extract_keywords("Python SQL ETL reporting dashboards", 5);
        let b = extract_keywords("Python SQL ETL reporting dashboards", 5);
        assert_eq!(a.keywords, b.keywords);
    }

    #[test]
    fn test_gap_analysis_partitions_and_scores() {
        let report = keyword_gap_analysis(&strings(&["Python", "SQL"]), &strings(&["Python", "AWS"]));
        assert_eq!(report.present, vec!["Python"]);
        assert_eq!(report.missing, vec!["AWS"]);
        assert_eq!(report.compatibility, 50);
    }

    #[test]
    fn test_gap_analysis_is_case_insensitive() {
        let report = keyword_gap_analysis(&strings(&["python"]), &strings(&["PYTHON"]));
        assert_eq!(report.present, vec!["PYTHON"]);
        assert_eq!(report.compatibility, 100);
    }

    #[test]
    fn test_gap_analysis_empty_keywords_scores_zero() {
        let report = keyword_gap_analysis(&strings(&["Python"]), &[]);
        assert_eq!(report.compatibility, 0);
        assert!(report.present.is_empty());
        assert!(report.missing.is_empty());
    }

    #[test]
    fn test_gap_analysis_compatibility_rounds() {
        // 1 of 3 present → 33.33 → 33; 2 of 3 → 66.67 → 67
        let report = keyword_gap_analysis(&strings(&["a1b"]), &strings(&["a1b", "c2d", "e3f"]));
        assert_eq!(report.compatibility, 33);
        let report = keyword_gap_analysis(&strings(&["a1b", "c2d"]), &strings(&["a1b", "c2d", "e3f"]));
        assert_eq!(report.compatibility, 67);
    }

    fn row(label: &str, score: i64) -> MetricRow {
        MetricRow {
            label: label.to_string(),
            score,
            rating: String::new(),
            comment: String::new(),
        }
    }

    #[test]
    fn test_section_scores_average_and_empty_section() {
        let mut metrics = SectionMetrics::new();
        metrics.insert("a".to_string(), vec![row("x", 80)]);
        metrics.insert("b".to_string(), vec![]);
        let report = section_score_summary(&metrics);
        assert_eq!(report.section_scores["a"], 80);
        assert_eq!(report.section_scores["b"], 0);
    }

    #[test]
    fn test_section_scores_truncate_toward_zero() {
        let mut metrics = SectionMetrics::new();
        metrics.insert("a".to_string(), vec![row("x", 70), row("y", 75)]);
        let report = section_score_summary(&metrics);
        assert_eq!(report.section_scores["a"], 72);
    }

    #[test]
    fn test_prioritize_actions_low_sections_then_keywords() {
        let mut scores = BTreeMap::new();
        scores.insert("experience".to_string(), 55);
        scores.insert("structure".to_string(), 90);
        let plan = prioritize_actions(&strings(&["aws", "sql"]), &scores);
        assert_eq!(plan.actions.len(), 2);
        assert!(plan.actions[0].contains("experience"));
        assert!(plan.actions[1].contains("aws, sql"));
    }

    #[test]
    fn test_prioritize_actions_bundles_at_most_eight_keywords() {
        let missing: Vec<String> = (0..12).map(|i| format!("kw{i}")).collect();
        let plan = prioritize_actions(&missing, &BTreeMap::new());
        assert!(plan.actions[0].contains("kw7"));
        assert!(!plan.actions[0].contains("kw8"));
    }

    #[test]
    fn test_prioritize_actions_falls_back_to_maintenance() {
        let mut scores = BTreeMap::new();
        scores.insert("structure".to_string(), 88);
        let plan = prioritize_actions(&[], &scores);
        assert_eq!(plan.actions.len(), 1);
        assert!(plan.actions[0].contains("Keep the current structure"));
    }

    #[test]
    fn test_prioritize_actions_caps_at_five() {
        let mut scores = BTreeMap::new();
        for i in 0..7 {
            scores.insert(format!("section-{i}"), 10);
        }
        let plan = prioritize_actions(&strings(&["aws"]), &scores);
        assert_eq!(plan.actions.len(), 5);
    }

    #[test]
    fn test_prioritize_actions_is_idempotent() {
        let mut scores = BTreeMap::new();
        scores.insert("skills".to_string(), 40);
        let first = prioritize_actions(&strings(&["etl"]), &scores);
        let second = prioritize_actions(&strings(&["etl"]), &scores);
        assert_eq!(first.actions, second.actions);
    }

    #[test]
    fn test_execute_unknown_tool_records_error() {
        let call = ToolCall {
            name: "launch_rocket".to_string(),
            arguments: Map::new(),
        };
        let result = execute(&call);
        assert!(result.output().is_none());
        assert!(matches!(&result.outcome, ToolOutcome::Error(e) if e.as_str() == "tool_not_found"));
    }

    #[test]
    fn test_execute_bad_arguments_records_error() {
        let call = ToolCall {
            name: "keyword_gap_analysis".to_string(),
            arguments: to_output(&json!({"resume_skills": "not-a-list"})),
        };
        let result = execute(&call);
        assert!(matches!(&result.outcome, ToolOutcome::Error(e) if e.contains("keyword_gap_analysis")));
    }

    #[test]
    fn test_execute_applies_default_max_keywords() {
        let call = ToolCall {
            name: "extract_keywords".to_string(),
            arguments: to_output(&json!({"job_description": "Python SQL ETL"})),
        };
        let result = execute(&call);
        let output = result.output().expect("tool should succeed");
        assert_eq!(output["keywords"], json!(["etl", "python", "sql"]));
    }

    #[test]
    fn test_tool_result_serializes_output_or_error_flat() {
        let ok = ToolResult::ok("extract_keywords", json!({}), to_output(&json!({"keywords": []})));
        let value = serde_json::to_value(&ok).unwrap();
        assert!(value.get("output").is_some());
        assert!(value.get("error").is_none());

        let err = ToolResult::err("nope", json!({}), "tool_not_found");
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["error"], "tool_not_found");
        assert!(value.get("output").is_none());
    }

    #[test]
    fn test_tool_catalog_lists_all_specs() {
        let catalog = tool_catalog();
        for spec in &TOOL_SPECS {
            assert!(catalog.contains(spec.name));
        }
        assert!(catalog.contains("\"job_description\":\"string\""));
    }
}
