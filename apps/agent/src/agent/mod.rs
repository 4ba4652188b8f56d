//! Agent orchestrator — the two-phase, tool-augmented review pipeline.
//!
//! One invocation runs exactly once through
//! sanitize → plan → execute tools → enforce required tools → finalize →
//! normalize. There is no retry loop and no state is revisited; the only
//! fatal error is a failed chat round-trip.

pub mod prompts;
pub mod verdict;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::config::{AgentConfig, SamplingParameters};
use crate::llm_client::{extract_json, ChatError, ChatMessage, ChatTransport};
use crate::sanitize::{sanitize_skills, sanitize_text, MAX_TEXT_CHARS};
use crate::tools::{self, MetricRow, SectionMetrics, ToolCall, ToolResult};

use self::verdict::FinalVerdict;

/// Hard cap on model-proposed tool calls per invocation; calls beyond it are
/// silently dropped.
pub const MAX_TOOL_CALLS: usize = 6;

const MAX_NAME_CHARS: usize = 120;
const MAX_AREA_CHARS: usize = 120;
const MAX_TITLE_CHARS: usize = 180;
const MAX_LABEL_CHARS: usize = 120;
const MAX_RATING_CHARS: usize = 40;
const MAX_COMMENT_CHARS: usize = 300;

/// Caller-provided review inputs, as received from the API layer. Raw —
/// sanitization happens inside [`run_agent`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRequest {
    pub candidate_name: String,
    pub area: String,
    pub resume_skills: Vec<String>,
    pub section_metrics: SectionMetrics,
    pub job_title: String,
    pub job_description: String,
}

/// Sanitized snapshot of the request — the only form that ever reaches a
/// prompt.
#[derive(Debug, Clone, Serialize)]
struct AgentContext {
    candidate_name: String,
    area: String,
    resume_skills: Vec<String>,
    section_metrics: SectionMetrics,
    job_title: String,
    job_description: String,
}

impl AgentContext {
    fn from_request(request: &AgentRequest) -> Self {
        Self {
            candidate_name: sanitize_text(&request.candidate_name, MAX_NAME_CHARS),
            area: sanitize_text(&request.area, MAX_AREA_CHARS),
            resume_skills: sanitize_skills(&request.resume_skills),
            section_metrics: sanitize_metrics(&request.section_metrics),
            job_title: sanitize_text(&request.job_title, MAX_TITLE_CHARS),
            job_description: sanitize_text(&request.job_description, MAX_TEXT_CHARS),
        }
    }
}

fn sanitize_metrics(metrics: &SectionMetrics) -> SectionMetrics {
    metrics
        .iter()
        .map(|(section, rows)| {
            let rows = rows
                .iter()
                .map(|row| MetricRow {
                    label: sanitize_text(&row.label, MAX_LABEL_CHARS),
                    score: row.score,
                    rating: sanitize_text(&row.rating, MAX_RATING_CHARS),
                    comment: sanitize_text(&row.comment, MAX_COMMENT_CHARS),
                })
                .collect();
            (sanitize_text(section, MAX_LABEL_CHARS), rows)
        })
        .collect()
}

/// Composite result of one agent invocation, `Serialize`-able so the API
/// layer can return it as-is.
#[derive(Debug, Clone, Serialize)]
pub struct AgentReport {
    pub model: String,
    pub parameters: SamplingParameters,
    /// Raw (best-effort parsed) planning-phase JSON, kept for transparency.
    pub planning: Map<String, Value>,
    /// Ordered tool executions; the four mandatory tools always appear here
    /// with successful outputs.
    pub tool_results: Vec<ToolResult>,
    #[serde(rename = "final")]
    pub verdict: FinalVerdict,
}

/// Runs the full review pipeline once. Returns `Err` only when the chat
/// endpoint cannot be reached; every other failure mode degrades to defaults.
pub async fn run_agent<T>(
    transport: &T,
    config: &AgentConfig,
    request: &AgentRequest,
) -> Result<AgentReport, ChatError>
where
    T: ChatTransport + ?Sized,
{
    let context = AgentContext::from_request(request);
    let context_json = serde_json::to_string(&context)?;

    let planning_messages = [
        ChatMessage::system(prompts::SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Available tools:\n{}\n\nContext:\n{}\n\n{}",
            tools::tool_catalog(),
            context_json,
            prompts::TOOL_SELECTION_PROMPT,
        )),
    ];
    let planning_raw = transport.chat(config, &planning_messages).await?;
    let planning = extract_json(&planning_raw);
    if planning.is_empty() {
        warn!("planning reply carried no parseable JSON; only mandatory tools will run");
    }

    let tool_calls = parse_tool_calls(&planning);
    if tool_calls.len() > MAX_TOOL_CALLS {
        warn!(
            dropped = tool_calls.len() - MAX_TOOL_CALLS,
            "plan exceeded the tool-call cap"
        );
    }
    debug!(proposed = tool_calls.len(), "executing planned tool calls");

    let mut tool_results: Vec<ToolResult> = tool_calls
        .iter()
        .take(MAX_TOOL_CALLS)
        .map(tools::execute)
        .collect();
    ensure_required_tools(&mut tool_results, &context);

    let results_json = serde_json::to_string(&tool_results)?;
    let final_messages = [
        ChatMessage::system(prompts::SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Base context:\n{}\n\nTool results:\n{}\n\n{}",
            context_json, results_json, prompts::FINAL_RESPONSE_PROMPT,
        )),
    ];
    let final_raw = transport.chat(config, &final_messages).await?;
    let final_json = extract_json(&final_raw);
    if final_json.is_empty() {
        warn!("final reply carried no parseable JSON; verdict falls back to defaults");
    }

    let fallback_actions = tool_output(&tool_results, "prioritize_actions")
        .map(|output| lenient_strings(output.get("actions")))
        .unwrap_or_default();
    let verdict = FinalVerdict::from_model_output(&final_json, &fallback_actions);

    Ok(AgentReport {
        model: config.model.clone(),
        parameters: config.sampling(),
        planning,
        tool_results,
        verdict,
    })
}

/// Lenient read of the planned `tool_calls` list: absent or malformed means
/// an empty plan — planning never blocks the pipeline.
fn parse_tool_calls(planning: &Map<String, Value>) -> Vec<ToolCall> {
    planning
        .get("tool_calls")
        .cloned()
        .and_then(|value| serde_json::from_value::<Vec<ToolCall>>(value).ok())
        .unwrap_or_default()
}

/// First successful output recorded for `name`, if any. Deliberately
/// permissive: any object output satisfies the check, its shape is not
/// re-validated.
fn tool_output<'a>(results: &'a [ToolResult], name: &str) -> Option<&'a Map<String, Value>> {
    results
        .iter()
        .filter(|result| result.tool == name)
        .find_map(|result| result.output())
}

fn lenient_strings(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn lenient_scores(value: Option<&Value>) -> BTreeMap<String, i64> {
    match value {
        Some(Value::Object(map)) => map
            .iter()
            .filter_map(|(key, value)| value.as_i64().map(|score| (key.clone(), score)))
            .collect(),
        _ => BTreeMap::new(),
    }
}

/// Guarantees the final prompt always has the complete analytical substrate:
/// each mandatory tool missing a successful result is synthesized in fixed
/// dependency order, chaining arguments from the outputs computed before it.
fn ensure_required_tools(results: &mut Vec<ToolResult>, context: &AgentContext) {
    if tool_output(results, "extract_keywords").is_none() {
        debug!("plan skipped extract_keywords; running it directly");
        let report =
            tools::extract_keywords(&context.job_description, tools::DEFAULT_MAX_KEYWORDS);
        let arguments = json!({
            "job_description": &context.job_description,
            "max_keywords": tools::DEFAULT_MAX_KEYWORDS,
        });
        results.push(ToolResult::ok(
            "extract_keywords",
            arguments,
            tools::to_output(&report),
        ));
    }
    let job_keywords = tool_output(results, "extract_keywords")
        .map(|output| lenient_strings(output.get("keywords")))
        .unwrap_or_default();

    if tool_output(results, "keyword_gap_analysis").is_none() {
        debug!("plan skipped keyword_gap_analysis; running it directly");
        let report = tools::keyword_gap_analysis(&context.resume_skills, &job_keywords);
        let arguments = json!({
            "resume_skills": &context.resume_skills,
            "job_keywords": &job_keywords,
        });
        results.push(ToolResult::ok(
            "keyword_gap_analysis",
            arguments,
            tools::to_output(&report),
        ));
    }

    if tool_output(results, "section_score_summary").is_none() {
        debug!("plan skipped section_score_summary; running it directly");
        let report = tools::section_score_summary(&context.section_metrics);
        let arguments = json!({ "section_metrics": &context.section_metrics });
        results.push(ToolResult::ok(
            "section_score_summary",
            arguments,
            tools::to_output(&report),
        ));
    }

    if tool_output(results, "prioritize_actions").is_none() {
        debug!("plan skipped prioritize_actions; running it directly");
        let missing = tool_output(results, "keyword_gap_analysis")
            .map(|output| lenient_strings(output.get("missing")))
            .unwrap_or_default();
        let section_scores = tool_output(results, "section_score_summary")
            .map(|output| lenient_scores(output.get("section_scores")))
            .unwrap_or_default();
        let report = tools::prioritize_actions(&missing, &section_scores);
        let arguments = json!({
            "missing_keywords": missing,
            "section_scores": section_scores,
        });
        results.push(ToolResult::ok(
            "prioritize_actions",
            arguments,
            tools::to_output(&report),
        ));
    }
}
