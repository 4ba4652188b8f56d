// All LLM prompt constants for the agent pipeline. Both phases share one
// system prompt; the per-phase instructions ride in the user message.

/// Shared system prompt — enforces JSON-only output for both phases.
pub const SYSTEM_PROMPT: &str = "You are a meticulous resume reviewer helping a \
    candidate tailor their resume to a specific job opening. \
    You reason from the analysis tool results you are given and never invent \
    facts about the candidate. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Planning-phase instructions, appended after the tool catalogue and context.
pub const TOOL_SELECTION_PROMPT: &str = r#"Decide which of the available tools should run to analyze this resume against the job description.

Return a JSON object with this EXACT schema (no extra fields):
{
  "tool_calls": [
    {"name": "extract_keywords", "arguments": {"job_description": "...", "max_keywords": 20}}
  ]
}

Rules:
- Propose at most 6 tool calls.
- Use only tool names from the catalogue above, with arguments matching each tool's declared inputs.
- Take argument values from the context verbatim; do not paraphrase the job description.
- Propose an empty list if no tool applies: {"tool_calls": []}"#;

/// Final-phase instructions, appended after the context and tool results.
pub const FINAL_RESPONSE_PROMPT: &str = r#"Write the final resume review verdict from the tool results above.

Return a JSON object with this EXACT schema (no extra fields):
{
  "summary": "2-3 sentence overall assessment of the resume against this job",
  "ats_risk": "low",
  "strengths": ["up to 6 short strings"],
  "weaknesses": ["up to 6 short strings"],
  "section_rewrites": {
    "structure": "one concrete rewrite suggestion for the resume structure",
    "experience": "one concrete rewrite suggestion for the experience section",
    "skills": "one concrete rewrite suggestion for the skills section"
  },
  "next_actions": ["up to 6 short, ordered, concrete actions"]
}

Rules:
- "ats_risk" is exactly one of "low", "medium", "high".
- Ground every point in the tool results (compatibility score, missing keywords, section scores, prioritized actions).
- Keep every list entry a single plain-text sentence."#;
