//! Input cleansing. Everything the caller hands us is free text from an
//! upload pipeline; it gets trimmed, stripped of control characters, and
//! bounded before it is ever embedded in a prompt.

/// Longest single text field (job descriptions) kept in the prompt context.
pub const MAX_TEXT_CHARS: usize = 8000;
/// Longest individual skill token.
pub const MAX_SKILL_CHARS: usize = 60;
/// Ceiling on the skill list after de-duplication.
pub const MAX_SKILLS: usize = 60;

/// Trims, strips C0 control characters (tab, newline, and carriage return are
/// kept), and truncates to `max_chars` characters. Total — always returns a
/// string, possibly empty.
pub fn sanitize_text(value: &str, max_chars: usize) -> String {
    value
        .trim()
        .chars()
        .filter(|c| !is_stripped_control(*c))
        .take(max_chars)
        .collect()
}

fn is_stripped_control(c: char) -> bool {
    matches!(c, '\u{00}'..='\u{08}' | '\u{0b}' | '\u{0c}' | '\u{0e}'..='\u{1f}')
}

/// Sanitizes each skill to at most [`MAX_SKILL_CHARS`], drops empties,
/// de-duplicates case-insensitively preserving first-seen order, and caps the
/// list at [`MAX_SKILLS`] so prompts stay bounded.
pub fn sanitize_skills(values: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut clean = Vec::new();
    for value in values {
        let token = sanitize_text(value, MAX_SKILL_CHARS);
        if token.is_empty() {
            continue;
        }
        if seen.insert(token.to_lowercase()) {
            clean.push(token);
        }
        if clean.len() == MAX_SKILLS {
            break;
        }
    }
    clean
}
