//! Candidate answer extraction and normalization.
//!
//! Workers mark their final answer as `{{answer}}` in free text, e.g.
//! `The answer is {{42}}.` The last marked value wins.

use std::sync::LazyLock;

use regex::Regex;

/// Matches `{{ value }}`; the value may not contain braces.
static ANSWER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([^{}]+?)\s*\}\}").expect("ANSWER_RE regex should compile")
});

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([+-])?(\d+)(?:\.(\d+))?$").expect("NUMBER_RE regex should compile")
});

/// Extract the last `{{...}}` value from `content`, normalized.
pub fn extract_answer(content: &str) -> Option<String> {
    ANSWER_RE
        .captures_iter(content)
        .last()
        .and_then(|caps| caps.get(1))
        .and_then(|m| normalize_answer(m.as_str()))
}

/// Normalize a candidate answer so equal values compare equal.
///
/// Numbers lose thousands separators, a leading `+`, and trailing
/// fractional zeros (`"1,200.50"` → `"1200.5"`, `"72.0"` → `"72"`).
/// Other strings are whitespace-collapsed and lowercased.
pub fn normalize_answer(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let compact: String = trimmed.chars().filter(|c| *c != ',').collect();
    if let Some(caps) = NUMBER_RE.captures(&compact) {
        let negative = caps.get(1).is_some_and(|m| m.as_str() == "-");
        let int = caps
            .get(2)
            .map(|m| m.as_str().trim_start_matches('0'))
            .unwrap_or_default();
        let int = if int.is_empty() { "0" } else { int };
        let frac = caps
            .get(3)
            .map(|m| m.as_str().trim_end_matches('0'))
            .unwrap_or_default();

        let mut number = String::new();
        if negative && !(int == "0" && frac.is_empty()) {
            number.push('-');
        }
        number.push_str(int);
        if !frac.is_empty() {
            number.push('.');
            number.push_str(frac);
        }
        return Some(number);
    }

    Some(
        trimmed
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase(),
    )
}
