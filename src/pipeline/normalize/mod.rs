#[cfg(test)]
mod tests;

use fancy_regex::Regex;
use std::sync::LazyLock;

/// Number of questions in a challenge
pub const CHALLENGE_QUESTION_COUNT: usize = 3;

// Bullets, then one of: a numbered "Q"/"Question" label ("Q1:", "Question 2."),
// a bare label followed by a colon ("Q:"), or a plain number ("3)").
// A bare label before other punctuation is part of the question ("Q-learning").
static QUESTION_PREFIX_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[\s\-*•]*(?:(?i:q(?:uestion)?)\s*\d+\s*[:.)\-]\s*|(?i:q(?:uestion)?)\s*:\s*|\d+\s*[.)\-:]?\s*)?",
    )
    .expect("valid regex")
});

/// Turn raw model output into at most three clean questions.
///
/// Only lines containing `?` survive. Enumeration is stripped and every
/// question ends in exactly one `?`. Fewer than three is returned as is.
#[inline]
pub fn normalize_questions(raw: &str) -> Vec<String> {
    raw.lines()
        .filter(|line| line.contains('?'))
        .filter_map(clean_question)
        .take(CHALLENGE_QUESTION_COUNT)
        .collect()
}

fn clean_question(line: &str) -> Option<String> {
    let body = match QUESTION_PREFIX_REGEX.find(line) {
        Ok(Some(prefix)) => &line[prefix.end()..],
        _ => line,
    };

    let body = body
        .trim()
        .trim_end_matches(|c: char| c == '?' || c == '*' || c.is_whitespace());

    if body.is_empty() {
        None
    } else {
        Some(format!("{}?", body))
    }
}
