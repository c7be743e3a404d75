use super::*;

#[test]
fn summary_detail_follows_target() {
    assert_eq!(SummaryDetail::for_target(10), SummaryDetail::Concise);
    assert_eq!(SummaryDetail::for_target(200), SummaryDetail::Concise);
    assert_eq!(SummaryDetail::for_target(201), SummaryDetail::Detailed);
    assert_eq!(SummaryDetail::for_target(400), SummaryDetail::Detailed);
    assert_eq!(SummaryDetail::for_target(401), SummaryDetail::Comprehensive);
}

#[test]
fn summary_prompt_asks_for_exact_word_count() {
    let prompt = summary_prompt("The sky is blue.", 150);
    assert!(prompt.contains("concise summary"));
    assert!(prompt.contains("EXACTLY 150 words"));
    assert!(prompt.contains("- Write exactly 150 words"));
    assert!(prompt.contains("The sky is blue."));
    assert!(!prompt.contains('{'));

    let prompt = summary_prompt("text", 800);
    assert!(prompt.contains("comprehensive summary"));
    assert!(prompt.contains("clear sections"));
}

#[test]
fn answer_prompt_includes_question_and_context() {
    let prompt = answer_prompt("[Page 1, segment 0]\nThe sky is blue.", "What color is the sky?");
    assert!(prompt.contains("ONLY the document excerpts"));
    assert!(prompt.contains("[Page 1, segment 0]\nThe sky is blue."));
    assert!(prompt.contains("Question: What color is the sky?"));
}

#[test]
fn challenge_prompt_asks_for_three_unnumbered_questions() {
    let prompt = challenge_prompt("Water is wet.");
    assert!(prompt.contains("exactly 3 questions"));
    assert!(prompt.contains("Do not number"));
    assert!(prompt.contains("Water is wet."));
}

#[test]
fn evaluation_prompt_marks_missing_answer() {
    let prompt = evaluation_prompt("ctx", "What is wet?", "  ");
    assert!(prompt.contains("User's answer: (no answer given)"));

    let prompt = evaluation_prompt("ctx", "What is wet?", "Water");
    assert!(prompt.contains("Question: What is wet?\nUser's answer: Water"));
}

#[test]
fn braces_in_user_text_survive() {
    let prompt = answer_prompt("fn main() { {question} }", "Why use {context} here?");
    assert!(prompt.contains("fn main() { {question} }"));
    assert!(prompt.contains("Question: Why use {context} here?"));
}

#[test]
fn unknown_placeholders_are_kept() {
    assert_eq!(fill("a {b} {c}", &[("c", "x")]), "a {b} x");
    assert_eq!(fill("{", &[]), "{");
}
