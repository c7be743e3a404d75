use super::*;

#[test]
fn enumeration_and_bullets_are_stripped() {
    let raw = "1. What color is the sky?\n2- Why is water wet?\n3) Who wrote it?";
    assert_eq!(
        normalize_questions(raw),
        vec![
            "What color is the sky?",
            "Why is water wet?",
            "Who wrote it?"
        ]
    );

    let raw = "- What is Rust?\n* What is Cargo?\n• What is a crate?";
    assert_eq!(
        normalize_questions(raw),
        vec!["What is Rust?", "What is Cargo?", "What is a crate?"]
    );

    let raw = "Q1: What is a borrow?\nQuestion 2. What is a move?\n**3. What is a trait?**";
    assert_eq!(
        normalize_questions(raw),
        vec!["What is a borrow?", "What is a move?", "What is a trait?"]
    );
}

#[test]
fn exactly_one_trailing_question_mark() {
    let raw = "What is the main idea??\nWhat happens next ? ?  \nIs it blue";
    assert_eq!(
        normalize_questions(raw),
        vec!["What is the main idea?", "What happens next?"]
    );
}

#[test]
fn non_question_lines_are_dropped() {
    let raw = "Here are three questions:\n\n1. What is the topic?\nThanks for reading.";
    assert_eq!(normalize_questions(raw), vec!["What is the topic?"]);
}

#[test]
fn empty_questions_are_dropped() {
    let raw = "1. ?\n- ??\nWhat remains?";
    assert_eq!(normalize_questions(raw), vec!["What remains?"]);
}

#[test]
fn at_most_three_and_never_padded() {
    let raw = "A?\nB?\nC?\nD?\nE?";
    assert_eq!(normalize_questions(raw), vec!["A?", "B?", "C?"]);
    assert!(normalize_questions("No questions here.").is_empty());
    assert!(normalize_questions("").is_empty());
}

#[test]
fn question_mark_inside_line_is_kept() {
    let raw = "2. Why? Explain what the author argues?";
    assert_eq!(
        normalize_questions(raw),
        vec!["Why? Explain what the author argues?"]
    );
}

#[test]
fn bare_label_with_colon_is_stripped() {
    let raw = "Q: What is a borrow?\nQuestion: What is a move?\nQ3) What is a trait?";
    assert_eq!(
        normalize_questions(raw),
        vec!["What is a borrow?", "What is a move?", "What is a trait?"]
    );
}

#[test]
fn words_starting_with_q_are_kept() {
    let raw = "Q-learning uses what reward?\nQuestion-answering systems need what data?\nQuestions about the text?";
    assert_eq!(
        normalize_questions(raw),
        vec![
            "Q-learning uses what reward?",
            "Question-answering systems need what data?",
            "Questions about the text?"
        ]
    );

    let raw = "- Qatar: where is it?";
    assert_eq!(normalize_questions(raw), vec!["Qatar: where is it?"]);
}
