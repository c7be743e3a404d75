use super::*;
use crate::ErrorKind;
use crate::embeddings::testing::HashingEmbedder;
use crate::embeddings::{ChunkUnit, ChunkingConfig, segment_text};
use crate::generation::testing::{FnBackend, instant_generator};
use crate::generation::{GenerationError, GenerationErrorKind};
use crate::index::VectorIndex;
use std::sync::Arc;

const TWO_PAGES: &str = "--- Page 1 ---\nThe sky is blue.\n\n--- Page 2 ---\nWater is wet.";

fn two_page_index() -> Index {
    let segments = segment_text(
        TWO_PAGES,
        &ChunkingConfig {
            chunk_size: 8,
            chunk_overlap: 0,
            unit: ChunkUnit::Tokens,
        },
    );
    VectorIndex::new(Some(Arc::new(HashingEmbedder::new(512))))
        .build(segments)
        .expect("index should build")
}

fn pipeline(backend: &Arc<FnBackend>) -> RetrievalPipeline {
    RetrievalPipeline::new(instant_generator(backend.clone()), RetrievalConfig::default())
}

#[test]
fn truncate_context_counts_characters() {
    assert_eq!(truncate_context("short", 10), "short");
    assert_eq!(truncate_context("exactly", 7), "exactly");
    assert_eq!(truncate_context("abcdef", 3), "abc...");
    assert_eq!(truncate_context("héllo wörld", 5), "héllo...");
    assert_eq!(truncate_context("anything", 0), "...");
}

#[test]
fn reference_label_with_and_without_page() {
    let mut segment = two_page_index().segments()[1].clone();
    segment.page = Some(2);
    segment.index = 1;
    assert_eq!(reference_label(&segment), "[Reference: Page 2, segment 1]");

    segment.page = None;
    assert_eq!(reference_label(&segment), "[Reference: segment 1]");
}

#[test]
fn answer_appends_reference_to_top_hit() {
    let backend = FnBackend::new(|_| Ok("The sky is blue.".to_string()));
    let index = two_page_index();

    let answer = pipeline(&backend)
        .answer(&index, "What color is the sky?")
        .expect("answer");

    assert!(answer.starts_with("The sky is blue."));
    assert!(answer.ends_with("[Reference: Page 1, segment 0]"));

    let request = &backend.requests()[0];
    assert_eq!(request.max_tokens, QA_MAX_TOKENS);
    assert!((request.temperature - QA_TEMPERATURE).abs() < f32::EPSILON);
    assert!(request.prompt.contains("Question: What color is the sky?"));
    assert!(request.prompt.contains("The sky is blue."));
}

#[test]
fn answer_without_reference_when_disabled() {
    let backend = FnBackend::new(|_| Ok("Blue.".to_string()));
    let retrieval = RetrievalConfig {
        append_reference: false,
        ..RetrievalConfig::default()
    };
    let pipeline = RetrievalPipeline::new(instant_generator(backend), retrieval);

    let answer = pipeline
        .answer(&two_page_index(), "What color is the sky?")
        .expect("answer");
    assert_eq!(answer, "Blue.");
}

#[test]
fn summary_uses_budget_and_truncated_context() {
    let backend = FnBackend::new(|_| Ok("A short summary.".to_string()));
    let index = two_page_index();

    let summary = pipeline(&backend).summarize(&index, 2).expect("summary");
    assert_eq!(summary, "A short summary.");

    let request = &backend.requests()[0];
    assert_eq!(request.max_tokens, summary_token_budget(2));
    assert!((request.temperature - SUMMARY_TEMPERATURE).abs() < f32::EPSILON);
    // 2 words allow 20 characters of context
    assert!(request.prompt.contains("--- Page 1 ---\nThe s...\n"));
    assert!(request.prompt.contains("EXACTLY 2 words"));
}

#[test]
fn challenge_output_is_normalized() {
    let backend = FnBackend::new(|_| {
        Ok("Here you go:\n1. What color is the sky??\n2) What is wet\n3- Is water wet?\n4. Extra?"
            .to_string())
    });

    let questions = pipeline(&backend)
        .generate_questions(&two_page_index())
        .expect("questions");
    assert_eq!(questions, vec!["What color is the sky?", "Is water wet?", "Extra?"]);

    let request = &backend.requests()[0];
    assert_eq!(request.max_tokens, CHALLENGE_MAX_TOKENS);
    assert!((request.temperature - CHALLENGE_TEMPERATURE).abs() < f32::EPSILON);
}

#[test]
fn evaluation_is_returned_verbatim() {
    let backend = FnBackend::new(|request| {
        assert!(request.prompt.contains("User's answer: Blue"));
        Ok("Correct: page 1 says the sky is blue.".to_string())
    });

    let feedback = pipeline(&backend)
        .evaluate_answer(&two_page_index(), "What color is the sky?", "Blue")
        .expect("feedback");
    assert_eq!(feedback, "Correct: page 1 says the sky is blue.");
    assert_eq!(backend.requests()[0].max_tokens, EVALUATION_MAX_TOKENS);
}

#[test]
fn generation_failure_surfaces_as_generation_error() {
    let backend = FnBackend::new(|_| {
        Err(GenerationError::new(
            GenerationErrorKind::Unconfigured,
            "no key",
        ))
    });

    let err = pipeline(&backend)
        .answer(&two_page_index(), "anything?")
        .expect_err("backend fails");
    assert_eq!(err.kind(), ErrorKind::Generation);
    assert_eq!(backend.requests().len(), 1);
}
