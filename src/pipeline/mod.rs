// Retrieval pipeline
// Retrieval, prompt assembly and generation for summaries, answers and challenges

pub mod normalize;
pub mod prompts;

#[cfg(test)]
mod tests;

use itertools::Itertools;
use tracing::{debug, info};

use crate::Result;
use crate::config::RetrievalConfig;
use crate::embeddings::{Segment, estimate_token_count, reconstruct_text};
use crate::generation::{
    CHALLENGE_MAX_TOKENS, CHALLENGE_TEMPERATURE, EVALUATION_MAX_TOKENS, EVALUATION_TEMPERATURE,
    QA_MAX_TOKENS, QA_TEMPERATURE, ResilientGenerator, SUMMARY_TEMPERATURE, summary_token_budget,
};
use crate::index::{Index, SearchResult};

pub use normalize::normalize_questions;

/// Characters of summary context allowed per requested word
const CONTEXT_CHARS_PER_WORD: usize = 10;

/// Runs every generation task against an [`Index`]
#[derive(Debug, Clone)]
pub struct RetrievalPipeline {
    generator: ResilientGenerator,
    retrieval: RetrievalConfig,
}

impl RetrievalPipeline {
    #[inline]
    pub fn new(generator: ResilientGenerator, retrieval: RetrievalConfig) -> Self {
        Self {
            generator,
            retrieval,
        }
    }

    #[inline]
    pub fn retrieval(&self) -> &RetrievalConfig {
        &self.retrieval
    }

    /// Summarize the opening of the document in about `target_words` words
    #[inline]
    pub fn summarize(&self, index: &Index, target_words: u32) -> Result<String> {
        let opening = reconstruct_text(index.leading(self.retrieval.summary_segments));
        let limit = self
            .retrieval
            .max_context_chars
            .min(target_words as usize * CONTEXT_CHARS_PER_WORD);
        let context = truncate_context(&opening, limit);

        let max_tokens = summary_token_budget(target_words);
        debug!(
            "Summarizing {} context chars (~{} tokens) into {} words, max_tokens {}",
            context.chars().count(),
            estimate_token_count(&context),
            target_words,
            max_tokens
        );

        let prompt = prompts::summary_prompt(&context, target_words);
        let summary = self
            .generator
            .generate(&prompt, max_tokens, SUMMARY_TEMPERATURE)?;

        info!("Generated summary of {} words", summary.split_whitespace().count());
        Ok(summary)
    }

    /// Answer from the segments most similar to the question
    #[inline]
    pub fn answer(&self, index: &Index, question: &str) -> Result<String> {
        let hits = index.search(question, self.retrieval.top_k)?;
        debug!("Answering from {} retrieved segments", hits.len());

        let prompt = prompts::answer_prompt(&render_excerpts(&hits), question);
        let mut answer = self.generator.generate(&prompt, QA_MAX_TOKENS, QA_TEMPERATURE)?;

        if let Some(top) = hits.first().filter(|_| self.retrieval.append_reference) {
            answer.push_str("\n\n");
            answer.push_str(&reference_label(&top.segment));
        }

        Ok(answer)
    }

    /// Ask for three comprehension questions about a representative sample
    #[inline]
    pub fn generate_questions(&self, index: &Index) -> Result<Vec<String>> {
        let sample = index.search("", self.retrieval.challenge_segments)?;
        let prompt = prompts::challenge_prompt(&render_excerpts(&sample));

        let raw = self
            .generator
            .generate(&prompt, CHALLENGE_MAX_TOKENS, CHALLENGE_TEMPERATURE)?;
        let questions = normalize_questions(&raw);

        info!("Generated {} challenge questions", questions.len());
        Ok(questions)
    }

    /// Feedback on `answer`, grounded in segments retrieved for `question`
    #[inline]
    pub fn evaluate_answer(&self, index: &Index, question: &str, answer: &str) -> Result<String> {
        let hits = index.search(question, self.retrieval.top_k)?;
        let prompt = prompts::evaluation_prompt(&render_excerpts(&hits), question, answer);

        Ok(self
            .generator
            .generate(&prompt, EVALUATION_MAX_TOKENS, EVALUATION_TEMPERATURE)?)
    }
}

/// Cut `text` to `max_chars` characters, marking the cut with `...`
#[inline]
pub fn truncate_context(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// `[Reference: Page P, segment S]`, or without the page when it is unknown
#[inline]
pub fn reference_label(segment: &Segment) -> String {
    format!("[Reference: {}]", location(segment))
}

fn location(segment: &Segment) -> String {
    match segment.page {
        Some(page) => format!("Page {}, segment {}", page, segment.index),
        None => format!("segment {}", segment.index),
    }
}

/// Retrieved segments as labelled excerpts
fn render_excerpts(hits: &[SearchResult]) -> String {
    hits.iter()
        .map(|hit| {
            format!(
                "[{}]\n{}",
                location(&hit.segment),
                hit.segment.content.trim()
            )
        })
        .join("\n\n")
}
