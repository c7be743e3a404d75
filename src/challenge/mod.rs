// Challenge engine
// Comprehension questions for a document, their answers and feedback


use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::index::Index;
use crate::pipeline::RetrievalPipeline;
use crate::{AssistantError, ErrorKind, Result};

/// Placeholder prefix recorded when feedback could not be generated
pub const FEEDBACK_UNAVAILABLE: &str = "Feedback unavailable";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionState {
    Generated,
    Answered,
    Evaluated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChallengeQuestion {
    pub text: String,
    pub state: QuestionState,
    pub last_answer: Option<String>,
    pub feedback: Option<String>,
}

impl ChallengeQuestion {
    #[inline]
    pub fn new(text: String) -> Self {
        Self {
            text,
            state: QuestionState::Generated,
            last_answer: None,
            feedback: None,
        }
    }

    /// Record an answer and its feedback. Re-answering an evaluated question
    /// replaces both and leaves it evaluated.
    #[inline]
    pub fn record_evaluation(&mut self, answer: String, feedback: String) {
        self.last_answer = Some(answer);
        self.state = QuestionState::Answered;
        self.feedback = Some(feedback);
        self.state = QuestionState::Evaluated;
    }

    /// Record an answer whose evaluation failed. An unevaluated question keeps
    /// the placeholder as feedback; an evaluated one keeps its earlier result.
    #[inline]
    pub fn record_failure(&mut self, answer: String, placeholder: String) {
        if self.state == QuestionState::Evaluated {
            return;
        }
        self.last_answer = Some(answer);
        self.feedback = Some(placeholder);
        self.state = QuestionState::Generated;
    }
}

/// One generated set of questions for a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Challenge {
    id: Uuid,
    questions: Vec<ChallengeQuestion>,
    created_at: DateTime<Utc>,
}

/// Result of evaluating a single question within a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionOutcome {
    pub question_index: usize,
    pub question: String,
    pub answer: String,
    pub feedback: String,
    pub state: QuestionState,
    /// Set when feedback is a placeholder for a failed evaluation
    pub error: Option<ErrorKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchEvaluation {
    pub results: Vec<QuestionOutcome>,
}

impl BatchEvaluation {
    #[inline]
    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| r.error.is_some()).count()
    }
}

impl Challenge {
    #[inline]
    pub fn new(questions: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            questions: questions.into_iter().map(ChallengeQuestion::new).collect(),
            created_at: Utc::now(),
        }
    }

    /// Generate a fresh challenge from the document behind `index`
    #[inline]
    pub fn generate(pipeline: &RetrievalPipeline, index: &Index) -> Result<Self> {
        let questions = pipeline.generate_questions(index)?;
        if questions.is_empty() {
            warn!("Model output contained no usable questions");
        }
        Ok(Self::new(questions))
    }

    /// Identifies this generation; a regenerated challenge gets a new id
    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[inline]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[inline]
    pub fn questions(&self) -> &[ChallengeQuestion] {
        &self.questions
    }

    #[inline]
    pub fn question_texts(&self) -> Vec<String> {
        self.questions.iter().map(|q| q.text.clone()).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[inline]
    pub fn question(&self, index: usize) -> Result<&ChallengeQuestion> {
        self.questions.get(index).ok_or_else(|| self.out_of_range(index))
    }

    fn question_mut(&mut self, index: usize) -> Result<&mut ChallengeQuestion> {
        if index >= self.questions.len() {
            return Err(self.out_of_range(index));
        }
        Ok(&mut self.questions[index])
    }

    fn out_of_range(&self, index: usize) -> AssistantError {
        AssistantError::NotFound(format!(
            "Question {} does not exist; the challenge has {} questions",
            index,
            self.questions.len()
        ))
    }

    #[inline]
    pub fn record_evaluation(
        &mut self,
        index: usize,
        answer: String,
        feedback: String,
    ) -> Result<()> {
        self.question_mut(index)?.record_evaluation(answer, feedback);
        Ok(())
    }

    /// One answer per question, with missing answers as empty strings
    #[inline]
    pub fn align_answers(&self, mut answers: Vec<String>) -> Result<Vec<String>> {
        if answers.len() > self.questions.len() {
            return Err(AssistantError::Validation(format!(
                "Received {} answers for {} questions",
                answers.len(),
                self.questions.len()
            )));
        }
        answers.resize(self.questions.len(), String::new());
        Ok(answers)
    }

    /// Apply per-question evaluation results. A failure only affects its own question.
    #[inline]
    pub fn apply_batch(
        &mut self,
        answers: Vec<String>,
        results: Vec<Result<String>>,
    ) -> BatchEvaluation {
        let mut outcomes = Vec::with_capacity(self.questions.len());

        for (i, ((question, answer), result)) in self
            .questions
            .iter_mut()
            .zip(answers)
            .zip(results)
            .enumerate()
        {
            let (feedback, error) = match result {
                Ok(feedback) => {
                    question.record_evaluation(answer.clone(), feedback.clone());
                    (feedback, None)
                }
                Err(e) => {
                    warn!("Evaluation of question {} failed: {}", i, e);
                    let placeholder = format!("{}: {}", FEEDBACK_UNAVAILABLE, e);
                    question.record_failure(answer.clone(), placeholder.clone());
                    (placeholder, Some(e.kind()))
                }
            };

            outcomes.push(QuestionOutcome {
                question_index: i,
                question: question.text.clone(),
                answer,
                feedback,
                state: question.state,
                error,
            });
        }

        debug!("Applied batch evaluation of {} questions", outcomes.len());
        BatchEvaluation { results: outcomes }
    }
}
