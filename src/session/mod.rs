// Document store
// Owns uploaded documents, their indexes and challenges, and runs pipeline work off the runtime


use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::challenge::{BatchEvaluation, Challenge};
use crate::config::Config;
use crate::embeddings::{ChunkingConfig, build_embedder, segment_text};
use crate::extractor::{DocumentType, extract};
use crate::generation::ResilientGenerator;
use crate::index::{Index, VectorIndex};
use crate::pipeline::RetrievalPipeline;
use crate::{AssistantError, ErrorKind, Result};

/// Accepted range for the requested summary length, in words
pub const SUMMARY_WORD_RANGE: RangeInclusive<u32> = 10..=1000;

/// Whether an upload's summary was produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SummaryOutcome {
    Generated { text: String },
    Unavailable { kind: ErrorKind, message: String },
}

impl SummaryOutcome {
    #[inline]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Generated { text } => Some(text),
            Self::Unavailable { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadResponse {
    pub document_id: Uuid,
    pub summary: SummaryOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AskResponse {
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChallengeResponse {
    pub questions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationResponse {
    pub feedback: String,
}

/// Metadata about a stored document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub document_id: Uuid,
    pub filename: String,
    pub document_type: DocumentType,
    pub uploaded_at: DateTime<Utc>,
    pub characters: usize,
    pub segment_count: usize,
    pub provider: String,
    pub indexed_at: DateTime<Utc>,
    pub has_challenge: bool,
}

#[derive(Debug)]
struct DocumentEntry {
    id: Uuid,
    filename: String,
    document_type: DocumentType,
    text: Arc<str>,
    uploaded_at: DateTime<Utc>,
    index: RwLock<Arc<Index>>,
    challenge: RwLock<Option<Challenge>>,
}

impl DocumentEntry {
    async fn current_index(&self) -> Arc<Index> {
        Arc::clone(&*self.index.read().await)
    }

    async fn summary(&self) -> DocumentSummary {
        let index = self.current_index().await;
        let has_challenge = self.challenge.read().await.is_some();
        DocumentSummary {
            document_id: self.id,
            filename: self.filename.clone(),
            document_type: self.document_type,
            uploaded_at: self.uploaded_at,
            characters: self.text.chars().count(),
            segment_count: index.len(),
            provider: index.provider_name().to_string(),
            indexed_at: index.built_at(),
            has_challenge,
        }
    }
}

/// In-memory registry of uploaded documents.
///
/// Every operation is async; extraction, embedding and generation run on the
/// blocking pool. Indexes and challenges are replaced whole, so concurrent
/// readers always see a complete value.
#[derive(Debug)]
pub struct DocumentStore {
    documents: RwLock<HashMap<Uuid, Arc<DocumentEntry>>>,
    index_builder: VectorIndex,
    chunking: ChunkingConfig,
    pipeline: Arc<RetrievalPipeline>,
    max_upload_bytes: usize,
}

impl DocumentStore {
    #[inline]
    pub fn new(
        pipeline: RetrievalPipeline,
        index_builder: VectorIndex,
        chunking: ChunkingConfig,
    ) -> Self {
        let max_upload_bytes = pipeline.retrieval().max_upload_bytes;
        Self {
            documents: RwLock::new(HashMap::new()),
            index_builder,
            chunking,
            pipeline: Arc::new(pipeline),
            max_upload_bytes,
        }
    }

    /// Store wired to the configured embedding provider and chat backend.
    /// The configuration is validated first.
    #[inline]
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let embedder = build_embedder(&config.embeddings)?;
        let generator = ResilientGenerator::from_config(&config.generation)?;
        let pipeline = RetrievalPipeline::new(generator, config.retrieval.clone());

        Ok(Self::new(
            pipeline,
            VectorIndex::new(embedder),
            config.chunking.clone(),
        ))
    }

    /// Extract, segment and index a file, then summarize it.
    ///
    /// Once the index is built the document is registered; a failed summary is
    /// reported in the response instead of failing the upload.
    #[inline]
    pub async fn upload(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        summary_word_target: u32,
    ) -> Result<UploadResponse> {
        validate_summary_target(summary_word_target)?;
        let document_id = self.ingest(bytes, filename).await?;

        let summary = match self.summarize(document_id, summary_word_target).await {
            Ok(text) => SummaryOutcome::Generated { text },
            Err(e) => {
                warn!("Summary for document {} unavailable: {}", document_id, e);
                SummaryOutcome::Unavailable {
                    kind: e.kind(),
                    message: e.to_string(),
                }
            }
        };

        Ok(UploadResponse {
            document_id,
            summary,
        })
    }

    /// Extract, segment and index a file and register it, without summarizing
    #[inline]
    pub async fn ingest(&self, bytes: Vec<u8>, filename: &str) -> Result<Uuid> {
        let document_type = DocumentType::from_filename(filename)?;
        self.validate_upload(&bytes)?;

        info!(
            "Processing upload {} ({} bytes, {})",
            filename,
            bytes.len(),
            document_type
        );

        let builder = self.index_builder.clone();
        let chunking = self.chunking.clone();
        let (text, index) = run_blocking(move || {
            let text = extract(&bytes, document_type)?;
            drop(bytes);

            if text.trim().is_empty() {
                return Err(AssistantError::Validation(
                    "Document contains no text".to_string(),
                ));
            }

            let segments = segment_text(&text, &chunking);
            let index = builder.build(segments)?;
            Ok((text, index))
        })
        .await?;

        let id = Uuid::new_v4();
        let segment_count = index.len();
        let entry = Arc::new(DocumentEntry {
            id,
            filename: filename.to_string(),
            document_type,
            text: Arc::from(text),
            uploaded_at: Utc::now(),
            index: RwLock::new(Arc::new(index)),
            challenge: RwLock::new(None),
        });

        self.documents.write().await.insert(id, entry);
        info!("Registered document {} with {} segments", id, segment_count);
        Ok(id)
    }

    /// Summarize a stored document in about `target_words` words
    #[inline]
    pub async fn summarize(&self, document_id: Uuid, target_words: u32) -> Result<String> {
        validate_summary_target(target_words)?;
        let index = self.entry(document_id).await?.current_index().await;
        let pipeline = Arc::clone(&self.pipeline);

        run_blocking(move || pipeline.summarize(&index, target_words)).await
    }

    fn validate_upload(&self, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() {
            return Err(AssistantError::Validation("Uploaded file is empty".to_string()));
        }

        if bytes.len() > self.max_upload_bytes {
            return Err(AssistantError::Validation(format!(
                "File is {} bytes, the limit is {} bytes",
                bytes.len(),
                self.max_upload_bytes
            )));
        }

        Ok(())
    }

    /// Answer a free-form question about a document
    #[inline]
    pub async fn ask(&self, document_id: Uuid, question: &str) -> Result<AskResponse> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AssistantError::Validation(
                "Question must not be empty".to_string(),
            ));
        }

        let index = self.entry(document_id).await?.current_index().await;
        let pipeline = Arc::clone(&self.pipeline);
        let question = question.to_string();

        debug!("Answering question for document {}", document_id);
        let answer = run_blocking(move || pipeline.answer(&index, &question)).await?;
        Ok(AskResponse { answer })
    }

    /// Generate a new challenge, replacing any existing one
    #[inline]
    pub async fn generate_challenges(&self, document_id: Uuid) -> Result<ChallengeResponse> {
        let entry = self.entry(document_id).await?;
        let index = entry.current_index().await;
        let pipeline = Arc::clone(&self.pipeline);

        let challenge = run_blocking(move || Challenge::generate(&pipeline, &index)).await?;
        let questions = challenge.question_texts();

        *entry.challenge.write().await = Some(challenge);
        info!(
            "Stored {} challenge questions for document {}",
            questions.len(),
            document_id
        );

        Ok(ChallengeResponse { questions })
    }

    /// Evaluate one answer to the current challenge
    #[inline]
    pub async fn evaluate(
        &self,
        document_id: Uuid,
        question_index: usize,
        answer: &str,
    ) -> Result<EvaluationResponse> {
        let entry = self.entry(document_id).await?;

        let (challenge_id, question) = {
            let guard = entry.challenge.read().await;
            let challenge = current_challenge(guard.as_ref(), document_id)?;
            (
                challenge.id(),
                challenge.question(question_index)?.text.clone(),
            )
        };

        let index = entry.current_index().await;
        let pipeline = Arc::clone(&self.pipeline);
        let answer = answer.to_string();
        let recorded_answer = answer.clone();

        let feedback =
            run_blocking(move || pipeline.evaluate_answer(&index, &question, &answer)).await?;

        let mut guard = entry.challenge.write().await;
        match guard.as_mut() {
            Some(challenge) if challenge.id() == challenge_id => {
                challenge.record_evaluation(question_index, recorded_answer, feedback.clone())?;
            }
            _ => debug!("Challenge for document {} was replaced during evaluation", document_id),
        }

        Ok(EvaluationResponse { feedback })
    }

    /// Evaluate answers to every question concurrently.
    ///
    /// Missing answers count as empty. A failed evaluation only affects its own question.
    #[inline]
    pub async fn evaluate_all(
        &self,
        document_id: Uuid,
        answers: Vec<String>,
    ) -> Result<BatchEvaluation> {
        let entry = self.entry(document_id).await?;

        let snapshot = {
            let guard = entry.challenge.read().await;
            current_challenge(guard.as_ref(), document_id)?.clone()
        };
        let answers = snapshot.align_answers(answers)?;
        let index = entry.current_index().await;

        let tasks = snapshot
            .questions()
            .iter()
            .zip(&answers)
            .map(|(question, answer)| {
                let pipeline = Arc::clone(&self.pipeline);
                let index = Arc::clone(&index);
                let question = question.text.clone();
                let answer = answer.clone();
                run_blocking(move || pipeline.evaluate_answer(&index, &question, &answer))
            });
        let results = join_all(tasks).await;

        let mut guard = entry.challenge.write().await;
        let batch = match guard.as_mut() {
            Some(challenge) if challenge.id() == snapshot.id() => {
                challenge.apply_batch(answers, results)
            }
            _ => {
                debug!("Challenge for document {} was replaced during evaluation", document_id);
                let mut detached = snapshot;
                detached.apply_batch(answers, results)
            }
        };

        info!(
            "Evaluated {} answers for document {} ({} failed)",
            batch.results.len(),
            document_id,
            batch.failed()
        );
        Ok(batch)
    }

    /// Re-segment and re-embed a document with `builder`, swapping the index in
    /// only when the whole build succeeds
    #[inline]
    pub async fn reindex(&self, document_id: Uuid, builder: VectorIndex) -> Result<DocumentSummary> {
        let entry = self.entry(document_id).await?;
        let text = Arc::clone(&entry.text);
        let chunking = self.chunking.clone();

        let index = run_blocking(move || builder.build(segment_text(&text, &chunking))).await?;

        *entry.index.write().await = Arc::new(index);
        info!("Rebuilt index for document {}", document_id);
        Ok(entry.summary().await)
    }

    #[inline]
    pub async fn delete_document(&self, document_id: Uuid) -> Result<()> {
        let removed = self.documents.write().await.remove(&document_id);
        match removed {
            Some(_) => {
                info!("Deleted document {}", document_id);
                Ok(())
            }
            None => Err(not_found(document_id)),
        }
    }

    #[inline]
    pub async fn document(&self, document_id: Uuid) -> Result<DocumentSummary> {
        Ok(self.entry(document_id).await?.summary().await)
    }

    /// All documents, oldest upload first
    #[inline]
    pub async fn list_documents(&self) -> Vec<DocumentSummary> {
        let entries: Vec<Arc<DocumentEntry>> =
            self.documents.read().await.values().cloned().collect();

        let mut summaries = Vec::with_capacity(entries.len());
        for entry in entries {
            summaries.push(entry.summary().await);
        }
        summaries.sort_by_key(|s| s.uploaded_at);
        summaries
    }

    async fn entry(&self, document_id: Uuid) -> Result<Arc<DocumentEntry>> {
        self.documents
            .read()
            .await
            .get(&document_id)
            .cloned()
            .ok_or_else(|| not_found(document_id))
    }
}

fn validate_summary_target(target_words: u32) -> Result<()> {
    if SUMMARY_WORD_RANGE.contains(&target_words) {
        return Ok(());
    }
    Err(AssistantError::Validation(format!(
        "Summary length must be between {} and {} words, got {}",
        SUMMARY_WORD_RANGE.start(),
        SUMMARY_WORD_RANGE.end(),
        target_words
    )))
}

fn not_found(document_id: Uuid) -> AssistantError {
    AssistantError::NotFound(format!("Document {} does not exist", document_id))
}

fn current_challenge(challenge: Option<&Challenge>, document_id: Uuid) -> Result<&Challenge> {
    challenge.ok_or_else(|| {
        AssistantError::NotFound(format!(
            "No challenge has been generated for document {}",
            document_id
        ))
    })
}

/// Run blocking pipeline work on the blocking pool; a panic becomes an internal error
async fn run_blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AssistantError::Other(anyhow::anyhow!("Background task failed: {}", e)))?
}
