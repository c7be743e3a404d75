#[cfg(test)]
mod tests;

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::embeddings::{Embedder, Segment};
use crate::{AssistantError, Result};

/// Builds [`Index`] snapshots with one embedding provider.
///
/// The provider travels with every index it builds, so queries are always
/// embedded the same way as the segments they are compared against.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    embedder: Option<Arc<dyn Embedder>>,
}

/// Immutable snapshot of segments and their embeddings
#[derive(Debug)]
pub struct Index {
    segments: Vec<Segment>,
    /// Parallel to `segments`; empty when there is no embedder
    vectors: Vec<Vec<f32>>,
    embedder: Option<Arc<dyn Embedder>>,
    built_at: DateTime<Utc>,
}

/// Search result from vector similarity search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub segment: Segment,
    pub similarity_score: f32,
}

impl VectorIndex {
    #[inline]
    pub fn new(embedder: Option<Arc<dyn Embedder>>) -> Self {
        Self { embedder }
    }

    #[inline]
    pub fn provider_name(&self) -> &str {
        self.embedder.as_deref().map_or("none", |e| e.name())
    }

    /// Embed every segment and return a complete index, or fail without one
    #[inline]
    pub fn build(&self, segments: Vec<Segment>) -> Result<Index> {
        if segments.is_empty() {
            return Err(AssistantError::Validation(
                "Document produced no segments to index".to_string(),
            ));
        }

        let vectors = match &self.embedder {
            Some(embedder) => embed_segments(embedder.as_ref(), &segments)?,
            None => Vec::new(),
        };

        info!(
            "Built index of {} segments with provider {}",
            segments.len(),
            self.provider_name()
        );

        Ok(Index {
            segments,
            vectors,
            embedder: self.embedder.clone(),
            built_at: Utc::now(),
        })
    }
}

fn embed_segments(embedder: &dyn Embedder, segments: &[Segment]) -> Result<Vec<Vec<f32>>> {
    let texts: Vec<String> = segments.iter().map(|s| s.content.clone()).collect();

    let vectors = embedder.embed_batch(&texts).map_err(|e| {
        error!("Embedding failed while building index: {:#}", e);
        AssistantError::Index(format!("Failed to embed segments: {:#}", e))
    })?;

    if vectors.len() != segments.len() {
        return Err(AssistantError::Index(format!(
            "Provider returned {} embeddings for {} segments",
            vectors.len(),
            segments.len()
        )));
    }

    let dimension = embedder.dimension();
    if let Some((i, vector)) = vectors
        .iter()
        .enumerate()
        .find(|(_, v)| v.len() != dimension)
    {
        return Err(AssistantError::Index(format!(
            "Segment {} has {} dimensions, expected {}",
            i,
            vector.len(),
            dimension
        )));
    }

    Ok(vectors)
}

impl Index {
    /// Return up to `k` segments, best match first.
    ///
    /// A blank query asks for a representative sample: the provider's own ranking
    /// when it supports one, otherwise the first `k` segments in document order.
    #[inline]
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        let k = k.min(self.segments.len());
        if k == 0 {
            return Ok(Vec::new());
        }

        let Some(embedder) = &self.embedder else {
            return Ok(self.in_document_order(k));
        };

        if query.trim().is_empty() && !embedder.ranks_empty_query() {
            debug!("Empty query, returning first {} segments", k);
            return Ok(self.in_document_order(k));
        }

        let query_vector = embedder.embed(query).map_err(|e| {
            AssistantError::Index(format!("Failed to embed query: {:#}", e))
        })?;

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, vector)| (i, cosine_similarity(&query_vector, vector)))
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let results: Vec<SearchResult> = scored
            .into_iter()
            .take(k)
            .map(|(i, score)| SearchResult {
                segment: self.segments[i].clone(),
                similarity_score: score,
            })
            .collect();

        debug!(
            "Search returned {} results (best score {:.3})",
            results.len(),
            results.first().map_or(0.0, |r| r.similarity_score)
        );

        Ok(results)
    }

    fn in_document_order(&self, k: usize) -> Vec<SearchResult> {
        self.segments
            .iter()
            .take(k)
            .map(|segment| SearchResult {
                segment: segment.clone(),
                similarity_score: 0.0,
            })
            .collect()
    }

    /// The first `n` segments in document order
    #[inline]
    pub fn leading(&self, n: usize) -> &[Segment] {
        &self.segments[..n.min(self.segments.len())]
    }

    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    #[inline]
    pub fn provider_name(&self) -> &str {
        self.embedder.as_deref().map_or("none", |e| e.name())
    }

    #[inline]
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }
}

/// Cosine similarity; zero when either vector has no magnitude
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let score = dot / (norm_a * norm_b);
    if score.is_nan() { 0.0 } else { score }
}
