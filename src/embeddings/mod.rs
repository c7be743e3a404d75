// Embeddings module
// Segmentation plus the embedding providers an index can be bound to

pub mod chunking;
pub mod local;
pub mod ollama;

#[cfg(test)]
pub(crate) mod testing;

use anyhow::Result;
use std::sync::Arc;

use crate::config::{EmbeddingConfig, EmbeddingProviderKind};

pub use chunking::{
    ChunkUnit, ChunkingConfig, Segment, estimate_token_count, reconstruct_text, segment_text,
};
pub use local::{LOCAL_MODEL_DIMENSION, LOCAL_MODEL_NAME, LocalModelEmbedder};
pub use ollama::{EmbeddingResult, OllamaClient};

/// A source of fixed-dimension text embeddings.
///
/// Implementations are blocking and must be safe to share between threads.
pub trait Embedder: Send + Sync + std::fmt::Debug {
    /// Short identifier used in logs and reference output
    fn name(&self) -> &str;

    /// Dimension of every vector this provider returns
    fn dimension(&self) -> usize;

    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    #[inline]
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }

    /// Whether an empty query produces a meaningful ranking.
    /// When false, empty-query searches fall back to document order.
    #[inline]
    fn ranks_empty_query(&self) -> bool {
        false
    }
}

/// Build the provider selected by configuration; `None` means retrieval without vectors
#[inline]
pub fn build_embedder(config: &EmbeddingConfig) -> Result<Option<Arc<dyn Embedder>>> {
    let embedder: Option<Arc<dyn Embedder>> = match config.provider {
        EmbeddingProviderKind::Local => Some(Arc::new(LocalModelEmbedder::new()?)),
        EmbeddingProviderKind::Remote => Some(Arc::new(OllamaClient::new(config)?)),
        EmbeddingProviderKind::None => None,
    };
    Ok(embedder)
}
