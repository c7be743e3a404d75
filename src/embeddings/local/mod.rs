
use anyhow::Result;
use fastembed::{EmbeddingModel, TextEmbedding, TextInitOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

use super::Embedder;

/// Sentence embedding model run in-process
pub const LOCAL_MODEL_NAME: &str = "all-MiniLM-L6-v2";
/// Output dimension of [`LOCAL_MODEL_NAME`]
pub const LOCAL_MODEL_DIMENSION: usize = 384;

const APP_CACHE_DIR_NAME: &str = "docs-qa";
const FALLBACK_CACHE_DIR: &str = ".fastembed_cache";

/// Embedder running all-MiniLM-L6-v2 through ONNX Runtime.
///
/// The model files are downloaded into the cache directory on first use.
pub struct LocalModelEmbedder {
    model: Mutex<TextEmbedding>,
    cache_dir: PathBuf,
}

impl std::fmt::Debug for LocalModelEmbedder {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalModelEmbedder")
            .field("model", &LOCAL_MODEL_NAME)
            .field("cache_dir", &self.cache_dir)
            .finish_non_exhaustive()
    }
}

impl LocalModelEmbedder {
    /// Load the model from the user cache directory
    #[inline]
    pub fn new() -> Result<Self> {
        Self::with_cache_dir(default_cache_dir())
    }

    #[inline]
    pub fn with_cache_dir(cache_dir: PathBuf) -> Result<Self> {
        info!(
            "Loading local embedding model {} from {}",
            LOCAL_MODEL_NAME,
            cache_dir.display()
        );

        let options = TextInitOptions::new(EmbeddingModel::AllMiniLML6V2)
            .with_cache_dir(cache_dir.clone())
            .with_show_download_progress(false);
        let model = TextEmbedding::try_new(options).map_err(|e| {
            anyhow::anyhow!(
                "Failed to load local embedding model {}: {}",
                LOCAL_MODEL_NAME,
                e
            )
        })?;

        Ok(Self {
            model: Mutex::new(model),
            cache_dir,
        })
    }

    #[inline]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }
}

impl Embedder for LocalModelEmbedder {
    #[inline]
    fn name(&self) -> &str {
        LOCAL_MODEL_NAME
    }

    #[inline]
    fn dimension(&self) -> usize {
        LOCAL_MODEL_DIMENSION
    }

    #[inline]
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("Local embedding model returned no vectors"))
    }

    #[inline]
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let vectors = {
            let mut model = self
                .model
                .lock()
                .map_err(|_| anyhow::anyhow!("Local embedding model lock poisoned"))?;
            model.embed(texts, None)
        }
        .map_err(|e| anyhow::anyhow!("Local embedding failed: {}", e))?;

        if vectors.len() != texts.len() {
            return Err(anyhow::anyhow!(
                "Mismatch between request and response counts: {} vs {}",
                texts.len(),
                vectors.len()
            ));
        }

        debug!("Embedded {} texts with {}", texts.len(), LOCAL_MODEL_NAME);
        Ok(vectors)
    }
}

/// `<user cache dir>/docs-qa/models`, or `.fastembed_cache` when there is no cache dir
fn default_cache_dir() -> PathBuf {
    dirs::cache_dir().map_or_else(
        || PathBuf::from(FALLBACK_CACHE_DIR),
        |dir| dir.join(APP_CACHE_DIR_NAME).join("models"),
    )
}
