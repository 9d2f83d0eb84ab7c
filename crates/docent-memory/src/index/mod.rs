//! Flat vector index over embedded chunks, persisted as a pair of JSON files.

mod flat;
mod persist;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use docent_llm::{LlmProvider, call_with_timeout};
use tokio::sync::RwLock;

use self::flat::FlatIndex;
use crate::document::Chunk;
use crate::error::MemoryError;

pub use self::persist::{CHUNKS_FILE, INDEX_FILE};

const DEFAULT_EMBED_TIMEOUT: Duration = Duration::from_secs(30);

/// Chunks sent per embedding call during `insert`.
pub const DEFAULT_EMBED_BATCH_SIZE: usize = 500;

/// A chunk paired with its embedding, produced before the merge step of `insert`.
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalResult {
    pub chunk: Chunk,
    /// Squared L2 distance to the query; lower is closer.
    pub score: f32,
}

/// `flat` is `None` exactly when `chunks` is empty; row `i` of `flat` embeds `chunks[i]`.
#[derive(Debug, Default)]
struct IndexState {
    chunks: Vec<Chunk>,
    flat: Option<FlatIndex>,
}

pub struct VectorIndex<P> {
    provider: Arc<P>,
    state: RwLock<IndexState>,
    embed_timeout: Duration,
    embed_batch_size: usize,
}

impl<P> std::fmt::Debug for VectorIndex<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorIndex")
            .field("embed_timeout", &self.embed_timeout)
            .field("embed_batch_size", &self.embed_batch_size)
            .finish_non_exhaustive()
    }
}

impl<P: LlmProvider> VectorIndex<P> {
    #[must_use]
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            state: RwLock::new(IndexState::default()),
            embed_timeout: DEFAULT_EMBED_TIMEOUT,
            embed_batch_size: DEFAULT_EMBED_BATCH_SIZE,
        }
    }

    #[must_use]
    pub fn with_embed_timeout(mut self, timeout: Duration) -> Self {
        self.embed_timeout = timeout;
        self
    }

    /// Split `insert` embedding into calls of at most `size` chunks, each under its own timeout.
    #[must_use]
    pub fn with_embed_batch_size(mut self, size: usize) -> Self {
        self.embed_batch_size = size.max(1);
        self
    }

    /// Embed `chunks` and append them. Returns the number of chunks now tracked.
    ///
    /// Nothing is added unless every chunk was embedded.
    ///
    /// # Errors
    ///
    /// Returns `EmptyInput` for an empty batch, the provider error if embedding fails or
    /// times out, and `DimensionMismatch` if the vectors do not fit the existing index.
    pub async fn insert(&self, chunks: Vec<Chunk>) -> Result<usize, MemoryError> {
        if chunks.is_empty() {
            return Err(MemoryError::EmptyInput);
        }

        let embedded = self.embed_chunks(chunks).await?;

        let mut state = self.state.write().await;
        let dimension = match &state.flat {
            Some(flat) => flat.dimension(),
            None => embedded[0].vector.len(),
        };
        if let Some(bad) = embedded.iter().find(|e| e.vector.len() != dimension) {
            return Err(MemoryError::DimensionMismatch {
                expected: dimension,
                actual: bad.vector.len(),
            });
        }

        let state = &mut *state;
        let flat = state.flat.get_or_insert_with(|| FlatIndex::new(dimension));
        for EmbeddedChunk { chunk, vector } in embedded {
            flat.push(&vector)?;
            state.chunks.push(chunk);
        }

        tracing::info!(total = state.chunks.len(), "vector index updated");
        Ok(state.chunks.len())
    }

    async fn embed_chunks(&self, chunks: Vec<Chunk>) -> Result<Vec<EmbeddedChunk>, MemoryError> {
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.embed_batch_size) {
            let embedded =
                call_with_timeout(self.embed_timeout, self.provider.embed_batch(batch)).await?;
            vectors.extend(embedded);
        }
        tracing::debug!(
            chunks = texts.len(),
            batches = texts.len().div_ceil(self.embed_batch_size),
            "chunks embedded"
        );

        if vectors.len() != chunks.len() {
            return Err(MemoryError::EmbeddingCount {
                expected: chunks.len(),
                actual: vectors.len(),
            });
        }
        if vectors.first().is_some_and(Vec::is_empty) {
            return Err(MemoryError::DimensionMismatch {
                expected: 1,
                actual: 0,
            });
        }

        Ok(chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| EmbeddedChunk { chunk, vector })
            .collect())
    }

    /// Up to `k` nearest chunks for `query`. Empty when nothing is indexed.
    ///
    /// # Errors
    ///
    /// Returns the provider error if the query cannot be embedded.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievalResult>, MemoryError> {
        if k == 0 || !self.is_available().await {
            return Ok(Vec::new());
        }
        let vector = call_with_timeout(self.embed_timeout, self.provider.embed(query)).await?;
        self.search_by_vector(&vector, k).await
    }

    /// # Errors
    ///
    /// Returns `DimensionMismatch` if `vector` does not match the index dimension.
    pub async fn search_by_vector(
        &self,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievalResult>, MemoryError> {
        let state = self.state.read().await;
        let Some(flat) = &state.flat else {
            return Ok(Vec::new());
        };

        let hits = flat.search(vector, k)?;
        tracing::debug!(k, hits = hits.len(), "vector search");
        Ok(hits
            .into_iter()
            .map(|(row, score)| RetrievalResult {
                chunk: state.chunks[row].clone(),
                score,
            })
            .collect())
    }

    /// Write `index.json` and `chunks.json` under `dir`. A no-op when nothing is indexed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or files cannot be written.
    pub async fn persist(&self, dir: &Path) -> Result<(), MemoryError> {
        let state = self.state.read().await;
        let Some(flat) = &state.flat else {
            tracing::debug!("index empty, nothing to persist");
            return Ok(());
        };
        persist::write(dir, flat, &state.chunks).await?;
        tracing::info!(path = %dir.display(), chunks = state.chunks.len(), "vector index persisted");
        Ok(())
    }

    /// Replace the in-memory state with the index stored under `dir`.
    ///
    /// Returns `false` and leaves the state untouched when no index file exists.
    ///
    /// # Errors
    ///
    /// Returns `CorruptIndex` if the stored files are unreadable or inconsistent.
    pub async fn restore(&self, dir: &Path) -> Result<bool, MemoryError> {
        let Some((flat, chunks)) = persist::read(dir).await? else {
            return Ok(false);
        };

        let mut state = self.state.write().await;
        if chunks.is_empty() {
            *state = IndexState::default();
        } else {
            state.flat = Some(flat);
            state.chunks = chunks;
        }
        tracing::info!(path = %dir.display(), chunks = state.chunks.len(), "vector index restored");
        Ok(true)
    }

    /// Delete the persisted files under `dir`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be removed.
    pub async fn remove_persisted(dir: &Path) -> Result<(), MemoryError> {
        persist::remove(dir).await
    }

    pub async fn clear(&self) {
        *self.state.write().await = IndexState::default();
    }

    pub async fn count(&self) -> usize {
        self.state.read().await.chunks.len()
    }

    pub async fn is_available(&self) -> bool {
        self.state.read().await.flat.is_some()
    }
}
