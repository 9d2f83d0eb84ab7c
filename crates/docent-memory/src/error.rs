#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("embedding failed: {0}")]
    Llm(#[from] docent_llm::LlmError),

    #[error("no chunks to index")]
    EmptyInput,

    #[error("vector dimension mismatch: index has {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("provider returned {actual} embeddings for {expected} chunks")]
    EmbeddingCount { expected: usize, actual: usize },

    #[error("persisted index is corrupt: {0}")]
    CorruptIndex(String),
}
