//! Document ingestion and the persistent vector index behind retrieval.

pub mod document;
pub mod error;
pub mod index;

pub use error::MemoryError;
pub use index::{EmbeddedChunk, RetrievalResult, VectorIndex};
