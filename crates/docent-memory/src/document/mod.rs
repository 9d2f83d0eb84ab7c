pub mod error;
pub mod ingest;
pub mod loader;
pub mod splitter;
pub mod types;

pub use error::DocumentError;
pub use ingest::{DocumentIngestor, IngestFailure, IngestReport, IngestedFile};
pub use loader::{CsvLoader, TextLoader};
pub use splitter::{SplitterConfig, TextSplitter};
pub use types::{Chunk, Document, DocumentMetadata, FileKind, UploadedFile};

#[cfg(feature = "pdf")]
pub use loader::PdfLoader;

/// Default maximum file size: 50 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Turns a staged file into per-page or per-row records.
pub trait DocumentLoader: Send + Sync {
    /// Load records from `path`, tagging each with `source` as its provenance.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    fn load(&self, path: &std::path::Path, source: &str) -> Result<Vec<Document>, DocumentError>;

    fn supported_extensions(&self) -> &[&str];
}
