use docent_memory::MemoryError;
use docent_memory::document::IngestReport;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error(transparent)]
    Memory(#[from] MemoryError),

    /// Every file in the batch was rejected or empty; the index was not touched.
    #[error("no content could be extracted from the uploaded files")]
    NoContent { report: IngestReport },

    /// Extraction succeeded for some files but embedding or merging failed; nothing was added.
    #[error("failed to index documents: {source}")]
    Indexing {
        source: MemoryError,
        report: IngestReport,
    },

    #[error("background task failed: {0}")]
    Task(String),
}
