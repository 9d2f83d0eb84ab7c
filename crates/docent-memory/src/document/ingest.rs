use std::io::Write;
use std::path::PathBuf;

use tempfile::NamedTempFile;

use super::{
    Chunk, CsvLoader, DEFAULT_MAX_FILE_SIZE, DocumentError, DocumentLoader, FileKind,
    SplitterConfig, TextLoader, TextSplitter, UploadedFile,
};

/// Per-file success entry in an [`IngestReport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestedFile {
    pub name: String,
    pub chunks: usize,
}

#[derive(Debug)]
pub struct IngestFailure {
    pub name: String,
    pub error: DocumentError,
}

/// Outcome of a batch upload. One failing file never hides its siblings.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub processed: Vec<IngestedFile>,
    pub failures: Vec<IngestFailure>,
    /// Whether the resulting index was written to disk.
    pub persisted: bool,
}

impl IngestReport {
    #[must_use]
    pub fn total_chunks(&self) -> usize {
        self.processed.iter().map(|f| f.chunks).sum()
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Converts raw uploads into chunks: extension check, size check, staging, load, split.
#[derive(Debug, Clone)]
pub struct DocumentIngestor {
    splitter: TextSplitter,
    max_file_size: u64,
    /// Where uploads are staged; the system temp directory when `None`.
    staging_dir: Option<PathBuf>,
}

impl Default for DocumentIngestor {
    fn default() -> Self {
        Self::new(SplitterConfig::default())
    }
}

impl DocumentIngestor {
    #[must_use]
    pub fn new(config: SplitterConfig) -> Self {
        Self {
            splitter: TextSplitter::new(config),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            staging_dir: None,
        }
    }

    #[must_use]
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    #[must_use]
    pub fn with_staging_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.staging_dir = dir;
        self
    }

    /// Ingest one uploaded file.
    ///
    /// The bytes are staged in a temporary file that is removed on every exit path.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedFormat` for anything other than pdf, txt or csv, `FileTooLarge`
    /// above the size limit, and loader errors for unreadable content.
    pub fn ingest(&self, file_name: &str, bytes: &[u8]) -> Result<Vec<Chunk>, DocumentError> {
        let source = std::path::Path::new(file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(file_name);

        let Some(kind) = FileKind::from_file_name(source) else {
            let ext = std::path::Path::new(source)
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_owned();
            return Err(DocumentError::UnsupportedFormat(ext));
        };

        let size = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        if size > self.max_file_size {
            return Err(DocumentError::FileTooLarge(size));
        }

        let mut staged = match &self.staging_dir {
            Some(dir) => NamedTempFile::new_in(dir)?,
            None => NamedTempFile::new()?,
        };
        staged.write_all(bytes)?;
        staged.flush()?;

        let documents = loader_for(kind)?.load(staged.path(), source)?;
        let chunks = self.splitter.split_all(&documents);

        tracing::debug!(
            source,
            kind = %kind,
            records = documents.len(),
            chunks = chunks.len(),
            "ingested file"
        );
        Ok(chunks)
    }

    /// Ingest every file independently, collecting all chunks and a per-file report.
    #[must_use]
    pub fn ingest_batch(&self, files: &[UploadedFile]) -> (Vec<Chunk>, IngestReport) {
        let mut all_chunks = Vec::new();
        let mut report = IngestReport::default();

        for file in files {
            match self.ingest(&file.name, &file.bytes) {
                Ok(chunks) => {
                    report.processed.push(IngestedFile {
                        name: file.name.clone(),
                        chunks: chunks.len(),
                    });
                    all_chunks.extend(chunks);
                }
                Err(error) => {
                    tracing::warn!(file = %file.name, "failed to ingest: {error}");
                    report.failures.push(IngestFailure {
                        name: file.name.clone(),
                        error,
                    });
                }
            }
        }

        (all_chunks, report)
    }
}

fn loader_for(kind: FileKind) -> Result<Box<dyn DocumentLoader>, DocumentError> {
    match kind {
        FileKind::Txt => Ok(Box::new(TextLoader)),
        FileKind::Csv => Ok(Box::new(CsvLoader)),
        #[cfg(feature = "pdf")]
        FileKind::Pdf => Ok(Box::new(super::PdfLoader)),
        #[cfg(not(feature = "pdf"))]
        FileKind::Pdf => Err(DocumentError::UnsupportedFormat(
            "pdf (built without pdf support)".into(),
        )),
    }
}
