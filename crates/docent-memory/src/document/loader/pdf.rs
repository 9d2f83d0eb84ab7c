use std::path::Path;

use super::super::{Document, DocumentError, DocumentLoader, DocumentMetadata, FileKind};

/// Extracts text page by page; pages with no visible text are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfLoader;

impl DocumentLoader for PdfLoader {
    fn load(&self, path: &Path, source: &str) -> Result<Vec<Document>, DocumentError> {
        let pages = pdf_extract::extract_text_by_pages(path)
            .map_err(|e| DocumentError::Pdf(e.to_string()))?;

        let documents: Vec<Document> = pages
            .into_iter()
            .enumerate()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(i, content)| Document {
                content,
                metadata: DocumentMetadata {
                    source: source.to_owned(),
                    page: u32::try_from(i + 1).unwrap_or(u32::MAX),
                    file_kind: FileKind::Pdf,
                    row_index: None,
                },
            })
            .collect();

        tracing::debug!(source, pages = documents.len(), "extracted pdf pages");
        Ok(documents)
    }

    fn supported_extensions(&self) -> &[&str] {
        &["pdf"]
    }
}
