use std::path::Path;

use super::super::{Document, DocumentError, DocumentLoader, DocumentMetadata, FileKind};

/// Loads a whole text file as a single page-1 record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextLoader;

impl DocumentLoader for TextLoader {
    fn load(&self, path: &Path, source: &str) -> Result<Vec<Document>, DocumentError> {
        let bytes = std::fs::read(path)?;
        let content = String::from_utf8_lossy(&bytes).into_owned();

        Ok(vec![Document {
            content,
            metadata: DocumentMetadata {
                source: source.to_owned(),
                page: 1,
                file_kind: FileKind::Txt,
                row_index: None,
            },
        }])
    }

    fn supported_extensions(&self) -> &[&str] {
        &["txt"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("staged");
        std::fs::write(&file, "hello world").unwrap();

        let docs = TextLoader.load(&file, "notes.txt").unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "hello world");
        assert_eq!(docs[0].metadata.source, "notes.txt");
        assert_eq!(docs[0].metadata.page, 1);
        assert_eq!(docs[0].metadata.file_kind, FileKind::Txt);
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("staged");
        std::fs::write(&file, [b'o', b'k', 0xff]).unwrap();

        let docs = TextLoader.load(&file, "a.txt").unwrap();
        assert!(docs[0].content.starts_with("ok"));
    }

    #[test]
    fn load_nonexistent_file() {
        let result = TextLoader.load(Path::new("/nonexistent/file.txt"), "file.txt");
        assert!(matches!(result, Err(DocumentError::Io(_))));
    }

    #[test]
    fn supported_extensions_list() {
        assert_eq!(TextLoader.supported_extensions(), &["txt"]);
    }
}
