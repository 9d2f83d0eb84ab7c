use std::fmt::Write;
use std::path::Path;

use super::super::{Document, DocumentError, DocumentLoader, DocumentMetadata, FileKind};

/// Loads each data row as one record of `column: value` lines in header order.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvLoader;

impl DocumentLoader for CsvLoader {
    fn load(&self, path: &Path, source: &str) -> Result<Vec<Document>, DocumentError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_owned())
            .collect();

        let mut documents = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record?;
            let mut content = String::new();
            for (col, header) in headers.iter().enumerate() {
                if col > 0 {
                    content.push('\n');
                }
                let value = record.get(col).unwrap_or("");
                let _ = write!(content, "{header}: {value}");
            }

            let row_index = u32::try_from(index).unwrap_or(u32::MAX);
            documents.push(Document {
                content,
                metadata: DocumentMetadata {
                    source: source.to_owned(),
                    page: row_index.saturating_add(1),
                    file_kind: FileKind::Csv,
                    row_index: Some(row_index),
                },
            });
        }

        tracing::debug!(source, rows = documents.len(), "loaded csv rows");
        Ok(documents)
    }

    fn supported_extensions(&self) -> &[&str] {
        &["csv"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(content: &str) -> Result<Vec<Document>, DocumentError> {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("staged");
        std::fs::write(&file, content).unwrap();
        CsvLoader.load(&file, "staff.csv")
    }

    #[test]
    fn rows_become_column_value_records() {
        let docs = load("name,days\nalice,20\nbob,15\n").unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].content, "name: alice\ndays: 20");
        assert_eq!(docs[1].content, "name: bob\ndays: 15");
    }

    #[test]
    fn row_positions_are_tracked() {
        let docs = load("a,b\n1,2\n3,4\n").unwrap();
        assert_eq!(docs[0].metadata.page, 1);
        assert_eq!(docs[0].metadata.row_index, Some(0));
        assert_eq!(docs[1].metadata.page, 2);
        assert_eq!(docs[1].metadata.row_index, Some(1));
        assert_eq!(docs[1].metadata.file_kind, FileKind::Csv);
        assert_eq!(docs[1].metadata.source, "staff.csv");
    }

    #[test]
    fn short_rows_get_empty_values() {
        let docs = load("a,b,c\n1\n").unwrap();
        assert_eq!(docs[0].content, "a: 1\nb: \nc: ");
    }

    #[test]
    fn quoted_fields_keep_commas() {
        let docs = load("title,note\n\"Leave, annual\",\"20 days\"\n").unwrap();
        assert_eq!(docs[0].content, "title: Leave, annual\nnote: 20 days");
    }

    #[test]
    fn header_only_file_has_no_rows() {
        assert!(load("a,b\n").unwrap().is_empty());
    }
}
