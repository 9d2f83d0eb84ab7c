use std::collections::VecDeque;

use super::types::{Chunk, Document};

/// Break points tried in order before falling back to hard character cuts.
const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "。", "? ", "! ", " "];

#[derive(Debug, Clone)]
pub struct SplitterConfig {
    /// Target chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks.
    pub chunk_overlap: usize,
    /// Prefer paragraph, line, sentence, then word boundaries before cutting mid-word.
    pub sentence_aware: bool,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            sentence_aware: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextSplitter {
    config: SplitterConfig,
}

impl TextSplitter {
    #[must_use]
    pub fn new(config: SplitterConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &SplitterConfig {
        &self.config
    }

    #[must_use]
    pub fn split(&self, document: &Document) -> Vec<Chunk> {
        let text = &document.content;
        if text.trim().is_empty() {
            return Vec::new();
        }

        let size = self.config.chunk_size.max(1);
        let pieces = if self.config.sentence_aware {
            split_recursive(text, SEPARATORS, size, self.config.chunk_overlap)
        } else {
            split_chars(text, size, self.config.chunk_overlap)
        };

        pieces
            .into_iter()
            .map(|p| p.trim().to_owned())
            .filter(|p| !p.is_empty())
            .enumerate()
            .map(|(i, content)| Chunk {
                content,
                metadata: document.metadata.clone(),
                chunk_index: i,
            })
            .collect()
    }

    #[must_use]
    pub fn split_all(&self, documents: &[Document]) -> Vec<Chunk> {
        documents.iter().flat_map(|d| self.split(d)).collect()
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn split_recursive(text: &str, separators: &[&str], size: usize, overlap: usize) -> Vec<String> {
    let Some(pos) = separators.iter().position(|sep| text.contains(sep)) else {
        return split_chars(text, size, overlap);
    };
    let rest = &separators[pos + 1..];

    let mut out = Vec::new();
    let mut fitting: Vec<&str> = Vec::new();

    for piece in text.split_inclusive(separators[pos]) {
        if char_len(piece) <= size {
            fitting.push(piece);
            continue;
        }
        if !fitting.is_empty() {
            out.extend(merge_pieces(&fitting, size, overlap));
            fitting.clear();
        }
        out.extend(split_recursive(piece, rest, size, overlap));
    }

    if !fitting.is_empty() {
        out.extend(merge_pieces(&fitting, size, overlap));
    }

    out
}

/// Greedily pack pieces (each at most `size` chars) into windows, carrying up to
/// `overlap` trailing chars of each emitted window into the next one.
fn merge_pieces(pieces: &[&str], size: usize, overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut window: VecDeque<(&str, usize)> = VecDeque::new();
    let mut total = 0;

    for &piece in pieces {
        let len = char_len(piece);
        if !window.is_empty() && total + len > size {
            chunks.push(window.iter().map(|(p, _)| *p).collect::<String>());
            while let Some(&(_, front_len)) = window.front() {
                if total > overlap || total + len > size {
                    total -= front_len;
                    window.pop_front();
                } else {
                    break;
                }
            }
        }
        window.push_back((piece, len));
        total += len;
    }

    if !window.is_empty() {
        chunks.push(window.iter().map(|(p, _)| *p).collect());
    }

    chunks
}

fn split_chars(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    let step = chunk_size.saturating_sub(overlap).max(1);
    let mut start = 0;

    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::types::{DocumentMetadata, FileKind};

    fn make_doc(content: &str) -> Document {
        Document {
            content: content.to_owned(),
            metadata: DocumentMetadata {
                source: "test.txt".to_owned(),
                page: 3,
                file_kind: FileKind::Txt,
                row_index: None,
            },
        }
    }

    fn splitter(chunk_size: usize, chunk_overlap: usize) -> TextSplitter {
        TextSplitter::new(SplitterConfig {
            chunk_size,
            chunk_overlap,
            sentence_aware: true,
        })
    }

    #[test]
    fn empty_document() {
        let splitter = TextSplitter::new(SplitterConfig::default());
        assert!(splitter.split(&make_doc("")).is_empty());
    }

    #[test]
    fn whitespace_only_document() {
        let splitter = TextSplitter::new(SplitterConfig::default());
        assert!(splitter.split(&make_doc(" \n\n\t ")).is_empty());
    }

    #[test]
    fn document_smaller_than_chunk_size() {
        let chunks = splitter(1000, 100).split(&make_doc("Short text."));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "Short text.");
        assert_eq!(chunks[0].chunk_index, 0);
    }

    #[test]
    fn metadata_preserved() {
        let chunks = splitter(10, 2).split(&make_doc("alpha beta gamma delta epsilon"));
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert_eq!(chunk.metadata.source, "test.txt");
            assert_eq!(chunk.metadata.page, 3);
        }
    }

    #[test]
    fn prefers_paragraph_breaks() {
        let text = "First paragraph here.\n\nSecond paragraph here.";
        let chunks = splitter(25, 0).split(&make_doc(text));
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, "First paragraph here.");
        assert_eq!(chunks[1].content, "Second paragraph here.");
    }

    #[test]
    fn sentence_boundaries_before_words() {
        let text = "One two three. Four five six.";
        let chunks = splitter(16, 0).split(&make_doc(text));
        assert_eq!(chunks[0].content, "One two three.");
        assert_eq!(chunks[1].content, "Four five six.");
    }

    #[test]
    fn overlap_carries_trailing_words() {
        let text = "a1 b2 c3 d4 e5 f6 g7 h8";
        let chunks = splitter(9, 3).split(&make_doc(text));
        assert!(chunks.len() > 1);
        let last_word_of_first = chunks[0].content.split(' ').next_back().unwrap();
        assert!(chunks[1].content.starts_with(last_word_of_first));
    }

    #[test]
    fn hard_cut_when_no_separator() {
        let text = "abcdefghijklmnopqrstuvwxyz";
        let chunks = splitter(10, 3).split(&make_doc(text));
        assert!(chunks.len() > 1);
        assert_eq!(chunks[0].content, "abcdefghij");
        assert_eq!(&chunks[0].content[7..10], &chunks[1].content[..3]);
    }

    #[test]
    fn multibyte_text_is_measured_in_chars() {
        let text = "休暇は年間二十日まで取得できます。申請は上長の承認が必要です。";
        let chunks = splitter(20, 0).split(&make_doc(text));
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.content.chars().count() <= 20));
    }

    #[test]
    fn split_all_concatenates_documents() {
        let docs = vec![make_doc("one"), make_doc(""), make_doc("two")];
        let chunks = splitter(100, 0).split_all(&docs);
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn char_split_no_overlap() {
        let chunks = super::split_chars("abcdefghij", 5, 0);
        assert_eq!(chunks, vec!["abcde", "fghij"]);
    }

    #[test]
    fn char_split_full_overlap_makes_progress() {
        let chunks = super::split_chars("abcde", 3, 3);
        assert!(!chunks.is_empty());
        assert_eq!(chunks[0], "abc");
        assert_eq!(chunks.last().unwrap(), "cde");
    }

    mod proptest_splitter {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(500))]

            #[test]
            fn split_never_panics(
                content in "\\PC{0,3000}",
                chunk_size in 1usize..1500,
                chunk_overlap in 0usize..400,
                sentence_aware in proptest::bool::ANY,
            ) {
                let splitter = TextSplitter::new(SplitterConfig {
                    chunk_size,
                    chunk_overlap,
                    sentence_aware,
                });
                let _ = splitter.split(&make_doc(&content));
            }

            #[test]
            fn chunks_never_exceed_target(
                content in "[a-z .\n]{1,800}",
                chunk_size in 1usize..200,
                chunk_overlap in 0usize..50,
            ) {
                let chunks = splitter(chunk_size, chunk_overlap).split(&make_doc(&content));
                for chunk in &chunks {
                    prop_assert!(chunk.content.chars().count() <= chunk_size);
                }
            }

            #[test]
            fn no_empty_chunks_and_sequential_indices(
                content in "[a-z. !?\n]{1,500}",
                chunk_size in 1usize..200,
                sentence_aware in proptest::bool::ANY,
            ) {
                let splitter = TextSplitter::new(SplitterConfig {
                    chunk_size,
                    chunk_overlap: 0,
                    sentence_aware,
                });
                let chunks = splitter.split(&make_doc(&content));
                for (i, chunk) in chunks.iter().enumerate() {
                    prop_assert!(!chunk.content.is_empty());
                    prop_assert_eq!(chunk.chunk_index, i);
                }
            }

            #[test]
            fn non_blank_text_yields_chunks(content in "[a-z]{1,20}( [a-z]{1,20}){0,30}") {
                let chunks = splitter(50, 10).split(&make_doc(&content));
                prop_assert!(!chunks.is_empty());
            }
        }
    }
}
