//! Retrieval-augmented answers: top-K search, grounded prompt, completion.

use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;

use docent_llm::{LlmProvider, Message, call_with_timeout};
use docent_memory::{RetrievalResult, VectorIndex};
use serde::Serialize;

/// Answer returned whenever retrieval produced nothing usable.
pub const NOT_FOUND_MESSAGE: &str =
    "Nothing relevant was found in the documents. Upload documents first.";

const SYSTEM_PROMPT: &str = "You answer questions using only the provided document excerpts. \
If the excerpts do not contain the answer, reply exactly: \"Nothing relevant was found in the \
documents. Upload documents first.\" Cite the source and page of every fact you use, \
for example (source: handbook.pdf, page: 3).";

/// Provenance of one retrieved chunk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceRef {
    pub source: String,
    pub page: u32,
    pub score: f32,
}

impl From<&RetrievalResult> for SourceRef {
    fn from(result: &RetrievalResult) -> Self {
        Self {
            source: result.chunk.metadata.source.clone(),
            page: result.chunk.metadata.page,
            score: result.score,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComposedAnswer {
    pub answer: String,
    pub sources: Vec<SourceRef>,
    /// `false` only when no index exists at all.
    pub grounded: bool,
}

impl ComposedAnswer {
    fn not_found(grounded: bool) -> Self {
        Self {
            answer: NOT_FOUND_MESSAGE.to_owned(),
            sources: Vec::new(),
            grounded,
        }
    }

    fn failed(answer: String) -> Self {
        Self {
            answer,
            sources: Vec::new(),
            grounded: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ComposerConfig {
    pub top_k: usize,
    /// Maximum squared L2 distance kept; `None` keeps every hit.
    pub score_threshold: Option<f32>,
    pub llm_timeout: Duration,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            score_threshold: Some(1.5),
            llm_timeout: Duration::from_secs(120),
        }
    }
}

pub struct RetrievalComposer<P: LlmProvider> {
    index: Arc<VectorIndex<P>>,
    provider: Arc<P>,
    config: ComposerConfig,
}

impl<P: LlmProvider> RetrievalComposer<P> {
    #[must_use]
    pub fn new(index: Arc<VectorIndex<P>>, provider: Arc<P>, config: ComposerConfig) -> Self {
        Self {
            index,
            provider,
            config,
        }
    }

    /// Answer `query` from the indexed documents. Failures become the answer text.
    pub async fn answer(&self, query: &str) -> ComposedAnswer {
        if !self.index.is_available().await {
            tracing::debug!("no index, retrieval skipped");
            return ComposedAnswer::not_found(false);
        }

        let results = match self.index.search(query, self.config.top_k).await {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!("document search failed: {e}");
                return ComposedAnswer::failed(format!(
                    "An error occurred while searching the documents: {e}"
                ));
            }
        };

        let results: Vec<RetrievalResult> = match self.config.score_threshold {
            Some(max) => results.into_iter().filter(|r| r.score <= max).collect(),
            None => results,
        };
        if results.is_empty() {
            tracing::debug!("no chunk within the distance threshold");
            return ComposedAnswer::not_found(true);
        }

        let messages = build_messages(query, &results);
        match call_with_timeout(self.config.llm_timeout, self.provider.chat(&messages)).await {
            Ok(answer) => ComposedAnswer {
                answer,
                sources: results.iter().map(SourceRef::from).collect(),
                grounded: true,
            },
            Err(e) => {
                tracing::warn!("grounded completion failed: {e}");
                ComposedAnswer::failed(format!(
                    "An error occurred while generating the answer: {e}"
                ))
            }
        }
    }
}

/// Context block with each excerpt prefixed by `[source: S, page: P]`.
#[must_use]
pub fn format_context(results: &[RetrievalResult]) -> String {
    let mut out = String::new();
    for result in results {
        let meta = &result.chunk.metadata;
        let _ = writeln!(out, "[source: {}, page: {}]", meta.source, meta.page);
        out.push_str(&result.chunk.content);
        out.push_str("\n\n");
    }
    out.truncate(out.trim_end().len());
    out
}

fn build_messages(query: &str, results: &[RetrievalResult]) -> Vec<Message> {
    vec![
        Message::system(SYSTEM_PROMPT),
        Message::user(format!(
            "Document excerpts:\n{}\n\nQuestion: {query}",
            format_context(results)
        )),
    ]
}

#[cfg(test)]
mod tests {
    use docent_llm::Role;
    use docent_llm::mock::{MockEmbedding, MockProvider};
    use docent_memory::document::{Chunk, DocumentMetadata, FileKind};

    use super::*;

    fn chunk(content: &str, source: &str, page: u32) -> Chunk {
        Chunk {
            content: content.into(),
            metadata: DocumentMetadata {
                source: source.into(),
                page,
                file_kind: FileKind::Txt,
                row_index: None,
            },
            chunk_index: 0,
        }
    }

    fn composer(provider: MockProvider, config: ComposerConfig) -> RetrievalComposer<MockProvider> {
        let provider = Arc::new(provider);
        let index = Arc::new(VectorIndex::new(Arc::clone(&provider)));
        RetrievalComposer::new(index, provider, config)
    }

    #[tokio::test]
    async fn absent_index_is_ungrounded() {
        let provider = MockProvider::default();
        let c = composer(provider.clone(), ComposerConfig::default());
        let answer = c.answer("what is the leave policy?").await;
        assert!(!answer.grounded);
        assert_eq!(answer.answer, NOT_FOUND_MESSAGE);
        assert!(answer.sources.is_empty());
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn grounded_answer_cites_sources() {
        let provider = MockProvider::with_responses(vec!["You get 20 days.".into()]);
        let c = composer(provider.clone(), ComposerConfig::default());
        c.index
            .insert(vec![chunk("leave policy allows 20 days", "A", 1)])
            .await
            .unwrap();

        let answer = c.answer("how many leave days are allowed?").await;
        assert!(answer.grounded);
        assert_eq!(answer.answer, "You get 20 days.");
        assert_eq!(answer.sources.len(), 1);
        assert_eq!(answer.sources[0].source, "A");
        assert_eq!(answer.sources[0].page, 1);

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0][0].role, Role::System);
        assert!(requests[0][1].content.contains("[source: A, page: 1]"));
        assert!(requests[0][1].content.contains("Question: how many leave days are allowed?"));
    }

    #[tokio::test]
    async fn unrelated_query_is_not_found_but_grounded() {
        let provider = MockProvider::default();
        let c = composer(provider.clone(), ComposerConfig::default());
        c.index
            .insert(vec![chunk("leave policy allows 20 days", "A", 1)])
            .await
            .unwrap();

        let answer = c.answer("capital of France").await;
        assert!(answer.grounded);
        assert_eq!(answer.answer, NOT_FOUND_MESSAGE);
        assert!(answer.sources.is_empty());
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn no_threshold_keeps_every_hit() {
        let provider = MockProvider::default();
        let config = ComposerConfig {
            score_threshold: None,
            ..ComposerConfig::default()
        };
        let c = composer(provider, config);
        c.index
            .insert(vec![chunk("leave policy allows 20 days", "A", 1)])
            .await
            .unwrap();

        let answer = c.answer("capital of France").await;
        assert_eq!(answer.sources.len(), 1);
    }

    #[tokio::test]
    async fn top_k_limits_sources() {
        let provider = MockProvider::default().with_embedding(MockEmbedding::Fixed(vec![1.0, 0.0]));
        let config = ComposerConfig {
            top_k: 2,
            ..ComposerConfig::default()
        };
        let c = composer(provider, config);
        c.index
            .insert(vec![chunk("a", "A", 1), chunk("b", "B", 2), chunk("c", "C", 3)])
            .await
            .unwrap();

        let answer = c.answer("anything").await;
        let sources: Vec<_> = answer.sources.iter().map(|s| s.source.as_str()).collect();
        assert_eq!(sources, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn completion_failure_becomes_answer() {
        let provider = MockProvider::failing();
        let c = composer(provider, ComposerConfig::default());
        c.index
            .insert(vec![chunk("leave policy allows 20 days", "A", 1)])
            .await
            .unwrap();

        let answer = c.answer("leave days").await;
        assert!(answer.grounded);
        assert!(answer.answer.contains("error"));
        assert!(answer.sources.is_empty());
    }

    #[tokio::test]
    async fn completion_timeout_becomes_answer() {
        let provider = MockProvider::default().with_delay(500);
        let config = ComposerConfig {
            llm_timeout: Duration::from_millis(20),
            ..ComposerConfig::default()
        };
        let c = composer(provider, config);
        c.index
            .insert(vec![chunk("leave policy allows 20 days", "A", 1)])
            .await
            .unwrap();

        let answer = c.answer("leave days").await;
        assert!(answer.grounded);
        assert!(answer.answer.contains("timed out"));
        assert!(answer.sources.is_empty());
    }

    #[test]
    fn context_tags_each_excerpt() {
        let results = vec![
            RetrievalResult {
                chunk: chunk("first", "a.pdf", 2),
                score: 0.1,
            },
            RetrievalResult {
                chunk: chunk("second", "b.csv", 7),
                score: 0.4,
            },
        ];
        assert_eq!(
            format_context(&results),
            "[source: a.pdf, page: 2]\nfirst\n\n[source: b.csv, page: 7]\nsecond"
        );
    }
}
