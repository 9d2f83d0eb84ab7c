use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use docent_llm::LlmProvider;
use docent_memory::VectorIndex;
use docent_memory::document::{DocumentIngestor, IngestReport, UploadedFile};
use serde::Serialize;

use crate::agent::ToolAgent;
use crate::composer::{ComposerConfig, RetrievalComposer};
use crate::config::Config;
use crate::error::ChatError;
use crate::router::{QueryResponse, QueryRouter};
use crate::session::{ConversationTurn, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SystemStatus {
    /// Number of indexed chunks.
    pub document_count: usize,
    pub index_available: bool,
    /// The provider can embed, so uploads and retrieval work.
    pub embeddings_available: bool,
    pub tools_available: bool,
}

/// Session facade owning the index, the router and the conversation history.
pub struct ChatBot<P: LlmProvider> {
    router: QueryRouter<P>,
    index: Arc<VectorIndex<P>>,
    provider: Arc<P>,
    ingestor: DocumentIngestor,
    store_path: PathBuf,
    session: Session,
}

impl<P: LlmProvider> ChatBot<P> {
    /// Build the session and restore any index persisted under `rag.vector_store_path`.
    ///
    /// A corrupt persisted index is logged and the session starts empty.
    pub async fn new(provider: Arc<P>, config: &Config) -> Self {
        if !provider.supports_embeddings() {
            tracing::warn!(
                provider = provider.name(),
                "provider cannot embed; uploads and document retrieval will fail"
            );
        }
        let index = Arc::new(
            VectorIndex::new(Arc::clone(&provider))
                .with_embed_timeout(Duration::from_secs(config.timeouts.embedding_seconds))
                .with_embed_batch_size(config.rag.embedding_batch_size),
        );
        let store_path = config.rag.vector_store_path.clone();

        match index.restore(&store_path).await {
            Ok(true) => {}
            Ok(false) => tracing::debug!(path = %store_path.display(), "no persisted index"),
            Err(e) => tracing::warn!(
                path = %store_path.display(),
                "ignoring unreadable persisted index: {e}"
            ),
        }

        let llm_timeout = Duration::from_secs(config.timeouts.llm_seconds);
        let composer = RetrievalComposer::new(
            Arc::clone(&index),
            Arc::clone(&provider),
            ComposerConfig {
                top_k: config.rag.top_k,
                score_threshold: config.rag.score_threshold,
                llm_timeout,
            },
        );
        let agent = ToolAgent::new(Arc::clone(&provider), llm_timeout);
        let ingestor = DocumentIngestor::new(config.rag.splitter())
            .with_max_file_size(config.rag.max_file_size)
            .with_staging_dir(config.rag.staging_dir.clone());

        Self {
            router: QueryRouter::new(composer, agent, Arc::clone(&index)),
            index,
            provider,
            ingestor,
            store_path,
            session: Session::default(),
        }
    }

    /// Route one query and append the exchange to the history.
    pub async fn process_query(&mut self, text: &str) -> QueryResponse {
        let outcome = self.router.route(text).await;
        self.session.record(ConversationTurn::new(text, &outcome));
        outcome
    }

    /// Ingest a batch, index every resulting chunk in one insert, then persist.
    ///
    /// Per-file failures are listed in the report. A persistence failure is logged and
    /// leaves `persisted` false; the in-memory index still holds the new chunks.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::NoContent`] when the batch yields no chunks, and
    /// [`ChatError::Indexing`] with the batch report when embedding fails.
    pub async fn add_documents(&self, files: Vec<UploadedFile>) -> Result<IngestReport, ChatError> {
        let ingestor = self.ingestor.clone();
        let (chunks, mut report) = tokio::task::spawn_blocking(move || ingestor.ingest_batch(&files))
            .await
            .map_err(|e| ChatError::Task(e.to_string()))?;

        if chunks.is_empty() {
            return Err(ChatError::NoContent { report });
        }

        let total = match self.index.insert(chunks).await {
            Ok(total) => total,
            Err(source) => return Err(ChatError::Indexing { source, report }),
        };
        tracing::info!(
            provider = self.provider.name(),
            files = report.processed.len(),
            total,
            "documents indexed"
        );

        match self.index.persist(&self.store_path).await {
            Ok(()) => report.persisted = true,
            Err(e) => tracing::warn!(
                path = %self.store_path.display(),
                "failed to persist index: {e}"
            ),
        }
        Ok(report)
    }

    /// Drop the index and its persisted files.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted files exist but cannot be removed.
    pub async fn clear_documents(&self) -> Result<(), ChatError> {
        self.index.clear().await;
        VectorIndex::<P>::remove_persisted(&self.store_path).await?;
        tracing::info!("documents cleared");
        Ok(())
    }

    pub fn clear_history(&mut self) {
        self.session.clear();
        self.router.agent_mut().clear_memory();
    }

    pub async fn status(&self) -> SystemStatus {
        SystemStatus {
            document_count: self.index.count().await,
            index_available: self.index.is_available().await,
            embeddings_available: self.provider.supports_embeddings(),
            tools_available: self.router.agent().tools_available(),
        }
    }

    #[must_use]
    pub fn history(&self) -> &[ConversationTurn] {
        self.session.turns()
    }

    #[must_use]
    pub fn store_path(&self) -> &Path {
        &self.store_path
    }
}
