use std::path::PathBuf;

use super::{Config, Secret};

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_llm();
        self.apply_env_overrides_rag();
        self.apply_env_overrides_timeouts();
        self.apply_env_secrets();
    }

    fn apply_env_overrides_llm(&mut self) {
        if let Ok(v) = std::env::var("DOCENT_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("DOCENT_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("DOCENT_LLM_EMBEDDING_MODEL") {
            self.llm.embedding_model = v;
        }
        if let Ok(v) = std::env::var("DOCENT_LLM_TEMPERATURE") {
            if let Ok(t) = v.parse::<f32>() {
                self.llm.temperature = t;
            } else {
                tracing::warn!("ignoring invalid DOCENT_LLM_TEMPERATURE value: {v}");
            }
        }
        if let Ok(v) = std::env::var("DOCENT_LLM_MAX_TOKENS")
            && let Ok(n) = v.parse::<u32>()
        {
            self.llm.max_tokens = n;
        }
        if let Ok(v) = std::env::var("DOCENT_LLM_MAX_RETRIES")
            && let Ok(n) = v.parse::<u32>()
        {
            self.llm.max_retries = n;
        }
    }

    fn apply_env_overrides_rag(&mut self) {
        if let Ok(v) = std::env::var("DOCENT_RAG_CHUNK_SIZE")
            && let Ok(n) = v.parse::<usize>()
        {
            self.rag.chunk_size = n;
        }
        if let Ok(v) = std::env::var("DOCENT_RAG_CHUNK_OVERLAP")
            && let Ok(n) = v.parse::<usize>()
        {
            self.rag.chunk_overlap = n;
        }
        if let Ok(v) = std::env::var("DOCENT_RAG_TOP_K")
            && let Ok(n) = v.parse::<usize>()
        {
            self.rag.top_k = n;
        }
        if let Ok(v) = std::env::var("DOCENT_RAG_SCORE_THRESHOLD") {
            match v.trim() {
                "" | "none" => self.rag.score_threshold = None,
                s => {
                    if let Ok(t) = s.parse::<f32>() {
                        self.rag.score_threshold = Some(t);
                    } else {
                        tracing::warn!("ignoring invalid DOCENT_RAG_SCORE_THRESHOLD value: {v}");
                    }
                }
            }
        }
        if let Ok(v) = std::env::var("DOCENT_VECTOR_STORE_PATH") {
            self.rag.vector_store_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("DOCENT_RAG_MAX_FILE_SIZE")
            && let Ok(n) = v.parse::<u64>()
        {
            self.rag.max_file_size = n;
        }
        if let Ok(v) = std::env::var("DOCENT_RAG_EMBEDDING_BATCH_SIZE")
            && let Ok(n) = v.parse::<usize>()
        {
            self.rag.embedding_batch_size = n;
        }
        if let Ok(v) = std::env::var("DOCENT_RAG_STAGING_DIR") {
            self.rag.staging_dir = (!v.trim().is_empty()).then(|| PathBuf::from(v));
        }
    }

    fn apply_env_overrides_timeouts(&mut self) {
        if let Ok(v) = std::env::var("DOCENT_TIMEOUT_LLM")
            && let Ok(secs) = v.parse::<u64>()
        {
            self.timeouts.llm_seconds = secs;
        }
        if let Ok(v) = std::env::var("DOCENT_TIMEOUT_EMBEDDING")
            && let Ok(secs) = v.parse::<u64>()
        {
            self.timeouts.embedding_seconds = secs;
        }
    }

    fn apply_env_secrets(&mut self) {
        let key = std::env::var("DOCENT_OPENAI_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .ok()
            .filter(|k| !k.trim().is_empty());
        if let Some(key) = key {
            self.secrets.openai_api_key = Some(Secret::new(key));
        }
    }
}
