mod env;
mod types;


pub use types::*;

use std::path::Path;

use anyhow::Context;

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or if the
    /// resulting values fail [`Config::validate`].
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.rag.chunk_size == 0 {
            anyhow::bail!("rag.chunk_size must be greater than 0");
        }
        if self.rag.chunk_overlap >= self.rag.chunk_size {
            anyhow::bail!(
                "rag.chunk_overlap ({}) must be less than rag.chunk_size ({})",
                self.rag.chunk_overlap,
                self.rag.chunk_size
            );
        }
        if self.rag.top_k == 0 {
            anyhow::bail!("rag.top_k must be greater than 0");
        }
        if self.rag.embedding_batch_size == 0 {
            anyhow::bail!("rag.embedding_batch_size must be greater than 0");
        }
        if let Some(t) = self.rag.score_threshold
            && !(t.is_finite() && t >= 0.0)
        {
            anyhow::bail!("rag.score_threshold must be a non-negative number");
        }
        if self.timeouts.llm_seconds == 0 || self.timeouts.embedding_seconds == 0 {
            anyhow::bail!("timeouts must be greater than 0");
        }
        Ok(())
    }
}
