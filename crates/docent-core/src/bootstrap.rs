use std::path::{Path, PathBuf};

use anyhow::Context;
use docent_llm::openai::OpenAiProvider;

use crate::config::Config;

/// Priority: CLI `--config` > `DOCENT_CONFIG` env > `config/default.toml`.
#[must_use]
pub fn resolve_config_path(cli: Option<&Path>) -> PathBuf {
    if let Some(path) = cli {
        return path.to_owned();
    }
    if let Ok(path) = std::env::var("DOCENT_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}

/// Build the OpenAI-compatible provider used for both chat and embeddings.
///
/// # Errors
///
/// Returns an error when no API key was resolved from the environment.
pub fn create_provider(config: &Config) -> anyhow::Result<OpenAiProvider> {
    let api_key = config
        .secrets
        .openai_api_key
        .as_ref()
        .context("DOCENT_OPENAI_API_KEY (or OPENAI_API_KEY) is not set")?;

    Ok(OpenAiProvider::new(
        api_key.expose().to_owned(),
        config.llm.base_url.clone(),
        config.llm.model.clone(),
        config.llm.max_tokens,
        Some(config.llm.embedding_model.clone()),
    )
    .with_temperature(config.llm.temperature)
    .with_max_retries(config.llm.max_retries))
}

#[cfg(test)]
mod tests {
    use docent_llm::LlmProvider;
    use serial_test::serial;

    use super::*;
    use crate::config::Secret;

    #[test]
    #[serial]
    fn cli_path_wins() {
        unsafe { std::env::set_var("DOCENT_CONFIG", "/from/env.toml") };
        let path = resolve_config_path(Some(Path::new("/from/cli.toml")));
        unsafe { std::env::remove_var("DOCENT_CONFIG") };
        assert_eq!(path, PathBuf::from("/from/cli.toml"));
    }

    #[test]
    #[serial]
    fn env_path_beats_default() {
        unsafe { std::env::set_var("DOCENT_CONFIG", "/from/env.toml") };
        let path = resolve_config_path(None);
        unsafe { std::env::remove_var("DOCENT_CONFIG") };
        assert_eq!(path, PathBuf::from("/from/env.toml"));
    }

    #[test]
    #[serial]
    fn default_path() {
        unsafe { std::env::remove_var("DOCENT_CONFIG") };
        assert_eq!(resolve_config_path(None), PathBuf::from("config/default.toml"));
    }

    #[test]
    fn provider_requires_api_key() {
        let err = create_provider(&Config::default()).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn provider_built_with_key() {
        let mut config = Config::default();
        config.secrets.openai_api_key = Some(Secret::new("sk-test"));
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "openai");
        assert!(provider.supports_embeddings());
    }
}
