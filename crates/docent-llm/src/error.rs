#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("rate limited")]
    RateLimited,

    #[error("empty response from {provider}")]
    EmptyResponse { provider: String },

    #[error("embedding not supported by {provider}")]
    EmbedUnsupported { provider: String },

    #[error("provider call timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, LlmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_display() {
        let err = LlmError::Timeout { seconds: 30 };
        assert_eq!(err.to_string(), "provider call timed out after 30s");
    }

    #[test]
    fn empty_response_names_provider() {
        let err = LlmError::EmptyResponse {
            provider: "openai".into(),
        };
        assert_eq!(err.to_string(), "empty response from openai");
    }
}
