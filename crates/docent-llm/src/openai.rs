use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::provider::{LlmProvider, Message, Role};
use crate::retry::send_with_retry;

const PROVIDER: &str = "openai";

/// Inputs per `/embeddings` request; the API rejects more than 2048.
pub const MAX_EMBEDDING_INPUTS: usize = 1000;

/// Chat completions and embeddings against any OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    embedding_model: Option<String>,
    max_retries: u32,
    embedding_inputs: usize,
}

impl fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("embedding_model", &self.embedding_model)
            .finish_non_exhaustive()
    }
}

impl OpenAiProvider {
    #[must_use]
    pub fn new(
        api_key: String,
        base_url: String,
        model: String,
        max_tokens: u32,
        embedding_model: Option<String>,
    ) -> Self {
        Self {
            client: crate::http::default_client(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_owned(),
            model,
            temperature: 0.7,
            max_tokens,
            embedding_model,
            max_retries: 2,
            embedding_inputs: MAX_EMBEDDING_INPUTS,
        }
    }

    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Cap the inputs of one `/embeddings` request. Clamped to `1..=MAX_EMBEDDING_INPUTS`.
    #[must_use]
    pub fn with_embedding_inputs(mut self, inputs: usize) -> Self {
        self.embedding_inputs = inputs.clamp(1, MAX_EMBEDDING_INPUTS);
        self
    }

    /// POST `body` to `{base_url}/{endpoint}` and decode the JSON reply.
    async fn post_json<B, R>(&self, endpoint: &str, body: &B) -> Result<R, LlmError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}/{endpoint}", self.base_url);
        let response = send_with_retry(PROVIDER, self.max_retries, || {
            self.client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(body)
                .send()
        })
        .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            tracing::error!(endpoint, "{PROVIDER} API error {status}: {text}");
            return Err(LlmError::Other(format!(
                "{endpoint} request failed (status {status})"
            )));
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role,
                    content: &m.content,
                })
                .collect(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };
        let reply: ChatResponse = self.post_json("chat/completions", &body).await?;

        if let Some(usage) = &reply.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "completion usage"
            );
        }

        reply
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .ok_or_else(empty_response)
    }

    async fn embeddings(&self, input: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        let Some(model) = self.embedding_model.as_deref() else {
            return Err(LlmError::EmbedUnsupported {
                provider: PROVIDER.into(),
            });
        };

        let reply: EmbeddingResponse = self
            .post_json("embeddings", &EmbeddingRequest { input, model })
            .await?;
        if reply.data.len() != input.len() {
            return Err(LlmError::Other(format!(
                "{PROVIDER} returned {} embeddings for {} inputs",
                reply.data.len(),
                input.len()
            )));
        }

        let mut data = reply.data;
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

fn empty_response() -> LlmError {
    LlmError::EmptyResponse {
        provider: PROVIDER.into(),
    }
}

impl LlmProvider for OpenAiProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        self.complete(messages).await
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        self.embeddings(&[text.to_owned()])
            .await?
            .pop()
            .ok_or_else(empty_response)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.embedding_inputs) {
            vectors.extend(self.embeddings(batch).await?);
        }
        Ok(vectors)
    }

    fn supports_embeddings(&self) -> bool {
        self.embedding_model.is_some()
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        PROVIDER
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [String],
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}
