use reqwest::blocking::Client;
use thiserror::Error;
use tracing::debug;

use super::types::{EmbeddingRequest, EmbeddingResponse};

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("embedding request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("embedding provider returned {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("embedding count mismatch: expected {expected}, got {got}")]
    CountMismatch { expected: usize, got: usize },
}

/// Blocking HTTP client for an OpenAI-compatible embeddings endpoint.
pub struct EmbeddingClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl EmbeddingClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Embeds `texts` in one request, returning one vector per input in
    /// input order. Empty input short-circuits without a request.
    pub fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let expected = texts.len();

        let request = EmbeddingRequest {
            model: self.model.clone(),
            input: texts,
        };
        let url = format!("{}/v1/embeddings", self.base_url.trim_end_matches('/'));
        debug!(%url, inputs = expected, "requesting embeddings");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(EmbedError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: EmbeddingResponse = response.json()?;
        if parsed.data.len() != expected {
            return Err(EmbedError::CountMismatch {
                expected,
                got: parsed.data.len(),
            });
        }

        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}
