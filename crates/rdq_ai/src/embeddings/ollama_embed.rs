use std::time::Duration;

use rdq_core::error::{AppError, ErrorCode};
use serde::{Deserialize, Serialize};

use super::Embedder;
use crate::ollama::OllamaClient;

const MAX_PROMPT_BYTES: usize = 12_000;

#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: OllamaClient,
    timeout: Duration,
}

impl OllamaEmbedder {
    pub fn new(client: OllamaClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[derive(Debug, Clone, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}

impl Embedder for OllamaEmbedder {
    fn embed(&self, model: &str, input: &str) -> Result<Vec<f32>, AppError> {
        let prompt = truncate_on_char_boundary(input, MAX_PROMPT_BYTES);

        let url = format!("{}/api/embeddings", self.client.base_url());
        let req = EmbeddingsRequest { model, prompt };
        let body = serde_json::to_value(req).map_err(|e| {
            AppError::new(
                ErrorCode::EmbeddingUnavailable,
                "Failed to encode embeddings request",
            )
            .with_details(e.to_string())
        })?;
        let resp = ureq::post(&url).timeout(self.timeout).send_json(body);

        match resp {
            Ok(r) if r.status() == 200 => {
                let v: EmbeddingsResponse = r.into_json().map_err(|e| {
                    AppError::new(
                        ErrorCode::EmbeddingUnavailable,
                        "Failed to decode embeddings response",
                    )
                    .with_details(e.to_string())
                })?;
                if v.embedding.is_empty() {
                    return Err(AppError::new(
                        ErrorCode::EmbeddingUnavailable,
                        "Embeddings response was empty",
                    )
                    .with_details(format!("model={model}")));
                }
                Ok(v.embedding)
            }
            Ok(r) => Err(AppError::new(
                ErrorCode::EmbeddingUnavailable,
                "Embeddings request failed",
            )
            .with_details(format!("model={model}; status={}", r.status()))),
            Err(e) => Err(AppError::new(
                ErrorCode::EmbeddingUnavailable,
                "Failed to call embeddings endpoint",
            )
            .with_details(e.to_string())
            .with_retryable(true)),
        }
    }
}

fn truncate_on_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
