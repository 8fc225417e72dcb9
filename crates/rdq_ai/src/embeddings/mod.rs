use rdq_core::error::AppError;

/// Text to vector adapter. Implementations must be deterministic for identical
/// `(model, input)` pairs and report backend failures as
/// `ErrorCode::EmbeddingUnavailable`.
pub trait Embedder {
    fn embed(&self, model: &str, input: &str) -> Result<Vec<f32>, AppError>;
}

pub mod ollama_embed;

pub use ollama_embed::OllamaEmbedder;
