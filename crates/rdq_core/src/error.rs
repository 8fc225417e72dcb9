use serde::{Deserialize, Serialize};
use std::fmt;

/// Failure categories surfaced to callers. Serialized as SCREAMING_SNAKE_CASE strings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    CorpusFormat,
    EmptyCorpus,
    DimensionMismatch,
    EmptyQuery,
    EmbeddingUnavailable,
    Cancelled,
    InvalidArgument,
    ConfigInvalid,
    RemoteNotAllowed,
    LlmFailed,
    CitationRequired,
    CitationInvalid,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::CorpusFormat => "CORPUS_FORMAT",
            ErrorCode::EmptyCorpus => "EMPTY_CORPUS",
            ErrorCode::DimensionMismatch => "DIMENSION_MISMATCH",
            ErrorCode::EmptyQuery => "EMPTY_QUERY",
            ErrorCode::EmbeddingUnavailable => "EMBEDDING_UNAVAILABLE",
            ErrorCode::Cancelled => "CANCELLED",
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::ConfigInvalid => "CONFIG_INVALID",
            ErrorCode::RemoteNotAllowed => "REMOTE_NOT_ALLOWED",
            ErrorCode::LlmFailed => "LLM_FAILED",
            ErrorCode::CitationRequired => "CITATION_REQUIRED",
            ErrorCode::CitationInvalid => "CITATION_INVALID",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single structured error shape used across the retrieval layers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
    pub retryable: bool,
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            retryable: false,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn corpus_format(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::CorpusFormat, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(details) = &self.details {
            write!(f, " ({details})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}
