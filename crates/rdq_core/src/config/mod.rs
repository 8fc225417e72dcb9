use std::path::Path;

use figment::providers::{Env, Format, Json, Serialized};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorCode};

pub const DEFAULT_TOP_K: u32 = 4;
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
pub const DEFAULT_EMBED_TIMEOUT_MS: u64 = 10_000;
/// Environment variables named `RDQ_<FIELD>` override file values, e.g.
/// `RDQ_TOP_K=8` or `RDQ_OLLAMA_BASE_URL=http://gpu-box:11434`.
pub const ENV_PREFIX: &str = "RDQ_";

/// Retrieval tuning knobs. Score floors differ per embedding model, so none of
/// these are baked into the retrieval code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: u32,
    /// Drop hits scoring below this value. `None` keeps everything.
    pub min_score: Option<f32>,
    pub dedup_by_section: bool,
    pub ollama_base_url: String,
    pub embed_timeout_ms: u64,
    pub llm_model: Option<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            min_score: None,
            dedup_by_section: true,
            ollama_base_url: DEFAULT_OLLAMA_URL.to_string(),
            embed_timeout_ms: DEFAULT_EMBED_TIMEOUT_MS,
            llm_model: None,
        }
    }
}

impl RetrievalConfig {
    /// Layered sources, lowest precedence first: defaults, the JSON file at
    /// `path` when given, then `RDQ_*` environment variables.
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Json::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn from_figment(figment: &Figment) -> Result<Self, AppError> {
        let cfg: Self = figment.extract().map_err(|e| {
            AppError::new(ErrorCode::ConfigInvalid, "Failed to extract retrieval config")
                .with_details(e.to_string())
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Defaults, then the optional JSON file, then `RDQ_*` overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        if let Some(path) = path {
            require_file(path)?;
        }
        Self::from_figment(&Self::figment(path))
    }

    /// Defaults overlaid with a JSON file only. Environment is not consulted.
    pub fn from_json_file(path: &Path) -> Result<Self, AppError> {
        require_file(path)?;
        Self::from_figment(
            &Figment::new()
                .merge(Serialized::defaults(Self::default()))
                .merge(Json::file(path)),
        )
    }

    /// Defaults overridden by `RDQ_*` process environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        Self::load(None)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.top_k == 0 {
            return Err(AppError::new(ErrorCode::ConfigInvalid, "top_k must be at least 1"));
        }
        if let Some(min) = self.min_score {
            if !min.is_finite() || !(-1.0..=1.0).contains(&min) {
                return Err(
                    AppError::new(ErrorCode::ConfigInvalid, "min_score must lie within [-1, 1]")
                        .with_details(format!("min_score={min}")),
                );
            }
        }
        if self.embed_timeout_ms == 0 {
            return Err(AppError::new(
                ErrorCode::ConfigInvalid,
                "embed_timeout_ms must be positive",
            ));
        }
        Ok(())
    }
}

// Figment treats a missing file as an empty source; an explicit path must exist.
fn require_file(path: &Path) -> Result<(), AppError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(AppError::new(ErrorCode::ConfigInvalid, "Config file not found")
            .with_details(format!("path={}", path.display())))
    }
}
