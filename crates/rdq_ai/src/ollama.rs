use rdq_core::error::{AppError, ErrorCode};

#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
}

impl OllamaClient {
    /// Create a client for an Ollama server given as `scheme://host[:port]`.
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        validate_base_url(&base_url)?;
        Ok(Self { base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn health_check(&self) -> Result<(), AppError> {
        let url = format!("{}/api/tags", self.base_url);
        let resp = ureq::get(&url)
            .timeout(std::time::Duration::from_millis(800))
            .call();

        match resp {
            Ok(r) if r.status() == 200 => Ok(()),
            Ok(r) => Err(AppError::new(
                ErrorCode::EmbeddingUnavailable,
                "Ollama health check failed",
            )
            .with_details(format!("status={}", r.status()))),
            Err(e) => Err(AppError::new(
                ErrorCode::EmbeddingUnavailable,
                "Failed to reach Ollama",
            )
            .with_details(e.to_string())
            .with_retryable(true)),
        }
    }
}

fn validate_base_url(base_url: &str) -> Result<(), AppError> {
    let reject = |why: &str| {
        AppError::new(ErrorCode::RemoteNotAllowed, "Invalid Ollama base URL")
            .with_details(format!("base_url={base_url}; reason={why}"))
    };

    let rest = base_url
        .strip_prefix("http://")
        .or_else(|| base_url.strip_prefix("https://"))
        .ok_or_else(|| reject("scheme must be http or https"))?;
    if rest.contains('/') {
        return Err(reject("path not allowed"));
    }
    if rest.contains('@') {
        return Err(reject("userinfo not allowed"));
    }

    // Bracketed IPv6 literals carry colons of their own.
    let (host, port) = if let Some(v6) = rest.strip_prefix('[') {
        let end = v6.find(']').ok_or_else(|| reject("unterminated IPv6 literal"))?;
        let after = &v6[end + 1..];
        let port = match after.strip_prefix(':') {
            Some(p) => Some(p),
            None if after.is_empty() => None,
            None => return Err(reject("unexpected text after IPv6 literal")),
        };
        (&v6[..end], port)
    } else {
        match rest.split_once(':') {
            Some((h, p)) => (h, Some(p)),
            None => (rest, None),
        }
    };

    if host.is_empty() {
        return Err(reject("host is empty"));
    }
    if let Some(port) = port {
        match port.parse::<u16>() {
            Ok(p) if p > 0 => {}
            _ => return Err(reject("port must be within 1..=65535")),
        }
    }
    Ok(())
}
