use thiserror::Error;

use crate::dispatch::MediaKind;

#[derive(Debug, Error)]
pub enum EaselError {
    #[error("model not found: {model}")]
    ModelNotFound {
        model: String,
        suggestions: Vec<String>,
    },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("generation timed out after {budget_secs}s")]
    Timeout { budget_secs: u64 },

    #[error("generation cancelled after {0} polls")]
    Cancelled(u64),

    #[error("rate limited by {provider}")]
    RateLimited { provider: String },

    #[error("upstream error from {provider}: {message}")]
    Upstream {
        provider: String,
        message: String,
        status: Option<u16>,
    },

    #[error("auth failed for {provider}: {message}")]
    AuthFailed { provider: String, message: String },

    #[error("schema parse error: {0}")]
    SchemaParse(String),

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("generation failed for {provider}: {reason}")]
    GenerationFailed { provider: String, reason: String },

    #[error("generation completed without a {kind} asset from {provider}")]
    MissingAsset { provider: String, kind: MediaKind },

    #[error("{0}")]
    Other(String),
}

impl EaselError {
    /// Extract provider name from structured error variants.
    /// Returns None for variants that don't carry provider context.
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::RateLimited { provider } => Some(provider),
            Self::Upstream { provider, .. } => Some(provider),
            Self::AuthFailed { provider, .. } => Some(provider),
            Self::GenerationFailed { provider, .. } => Some(provider),
            Self::MissingAsset { provider, .. } => Some(provider),
            _ => None,
        }
    }

    /// Returns true when resubmitting as a fresh job may succeed. The wait
    /// loop itself never retries; this is advice for the caller.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            Self::Timeout { .. } => true,
            Self::Upstream { status, .. } => {
                // 5xx = server error (retryable), 4xx = client error (not retryable)
                // status: None = ambiguous (not from HTTP) → safe default: NOT retryable
                status.is_some_and(|s| s >= 500)
            }
            Self::Request(_) => true, // connection errors may be transient
            _ => false,
        }
    }

    /// Produce a sanitized error message safe for returning to MCP clients.
    /// Does not leak internal URLs, job IDs, or connection details.
    pub fn user_message(&self) -> String {
        match self {
            Self::ModelNotFound { model, suggestions } => {
                if suggestions.is_empty() {
                    format!("model not found: {model}")
                } else {
                    format!(
                        "model not found: {model}. Did you mean: {}?",
                        suggestions.join(", ")
                    )
                }
            }
            Self::InvalidRequest(msg) => msg.clone(),
            Self::Timeout { budget_secs } => format!(
                "generation timed out after {budget_secs}s — the vendor job may still be running"
            ),
            Self::Cancelled(_) => "generation cancelled".to_string(),
            Self::RateLimited { provider } => {
                format!("rate limited by {provider} — try again shortly")
            }
            Self::Upstream {
                provider, message, ..
            } => {
                format!("upstream error from {provider}: {message}")
            }
            Self::AuthFailed { provider, message } => {
                format!("authentication failed for {provider}: {message}")
            }
            Self::SchemaParse(_) => "failed to parse vendor response".to_string(),
            Self::Request(_) => "request to vendor failed".to_string(),
            Self::GenerationFailed { reason, .. } => {
                // Vendor reasons ("nsfw_content", "quota exceeded") are the
                // only actionable detail the caller gets. Pass them through.
                format!("generation failed: {reason}")
            }
            Self::MissingAsset { kind, .. } => {
                format!("generation completed but returned no {kind} asset")
            }
            Self::Other(msg) => msg.clone(),
        }
    }
}
