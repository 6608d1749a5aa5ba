pub mod generation;
pub mod registry;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Media kind of a generation request. Selects the vendor endpoint and the
/// wait budget.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Internal request type passed from the server layer to the registry.
#[derive(Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub kind: MediaKind,
    /// Aspect ratio for image jobs ("16:9"). Defaulted when absent. Video jobs
    /// use fixed vendor parameters and ignore it.
    pub aspect_ratio: Option<String>,
    pub model: String,
    /// Cooperative cancellation, checked once per poll tick. Cancelling does
    /// not notify the vendor; the remote job keeps running.
    pub cancellation_token: Option<CancellationToken>,
}

/// Internal result type.
#[derive(Debug)]
pub struct GenerationOutcome {
    pub url: String,
    pub model: String,
    pub provider: String,
}
