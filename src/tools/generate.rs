use schemars::JsonSchema;
use serde::Deserialize;

use crate::dispatch::MediaKind;

pub const DEFAULT_IMAGE_MODEL: &str = "photon-1";
pub const DEFAULT_VIDEO_MODEL: &str = "ray-2";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GenerateRequest {
    /// What to produce: "image" or "video".
    pub kind: MediaKind,
    /// Text prompt describing the asset to generate.
    pub prompt: String,
    /// Aspect ratio for image jobs as "W:H" (defaults to 16:9). Video jobs use fixed vendor parameters and ignore it.
    pub aspect_ratio: Option<String>,
    /// Model name from `listmodels` output. Defaults per kind. Use exact names.
    pub model: Option<String>,
}

impl GenerateRequest {
    pub fn model_or_default(&self) -> &str {
        self.model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(match self.kind {
                MediaKind::Image => DEFAULT_IMAGE_MODEL,
                MediaKind::Video => DEFAULT_VIDEO_MODEL,
            })
    }
}
