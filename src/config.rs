use std::collections::HashMap;
use std::env;

use crate::dispatch::MediaKind;
use crate::dispatch::registry::{GenerationVendorType, ModelEntry, VendorConfig};

pub struct Config {
    pub models: HashMap<String, ModelEntry>,
}

impl Config {
    pub fn from_env() -> Self {
        let luma_key = env::var("LUMA_API_KEY").ok();

        let mut models = HashMap::new();

        if let Some(key) = luma_key {
            models.insert(
                "photon-1".to_string(),
                ModelEntry {
                    model_id: "photon-1".to_string(),
                    provider: "luma".to_string(),
                    kind: MediaKind::Image,
                    backend: VendorConfig::Polled {
                        vendor_type: GenerationVendorType::DreamMachine,
                        api_key: key.clone(),
                    },
                    description: "High-fidelity image generation".to_string(),
                },
            );

            models.insert(
                "photon-flash-1".to_string(),
                ModelEntry {
                    model_id: "photon-flash-1".to_string(),
                    provider: "luma".to_string(),
                    kind: MediaKind::Image,
                    backend: VendorConfig::Polled {
                        vendor_type: GenerationVendorType::DreamMachine,
                        api_key: key.clone(),
                    },
                    description: "Fast image drafts, lower fidelity".to_string(),
                },
            );

            models.insert(
                "ray-2".to_string(),
                ModelEntry {
                    model_id: "ray-2".to_string(),
                    provider: "luma".to_string(),
                    kind: MediaKind::Video,
                    backend: VendorConfig::Polled {
                        vendor_type: GenerationVendorType::DreamMachine,
                        api_key: key,
                    },
                    description: "Text-to-video, 720p five-second clips".to_string(),
                },
            );
        } else {
            tracing::warn!("LUMA_API_KEY not set — generation models unavailable");
        }

        if models.is_empty() {
            tracing::error!("no models configured — generate calls will fail");
        }

        Config { models }
    }
}
