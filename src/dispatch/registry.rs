use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::config::Config;
use crate::dispatch::generation::{GenerationDispatch, budget_for};
use crate::dispatch::{GenerationOutcome, GenerationRequest, MediaKind};
use crate::error::EaselError;

/// Max concurrent generation jobs per easel instance. Low limit since a video
/// job can hold its permit for up to half an hour.
const GENERATION_MAX_CONCURRENT: usize = 4;

/// Discriminant for generation vendors.
#[derive(Clone, Debug)]
pub enum GenerationVendorType {
    DreamMachine,
}

/// Backend-specific configuration for a model entry. Every current vendor is
/// submit-then-poll; one-shot backends would get their own variant.
#[derive(Clone)]
pub enum VendorConfig {
    Polled {
        vendor_type: GenerationVendorType,
        api_key: String,
    },
}

#[derive(Clone)]
pub struct ModelEntry {
    pub model_id: String,
    pub provider: String,
    pub kind: MediaKind,
    pub backend: VendorConfig,
    /// One-line description of the model's purpose.
    pub description: String,
}

impl ModelEntry {
    /// Returns the backend type as a string for display purposes.
    pub fn backend_name(&self) -> &'static str {
        match &self.backend {
            VendorConfig::Polled { .. } => "polled",
        }
    }
}

impl std::fmt::Debug for ModelEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("ModelEntry");
        s.field("model_id", &self.model_id)
            .field("provider", &self.provider)
            .field("kind", &self.kind);

        match &self.backend {
            VendorConfig::Polled { vendor_type, .. } => {
                s.field("backend", &"polled")
                    .field("vendor_type", vendor_type)
                    .field("api_key", &"[REDACTED]");
            }
        }

        s.field("description", &self.description);
        s.finish()
    }
}

pub struct Registry {
    models: HashMap<String, ModelEntry>,
    generation: GenerationDispatch,
    generation_semaphore: Semaphore,
}

impl Registry {
    pub fn from_config(config: Config) -> Self {
        Self {
            models: config.models,
            generation: GenerationDispatch::new(),
            generation_semaphore: Semaphore::new(GENERATION_MAX_CONCURRENT),
        }
    }

    /// Returns the number of generation semaphore permits (for testing).
    pub fn generation_semaphore_permits(&self) -> usize {
        self.generation_semaphore.available_permits()
    }

    pub fn get(&self, model: &str) -> Option<&ModelEntry> {
        self.models.get(model)
    }

    pub fn list_models(&self) -> Vec<(&String, &ModelEntry)> {
        self.models.iter().collect()
    }

    /// Suggest similar model names for a failed lookup (substring match).
    /// Sorted alphabetically, capped at 5 to keep error messages readable.
    pub fn suggest_models(&self, query: &str) -> Vec<String> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return vec![];
        }
        let mut suggestions: Vec<String> = self
            .models
            .keys()
            .filter(|k| {
                let k_lower = k.to_lowercase();
                k_lower.contains(&q) || q.contains(&k_lower)
            })
            .cloned()
            .collect();
        suggestions.sort();
        suggestions.truncate(5);
        suggestions
    }

    /// Acquire a semaphore permit within the caller's wait budget.
    /// Returns Timeout if no permit frees up before the budget expires.
    async fn acquire_within(
        semaphore: &Semaphore,
        budget: Duration,
    ) -> Result<tokio::sync::SemaphorePermit<'_>, EaselError> {
        tokio::time::timeout(budget, semaphore.acquire())
            .await
            .map_err(|_| EaselError::Timeout {
                budget_secs: budget.as_secs(),
            })?
            .map_err(|_| EaselError::Other("semaphore closed".to_string()))
    }

    pub async fn generate(
        &self,
        req: &GenerationRequest,
    ) -> Result<GenerationOutcome, EaselError> {
        let entry = self.models.get(&req.model).ok_or_else(|| {
            let suggestions = self.suggest_models(&req.model);
            EaselError::ModelNotFound {
                model: req.model.clone(),
                suggestions,
            }
        })?;

        if entry.kind != req.kind {
            return Err(EaselError::InvalidRequest(format!(
                "model {} generates {}, not {}",
                req.model, entry.kind, req.kind
            )));
        }

        // Substitute the vendor's model_id for the easel model name.
        let resolved = GenerationRequest {
            model: entry.model_id.clone(),
            ..req.clone()
        };
        let req = &resolved;

        match &entry.backend {
            VendorConfig::Polled {
                vendor_type,
                api_key,
            } => {
                let _permit =
                    Self::acquire_within(&self.generation_semaphore, budget_for(req.kind)).await?;
                self.generation
                    .generate(req, &entry.provider, vendor_type, api_key)
                    .await
            }
        }
    }
}
