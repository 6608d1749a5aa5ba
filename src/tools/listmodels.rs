use serde::Serialize;

use crate::dispatch::generation::budget_for;
use crate::dispatch::registry::ModelEntry;

#[derive(Serialize)]
pub struct ModelInfo {
    pub name: String,
    pub provider: String,
    pub kind: String,
    pub backend: String,
    /// Maximum wait before the server reports a timeout, in seconds.
    pub budget_secs: u64,
    pub description: String,
}

impl From<(&String, &ModelEntry)> for ModelInfo {
    fn from((key, entry): (&String, &ModelEntry)) -> Self {
        Self {
            name: key.clone(),
            provider: entry.provider.clone(),
            kind: entry.kind.to_string(),
            backend: entry.backend_name().to_string(),
            budget_secs: budget_for(entry.kind).as_secs(),
            description: entry.description.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct ListModelsResponse {
    pub models: Vec<ModelInfo>,
}

impl ListModelsResponse {
    pub fn to_markdown(&self) -> String {
        if self.models.is_empty() {
            return "No models configured. Set LUMA_API_KEY and restart.".to_string();
        }
        let mut out = String::from(
            "| model | provider | kind | wait budget | notes |\n|---|---|---|---|---|\n",
        );
        for m in &self.models {
            out.push_str(&format!(
                "| {} | {} | {} | {}s | {} |\n",
                m.name, m.provider, m.kind, m.budget_secs, m.description
            ));
        }
        out
    }
}
