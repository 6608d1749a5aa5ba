use std::sync::Arc;
use std::time::Instant;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Implementation, ServerCapabilities, ServerInfo};
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};

use crate::config::Config;
use crate::dispatch::GenerationRequest;
use crate::dispatch::registry::Registry;
use crate::response::{ToolMetadata, ToolResponse};
use crate::tools::generate::GenerateRequest;
use crate::tools::listmodels::{ListModelsResponse, ModelInfo};
use crate::validate;

#[derive(Clone)]
pub struct EaselServer {
    registry: Arc<Registry>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl EaselServer {
    pub fn new(config: Config) -> Self {
        Self {
            registry: Arc::new(Registry::from_config(config)),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        name = "generate",
        description = "Generate an image or video from a text prompt and return the asset URL. Blocks until the vendor job finishes (up to 5 min for images, 30 min for videos). Use `listmodels` for model names."
    )]
    async fn generate(
        &self,
        Parameters(req): Parameters<GenerateRequest>,
    ) -> Result<CallToolResult, McpError> {
        validate::validate_prompt(&req.prompt).map_err(|msg| McpError::invalid_params(msg, None))?;
        if let Some(ref ratio) = req.aspect_ratio {
            validate::validate_aspect_ratio(ratio)
                .map_err(|msg| McpError::invalid_params(msg, None))?;
        }

        let model = req.model_or_default().to_string();
        let start = Instant::now();

        let provider_req = GenerationRequest {
            prompt: req.prompt,
            kind: req.kind,
            aspect_ratio: req.aspect_ratio,
            model: model.clone(),
            cancellation_token: None,
        };

        let response = match self.registry.generate(&provider_req).await {
            Ok(outcome) => ToolResponse::success(
                outcome.url,
                ToolMetadata {
                    tool_name: "generate".to_string(),
                    model_used: outcome.model,
                    provider_used: outcome.provider,
                    duration_seconds: start.elapsed().as_secs_f64(),
                },
            ),
            Err(e) => {
                tracing::warn!("generate failed: {e}");
                let provider = e.provider().unwrap_or("unknown").to_string();
                ToolResponse::error(
                    e.user_message(),
                    ToolMetadata {
                        tool_name: "generate".to_string(),
                        model_used: model,
                        provider_used: provider,
                        duration_seconds: start.elapsed().as_secs_f64(),
                    },
                )
            }
        };

        Ok(response.into_call_tool_result())
    }

    #[tool(
        name = "listmodels",
        description = "List available generation models with provider, media kind, and wait budget.",
        annotations(read_only_hint = true)
    )]
    async fn listmodels(&self) -> Result<CallToolResult, McpError> {
        let mut models: Vec<ModelInfo> = self
            .registry
            .list_models()
            .into_iter()
            .map(ModelInfo::from)
            .collect();
        models.sort_by(|a, b| a.name.cmp(&b.name));

        let list = ListModelsResponse { models };
        let content = list.to_markdown();

        let response = ToolResponse::success(
            content,
            ToolMetadata {
                tool_name: "listmodels".to_string(),
                model_used: "none".to_string(),
                provider_used: "none".to_string(),
                duration_seconds: 0.0,
            },
        );

        Ok(response.into_call_tool_result())
    }
}

#[tool_handler]
impl ServerHandler for EaselServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "easel".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(
                "Easel: AI image and video generation.\n\n\
                 Workflow:\n\
                 1. Call `listmodels` for exact model names and wait budgets.\n\
                 2. Call `generate` with kind (\"image\" or \"video\") and a prompt.\n\
                    - Images accept `aspect_ratio` (\"16:9\" default).\n\
                    - Videos use fixed vendor parameters (720p, 5s clips).\n\
                    - The call blocks until the vendor finishes; image jobs wait up to\n\
                      5 minutes, video jobs up to 30 minutes.\n\
                 3. The response is a JSON envelope; on success `content` is the asset URL.\n\
                    Download it promptly — vendor URLs expire."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
