pub mod bedrock;
pub mod diffusion;
pub mod dryrun;
pub mod gemini;
mod http;

use crate::{
    config::Config,
    error::Result,
    models::{BackendKind, BackendRequest, BackendResponse, ModelInfo},
};
use async_trait::async_trait;
use std::sync::Arc;

pub use bedrock::BedrockBackend;
pub use diffusion::DiffusionBackend;
pub use dryrun::DryRunBackend;
pub use gemini::GeminiBackend;

/// A service that turns a prompt into a response of text and image parts.
#[async_trait]
pub trait ImageBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Model used when the request does not name one.
    fn model(&self) -> &str;

    /// Fail fast when credentials or endpoints are missing, before any call.
    fn ensure_configured(&self) -> Result<()>;

    async fn generate(&self, request: &BackendRequest) -> Result<BackendResponse>;
}

/// Build the backend selected in `config`.
pub async fn connect(config: &Config) -> Result<Arc<dyn ImageBackend>> {
    let backend: Arc<dyn ImageBackend> = match config.backend {
        BackendKind::Gemini => Arc::new(GeminiBackend::new(
            config.gemini.clone(),
            config.request_timeout,
        )?),
        BackendKind::Bedrock => Arc::new(BedrockBackend::new(config.bedrock.clone()).await?),
        BackendKind::Diffusion => Arc::new(DiffusionBackend::new(
            config.diffusion.clone(),
            config.request_timeout,
        )?),
        BackendKind::DryRun => Arc::new(DryRunBackend::new()),
    };

    log::info!(
        "✅ {} backend ready (model: {})",
        backend.name(),
        backend.model()
    );
    Ok(backend)
}

pub fn supported_models(kind: BackendKind) -> Vec<ModelInfo> {
    match kind {
        BackendKind::Gemini => GeminiBackend::supported_models(),
        BackendKind::Bedrock => BedrockBackend::supported_models(),
        BackendKind::Diffusion => DiffusionBackend::supported_models(),
        BackendKind::DryRun => DryRunBackend::supported_models(),
    }
}
