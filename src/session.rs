use crate::{
    backends::ImageBackend,
    error::Result,
    extract::extract,
    imaging, logger,
    models::{BackendRequest, GenerationRequest, GenerationResult, Outcome},
    output::{self, OutputSettings},
    retry::{with_retry, RetryPolicy},
};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct SessionSettings {
    pub retry: RetryPolicy,
    /// `None` keeps images in memory only.
    pub output: Option<OutputSettings>,
}

impl SessionSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            retry: config.retry.clone(),
            output: config.output(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_output(mut self, output: OutputSettings) -> Self {
        self.output = Some(output);
        self
    }
}

/// One prompt in, at most one image out.
///
/// Holds no per-request state, so a single session can serve many
/// concurrent callers.
#[derive(Clone)]
pub struct Session {
    backend: Arc<dyn ImageBackend>,
    settings: SessionSettings,
}

impl Session {
    pub fn new(backend: Arc<dyn ImageBackend>, settings: SessionSettings) -> Self {
        Self { backend, settings }
    }

    pub fn backend(&self) -> &dyn ImageBackend {
        self.backend.as_ref()
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub async fn generate(&self, request: GenerationRequest) -> Result<Outcome> {
        let request_id = Uuid::new_v4().to_string();

        let prompt = request.prompt()?;
        self.backend.ensure_configured()?;

        let backend_request = BackendRequest {
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.backend.model().to_string()),
            prompt: prompt.clone(),
            response_modalities: request.response_modalities.clone(),
            stream: false,
        };

        log::info!(
            "🖼️  [{}] {} prompt: {}",
            &request_id[..8],
            self.backend.name(),
            prompt
        );
        let _timer = logger::timer(&format!("generation {}", &request_id[..8]));

        let backend = self.backend.as_ref();
        let call = &backend_request;
        let response =
            with_retry(&self.settings.retry, backend.name(), move || backend.generate(call))
                .await?;

        let extraction = extract(&response);
        let Some(inline) = extraction.image else {
            log::warn!("⚠️  [{}] backend returned no image part", &request_id[..8]);
            return Ok(Outcome::NoImage {
                request_id,
                description: extraction.description,
            });
        };

        let decoded = imaging::decode(&inline.data, &inline.mime_type)?;

        let saved_to = match &self.settings.output {
            Some(settings) => Some(
                output::save_image(
                    settings,
                    request.file_stem_hint().as_deref(),
                    &decoded.mime_type,
                    &inline.data,
                )
                .await?,
            ),
            None => None,
        };

        log::info!(
            "✅ [{}] {}x{} {} ({} bytes)",
            &request_id[..8],
            decoded.width,
            decoded.height,
            decoded.mime_type,
            inline.data.len()
        );

        Ok(Outcome::Generated(GenerationResult {
            request_id,
            prompt,
            description: extraction.description,
            bytes: inline.data,
            mime_type: decoded.mime_type,
            image: decoded.image,
            width: decoded.width,
            height: decoded.height,
            saved_to,
        }))
    }
}
