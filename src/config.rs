use crate::models::BackendKind;
use crate::output::OutputSettings;
use crate::retry::RetryPolicy;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-exp-image-generation";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_BEDROCK_MODEL: &str = "amazon.titan-image-generator-v1";
pub const DEFAULT_DIFFUSION_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_OUTPUT_DIR: &str = "generated_images";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct BedrockConfig {
    pub region: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub model: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct DiffusionConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub size: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: Option<u16>,
    pub backend: BackendKind,
    pub gemini: GeminiConfig,
    pub bedrock: BedrockConfig,
    pub diffusion: DiffusionConfig,
    pub output_dir: PathBuf,
    pub save_images: bool,
    pub retry: RetryPolicy,
    pub request_timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        GeminiConfig {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        }
    }
}

impl GeminiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// `GOOGLE_API_KEY` wins over `GEMINI_API_KEY`.
    pub fn from_env() -> Self {
        let api_key = non_empty_var("GOOGLE_API_KEY").or_else(|| non_empty_var("GEMINI_API_KEY"));
        let model = non_empty_var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());
        let base_url =
            non_empty_var("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string());

        GeminiConfig {
            api_key,
            model,
            base_url,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for BedrockConfig {
    fn default() -> Self {
        BedrockConfig {
            region: None,
            access_key: None,
            secret_key: None,
            model: DEFAULT_BEDROCK_MODEL.to_string(),
            width: 1024,
            height: 1024,
        }
    }
}

impl BedrockConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        BedrockConfig {
            region: non_empty_var("AWS_REGION").or_else(|| non_empty_var("AWS_DEFAULT_REGION")),
            access_key: non_empty_var("AWS_ACCESS_KEY_ID"),
            secret_key: non_empty_var("AWS_SECRET_ACCESS_KEY"),
            model: non_empty_var("BEDROCK_MODEL").unwrap_or_else(|| DEFAULT_BEDROCK_MODEL.to_string()),
            ..Default::default()
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.access_key = Some(access_key.into());
        self.secret_key = Some(secret_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

impl Default for DiffusionConfig {
    fn default() -> Self {
        DiffusionConfig {
            base_url: DEFAULT_DIFFUSION_URL.to_string(),
            api_key: None,
            model: "stable-diffusion".to_string(),
            size: "512x512".to_string(),
        }
    }
}

impl DiffusionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        DiffusionConfig {
            base_url: non_empty_var("DIFFUSION_URL").unwrap_or(defaults.base_url),
            api_key: non_empty_var("DIFFUSION_API_KEY"),
            model: non_empty_var("DIFFUSION_MODEL").unwrap_or(defaults.model),
            size: non_empty_var("DIFFUSION_SIZE").unwrap_or(defaults.size),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: None,
            backend: BackendKind::Gemini,
            gemini: GeminiConfig::default(),
            bedrock: BedrockConfig::default(),
            diffusion: DiffusionConfig::default(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            save_images: true,
            retry: RetryPolicy::default(),
            request_timeout: Duration::from_secs(120),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        let port = env::var("PORT").ok().and_then(|port| port.parse().ok());
        let backend = match non_empty_var("PROMPTPAINT_BACKEND") {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                log::warn!("⚠️  {}, falling back to {}", e, defaults.backend);
                defaults.backend
            }),
            None => defaults.backend,
        };
        let save_images = env::var("SAVE_IMAGES")
            .ok()
            .map_or(true, |val| !matches!(val.trim(), "false" | "0" | "no"));

        let mut retry = RetryPolicy::default();
        if let Some(attempts) = env::var("RETRY_MAX_ATTEMPTS").ok().and_then(|v| v.parse().ok()) {
            retry = retry.with_max_attempts(attempts);
        }
        if let Some(ms) = env::var("RETRY_BASE_DELAY_MS").ok().and_then(|v| v.parse().ok()) {
            retry = retry.with_base_delay(Duration::from_millis(ms));
        }

        let request_timeout = env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        Config {
            port,
            backend,
            gemini: GeminiConfig::from_env(),
            bedrock: BedrockConfig::from_env(),
            diffusion: DiffusionConfig::from_env(),
            output_dir: non_empty_var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            save_images,
            retry,
            request_timeout,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_gemini(mut self, config: GeminiConfig) -> Self {
        self.gemini = config;
        self.backend = BackendKind::Gemini;
        self
    }

    pub fn with_bedrock(mut self, config: BedrockConfig) -> Self {
        self.bedrock = config;
        self.backend = BackendKind::Bedrock;
        self
    }

    pub fn with_diffusion(mut self, config: DiffusionConfig) -> Self {
        self.diffusion = config;
        self.backend = BackendKind::Diffusion;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self.save_images = true;
        self
    }

    pub fn without_saving(mut self) -> Self {
        self.save_images = false;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Model id of the selected backend.
    pub fn model(&self) -> &str {
        match self.backend {
            BackendKind::Gemini => &self.gemini.model,
            BackendKind::Bedrock => &self.bedrock.model,
            BackendKind::Diffusion => &self.diffusion.model,
            BackendKind::DryRun => "dryrun",
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        match self.backend {
            BackendKind::Gemini => self.gemini.model = model,
            BackendKind::Bedrock => self.bedrock.model = model,
            BackendKind::Diffusion => self.diffusion.model = model,
            BackendKind::DryRun => {}
        }
        self
    }

    pub fn output(&self) -> Option<OutputSettings> {
        if self.save_images {
            Some(OutputSettings::new(self.output_dir.clone()))
        } else {
            None
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
