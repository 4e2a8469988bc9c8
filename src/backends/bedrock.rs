use super::ImageBackend;
use crate::{
    config::BedrockConfig,
    error::{GenerationError, Result},
    models::{BackendKind, BackendRequest, BackendResponse, ModelInfo, Part},
};
use async_trait::async_trait;
use aws_sdk_bedrockruntime::{
    config::ProvideCredentials,
    error::{ProvideErrorMetadata, SdkError},
    primitives::Blob,
    Client,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
struct TitanImageResponse {
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Amazon Titan image generator through Bedrock `InvokeModel`.
#[derive(Clone)]
pub struct BedrockBackend {
    client: Client,
    config: BedrockConfig,
    /// Why the credential chain came up empty, if it did.
    credentials_error: Option<String>,
}

impl BedrockBackend {
    pub async fn new(config: BedrockConfig) -> Result<Self> {
        let region = aws_sdk_bedrockruntime::config::Region::new(
            config.region.clone().unwrap_or_else(|| "us-east-1".to_string()),
        );

        let aws_config = match (&config.access_key, &config.secret_key) {
            (Some(access_key), Some(secret_key)) => {
                aws_config::from_env()
                    .credentials_provider(aws_sdk_bedrockruntime::config::Credentials::new(
                        access_key,
                        secret_key,
                        None,
                        None,
                        "promptpaint",
                    ))
                    .region(region)
                    .load()
                    .await
            }
            (None, None) => aws_config::from_env().region(region).load().await,
            _ => {
                return Err(GenerationError::Configuration(
                    "AWS access key and secret key must be supplied together".into(),
                ))
            }
        };

        let credentials_error = match aws_config.credentials_provider() {
            Some(provider) => match provider.provide_credentials().await {
                Ok(_) => None,
                Err(e) => {
                    log::warn!("⚠️  AWS credentials could not be resolved: {}", e);
                    Some(format!("AWS credentials could not be resolved: {}", e))
                }
            },
            None => Some("no AWS credentials provider is configured".to_string()),
        };

        Ok(Self {
            client: Client::new(&aws_config),
            config,
            credentials_error,
        })
    }

    pub fn supported_models() -> Vec<ModelInfo> {
        vec![
            ModelInfo::new(
                "amazon.titan-image-generator-v1",
                "Titan Image Generator G1",
                "Amazon",
                BackendKind::Bedrock,
                "Text-to-image generation on Bedrock",
            ),
            ModelInfo::new(
                "amazon.titan-image-generator-v2:0",
                "Titan Image Generator G1 v2",
                "Amazon",
                BackendKind::Bedrock,
                "Second revision of the Titan image model",
            ),
        ]
    }

    fn payload(&self, prompt: &str) -> serde_json::Value {
        json!({
            "taskType": "TEXT_IMAGE",
            "textToImageParams": {
                "text": prompt,
            },
            "imageGenerationConfig": {
                "numberOfImages": 1,
                "width": self.config.width,
                "height": self.config.height,
                "quality": "standard",
                "cfgScale": 8.0
            }
        })
    }
}

#[async_trait]
impl ImageBackend for BedrockBackend {
    fn name(&self) -> &str {
        "bedrock"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn ensure_configured(&self) -> Result<()> {
        if !self.config.model.starts_with("amazon.titan-image-generator") {
            return Err(GenerationError::Configuration(format!(
                "unsupported Bedrock image model: {}",
                self.config.model
            )));
        }
        match (&self.config.access_key, &self.config.secret_key) {
            (Some(_), None) | (None, Some(_)) => Err(GenerationError::Configuration(
                "AWS access key and secret key must be supplied together".into(),
            )),
            _ => match &self.credentials_error {
                Some(reason) => Err(GenerationError::Configuration(reason.clone())),
                None => Ok(()),
            },
        }
    }

    async fn generate(&self, request: &BackendRequest) -> Result<BackendResponse> {
        let request_json = serde_json::to_string(&self.payload(&request.prompt))
            .map_err(|e| GenerationError::Validation(e.to_string()))?;

        log::info!("🎨 Generating image with model: {}", request.model);

        let response = self
            .client
            .invoke_model()
            .model_id(&request.model)
            .content_type("application/json")
            .accept("application/json")
            .body(Blob::new(request_json.into_bytes()))
            .send()
            .await
            .map_err(|e| {
                log::error!("AWS SDK Image Generation Error details: {:?}", e);
                let message = e
                    .message()
                    .map(str::to_string)
                    .unwrap_or_else(|| e.to_string());
                let transport = matches!(e, SdkError::TimeoutError(_) | SdkError::DispatchFailure(_));
                classify(e.code(), message, transport)
            })?;

        let titan: TitanImageResponse = serde_json::from_slice(&response.body.into_inner())
            .map_err(|e| GenerationError::Backend {
                status: None,
                message: format!("Bedrock returned an unexpected payload: {}", e),
            })?;

        into_backend_response(titan)
    }
}

/// Map Bedrock error codes onto the shared taxonomy.
///
/// Without a service code only timeouts and dispatch failures are worth
/// retrying.
fn classify(code: Option<&str>, message: String, transport: bool) -> GenerationError {
    match code {
        Some("ThrottlingException") => GenerationError::from_status(429, message),
        Some("ServiceUnavailableException") | Some("ModelNotReadyException") => {
            GenerationError::from_status(503, message)
        }
        Some("AccessDeniedException")
        | Some("UnrecognizedClientException")
        | Some("ExpiredTokenException") => GenerationError::from_status(403, message),
        Some("ValidationException") => GenerationError::from_status(400, message),
        Some(other) => GenerationError::Backend {
            status: None,
            message: format!("{}: {}", other, message),
        },
        None if transport => GenerationError::TransientBackend {
            status: None,
            message,
        },
        None => GenerationError::Backend {
            status: None,
            message,
        },
    }
}

fn into_backend_response(titan: TitanImageResponse) -> Result<BackendResponse> {
    if let Some(error) = titan.error.filter(|e| !e.is_empty()) {
        return Err(GenerationError::Backend {
            status: None,
            message: error,
        });
    }

    let mut images = titan.images.into_iter();
    let Some(first) = images.next() else {
        return Ok(BackendResponse::default());
    };
    if images.len() > 0 {
        log::debug!("Ignoring {} additional Titan image(s)", images.len());
    }

    let data = BASE64
        .decode(first.as_bytes())
        .map_err(|e| GenerationError::Decode(format!("image is not valid base64: {}", e)))?;
    let parts = vec![Part::image(data, "image/png")];

    Ok(BackendResponse::single(parts))
}
