use super::{http, ImageBackend};
use crate::{
    config::GeminiConfig,
    error::{GenerationError, Result},
    models::{BackendKind, BackendRequest, BackendResponse, Candidate, ModelInfo, Part},
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<&'static str>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
    #[serde(default, alias = "prompt_feedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Default, Deserialize)]
struct WireCandidate {
    #[serde(default)]
    content: Option<WireContent>,
}

#[derive(Debug, Default, Deserialize)]
struct WireContent {
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default, alias = "inline_data")]
    inline_data: Option<WireBlob>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireBlob {
    #[serde(default, alias = "mime_type")]
    mime_type: Option<String>,
    #[serde(default)]
    data: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default, alias = "block_reason")]
    block_reason: Option<String>,
}

/// Google Gemini `generateContent` over REST.
#[derive(Clone)]
pub struct GeminiBackend {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiBackend {
    pub fn new(config: GeminiConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: http::build_client(timeout)?,
            config,
        })
    }

    pub fn supported_models() -> Vec<ModelInfo> {
        vec![
            ModelInfo::new(
                "gemini-2.0-flash-exp-image-generation",
                "Gemini 2.0 Flash (image generation)",
                "Google",
                BackendKind::Gemini,
                "Experimental Flash model returning interleaved text and images",
            ),
            ModelInfo::new(
                "gemini-2.0-flash-preview-image-generation",
                "Gemini 2.0 Flash Preview (image generation)",
                "Google",
                BackendKind::Gemini,
                "Preview Flash model with TEXT and IMAGE response modalities",
            ),
        ]
    }

    fn endpoint(&self, model: &str) -> String {
        let model = model.trim_start_matches("models/");
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        )
    }

    fn api_key(&self) -> Result<&str> {
        self.config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                GenerationError::Configuration(
                    "GOOGLE_API_KEY (or GEMINI_API_KEY) is not set".into(),
                )
            })
    }
}

#[async_trait]
impl ImageBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn ensure_configured(&self) -> Result<()> {
        let key = self.api_key()?;
        if key.chars().any(char::is_whitespace) {
            return Err(GenerationError::Configuration(
                "the Gemini API key contains whitespace".into(),
            ));
        }
        Ok(())
    }

    async fn generate(&self, request: &BackendRequest) -> Result<BackendResponse> {
        let api_key = self.api_key()?;
        let modalities: Vec<&'static str> = request
            .response_modalities
            .iter()
            .map(|m| m.as_gemini())
            .collect();

        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart {
                    text: &request.prompt,
                }],
            }],
            generation_config: if modalities.is_empty() {
                None
            } else {
                Some(GenerationConfig {
                    response_modalities: modalities,
                })
            },
        };

        log::info!("🎨 Generating image with model: {}", request.model);

        let response = self
            .http
            .post(self.endpoint(&request.model))
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let payload: GenerateContentResponse = http::read_json("Gemini", response).await?;
        into_backend_response(payload)
    }
}

/// Only the first candidate survives, and only its first inline image is
/// decoded. Later inline parts are skipped without touching their payload.
fn into_backend_response(payload: GenerateContentResponse) -> Result<BackendResponse> {
    let block_reason = payload.prompt_feedback.and_then(|f| f.block_reason);
    let skipped = payload.candidates.len().saturating_sub(1);
    let Some(candidate) = payload.candidates.into_iter().next() else {
        return Ok(BackendResponse {
            candidates: Vec::new(),
            block_reason,
        });
    };
    if skipped > 0 {
        log::debug!("Ignoring {} additional candidate(s)", skipped);
    }

    let mut parts = Vec::new();
    let mut has_image = false;
    for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
        if let Some(blob) = part.inline_data.filter(|b| !b.data.is_empty()) {
            if has_image {
                log::debug!("Ignoring additional inline part ({} base64 chars)", blob.data.len());
                continue;
            }
            let data = BASE64.decode(blob.data.as_bytes()).map_err(|e| {
                GenerationError::Decode(format!("inline data is not valid base64: {}", e))
            })?;
            let mime_type = blob.mime_type.unwrap_or_else(|| "image/png".to_string());
            parts.push(Part::image(data, mime_type));
            has_image = true;
        } else if let Some(text) = part.text {
            parts.push(Part::Text(text));
        }
    }

    Ok(BackendResponse {
        candidates: vec![Candidate::new(parts)],
        block_reason,
    })
}
