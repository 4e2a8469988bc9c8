use super::{http, ImageBackend};
use crate::{
    config::DiffusionConfig,
    error::{GenerationError, Result},
    models::{BackendKind, BackendRequest, BackendResponse, ModelInfo, Part},
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize)]
struct ImagesRequest<'a> {
    prompt: &'a str,
    model: &'a str,
    n: u32,
    size: &'a str,
    response_format: &'static str,
}

#[derive(Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Deserialize)]
struct ImageData {
    #[serde(default)]
    b64_json: Option<String>,
    #[serde(default)]
    revised_prompt: Option<String>,
}

/// Local diffusion pipeline behind an OpenAI-style `/v1/images/generations`.
#[derive(Clone)]
pub struct DiffusionBackend {
    http: reqwest::Client,
    config: DiffusionConfig,
}

impl DiffusionBackend {
    pub fn new(config: DiffusionConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: http::build_client(timeout)?,
            config,
        })
    }

    pub fn supported_models() -> Vec<ModelInfo> {
        vec![ModelInfo::new(
            "stable-diffusion",
            "Stable Diffusion (local)",
            "Local",
            BackendKind::Diffusion,
            "Any server exposing /v1/images/generations with b64_json output",
        )]
    }

    fn endpoint(&self) -> Result<reqwest::Url> {
        let base = reqwest::Url::parse(&self.config.base_url).map_err(|e| {
            GenerationError::Configuration(format!(
                "invalid diffusion URL '{}': {}",
                self.config.base_url, e
            ))
        })?;
        let path = format!("{}/v1/images/generations", base.path().trim_end_matches('/'));
        let mut url = base;
        url.set_path(&path);
        Ok(url)
    }
}

#[async_trait]
impl ImageBackend for DiffusionBackend {
    fn name(&self) -> &str {
        "diffusion"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn ensure_configured(&self) -> Result<()> {
        self.endpoint().map(|_| ())
    }

    async fn generate(&self, request: &BackendRequest) -> Result<BackendResponse> {
        let body = ImagesRequest {
            prompt: &request.prompt,
            model: &request.model,
            n: 1,
            size: &self.config.size,
            response_format: "b64_json",
        };

        log::info!("🎨 Generating image with local pipeline: {}", request.model);

        let mut builder = self.http.post(self.endpoint()?).json(&body);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await?;

        let payload: ImagesResponse = http::read_json("Diffusion", response).await?;
        into_backend_response(payload)
    }
}

/// Each entry of `data` is one candidate; only the first is kept.
fn into_backend_response(payload: ImagesResponse) -> Result<BackendResponse> {
    let Some(item) = payload.data.into_iter().next() else {
        return Ok(BackendResponse::default());
    };

    let mut parts = Vec::new();
    if let Some(revised) = item.revised_prompt.filter(|p| !p.is_empty()) {
        parts.push(Part::Text(revised));
    }
    if let Some(b64) = item.b64_json.filter(|b| !b.is_empty()) {
        let data = BASE64
            .decode(b64.as_bytes())
            .map_err(|e| GenerationError::Decode(format!("b64_json is not valid base64: {}", e)))?;
        parts.push(Part::image(data, "image/png"));
    }
    Ok(BackendResponse::single(parts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_keeps_base_path() {
        let backend = DiffusionBackend::new(
            DiffusionConfig::new().with_base_url("http://gpu-box:7860/sd/"),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            backend.endpoint().unwrap().as_str(),
            "http://gpu-box:7860/sd/v1/images/generations"
        );
    }

    #[test]
    fn test_bad_url_is_configuration_error() {
        let backend = DiffusionBackend::new(
            DiffusionConfig::new().with_base_url("not a url"),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            backend.ensure_configured().unwrap_err().kind(),
            "configuration_error"
        );
    }

    #[test]
    fn test_revised_prompt_and_image() {
        let payload: ImagesResponse = serde_json::from_value(serde_json::json!({
            "created": 1700000000,
            "data": [{"b64_json": BASE64.encode([5u8, 6]), "revised_prompt": "a fox, watercolor"}]
        }))
        .unwrap();
        let response = into_backend_response(payload).unwrap();
        assert_eq!(
            response.candidates[0].parts,
            vec![
                Part::text("a fox, watercolor"),
                Part::image(vec![5, 6], "image/png")
            ]
        );
    }

    #[test]
    fn test_only_first_entry_is_decoded() {
        let payload: ImagesResponse = serde_json::from_value(serde_json::json!({
            "data": [{"b64_json": BASE64.encode([5u8])}, {"b64_json": "***"}]
        }))
        .unwrap();
        let response = into_backend_response(payload).unwrap();
        assert_eq!(response.candidates.len(), 1);
        assert_eq!(response.candidates[0].parts, vec![Part::image(vec![5], "image/png")]);
    }

    #[test]
    fn test_empty_data_has_no_candidates() {
        let payload: ImagesResponse = serde_json::from_value(serde_json::json!({"data": []})).unwrap();
        assert!(into_backend_response(payload).unwrap().candidates.is_empty());
    }
}
