use super::ImageBackend;
use crate::{
    error::Result,
    imaging,
    models::{BackendKind, BackendRequest, BackendResponse, ModelInfo, Part},
};
use async_trait::async_trait;
use sha2::{Digest, Sha256};

const DRYRUN_SIZE: u32 = 256;

/// Offline backend: a solid square whose colour is a hash of the prompt.
#[derive(Debug, Clone, Default)]
pub struct DryRunBackend;

impl DryRunBackend {
    pub fn new() -> Self {
        Self
    }

    pub fn supported_models() -> Vec<ModelInfo> {
        vec![ModelInfo::new(
            "dryrun",
            "Dry run",
            "promptpaint",
            BackendKind::DryRun,
            "Deterministic solid-colour PNG, no network",
        )]
    }
}

fn color_from_prompt(prompt: &str) -> [u8; 3] {
    let digest = Sha256::digest(prompt.as_bytes());
    [digest[0], digest[1], digest[2]]
}

#[async_trait]
impl ImageBackend for DryRunBackend {
    fn name(&self) -> &str {
        "dryrun"
    }

    fn model(&self) -> &str {
        "dryrun"
    }

    fn ensure_configured(&self) -> Result<()> {
        Ok(())
    }

    async fn generate(&self, request: &BackendRequest) -> Result<BackendResponse> {
        let [r, g, b] = color_from_prompt(&request.prompt);
        let png = imaging::solid_png(DRYRUN_SIZE, DRYRUN_SIZE, [r, g, b])?;
        log::debug!("Dry run image #{:02x}{:02x}{:02x} for: {}", r, g, b, request.prompt);

        Ok(BackendResponse::single(vec![
            Part::Text(format!(
                "Dry run: a {}x{} swatch of #{:02x}{:02x}{:02x}.",
                DRYRUN_SIZE, DRYRUN_SIZE, r, g, b
            )),
            Part::image(png, "image/png"),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Modality;

    #[tokio::test]
    async fn test_dryrun_is_deterministic() {
        let request = BackendRequest {
            model: "dryrun".into(),
            prompt: "a lighthouse at dusk".into(),
            response_modalities: vec![Modality::Text, Modality::Image],
            stream: false,
        };
        let first = DryRunBackend::new().generate(&request).await.unwrap();
        let second = DryRunBackend::new().generate(&request).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.candidates[0].parts.len(), 2);
    }
}
