use image::DynamicImage;
use std::path::PathBuf;

pub const NO_IMAGE_NOTICE: &str = "No image was generated. Try a different prompt.";

#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub request_id: String,
    pub prompt: String,
    pub description: Option<String>,
    /// Exactly the bytes the backend returned; also what gets downloaded.
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub image: DynamicImage,
    pub width: u32,
    pub height: u32,
    pub saved_to: Option<PathBuf>,
}

impl GenerationResult {
    pub fn download_name(&self) -> String {
        match &self.saved_to {
            Some(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| default_download_name(&self.mime_type)),
            None => default_download_name(&self.mime_type),
        }
    }
}

fn default_download_name(mime_type: &str) -> String {
    format!("generated.{}", crate::output::extension_for(mime_type))
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Generated(GenerationResult),
    /// The call succeeded but no image part came back.
    NoImage {
        request_id: String,
        description: Option<String>,
    },
}

impl Outcome {
    pub fn image(&self) -> Option<&GenerationResult> {
        match self {
            Outcome::Generated(result) => Some(result),
            Outcome::NoImage { .. } => None,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Outcome::Generated(result) => result.description.as_deref(),
            Outcome::NoImage { description, .. } => description.as_deref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Outcome::NoImage { .. })
    }
}
