use super::GenerateForm;
use crate::models::{GenerationResult, NO_IMAGE_NOTICE};
use askama::Template;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

/// What to show under the form after a submission.
pub(crate) enum Notice<'a> {
    Image(ImageView<'a>),
    Empty(Option<&'a str>),
    Error(String),
}

impl<'a> Notice<'a> {
    pub(crate) fn image(result: &'a GenerationResult) -> Self {
        Notice::Image(ImageView::new(result))
    }
}

pub(crate) struct ImageView<'a> {
    data_uri: String,
    width: u32,
    height: u32,
    alt: &'a str,
    description: Option<&'a str>,
    download_name: String,
}

impl<'a> ImageView<'a> {
    fn new(result: &'a GenerationResult) -> Self {
        Self {
            data_uri: data_uri(&result.mime_type, &result.bytes),
            width: result.width,
            height: result.height,
            alt: &result.prompt,
            description: result.description.as_deref(),
            download_name: result.download_name(),
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
struct PageTemplate<'a> {
    composed: bool,
    prompt: &'a str,
    subject: &'a str,
    style: &'a str,
    scene: &'a str,
    no_image_notice: &'static str,
    notice: Option<Notice<'a>>,
}

pub(crate) fn render(form: &GenerateForm, notice: Option<Notice<'_>>) -> askama::Result<String> {
    PageTemplate {
        composed: form.is_composed(),
        prompt: form.prompt.as_deref().unwrap_or_default(),
        subject: form.subject.as_deref().unwrap_or_default(),
        style: form.style.as_deref().unwrap_or_default(),
        scene: form.scene.as_deref().unwrap_or_default(),
        no_image_notice: NO_IMAGE_NOTICE,
        notice,
    }
    .render()
}

/// The URI is emitted unescaped, so the MIME type is restricted to token
/// characters and falls back to a generic type otherwise.
fn data_uri(mime_type: &str, bytes: &[u8]) -> String {
    let is_token = !mime_type.is_empty()
        && mime_type
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '+' | '.' | '-'));
    let mime_type = if is_token {
        mime_type
    } else {
        "application/octet-stream"
    };
    format!("data:{};base64,{}", mime_type, BASE64.encode(bytes))
}
