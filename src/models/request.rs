use crate::error::{GenerationError, Result};
use serde::{Deserialize, Serialize};

/// Output modalities a backend may be asked for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Image,
}

impl Modality {
    pub fn as_gemini(&self) -> &'static str {
        match self {
            Modality::Text => "TEXT",
            Modality::Image => "IMAGE",
        }
    }
}

/// What the user typed: a free prompt or the subject/style/scene triple.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum PromptInput {
    Free {
        prompt: String,
    },
    Composed {
        subject: String,
        style: String,
        scene: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub input: PromptInput,
    pub model: Option<String>,
    pub response_modalities: Vec<Modality>,
    #[serde(default)]
    pub stream: bool,
}

impl GenerationRequest {
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self::new(PromptInput::Free {
            prompt: prompt.into(),
        })
    }

    pub fn composed(
        subject: impl Into<String>,
        style: impl Into<String>,
        scene: impl Into<String>,
    ) -> Self {
        Self::new(PromptInput::Composed {
            subject: subject.into(),
            style: style.into(),
            scene: scene.into(),
        })
    }

    fn new(input: PromptInput) -> Self {
        Self {
            input,
            model: None,
            response_modalities: vec![Modality::Text, Modality::Image],
            stream: false,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_modalities(mut self, modalities: Vec<Modality>) -> Self {
        self.response_modalities = modalities;
        self
    }

    /// Validate the input and render the prompt sent to the backend.
    pub fn prompt(&self) -> Result<String> {
        if self.stream {
            return Err(GenerationError::Validation(
                "streaming responses are not supported".into(),
            ));
        }

        match &self.input {
            PromptInput::Free { prompt } => {
                let prompt = prompt.trim();
                if prompt.is_empty() {
                    return Err(GenerationError::Validation(
                        "Please enter a prompt.".into(),
                    ));
                }
                Ok(prompt.to_string())
            }
            PromptInput::Composed {
                subject,
                style,
                scene,
            } => {
                let subject = required("subject", subject)?;
                let style = required("style", style)?;
                let scene = required("scene", scene)?;
                Ok(format!(
                    "Create a {} image of {} in a {}",
                    style, subject, scene
                ))
            }
        }
    }

    /// File name stem derived from the structured fields, if any.
    pub fn file_stem_hint(&self) -> Option<String> {
        match &self.input {
            PromptInput::Free { .. } => None,
            PromptInput::Composed { subject, style, .. } => {
                let stem = crate::output::sanitize_stem(&format!(
                    "{}_{}",
                    subject.trim(),
                    style.trim()
                ));
                if stem.is_empty() {
                    None
                } else {
                    Some(stem)
                }
            }
        }
    }
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(GenerationError::Validation(format!(
            "Please fill in the {} field.",
            field
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_prompt_is_trimmed() {
        let request = GenerationRequest::from_prompt("  a watercolor fox in a forest \n");
        assert_eq!(request.prompt().unwrap(), "a watercolor fox in a forest");
        assert_eq!(request.file_stem_hint(), None);
    }

    #[test]
    fn test_blank_prompt_rejected() {
        for prompt in ["", "   ", "\t\n"] {
            let err = GenerationRequest::from_prompt(prompt).prompt().unwrap_err();
            assert_eq!(err.kind(), "validation_error");
        }
    }

    #[test]
    fn test_composed_prompt_template() {
        let request = GenerationRequest::composed("red fox", "watercolor", "misty forest");
        assert_eq!(
            request.prompt().unwrap(),
            "Create a watercolor image of red fox in a misty forest"
        );
        assert_eq!(request.file_stem_hint().as_deref(), Some("red_fox_watercolor"));
    }

    #[test]
    fn test_composed_prompt_requires_every_field() {
        let err = GenerationRequest::composed("fox", " ", "forest")
            .prompt()
            .unwrap_err();
        assert_eq!(
            err,
            GenerationError::Validation("Please fill in the style field.".into())
        );
    }

    #[test]
    fn test_streaming_rejected() {
        let mut request = GenerationRequest::from_prompt("a cat");
        request.stream = true;
        assert!(request.prompt().is_err());
    }

    #[test]
    fn test_default_modalities() {
        let request = GenerationRequest::from_prompt("a cat");
        assert_eq!(
            request.response_modalities,
            vec![Modality::Text, Modality::Image]
        );
    }
}
