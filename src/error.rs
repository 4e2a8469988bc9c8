use thiserror::Error;

/// Everything that can stop a generation.
///
/// An empty result (the backend answered but produced no image) is not an
/// error; see [`crate::models::Outcome::NoImage`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Transient backend error{}: {message}", status_suffix(.status))]
    TransientBackend {
        status: Option<u16>,
        message: String,
    },
    #[error("Backend error{}: {message}", status_suffix(.status))]
    Backend {
        status: Option<u16>,
        message: String,
    },
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" ({})", code),
        None => String::new(),
    }
}

impl GenerationError {
    /// Classify an HTTP-equivalent status code returned by a backend.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            429 | 503 => GenerationError::TransientBackend {
                status: Some(status),
                message,
            },
            401 | 403 => GenerationError::Configuration(format!(
                "credentials rejected by backend ({}): {}",
                status, message
            )),
            _ => GenerationError::Backend {
                status: Some(status),
                message,
            },
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, GenerationError::TransientBackend { .. })
    }

    /// Stable tag used by the JSON API.
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::Configuration(_) => "configuration_error",
            GenerationError::Validation(_) => "validation_error",
            GenerationError::TransientBackend { .. } => "transient_backend_error",
            GenerationError::Backend { .. } => "backend_error",
            GenerationError::Decode(_) => "decode_error",
            GenerationError::Storage(_) => "storage_error",
        }
    }

    /// Text shown to the person who pressed the button.
    pub fn user_message(&self) -> String {
        match self {
            GenerationError::Configuration(msg) => format!(
                "Image generation is not configured: {}. Supply valid credentials and try again.",
                msg
            ),
            GenerationError::Validation(msg) => msg.clone(),
            GenerationError::TransientBackend { message, .. } => format!(
                "The image service is busy right now ({}). Please try again in a moment.",
                message
            ),
            GenerationError::Backend { message, .. } => {
                format!("Something went wrong: {}", message)
            }
            GenerationError::Decode(msg) => format!(
                "The service returned data that is not a valid image ({}).",
                msg
            ),
            GenerationError::Storage(msg) => {
                format!("The image was generated but could not be saved: {}", msg)
            }
        }
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            GenerationError::TransientBackend {
                status: None,
                message: err.to_string(),
            }
        } else if let Some(status) = err.status() {
            GenerationError::from_status(status.as_u16(), err.to_string())
        } else {
            GenerationError::Backend {
                status: None,
                message: err.to_string(),
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, GenerationError>;
