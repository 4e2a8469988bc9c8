use serde::{Deserialize, Serialize};

/// One unit of a generation response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(String),
    InlineImage { data: Vec<u8>, mime_type: String },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(text.into())
    }

    pub fn image(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Part::InlineImage {
            data,
            mime_type: mime_type.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidate {
    pub parts: Vec<Part>,
}

impl Candidate {
    pub fn new(parts: Vec<Part>) -> Self {
        Self { parts }
    }
}

/// Backend-neutral response: ordered candidates of ordered parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendResponse {
    pub candidates: Vec<Candidate>,
    pub block_reason: Option<String>,
}

impl BackendResponse {
    pub fn single(parts: Vec<Part>) -> Self {
        Self {
            candidates: vec![Candidate::new(parts)],
            block_reason: None,
        }
    }
}

/// What a session hands to a backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendRequest {
    pub model: String,
    pub prompt: String,
    pub response_modalities: Vec<super::Modality>,
    pub stream: bool,
}
