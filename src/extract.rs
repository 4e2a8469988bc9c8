//! Pulling the image payload and any accompanying text out of a response.

use crate::models::{BackendResponse, Part};

/// First inline image found in a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub data: Vec<u8>,
    pub mime_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub description: Option<String>,
    pub image: Option<InlineImage>,
}

/// Scan the first candidate in order.
///
/// Text parts are concatenated as they appear. The first inline image is
/// kept and any later ones are dropped. A response without an image part
/// is not an error; callers treat `image: None` as an empty result.
pub fn extract(response: &BackendResponse) -> Extraction {
    let Some(candidate) = response.candidates.first() else {
        return Extraction {
            description: response
                .block_reason
                .as_ref()
                .map(|reason| format!("Prompt blocked: {}", reason)),
            image: None,
        };
    };

    let mut description = String::new();
    let mut image = None;

    for part in &candidate.parts {
        match part {
            Part::Text(text) => description.push_str(text),
            Part::InlineImage { data, mime_type } => {
                if image.is_none() {
                    image = Some(InlineImage {
                        data: data.clone(),
                        mime_type: mime_type.clone(),
                    });
                } else {
                    log::debug!("Ignoring additional inline image ({} bytes)", data.len());
                }
            }
        }
    }

    Extraction {
        description: if description.trim().is_empty() {
            None
        } else {
            Some(description)
        },
        image,
    }
}
