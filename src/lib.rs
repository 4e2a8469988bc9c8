//! Prompt-to-image sessions.
//!
//! A [`Session`] takes a prompt, calls one [`ImageBackend`] (Gemini,
//! Bedrock Titan, a local diffusion server or an offline dry run), pulls
//! the first inline image out of the response, validates it and optionally
//! writes it to disk.

pub mod backends;
pub mod config;
pub mod error;
pub mod extract;
pub mod imaging;
pub mod logger;
pub mod models;
pub mod output;
pub mod retry;
pub mod session;

#[cfg(feature = "server")]
pub mod server;

pub use backends::{connect, ImageBackend};
pub use config::{BedrockConfig, Config, DiffusionConfig, GeminiConfig};
pub use error::{GenerationError, Result};
pub use models::*;
pub use retry::RetryPolicy;
pub use session::{Session, SessionSettings};
