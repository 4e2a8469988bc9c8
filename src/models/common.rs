use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub provider: String,
    pub backend: BackendKind,
    pub description: String,
}

impl ModelInfo {
    pub fn new(id: &str, name: &str, provider: &str, backend: BackendKind, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            provider: provider.to_string(),
            backend,
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Gemini,
    Bedrock,
    Diffusion,
    DryRun,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Gemini => "gemini",
            BackendKind::Bedrock => "bedrock",
            BackendKind::Diffusion => "diffusion",
            BackendKind::DryRun => "dryrun",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(BackendKind::Gemini),
            "bedrock" | "titan" => Ok(BackendKind::Bedrock),
            "diffusion" | "local" => Ok(BackendKind::Diffusion),
            "dryrun" | "dry-run" | "offline" => Ok(BackendKind::DryRun),
            other => Err(format!("unknown backend '{}'", other)),
        }
    }
}
