#![allow(dead_code)]

use async_trait::async_trait;
use promptpaint::{
    imaging, BackendRequest, BackendResponse, GenerationError, ImageBackend, Result,
};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Backend that replays a queue of canned answers and records every call.
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Result<BackendResponse>>>,
    calls: Mutex<Vec<BackendRequest>>,
    configured: bool,
}

impl ScriptedBackend {
    pub fn new(script: Vec<Result<BackendResponse>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
            configured: true,
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new(Vec::new())
        }
    }

    pub fn calls(&self) -> Vec<BackendRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ImageBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    fn ensure_configured(&self) -> Result<()> {
        if self.configured {
            Ok(())
        } else {
            Err(GenerationError::Configuration("API key is not set".into()))
        }
    }

    async fn generate(&self, request: &BackendRequest) -> Result<BackendResponse> {
        self.calls.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(BackendResponse::default()))
    }
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    imaging::solid_png(width, height, [30, 140, 90]).unwrap()
}
