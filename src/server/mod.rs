//! Web form and JSON API over a [`Session`].
//!
//! - `GET  /`             form
//! - `POST /generate`     form submission, renders the result page
//! - `POST /api/generate` JSON in, JSON out
//! - `GET  /health`

mod page;

use crate::{
    error::GenerationError,
    models::{GenerationRequest, Outcome, NO_IMAGE_NOTICE},
    session::Session,
};
use actix_web::{http::StatusCode, web, HttpResponse};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use page::Notice;
use serde::Deserialize;
use serde_json::json;

pub struct AppState {
    pub session: Session,
}

impl AppState {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

/// Fields shared by the HTML form and the JSON API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateForm {
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub scene: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

impl GenerateForm {
    fn is_composed(&self) -> bool {
        match self.mode.as_deref() {
            Some("composed") => true,
            Some(_) => false,
            None => self.prompt.is_none() && self.subject.is_some(),
        }
    }

    fn to_request(&self) -> GenerationRequest {
        let request = if self.is_composed() {
            GenerationRequest::composed(
                self.subject.clone().unwrap_or_default(),
                self.style.clone().unwrap_or_default(),
                self.scene.clone().unwrap_or_default(),
            )
        } else {
            GenerationRequest::from_prompt(self.prompt.clone().unwrap_or_default())
        };

        match self.model.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
            Some(model) => request.with_model(model),
            None => request,
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/generate", web::post().to(generate_page))
        .route("/api/generate", web::post().to(generate_api))
        .route("/health", web::get().to(health));
}

pub fn status_for(err: &GenerationError) -> StatusCode {
    match err {
        GenerationError::Validation(_) => StatusCode::BAD_REQUEST,
        GenerationError::Configuration(_) | GenerationError::TransientBackend { .. } => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        GenerationError::Backend { .. } | GenerationError::Decode(_) => StatusCode::BAD_GATEWAY,
        GenerationError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn index() -> HttpResponse {
    html(StatusCode::OK, page::render(&GenerateForm::default(), None))
}

async fn health(state: web::Data<AppState>) -> HttpResponse {
    let backend = state.session.backend();
    let configured = backend.ensure_configured();
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "backend": backend.name(),
        "model": backend.model(),
        "configured": configured.is_ok(),
        "detail": configured.err().map(|e| e.to_string()),
    }))
}

async fn generate_page(
    state: web::Data<AppState>,
    form: web::Form<GenerateForm>,
) -> HttpResponse {
    let form = form.into_inner();

    match state.session.generate(form.to_request()).await {
        Ok(Outcome::Generated(result)) => html(
            StatusCode::OK,
            page::render(&form, Some(Notice::image(&result))),
        ),
        Ok(Outcome::NoImage { description, .. }) => html(
            StatusCode::OK,
            page::render(
                &form,
                Some(Notice::Empty(description.as_deref())),
            ),
        ),
        Err(e) => {
            log::error!("❌ Generation failed: {}", e);
            html(
                status_for(&e),
                page::render(&form, Some(Notice::Error(e.user_message()))),
            )
        }
    }
}

async fn generate_api(
    state: web::Data<AppState>,
    body: web::Json<GenerateForm>,
) -> HttpResponse {
    match state.session.generate(body.to_request()).await {
        Ok(Outcome::Generated(result)) => HttpResponse::Ok().json(json!({
            "request_id": result.request_id,
            "description": result.description,
            "mime_type": result.mime_type,
            "width": result.width,
            "height": result.height,
            "image_b64": BASE64.encode(&result.bytes),
            "saved_to": result.saved_to.as_ref().map(|p| p.display().to_string()),
        })),
        Ok(Outcome::NoImage {
            request_id,
            description,
        }) => HttpResponse::Ok().json(json!({
            "request_id": request_id,
            "notice": NO_IMAGE_NOTICE,
            "description": description,
        })),
        Err(e) => {
            log::error!("❌ Generation failed: {}", e);
            HttpResponse::build(status_for(&e)).json(json!({
                "error": {
                    "kind": e.kind(),
                    "message": e.user_message(),
                }
            }))
        }
    }
}

fn html(status: StatusCode, page: askama::Result<String>) -> HttpResponse {
    match page {
        Ok(body) => HttpResponse::build(status)
            .content_type("text/html; charset=utf-8")
            .body(body),
        Err(e) => {
            log::error!("❌ Failed to render page: {}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}
