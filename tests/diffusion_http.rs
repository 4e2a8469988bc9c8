mod common;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use common::png;
use promptpaint::{
    backends::DiffusionBackend, DiffusionConfig, GenerationRequest, Session, SessionSettings,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn local_pipeline_returns_image_and_revised_prompt() {
    let server = MockServer::start().await;
    let image = png(12, 8);

    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .and(body_partial_json(json!({
            "prompt": "Create a pixel-art image of a robot in a garden",
            "response_format": "b64_json",
            "n": 1
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "created": 1700000000,
            "data": [{"b64_json": BASE64.encode(&image), "revised_prompt": "a small robot tending flowers"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = DiffusionBackend::new(
        DiffusionConfig::new().with_base_url(server.uri()),
        Duration::from_secs(5),
    )
    .unwrap();
    let session = Session::new(Arc::new(backend), SessionSettings::new());

    let outcome = session
        .generate(GenerationRequest::composed("a robot", "pixel-art", "garden"))
        .await
        .unwrap();

    let result = outcome.image().unwrap();
    assert_eq!(result.bytes, image);
    assert_eq!((result.width, result.height), (12, 8));
    assert_eq!(
        result.description.as_deref(),
        Some("a small robot tending flowers")
    );
}

#[tokio::test]
async fn service_unavailable_is_retried() {
    let server = MockServer::start().await;
    let image = png(2, 2);

    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"error": {"message": "model loading"}})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"b64_json": BASE64.encode(&image)}]
        })))
        .mount(&server)
        .await;

    let backend = DiffusionBackend::new(
        DiffusionConfig::new().with_base_url(server.uri()),
        Duration::from_secs(5),
    )
    .unwrap();
    let session = Session::new(
        Arc::new(backend),
        SessionSettings::new().with_retry(
            promptpaint::RetryPolicy::new().with_base_delay(Duration::from_millis(5)),
        ),
    );

    let outcome = session
        .generate(GenerationRequest::from_prompt("a robot"))
        .await
        .unwrap();
    assert_eq!(outcome.image().unwrap().bytes, image);
}
