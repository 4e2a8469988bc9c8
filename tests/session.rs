mod common;

use common::{png, ScriptedBackend};
use promptpaint::{
    output::OutputSettings, BackendResponse, Candidate, GenerationError, GenerationRequest,
    Modality, Outcome, Part, RetryPolicy, Session, SessionSettings,
};
use std::sync::Arc;
use std::time::Duration;

fn fast_retry() -> RetryPolicy {
    RetryPolicy::new()
        .with_max_attempts(3)
        .with_base_delay(Duration::from_millis(1))
}

fn session(backend: Arc<ScriptedBackend>) -> Session {
    Session::new(backend, SessionSettings::new().with_retry(fast_retry()))
}

#[tokio::test]
async fn watercolor_fox_end_to_end() {
    let tmp = tempfile::tempdir().unwrap();
    let image = png(10, 10);
    let backend = Arc::new(ScriptedBackend::new(vec![Ok(BackendResponse::single(vec![
        Part::text("A whimsical watercolor-style fox scene."),
        Part::image(image.clone(), "image/png"),
    ]))]));
    let session = Session::new(
        backend.clone(),
        SessionSettings::new()
            .with_retry(fast_retry())
            .with_output(OutputSettings::new(tmp.path().join("out"))),
    );

    let outcome = session
        .generate(GenerationRequest::from_prompt("a watercolor fox in a forest"))
        .await
        .unwrap();

    let result = outcome.image().expect("an image");
    assert_eq!(
        result.description.as_deref(),
        Some("A whimsical watercolor-style fox scene.")
    );
    assert_eq!((result.width, result.height), (10, 10));
    assert_eq!(result.bytes, image);
    assert_eq!(result.prompt, "a watercolor fox in a forest");

    let saved = result.saved_to.as_ref().expect("a saved file");
    assert_eq!(std::fs::read(saved).unwrap(), image);
    assert_eq!(saved.extension().unwrap(), "png");

    let calls = backend.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].prompt, "a watercolor fox in a forest");
    assert_eq!(calls[0].model, "scripted-model");
    assert_eq!(
        calls[0].response_modalities,
        vec![Modality::Text, Modality::Image]
    );
    assert!(!calls[0].stream);
}

#[tokio::test]
async fn text_only_response_is_empty_result() {
    let backend = Arc::new(ScriptedBackend::new(vec![Ok(BackendResponse::single(vec![
        Part::text("I would rather describe it: a fox."),
    ]))]));

    let outcome = session(backend)
        .generate(GenerationRequest::from_prompt("a fox"))
        .await
        .unwrap();

    assert!(outcome.is_empty());
    assert_eq!(
        outcome.description(),
        Some("I would rather describe it: a fox.")
    );
}

#[tokio::test]
async fn no_candidates_is_empty_result() {
    let backend = Arc::new(ScriptedBackend::new(vec![Ok(BackendResponse::default())]));
    let outcome = session(backend)
        .generate(GenerationRequest::from_prompt("a fox"))
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::NoImage { description: None, .. }));
}

#[tokio::test]
async fn only_first_image_is_returned() {
    let first = png(4, 4);
    let second = png(8, 8);
    let backend = Arc::new(ScriptedBackend::new(vec![Ok(BackendResponse::single(vec![
        Part::image(first.clone(), "image/png"),
        Part::image(second, "image/png"),
    ]))]));

    let outcome = session(backend)
        .generate(GenerationRequest::from_prompt("two foxes"))
        .await
        .unwrap();

    let result = outcome.image().unwrap();
    assert_eq!(result.bytes, first);
    assert_eq!(result.width, 4);
}

#[tokio::test]
async fn text_parts_concatenate_in_order() {
    let backend = Arc::new(ScriptedBackend::new(vec![Ok(BackendResponse::single(vec![
        Part::text("One. "),
        Part::image(png(2, 2), "image/png"),
        Part::text("Two. "),
        Part::text("Three."),
    ]))]));

    let outcome = session(backend)
        .generate(GenerationRequest::from_prompt("a fox"))
        .await
        .unwrap();

    assert_eq!(outcome.description(), Some("One. Two. Three."));
}

#[tokio::test]
async fn later_candidates_are_ignored() {
    let backend = Arc::new(ScriptedBackend::new(vec![Ok(BackendResponse {
        candidates: vec![
            Candidate::new(vec![Part::text("no picture here")]),
            Candidate::new(vec![Part::image(png(2, 2), "image/png")]),
        ],
        block_reason: None,
    })]));

    let outcome = session(backend)
        .generate(GenerationRequest::from_prompt("a fox"))
        .await
        .unwrap();
    assert!(outcome.is_empty());
}

#[tokio::test]
async fn malformed_image_is_decode_error() {
    let backend = Arc::new(ScriptedBackend::new(vec![Ok(BackendResponse::single(vec![
        Part::image(b"not really a png".to_vec(), "image/png"),
    ]))]));

    let err = session(backend)
        .generate(GenerationRequest::from_prompt("a fox"))
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::Decode(_)));
}

#[tokio::test]
async fn blank_prompts_never_reach_the_backend() {
    let backend = Arc::new(ScriptedBackend::new(vec![]));
    let session = session(backend.clone());

    for request in [
        GenerationRequest::from_prompt(""),
        GenerationRequest::from_prompt("   \t"),
        GenerationRequest::composed("fox", "watercolor", ""),
        GenerationRequest::composed(" ", "watercolor", "forest"),
    ] {
        let err = session.generate(request).await.unwrap_err();
        assert_eq!(err.kind(), "validation_error");
    }
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn missing_credentials_fail_before_any_call() {
    let backend = Arc::new(ScriptedBackend::unconfigured());
    let err = session(backend.clone())
        .generate(GenerationRequest::from_prompt("a fox"))
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::Configuration(_)));
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn rate_limits_are_retried_transparently() {
    let image = png(5, 5);
    let backend = Arc::new(ScriptedBackend::new(vec![
        Err(GenerationError::from_status(429, "Resource has been exhausted")),
        Err(GenerationError::from_status(429, "Resource has been exhausted")),
        Ok(BackendResponse::single(vec![Part::image(
            image.clone(),
            "image/png",
        )])),
    ]));

    let outcome = session(backend.clone())
        .generate(GenerationRequest::from_prompt("a fox"))
        .await
        .unwrap();

    assert_eq!(outcome.image().unwrap().bytes, image);
    assert_eq!(backend.call_count(), 3);
}

#[tokio::test]
async fn persistent_unavailability_is_surfaced() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        Err(GenerationError::from_status(503, "overloaded")),
        Err(GenerationError::from_status(503, "overloaded")),
        Err(GenerationError::from_status(503, "overloaded")),
        Ok(BackendResponse::single(vec![Part::image(png(1, 1), "image/png")])),
    ]));

    let err = session(backend.clone())
        .generate(GenerationRequest::from_prompt("a fox"))
        .await
        .unwrap_err();

    assert!(err.is_transient());
    assert_eq!(backend.call_count(), 3);
}

#[tokio::test]
async fn other_backend_errors_are_not_retried() {
    let backend = Arc::new(ScriptedBackend::new(vec![Err(GenerationError::from_status(
        400,
        "Prompt was rejected",
    ))]));

    let err = session(backend.clone())
        .generate(GenerationRequest::from_prompt("a fox"))
        .await
        .unwrap_err();

    assert_eq!(backend.call_count(), 1);
    assert!(err.user_message().contains("Prompt was rejected"));
}

#[tokio::test]
async fn composed_prompt_names_the_file() {
    let tmp = tempfile::tempdir().unwrap();
    let backend = Arc::new(ScriptedBackend::new(vec![Ok(BackendResponse::single(vec![
        Part::image(png(3, 3), "image/png"),
    ]))]));
    let session = Session::new(
        backend.clone(),
        SessionSettings::new().with_output(OutputSettings::new(tmp.path())),
    );

    let outcome = session
        .generate(GenerationRequest::composed("red fox", "oil painting", "meadow"))
        .await
        .unwrap();

    assert_eq!(
        backend.calls()[0].prompt,
        "Create a oil painting image of red fox in a meadow"
    );
    let name = outcome
        .image()
        .unwrap()
        .saved_to
        .as_ref()
        .unwrap()
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned();
    assert!(name.starts_with("red_fox_oil_painting_"), "{}", name);
}

#[tokio::test]
async fn request_model_overrides_backend_default() {
    let backend = Arc::new(ScriptedBackend::new(vec![]));
    let _ = session(backend.clone())
        .generate(GenerationRequest::from_prompt("a fox").with_model("custom-model"))
        .await
        .unwrap();
    assert_eq!(backend.calls()[0].model, "custom-model");
}
