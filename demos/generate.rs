use promptpaint::{backends, logger, BackendKind, Config, GenerationRequest, Outcome, Session, SessionSettings};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logger::init_with_config(logger::LoggerConfig::development())?;

    match dotenv::dotenv() {
        Ok(_) => log::info!("✅ .env file loaded successfully"),
        Err(_) => log::warn!("⚠️  No .env file found, using system environment variables"),
    }

    // Falls back to the offline backend when no Gemini key is around.
    let mut config = Config::from_env();
    if config.backend == BackendKind::Gemini && config.gemini.api_key.is_none() {
        log::warn!("⚠️  GOOGLE_API_KEY not set, using the dry run backend");
        config = config.with_backend(BackendKind::DryRun);
    }

    let backend = backends::connect(&config).await?;
    let session = Session::new(backend, SessionSettings::from_config(&config));

    let requests = vec![
        GenerationRequest::from_prompt("a watercolor fox in a forest"),
        GenerationRequest::composed("lighthouse", "art deco poster", "stormy harbour"),
    ];

    for request in requests {
        match session.generate(request).await {
            Ok(Outcome::Generated(result)) => {
                log::info!("🖼️  {}x{} {}", result.width, result.height, result.mime_type);
                if let Some(description) = &result.description {
                    log::info!("📝 {}", description);
                }
                if let Some(path) = &result.saved_to {
                    log::info!("💾 {}", path.display());
                }
            }
            Ok(Outcome::NoImage { description, .. }) => {
                log::warn!("⚠️  {}", promptpaint::models::NO_IMAGE_NOTICE);
                if let Some(description) = description {
                    log::info!("📝 {}", description);
                }
            }
            Err(e) => log::error!("❌ {}", e.user_message()),
        }
    }

    Ok(())
}
