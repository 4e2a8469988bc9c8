use actix_web::{middleware, web, App, HttpServer};
use promptpaint::{
    backends, logger,
    server::{self, AppState},
    Config, Session, SessionSettings,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    if let Err(e) = logger::init() {
        eprintln!("{}", e);
    }
    if dotenv_loaded {
        log::info!("✅ .env file loaded successfully");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    let config = Config::from_env();
    let port = config.port.unwrap_or(8080);
    logger::log_startup_info("promptpaint-server", env!("CARGO_PKG_VERSION"));
    logger::log_config_info(&config);

    let backend = backends::connect(&config)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    if let Err(e) = backend.ensure_configured() {
        log::warn!("⚠️  {} (requests will be refused until this is fixed)", e);
    }

    let state = web::Data::new(AppState::new(Session::new(
        backend,
        SessionSettings::from_config(&config),
    )));

    let http_server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .configure(server::configure)
    })
    .bind(("0.0.0.0", port))?;

    for addr in http_server.addrs() {
        log::info!("🌐 Listening on http://{}", addr);
    }
    http_server.run().await
}
