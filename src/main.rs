use clap::Parser;
use promptpaint::{
    backends, logger, models::NO_IMAGE_NOTICE, BackendKind, Config, GenerationRequest, Outcome,
    Session, SessionSettings,
};
use std::path::PathBuf;
use std::process::ExitCode;

/// Turn a prompt into an image.
#[derive(Parser, Debug)]
#[command(name = "promptpaint", version, about)]
struct Args {
    /// Free-text prompt. Leave empty to use --subject/--style/--scene.
    prompt: Option<String>,

    #[arg(long, requires_all = ["style", "scene"], conflicts_with = "prompt")]
    subject: Option<String>,

    #[arg(long)]
    style: Option<String>,

    #[arg(long)]
    scene: Option<String>,

    /// gemini, bedrock, diffusion or dryrun
    #[arg(long)]
    backend: Option<BackendKind>,

    #[arg(long)]
    model: Option<String>,

    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Keep the image in memory only.
    #[arg(long)]
    no_save: bool,

    /// List models for the selected backend and exit.
    #[arg(long)]
    list_models: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    let args = Args::parse();

    let log_config = if args.verbose {
        logger::LoggerConfig::development()
    } else {
        logger::LoggerConfig::default().with_level(logger::LogLevel::Warn)
    };
    if let Err(e) = logger::init_with_config(log_config) {
        eprintln!("{}", e);
    }
    if !dotenv_loaded {
        log::debug!("No .env file found, using system environment variables");
    }

    let mut config = Config::from_env();
    if let Some(kind) = args.backend {
        config = config.with_backend(kind);
    }
    if let Some(model) = &args.model {
        config = config.with_model(model.clone());
    }
    if let Some(dir) = &args.output_dir {
        config = config.with_output_dir(dir.clone());
    }
    if args.no_save {
        config = config.without_saving();
    }

    if args.list_models {
        for model in backends::supported_models(config.backend) {
            println!("{}  {} ({})", model.id, model.name, model.provider);
        }
        return ExitCode::SUCCESS;
    }

    logger::log_config_info(&config);

    let request = match (&args.prompt, &args.subject) {
        (_, Some(subject)) => GenerationRequest::composed(
            subject.clone(),
            args.style.clone().unwrap_or_default(),
            args.scene.clone().unwrap_or_default(),
        ),
        (prompt, None) => GenerationRequest::from_prompt(prompt.clone().unwrap_or_default()),
    };

    let backend = match backends::connect(&config).await {
        Ok(backend) => backend,
        Err(e) => {
            eprintln!("{}", e.user_message());
            return ExitCode::FAILURE;
        }
    };
    let session = Session::new(backend, SessionSettings::from_config(&config));

    eprintln!("Generating...");
    match session.generate(request).await {
        Ok(Outcome::Generated(result)) => {
            if let Some(description) = &result.description {
                println!("{}", description.trim());
            }
            println!("{}x{} {}", result.width, result.height, result.mime_type);
            match &result.saved_to {
                Some(path) => println!("Saved to {}", path.display()),
                None => println!("Not saved ({} bytes in memory)", result.bytes.len()),
            }
            ExitCode::SUCCESS
        }
        Ok(Outcome::NoImage { description, .. }) => {
            if let Some(description) = description {
                println!("{}", description.trim());
            }
            eprintln!("{}", NO_IMAGE_NOTICE);
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}
