use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use jellysub::{AppConfig, FfmpegMuxer, JobGate, WhisperEngine};
use jellysub_server::{create_router, AppState};

#[derive(Parser)]
#[command(name = "jellysub-server", about = "Transcription server for media libraries")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(long, env = "JELLYSUB_CONFIG", default_value = "config.json")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> jellysub::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("jellysub=info".parse().unwrap())
                .add_directive("jellysub_server=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Arc::new(AppConfig::load(&cli.config)?);

    let engine = Arc::new(WhisperEngine::from_config(&config).await?);
    let muxer = Arc::new(FfmpegMuxer::new(
        config.ffmpeg_path.clone(),
        config.language.clone(),
    ));
    let gate = JobGate::new(config.max_concurrent_jobs);

    let state = AppState {
        config: Arc::clone(&config),
        engine,
        muxer,
        gate,
    };

    let router = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(
        %addr,
        model = %config.model,
        max_concurrent_jobs = config.max_concurrent_jobs,
        "jellysub server listening"
    );

    axum::serve(listener, router).await?;

    Ok(())
}
