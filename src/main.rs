use anyhow::Result;
use brainrot_shorts::config::Config;
use brainrot_shorts::generator::run_generation;
use brainrot_shorts::init;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cfg = Config::load("config.json").await?;

    // Initialize directories first
    init::ensure_directories(&cfg).await?;

    if !init::check_ffmpeg().await {
        tracing::warn!("FFmpeg not found in PATH. Please install FFmpeg.");
    }

    run_generation(cfg).await?;
    Ok(())
}
