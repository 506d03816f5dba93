use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use utterd::cli::Cli;
use utterd::config::Config;
use utterd::dispatch::Dispatcher;
use utterd::sink::{LatestSink, RtdbSink, SpeechSink};
use utterd::stt::{Transcriber, WhisperConfig, WhisperTranscriber};
use utterd::{defaults, server, version_string};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(Config::default_path);
    let config = cli.apply_to(Config::load_or_default(&config_path).with_env_overrides());

    config.validate().context("invalid configuration")?;

    info!(
        version = %version_string(),
        gpu = defaults::gpu_backend(),
        "starting utterd"
    );

    let transcriber = WhisperTranscriber::new(WhisperConfig {
        model_path: PathBuf::from(&config.stt.model),
        language: config.stt.language.clone(),
        beam_size: config.stt.beam_size,
        threads: config.stt.threads,
    })
    .with_context(|| format!("failed to load model {}", config.stt.model))?;
    info!(model = transcriber.model_name(), language = %config.stt.language, "model loaded");

    let sink: Arc<dyn SpeechSink> = match &config.sink.url {
        Some(url) => {
            let sink = RtdbSink::new(url).context("failed to build sink client")?;
            info!(url = sink.url(), "publishing transcripts to remote sink");
            Arc::new(sink)
        }
        None => {
            info!("no sink URL configured, keeping transcripts in process");
            Arc::new(LatestSink::new())
        }
    };

    let dispatcher = Arc::new(
        Dispatcher::new(Arc::new(transcriber), sink)
            .with_noise_phrases(&config.filter.noise_phrases),
    );

    server::run(&config, dispatcher).await
}

fn init_logging() {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}
