//! Command-line interface for utterd
//!
//! Provides argument parsing using clap derive macros.

use crate::config::Config;
use clap::Parser;
use std::path::PathBuf;

/// Streaming utterance segmentation and transcription server
#[derive(Parser, Debug)]
#[command(
    name = "utterd",
    version,
    about = "Streaming utterance segmentation and transcription server"
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Address to bind (e.g., 0.0.0.0)
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Path to the Whisper model file
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Language code for transcription (e.g., en, es) or auto
    #[arg(long, value_name = "LANG")]
    pub language: Option<String>,

    /// Base URL of the transcript sink
    #[arg(long, value_name = "URL")]
    pub sink_url: Option<String>,
}

impl Cli {
    /// Fold flag overrides into a loaded configuration.
    pub fn apply_to(&self, mut config: Config) -> Config {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(model) = &self.model {
            config.stt.model = model.clone();
        }
        if let Some(language) = &self.language {
            config.stt.language = language.clone();
        }
        if let Some(url) = &self.sink_url {
            config.sink.url = Some(url.clone());
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn no_flags_leaves_config_untouched() {
        let cli = Cli::parse_from(["utterd"]);
        let config = cli.apply_to(Config::default());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn flags_override_config_fields() {
        let cli = Cli::parse_from([
            "utterd",
            "--host",
            "127.0.0.1",
            "--port",
            "9000",
            "--model",
            "models/ggml-base.bin",
            "--language",
            "de",
            "--sink-url",
            "https://db.example.com",
        ]);

        let config = cli.apply_to(Config::default());

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.stt.model, "models/ggml-base.bin");
        assert_eq!(config.stt.language, "de");
        assert_eq!(config.sink.url, Some("https://db.example.com".to_string()));
    }
}
