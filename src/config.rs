use crate::defaults;
use crate::error::UtterdError;
use crate::segmenter::SegmenterConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub audio: AudioConfig,
    pub stt: SttConfig,
    pub filter: FilterConfig,
    pub sink: SinkConfig,
}

/// Network listener configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Audio format and segmentation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub silence_threshold: f32,
    pub min_record_secs: f64,
    pub max_record_secs: f64,
    pub silence_duration_secs: f64,
}

/// Speech-to-text configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SttConfig {
    pub model: String,
    pub language: String,
    pub beam_size: u32,
    pub threads: Option<usize>,
}

/// Transcript filtering configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FilterConfig {
    pub noise_phrases: Vec<String>,
}

/// Transcript sink configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct SinkConfig {
    /// Base URL of a Firebase-style REST store. None keeps records in process.
    pub url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::HOST.to_string(),
            port: defaults::PORT,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
            silence_threshold: defaults::SILENCE_THRESHOLD,
            min_record_secs: defaults::MIN_RECORD_SECS,
            max_record_secs: defaults::MAX_RECORD_SECS,
            silence_duration_secs: defaults::SILENCE_DURATION_SECS,
        }
    }
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            model: defaults::DEFAULT_MODEL.to_string(),
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            beam_size: defaults::BEAM_SIZE,
            threads: None,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            noise_phrases: defaults::NOISE_PHRASES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

impl AudioConfig {
    /// Segmenter parameters derived from this section.
    pub fn segmenter(&self) -> SegmenterConfig {
        SegmenterConfig {
            sample_rate: self.sample_rate,
            silence_threshold: self.silence_threshold,
            min_record_secs: self.min_record_secs,
            max_record_secs: self.max_record_secs,
            silence_duration_secs: self.silence_duration_secs,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Self::default()
                } else {
                    panic!("Failed to load config from {}: {}", path.display(), e);
                }
            }
        }
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.audio.sample_rate == 0 {
            return Err(UtterdError::ConfigInvalidValue {
                key: "audio.sample_rate".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.audio.max_record_secs <= 0.0 {
            return Err(UtterdError::ConfigInvalidValue {
                key: "audio.max_record_secs".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.audio.min_record_secs > self.audio.max_record_secs {
            return Err(UtterdError::ConfigInvalidValue {
                key: "audio.min_record_secs".to_string(),
                message: format!(
                    "must not exceed max_record_secs ({})",
                    self.audio.max_record_secs
                ),
            });
        }
        if self.audio.silence_duration_secs < 0.0 {
            return Err(UtterdError::ConfigInvalidValue {
                key: "audio.silence_duration_secs".to_string(),
                message: "must not be negative".to_string(),
            });
        }
        Ok(())
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - UTTERD_MODEL → stt.model
    /// - UTTERD_LANGUAGE → stt.language
    /// - UTTERD_SINK_URL → sink.url
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var("UTTERD_MODEL")
            && !model.is_empty()
        {
            self.stt.model = model;
        }

        if let Ok(language) = std::env::var("UTTERD_LANGUAGE")
            && !language.is_empty()
        {
            self.stt.language = language;
        }

        if let Ok(url) = std::env::var("UTTERD_SINK_URL")
            && !url.is_empty()
        {
            self.sink.url = Some(url);
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/utterd/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .expect("Could not determine config directory")
            .join("utterd")
            .join("config.toml")
    }
}
