//! Transcript sinks.
//!
//! A sink receives the accepted transcript of each utterance. The server
//! keeps exactly one record alive at a time ("latest wins"); sinks that
//! persist history are out of scope.

use crate::error::{Result, UtterdError};
use crate::segment::SpeechRecord;
use std::sync::Mutex;
use std::time::Duration;

const SINK_TIMEOUT: Duration = Duration::from_secs(5);

/// Destination for accepted transcripts.
pub trait SpeechSink: Send + Sync {
    /// Publish a record, replacing whatever was published before.
    fn publish(&self, record: &SpeechRecord) -> Result<()>;

    /// Short sink name for logs.
    fn name(&self) -> &'static str;
}

/// In-process sink holding only the most recent record.
///
/// Used when no external sink URL is configured, and by tests.
#[derive(Debug, Default)]
pub struct LatestSink {
    latest: Mutex<Option<SpeechRecord>>,
}

impl LatestSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently published record, if any.
    pub fn latest(&self) -> Option<SpeechRecord> {
        self.latest.lock().ok().and_then(|guard| guard.clone())
    }
}

impl SpeechSink for LatestSink {
    fn publish(&self, record: &SpeechRecord) -> Result<()> {
        let mut guard = self.latest.lock().map_err(|e| UtterdError::SinkWrite {
            message: format!("latest sink poisoned: {}", e),
        })?;
        *guard = Some(record.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "latest"
    }
}

/// Sink that PUTs the record to a Firebase-style REST endpoint.
///
/// Each publish overwrites the `speech_latest` key under the configured
/// base URL, so the remote store also follows latest-wins semantics.
pub struct RtdbSink {
    client: reqwest::blocking::Client,
    url: String,
}

impl std::fmt::Debug for RtdbSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RtdbSink").field("url", &self.url).finish()
    }
}

impl RtdbSink {
    /// Build a sink targeting `<base_url>/speech_latest.json`.
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(SINK_TIMEOUT)
            .build()
            .map_err(|e| UtterdError::SinkWrite {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            url: format!("{}/speech_latest.json", base_url.trim_end_matches('/')),
        })
    }

    /// Full endpoint URL this sink writes to.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl SpeechSink for RtdbSink {
    fn publish(&self, record: &SpeechRecord) -> Result<()> {
        let response = self
            .client
            .put(&self.url)
            .json(record)
            .send()
            .map_err(|e| UtterdError::SinkWrite {
                message: format!("PUT {} failed: {}", self.url, e),
            })?;

        if !response.status().is_success() {
            return Err(UtterdError::SinkWrite {
                message: format!("PUT {} returned {}", self.url, response.status()),
            });
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "rtdb"
    }
}
