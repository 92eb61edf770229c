//! Injected log-artifact capability used by the `UploadLogs` command
//! (spec §4.4). Grounded on `zc-log-tools::{LogSource, MockLogSource}`:
//! a small async trait plus an in-memory fake that serves pre-loaded
//! content instead of reading real log files.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogProducerError {
    #[error("no log artifact available: {0}")]
    Unavailable(String),
}

pub type LogProducerResult<T> = Result<T, LogProducerError>;

/// A single log artifact ready for upload.
#[derive(Debug, Clone)]
pub struct LogArtifact {
    pub content_type: String,
    pub log_file: String,
    pub bytes: Vec<u8>,
}

/// Produces the log artifact an `UploadLogs` command ships to the DMS
/// control plane. The dispatcher computes size/MD5 itself; this trait
/// only supplies the bytes.
#[async_trait]
pub trait LogProducer: Send + Sync {
    async fn produce(&self) -> LogProducerResult<LogArtifact>;
}

/// In-memory `LogProducer` serving a pre-loaded artifact, or failing with
/// `Unavailable` if none was set — the dispatcher's no-op simulation path
/// (spec §4.4: "if absent, this is a reserved no-op returning Success in
/// simulation mode") is reached by omitting a `LogProducer` entirely
/// rather than by configuring this mock to fail.
pub struct MockLogProducer {
    artifact: Option<LogArtifact>,
}

impl MockLogProducer {
    pub fn new() -> Self {
        MockLogProducer { artifact: None }
    }

    pub fn with_artifact(artifact: LogArtifact) -> Self {
        MockLogProducer { artifact: Some(artifact) }
    }

    /// A mock pre-loaded with a small sample syslog excerpt.
    pub fn with_sample() -> Self {
        Self::with_artifact(LogArtifact {
            content_type: "text/plain".into(),
            log_file: "agent.log".into(),
            bytes: b"2026-07-29T00:00:00Z INFO agent started\n".to_vec(),
        })
    }
}

impl Default for MockLogProducer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LogProducer for MockLogProducer {
    async fn produce(&self) -> LogProducerResult<LogArtifact> {
        self.artifact
            .clone()
            .ok_or_else(|| LogProducerError::Unavailable("mock has no artifact loaded".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn produces_the_loaded_artifact() {
        let producer = MockLogProducer::with_sample();
        let artifact = producer.produce().await.unwrap();
        assert_eq!(artifact.log_file, "agent.log");
        assert!(!artifact.bytes.is_empty());
    }

    #[tokio::test]
    async fn empty_mock_is_unavailable() {
        let producer = MockLogProducer::new();
        assert!(producer.produce().await.is_err());
    }
}
