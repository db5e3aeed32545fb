use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncRead;
use tokio::sync::mpsc;

use super::{EventSource, forward_line, read_lines};
use crate::events::ReporterEvent;

/// Reads a recorded NDJSON event stream from a file, or stdin when no path is given.
pub struct ReplaySource {
    path: Option<PathBuf>,
}

impl ReplaySource {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    async fn pump<R: AsyncRead + Unpin>(
        &self,
        reader: R,
        tx: &mpsc::UnboundedSender<ReporterEvent>,
    ) -> Result<()> {
        read_lines(reader, |line| {
            forward_line(self.name(), line, tx);
        })
        .await
        .context("failed to read event stream")
    }
}

#[async_trait]
impl EventSource for ReplaySource {
    async fn stream(&self, tx: mpsc::UnboundedSender<ReporterEvent>) -> Result<Option<i32>> {
        match self.path {
            Some(ref path) => {
                let file = tokio::fs::File::open(path)
                    .await
                    .with_context(|| format!("failed to open {}", path.display()))?;
                self.pump(file, &tx).await?;
            }
            None => self.pump(tokio::io::stdin(), &tx).await?,
        }
        Ok(None)
    }

    fn name(&self) -> &str {
        "replay"
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[tokio::test]
    async fn replays_events_and_skips_noise() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Running 1 test using 1 worker").unwrap();
        writeln!(file, r#"{{"type":"run-begin","rootDir":"/suite"}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"type":"run-end"}}"#).unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let source = ReplaySource::new(Some(file.path().to_path_buf()));
        assert_eq!(source.stream(tx).await.unwrap(), None);

        assert!(matches!(rx.recv().await, Some(ReporterEvent::RunBegin { .. })));
        assert!(matches!(rx.recv().await, Some(ReporterEvent::RunEnd { .. })));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn invalid_utf8_line_is_skipped() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"garbage \xfe\xff\n").unwrap();
        writeln!(file, r#"{{"type":"run-end"}}"#).unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let source = ReplaySource::new(Some(file.path().to_path_buf()));
        assert_eq!(source.stream(tx).await.unwrap(), None);
        assert!(matches!(rx.recv().await, Some(ReporterEvent::RunEnd { .. })));
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let source = ReplaySource::new(Some(PathBuf::from("/no/such/events.ndjson")));
        let err = source.stream(tx).await.unwrap_err();
        assert!(err.to_string().contains("failed to open"));
    }
}
