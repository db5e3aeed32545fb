pub mod playwright;
pub mod replay;

use anyhow::Result;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;

use crate::events::{ParsedLine, ReporterEvent};

pub use playwright::PlaywrightSource;
pub use replay::ReplaySource;

/// Something that produces host lifecycle events.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Stream events over the channel until the source is exhausted.
    /// Returns the host process exit code when there is a host process.
    async fn stream(&self, tx: mpsc::UnboundedSender<ReporterEvent>) -> Result<Option<i32>>;

    /// Display name for this source (e.g., "Playwright").
    fn name(&self) -> &str;
}

/// Call `on_line` for every line of `reader` until EOF. Invalid UTF-8 is
/// replaced rather than ending the stream; line terminators are stripped.
pub(crate) async fn read_lines<R, F>(reader: R, mut on_line: F) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    F: FnMut(&str),
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        on_line(line.trim_end_matches(['\n', '\r']));
    }
}

/// Parse one output line and forward it if it is an event. Other lines are
/// host chatter and only go to the log. Returns whether an event was sent.
pub(crate) fn forward_line(source: &str, line: &str, tx: &mpsc::UnboundedSender<ReporterEvent>) -> bool {
    let line = line.trim();
    if line.is_empty() {
        return false;
    }
    match ParsedLine::from_line(line) {
        ParsedLine::Event(event) => tx.send(event).is_ok(),
        ParsedLine::Malformed(e) => {
            tracing::warn!(target: "steplens::host", source, error = %e, "dropping malformed event: {}", line);
            false
        }
        ParsedLine::Output => {
            tracing::info!(target: "steplens::host", source, "{}", line);
            false
        }
    }
}
