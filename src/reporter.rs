use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, FixedOffset, Utc};
use tokio::sync::mpsc;

use crate::attachments;
use crate::config::{Config, MetadataConfig};
use crate::events::{OutputChunk, ReporterEvent};
use crate::models::{RunSummary, TestCaseRecord};
use crate::recorder::{Recorder, TestOutcome};
use crate::render::{self, RenderContext};
use crate::source::EventSource;
use crate::writer::ReportWriter;

/// Turns the host's lifecycle events into one HTML report per test execution.
///
/// Nothing in here aborts the host run: unreadable attachments, odd failure
/// payloads and failed writes are logged and the run carries on.
pub struct Reporter {
    recorder: Recorder,
    writer: ReportWriter,
    metadata: MetadataConfig,
    offset: FixedOffset,
    summary: RunSummary,
    reports: Vec<PathBuf>,
}

impl Reporter {
    pub fn new(config: &Config, workspace: &Path) -> Self {
        Self::with_writer(
            ReportWriter::new(config.output_dir(workspace)),
            config.metadata.clone(),
            config.offset(),
        )
    }

    pub fn with_writer(writer: ReportWriter, metadata: MetadataConfig, offset: FixedOffset) -> Self {
        Self {
            recorder: Recorder::new(offset),
            writer,
            metadata,
            offset,
            summary: RunSummary::default(),
            reports: Vec::new(),
        }
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Reports written so far, in completion order.
    pub fn reports(&self) -> &[PathBuf] {
        &self.reports
    }

    /// Process one event from the host.
    pub fn handle(&mut self, event: ReporterEvent) {
        match event {
            ReporterEvent::RunBegin { root_dir } => {
                tracing::info!("Starting tests in {}", root_dir.as_deref().unwrap_or("."));
                if let Err(e) = self.writer.ensure_dir() {
                    tracing::error!(error = %e, "cannot prepare report directory");
                }
            }

            ReporterEvent::TestBegin {
                execution_id,
                title,
                title_path,
                start_time,
            } => {
                self.recorder
                    .test_begin(&execution_id, &title, &title_path, start_time);
            }

            ReporterEvent::StepBegin {
                execution_id,
                title,
                time,
            } => {
                self.recorder.step_begin(&execution_id, &title, time);
            }

            ReporterEvent::StepEnd {
                execution_id,
                title,
                status,
                time,
            } => {
                self.recorder.step_end(&execution_id, &title, status, time);
            }

            ReporterEvent::StdOut { execution_id, chunk } => {
                self.recorder.std_out(&execution_id, chunk.into_text());
            }

            ReporterEvent::TestEnd {
                execution_id,
                title: _,
                status,
                duration,
                time,
                attachments,
                stdout,
                error,
            } => {
                let outcome = TestOutcome {
                    status,
                    duration_ms: duration.map(|d| d.max(0.0) as u64),
                    stdout: stdout.into_iter().map(OutputChunk::into_text).collect(),
                    error,
                };
                let Some(mut record) = self.recorder.test_end(&execution_id, outcome) else {
                    tracing::debug!(execution = %execution_id, "test end for unknown execution");
                    return;
                };
                record.attachments = attachments::load(&attachments);
                let finished_at = self.timestamp(time);
                self.publish(&record, finished_at);
            }

            ReporterEvent::RunEnd { status } => {
                let in_flight = self.recorder.in_flight();
                if in_flight > 0 {
                    tracing::warn!(in_flight, "run ended with unfinished executions");
                }
                let s = &self.summary;
                tracing::info!(
                    status = status.as_deref().unwrap_or("unknown"),
                    total = s.total,
                    passed = s.passed,
                    failed = s.failed,
                    skipped = s.skipped,
                    timed_out = s.timed_out,
                    interrupted = s.interrupted,
                    reports = s.reports_written,
                    "All tests finished."
                );
            }
        }
    }

    fn publish(&mut self, record: &TestCaseRecord, at: DateTime<FixedOffset>) {
        self.summary.record(record.status);

        let ctx = RenderContext::from_env(&self.metadata, at);
        let html = render::render(record, &ctx);

        match self.writer.write(&record.title, record.status, at, &html) {
            Ok(path) => {
                tracing::info!("HTML report generated: {}", path.display());
                self.summary.reports_written += 1;
                self.reports.push(path);
            }
            Err(e) => {
                tracing::error!(test = %record.display_name, error = %e, "failed to write report");
                self.summary.write_failures += 1;
            }
        }
    }

    fn timestamp(&self, epoch_ms: Option<i64>) -> DateTime<FixedOffset> {
        epoch_ms
            .and_then(DateTime::from_timestamp_millis)
            .unwrap_or_else(Utc::now)
            .with_timezone(&self.offset)
    }
}

/// Pump events from `source` into `reporter` until the source finishes or
/// the process is interrupted. Returns the host's exit code, if any.
pub async fn drive(source: Arc<dyn EventSource>, reporter: &mut Reporter) -> Result<Option<i32>> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut task = tokio::spawn(async move { source.stream(tx).await });

    let mut interrupted = false;
    loop {
        tokio::select! {
            maybe_event = rx.recv() => match maybe_event {
                Some(event) => reporter.handle(event),
                None => break,
            },
            _ = tokio::signal::ctrl_c(), if !interrupted => {
                tracing::warn!("interrupted, stopping test run");
                interrupted = true;
                task.abort();
            }
        }
    }

    match (&mut task).await {
        Ok(result) => result,
        Err(e) if e.is_cancelled() => Ok(Some(130)),
        Err(e) => Err(e.into()),
    }
}
