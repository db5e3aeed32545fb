use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::mpsc;

use super::{EventSource, forward_line, read_lines};
use crate::events::ReporterEvent;

/// Guard that kills the child process (and its entire process group) on drop.
struct ChildGuard {
    child: Option<tokio::process::Child>,
    /// Process group ID saved at spawn time so we can kill the whole group.
    #[cfg(unix)]
    pgid: Option<u32>,
}

impl ChildGuard {
    fn new(child: tokio::process::Child) -> Self {
        #[cfg(unix)]
        let pgid = child.id();
        Self {
            child: Some(child),
            #[cfg(unix)]
            pgid,
        }
    }

    /// Wait for a clean exit. After this the guard has nothing left to kill.
    async fn wait(&mut self) -> Result<std::process::ExitStatus> {
        let Some(ref mut child) = self.child else {
            anyhow::bail!("child already reaped");
        };
        let status = child.wait().await.context("failed to wait for playwright")?;
        self.child = None;
        #[cfg(unix)]
        {
            self.pgid = None;
        }
        Ok(status)
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        // Kill the entire process group so browser and worker processes don't become orphans.
        #[cfg(unix)]
        if let Some(pgid) = self.pgid {
            unsafe { libc::kill(-(pgid as libc::pid_t), libc::SIGKILL) };
        }
        // Fallback / non-Unix: kill just the direct child.
        if let Some(ref mut child) = self.child {
            let _ = child.start_kill();
        }
    }
}

const REPORTER_SOURCE: &str = include_str!("../../reporters/playwright-reporter.mjs");

/// Runs `playwright test` with an embedded NDJSON reporter and streams its events.
pub struct PlaywrightSource {
    workspace: PathBuf,
    command: String,
    args: Vec<String>,
}

impl PlaywrightSource {
    pub fn new(workspace: PathBuf, command: String, args: Vec<String>) -> Self {
        Self {
            workspace,
            command,
            args,
        }
    }

    /// Write the embedded reporter to a temp file and return its path.
    fn write_reporter(&self) -> Result<tempfile::NamedTempFile> {
        let mut file = tempfile::Builder::new()
            .prefix("steplens-reporter-")
            .suffix(".mjs")
            .tempfile()
            .context("failed to create temp reporter file")?;

        use std::io::Write;
        file.write_all(REPORTER_SOURCE.as_bytes())
            .context("failed to write reporter to temp file")?;

        Ok(file)
    }

    fn build_command(&self, reporter: &std::path::Path) -> Command {
        let mut cmd = Command::new(&self.command);
        if self.command == "npx" {
            cmd.arg("playwright");
        }
        cmd.arg("test")
            .arg(format!("--reporter={}", reporter.to_string_lossy()))
            .args(&self.args);
        cmd
    }
}

#[async_trait]
impl EventSource for PlaywrightSource {
    async fn stream(&self, tx: mpsc::UnboundedSender<ReporterEvent>) -> Result<Option<i32>> {
        let reporter_file = self.write_reporter()?;
        let mut cmd = self.build_command(reporter_file.path());

        tracing::debug!(cmd = ?cmd.as_std(), cwd = %self.workspace.display(), "spawning host runner");

        // Own process group, so ChildGuard can take out browsers and workers too.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.as_std_mut().process_group(0);
        }

        let mut child = cmd
            .current_dir(&self.workspace)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn {}", self.command))?;

        let stdout = child.stdout.take().context("missing stdout")?;
        let stderr = child.stderr.take().context("missing stderr")?;

        // The child stays in the guard so it is killed if this future is dropped
        // (task aborted on Ctrl-C).
        let mut child_guard = ChildGuard::new(child);

        let stderr_handle = tokio::spawn(async move {
            let drained = read_lines(stderr, |line| {
                tracing::warn!(target: "steplens::host", "{}", line);
            })
            .await;
            if let Err(e) = drained {
                tracing::warn!(error = %e, "failed reading playwright stderr");
            }
        });

        // A read error drops the pipe, so the host gets EPIPE instead of blocking.
        let drained = read_lines(stdout, |line| {
            forward_line(self.name(), line, &tx);
        })
        .await;
        if let Err(e) = drained {
            tracing::warn!(error = %e, "failed reading playwright stdout");
        }

        stderr_handle.await.ok();

        let status = child_guard.wait().await?;
        // Keep the temp file alive until playwright exits
        drop(reporter_file);

        if !status.success() {
            tracing::warn!(code = status.code().unwrap_or(-1), "playwright exited with failures");
        }
        Ok(status.code())
    }

    fn name(&self) -> &str {
        "Playwright"
    }
}
