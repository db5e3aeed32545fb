use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};

use crate::models::Status;

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("failed to create report directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write report {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Replace everything outside `[A-Za-z0-9]` with `_`.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// `<sanitized title>_<status>_<MMddyyyyHHmmss>.html`
pub fn report_filename(title: &str, status: Status, at: DateTime<FixedOffset>) -> String {
    format!(
        "{}_{}_{}.html",
        sanitize_title(title),
        status.as_str(),
        at.format("%m%d%Y%H%M%S")
    )
}

/// Persists one HTML document per test execution into a single directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the output directory (and parents) if it does not exist yet.
    pub fn ensure_dir(&self) -> Result<(), WriteError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| WriteError::CreateDir {
            path: self.dir.clone(),
            source,
        })
    }

    /// Write a report, replacing any file with the same name. Returns its path.
    pub fn write(
        &self,
        title: &str,
        status: Status,
        at: DateTime<FixedOffset>,
        html: &str,
    ) -> Result<PathBuf, WriteError> {
        self.ensure_dir()?;
        let path = self.dir.join(report_filename(title, status, at));
        std::fs::write(&path, html).map_err(|source| WriteError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}
