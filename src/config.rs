use std::path::{Path, PathBuf};

use chrono::{FixedOffset, Offset, Utc};
use serde::Deserialize;

pub const CONFIG_FILE: &str = "steplens.toml";
pub const DEFAULT_OUTPUT_DIR: &str = "resultDocumentDirectory";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
}

/// Where reports land and which clock they are stamped with.
#[derive(Debug, Deserialize)]
pub struct ReportConfig {
    /// Output directory, relative to the working directory unless absolute.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Fixed UTC offset used for every timestamp in reports and filenames.
    /// Defaults to +05:30.
    #[serde(default = "default_utc_offset")]
    pub utc_offset_minutes: i32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            utc_offset_minutes: default_utc_offset(),
        }
    }
}

/// Names of the environment variables shown in the report metadata block.
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataConfig {
    #[serde(default = "default_client_var")]
    pub client_var: String,
    #[serde(default = "default_environment_var")]
    pub environment_var: String,
    #[serde(default = "default_build_number_var")]
    pub build_number_var: String,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            client_var: default_client_var(),
            environment_var: default_environment_var(),
            build_number_var: default_build_number_var(),
        }
    }
}

/// How the host test runner is launched by `steplens run`.
#[derive(Debug, Deserialize)]
pub struct RunnerConfig {
    #[serde(default = "default_runner_command")]
    pub command: String,
    /// Extra arguments, shell-quoted.
    /// Example: "--project chromium --workers 2"
    #[serde(default)]
    pub args: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            command: default_runner_command(),
            args: String::new(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_utc_offset() -> i32 {
    330
}

fn default_client_var() -> String {
    "CLIENT".into()
}

fn default_environment_var() -> String {
    "TESTENVIRONMENT".into()
}

fn default_build_number_var() -> String {
    "BuildNumber".into()
}

fn default_runner_command() -> String {
    "npx".into()
}

impl Config {
    /// Load `steplens.toml` from the workspace root, falling back to defaults if absent or invalid.
    pub fn load(workspace: &Path) -> Self {
        let path = workspace.join(CONFIG_FILE);
        let Ok(content) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        match toml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "invalid config, using defaults");
                Self::default()
            }
        }
    }

    /// Absolute output directory for reports.
    pub fn output_dir(&self, workspace: &Path) -> PathBuf {
        workspace.join(&self.report.output_dir)
    }

    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.report.utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix())
    }

    pub fn runner_args(&self) -> anyhow::Result<Vec<String>> {
        shell_words::split(&self.runner.args)
            .map_err(|e| anyhow::anyhow!("invalid runner.args {:?}: {}", self.runner.args, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path());
        assert_eq!(config.report.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(config.offset().local_minus_utc(), 330 * 60);
        assert_eq!(config.metadata.build_number_var, "BuildNumber");
        assert_eq!(config.runner.command, "npx");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[report]\nutc_offset_minutes = 0\n\n[runner]\nargs = \"--project 'Desktop Chrome'\"\n",
        )
        .unwrap();
        let config = Config::load(dir.path());
        assert_eq!(config.offset().local_minus_utc(), 0);
        assert_eq!(config.metadata.client_var, "CLIENT");
        assert_eq!(
            config.runner_args().unwrap(),
            vec!["--project".to_string(), "Desktop Chrome".to_string()]
        );
    }

    #[test]
    fn invalid_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "report = [").unwrap();
        let config = Config::load(dir.path());
        assert_eq!(config.report.utc_offset_minutes, 330);
    }
}
