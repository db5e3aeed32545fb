use std::fmt;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Status {
    #[default]
    Pending,
    Passed,
    Failed,
    Skipped,
    TimedOut,
    Interrupted,
}

impl Status {
    /// Name as reported by the host runner (also used in report filenames).
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Passed => "passed",
            Status::Failed => "failed",
            Status::Skipped => "skipped",
            Status::TimedOut => "timedOut",
            Status::Interrupted => "interrupted",
        }
    }

    pub fn css_class(&self) -> String {
        format!("status-{}", self.as_str().to_lowercase())
    }

    pub fn label(&self) -> String {
        self.as_str().to_uppercase()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_host_names() {
        let status: Status = serde_json::from_str("\"timedOut\"").unwrap();
        assert_eq!(status, Status::TimedOut);
        assert_eq!(status.as_str(), "timedOut");
        assert_eq!(status.css_class(), "status-timedout");
        assert_eq!(status.label(), "TIMEDOUT");
    }
}
