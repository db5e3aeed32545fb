use super::status::Status;
use super::step::Step;

/// An attachment ready to embed: `url` is already a `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub title: String,
    pub url: String,
}

/// Everything collected for one test execution. Built at test-begin, finalized
/// and rendered at test-end, then dropped.
#[derive(Debug, Clone, Default)]
pub struct TestCaseRecord {
    pub display_name: String,
    /// Bare test title, used for the report filename.
    pub title: String,
    pub steps: Vec<Step>,
    pub status: Status,
    pub attachments: Vec<Attachment>,
    pub duration_ms: Option<u64>,
    pub start_time: Option<String>,
    pub stdout: Vec<String>,
    pub error: Option<String>,
}

impl TestCaseRecord {
    pub fn new(display_name: String, title: String, start_time: Option<String>) -> Self {
        Self {
            display_name,
            title,
            start_time,
            ..Self::default()
        }
    }

    pub fn step_count(&self) -> usize {
        self.steps.iter().map(Step::count).sum()
    }
}
