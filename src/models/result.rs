use super::status::Status;

/// Tally of finished executions and written reports for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub timed_out: usize,
    pub interrupted: usize,
    pub reports_written: usize,
    pub write_failures: usize,
}

impl RunSummary {
    pub fn record(&mut self, status: Status) {
        self.total += 1;
        match status {
            Status::Passed => self.passed += 1,
            Status::Failed => self.failed += 1,
            Status::Skipped => self.skipped += 1,
            Status::TimedOut => self.timed_out += 1,
            Status::Interrupted => self.interrupted += 1,
            Status::Pending => {}
        }
    }
}
