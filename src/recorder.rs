use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use serde_json::Value;

use crate::failure;
use crate::models::step::{step_at, step_at_mut};
use crate::models::{Status, Step, TestCaseRecord};

/// Final state of an execution as reported by the host at test-end.
#[derive(Debug, Default)]
pub struct TestOutcome {
    pub status: Status,
    pub duration_ms: Option<u64>,
    pub stdout: Vec<String>,
    pub error: Option<Value>,
}

/// Bookkeeping for one in-flight execution.
#[derive(Debug)]
struct Tracking {
    record: TestCaseRecord,
    /// Child indices from the root list down to the open step. Empty when no
    /// step is open; popping it is how we return to the enclosing step.
    open: Vec<usize>,
}

/// Builds one step tree per test execution from begin/end callbacks.
///
/// State is keyed by execution id, so executions running on parallel workers
/// never see each other's steps.
#[derive(Debug)]
pub struct Recorder {
    executions: HashMap<String, Tracking>,
    offset: FixedOffset,
}

impl Recorder {
    pub fn new(offset: FixedOffset) -> Self {
        Self {
            executions: HashMap::new(),
            offset,
        }
    }

    /// Start tracking an execution. A repeated id replaces the old state.
    pub fn test_begin(
        &mut self,
        execution: &str,
        title: &str,
        title_path: &[String],
        start_time_ms: Option<i64>,
    ) {
        let start_time = start_time_ms.and_then(|ms| self.format_start_time(ms));
        let record = TestCaseRecord::new(display_name(title, title_path), title.to_string(), start_time);
        self.executions.insert(
            execution.to_string(),
            Tracking {
                record,
                open: Vec::new(),
            },
        );
    }

    /// Open a step under the currently open one. Returns false for unknown executions.
    pub fn step_begin(&mut self, execution: &str, title: &str, now_ms: u64) -> bool {
        let Some(tracking) = self.executions.get_mut(execution) else {
            return false;
        };
        let step = Step::begin(title, now_ms);

        match step_at_mut(&mut tracking.record.steps, &tracking.open) {
            Some(parent) => {
                parent.children.push(step);
                tracking.open.push(parent.children.len() - 1);
            }
            None => {
                tracking.record.steps.push(step);
                tracking.open = vec![tracking.record.steps.len() - 1];
            }
        }
        true
    }

    /// Close the open step if its name matches `title`. A mismatch means the
    /// stream is interleaved or malformed; the event is dropped and the tree
    /// is left untouched. Returns whether a step was closed.
    pub fn step_end(&mut self, execution: &str, title: &str, status: Status, now_ms: u64) -> bool {
        let Some(tracking) = self.executions.get_mut(execution) else {
            return false;
        };
        let Some(step) = step_at_mut(&mut tracking.record.steps, &tracking.open) else {
            return false;
        };
        if step.name != title {
            tracing::debug!(execution, expected = %step.name, got = title, "ignoring unmatched step end");
            return false;
        }
        step.finish(status, now_ms);
        tracking.open.pop();
        true
    }

    /// Append captured output that arrived while the test was running.
    pub fn std_out(&mut self, execution: &str, text: String) {
        if let Some(tracking) = self.executions.get_mut(execution) {
            tracking.record.stdout.push(text);
        }
    }

    /// Finalize an execution and hand back its record. Tracking state is dropped.
    pub fn test_end(&mut self, execution: &str, outcome: TestOutcome) -> Option<TestCaseRecord> {
        let Tracking { mut record, .. } = self.executions.remove(execution)?;

        record.status = outcome.status;
        record.duration_ms = outcome.duration_ms;
        record.stdout.extend(outcome.stdout);
        record.error = failure::describe(outcome.status, outcome.error.as_ref());

        tracing::debug!(
            execution,
            status = %record.status,
            error = failure::summary(record.error.as_deref()),
            "execution finished"
        );

        Some(record)
    }

    pub fn get(&self, execution: &str) -> Option<&TestCaseRecord> {
        self.executions.get(execution).map(|t| &t.record)
    }

    /// Name of the innermost open step.
    pub fn open_step(&self, execution: &str) -> Option<&str> {
        let tracking = self.executions.get(execution)?;
        step_at(&tracking.record.steps, &tracking.open).map(|s| s.name.as_str())
    }

    pub fn in_flight(&self) -> usize {
        self.executions.len()
    }

    fn format_start_time(&self, ms: i64) -> Option<String> {
        let at = DateTime::from_timestamp_millis(ms)?.with_timezone(&self.offset);
        Some(at.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string())
    }
}

/// Title path without the root suite and project entries, joined like the host does.
fn display_name(title: &str, title_path: &[String]) -> String {
    let name = title_path
        .iter()
        .skip(2)
        .filter(|part| !part.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" > ");
    if name.is_empty() { title.to_string() } else { name }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(330 * 60).unwrap()
    }

    fn recorder_with(execution: &str) -> Recorder {
        let mut recorder = Recorder::new(ist());
        recorder.test_begin(execution, "checkout", &[], None);
        recorder
    }

    #[test]
    fn nested_steps_build_a_tree() {
        let mut r = recorder_with("e1");
        assert!(r.step_begin("e1", "outer", 100));
        assert!(r.step_begin("e1", "inner", 110));
        assert_eq!(r.open_step("e1"), Some("inner"));
        assert!(r.step_end("e1", "inner", Status::Passed, 150));
        assert!(r.step_begin("e1", "sibling", 160));
        assert!(r.step_end("e1", "sibling", Status::Passed, 165));
        assert!(r.step_end("e1", "outer", Status::Failed, 200));
        assert!(r.step_begin("e1", "second root", 210));
        assert!(r.step_end("e1", "second root", Status::Passed, 215));
        assert_eq!(r.open_step("e1"), None);

        let record = r.get("e1").unwrap();
        assert_eq!(record.steps.len(), 2);
        assert_eq!(record.step_count(), 4);

        let outer = &record.steps[0];
        assert_eq!(outer.status, Status::Failed);
        assert_eq!(outer.duration_ms, Some(100));
        assert_eq!(outer.children[0].name, "inner");
        assert_eq!(outer.children[0].duration_ms, Some(40));
        assert_eq!(outer.children[1].name, "sibling");
        assert_eq!(outer.children[1].duration_ms, Some(5));
    }

    #[test]
    fn step_count_matches_begin_events() {
        let mut r = recorder_with("e1");
        let mut begins = 0;
        let mut clock = 0;
        for depth in 1..=5u64 {
            for level in 0..depth {
                clock += 1;
                r.step_begin("e1", &format!("s{depth}.{level}"), clock);
                begins += 1;
            }
            for level in (0..depth).rev() {
                clock += 3;
                assert!(r.step_end("e1", &format!("s{depth}.{level}"), Status::Passed, clock));
            }
        }
        let record = r.get("e1").unwrap();
        assert_eq!(record.step_count(), begins);
        assert_eq!(record.steps.len(), 5);
    }

    #[test]
    fn mismatched_end_leaves_tree_unchanged() {
        let mut r = recorder_with("e1");
        r.step_begin("e1", "fill form", 10);
        let before = r.get("e1").unwrap().steps.clone();

        assert!(!r.step_end("e1", "click button", Status::Passed, 20));

        assert_eq!(r.get("e1").unwrap().steps, before);
        assert_eq!(r.open_step("e1"), Some("fill form"));
        assert_eq!(r.get("e1").unwrap().steps[0].status, Status::Pending);
    }

    #[test]
    fn end_without_open_step_is_ignored() {
        let mut r = recorder_with("e1");
        assert!(!r.step_end("e1", "anything", Status::Passed, 5));
        assert!(r.get("e1").unwrap().steps.is_empty());
    }

    #[test]
    fn unknown_execution_is_ignored() {
        let mut r = recorder_with("e1");
        assert!(!r.step_begin("nope", "step", 1));
        assert!(!r.step_end("nope", "step", Status::Passed, 2));
        r.std_out("nope", "lost".into());
        assert!(r.test_end("nope", TestOutcome::default()).is_none());
        assert_eq!(r.in_flight(), 1);
    }

    #[test]
    fn executions_do_not_share_state() {
        let mut r = Recorder::new(ist());
        r.test_begin("a", "first", &[], None);
        r.test_begin("b", "second", &[], None);
        r.step_begin("a", "a1", 0);
        r.step_begin("b", "b1", 0);
        r.step_begin("a", "a2", 1);
        assert!(r.step_end("b", "b1", Status::Passed, 2));
        assert_eq!(r.open_step("a"), Some("a2"));
        assert_eq!(r.open_step("b"), None);

        let failed = r
            .test_end(
                "a",
                TestOutcome {
                    status: Status::Failed,
                    error: Some(json!({ "message": "boom" })),
                    ..TestOutcome::default()
                },
            )
            .unwrap();
        let passed = r
            .test_end(
                "b",
                TestOutcome {
                    status: Status::Passed,
                    ..TestOutcome::default()
                },
            )
            .unwrap();

        assert_eq!(failed.error.as_deref(), Some("boom"));
        assert_eq!(passed.error, None);
        assert_eq!(r.in_flight(), 0);
    }

    #[test]
    fn test_end_collects_output_and_status() {
        let mut r = recorder_with("e1");
        r.std_out("e1", "early\n".into());
        let record = r
            .test_end(
                "e1",
                TestOutcome {
                    status: Status::TimedOut,
                    duration_ms: Some(30_000),
                    stdout: vec!["late\n".into()],
                    error: Some(json!({ "message": "Test timeout of 30000ms exceeded." })),
                },
            )
            .unwrap();
        assert_eq!(record.status, Status::TimedOut);
        assert_eq!(record.duration_ms, Some(30_000));
        assert_eq!(record.stdout, vec!["early\n", "late\n"]);
        assert_eq!(record.error, None);
    }

    #[test]
    fn display_name_drops_root_and_project() {
        let path: Vec<String> = ["", "chromium", "cart.spec.ts", "Cart", "adds item"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(display_name("adds item", &path), "cart.spec.ts > Cart > adds item");
        assert_eq!(display_name("adds item", &[]), "adds item");
    }

    #[test]
    fn start_time_uses_fixed_offset() {
        let mut r = Recorder::new(ist());
        // 2024-03-05T08:04:05Z
        r.test_begin("e1", "t", &[], Some(1_709_625_845_000));
        assert_eq!(
            r.get("e1").unwrap().start_time.as_deref(),
            Some("3/5/2024, 1:34:05 PM")
        );
    }
}
