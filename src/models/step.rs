use super::status::Status;

/// A named, timed unit of work within a test. Children are owned in order;
/// the way back to the parent is tracked by the recorder, not by the step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Step {
    pub name: String,
    pub status: Status,
    pub children: Vec<Step>,
    pub duration_ms: Option<u64>,
    pub start_time_ms: Option<u64>,
}

impl Step {
    pub fn begin(name: impl Into<String>, now_ms: u64) -> Self {
        Self {
            name: name.into(),
            status: Status::Pending,
            children: Vec::new(),
            duration_ms: None,
            start_time_ms: Some(now_ms),
        }
    }

    /// Close the step. Clock skew never yields a negative duration.
    pub fn finish(&mut self, status: Status, now_ms: u64) {
        let start = self.start_time_ms.unwrap_or(now_ms);
        self.duration_ms = Some(now_ms.saturating_sub(start));
        self.status = status;
    }

    pub fn is_parent(&self) -> bool {
        !self.children.is_empty()
    }

    /// Number of steps in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Step::count).sum::<usize>()
    }
}

/// Follow a path of child indices down from a root list.
pub fn step_at_mut<'a>(roots: &'a mut [Step], path: &[usize]) -> Option<&'a mut Step> {
    let (&first, rest) = path.split_first()?;
    let mut step = roots.get_mut(first)?;
    for &idx in rest {
        step = step.children.get_mut(idx)?;
    }
    Some(step)
}

pub fn step_at<'a>(roots: &'a [Step], path: &[usize]) -> Option<&'a Step> {
    let (&first, rest) = path.split_first()?;
    let mut step = roots.get(first)?;
    for &idx in rest {
        step = step.children.get(idx)?;
    }
    Some(step)
}
