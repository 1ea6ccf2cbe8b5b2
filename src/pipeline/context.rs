use std::path::PathBuf;
use std::time::Duration;

/// What was written for one group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSummary {
    pub key: String,
    pub path: PathBuf,
    pub lines_written: usize,
}

/// Runtime statistics of a split run
#[derive(Debug, Default, Clone)]
pub struct SplitStats {
    pub lines_read: usize,
    pub headers_seen: usize,
    /// Groups in the order their first header appeared
    pub groups: Vec<GroupSummary>,
    pub processing_time: Duration,
}

impl SplitStats {
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn group(&self, key: &str) -> Option<&GroupSummary> {
        self.groups.iter().find(|g| g.key == key)
    }

    pub fn lines_per_second(&self) -> Option<f64> {
        let secs = self.processing_time.as_secs_f64();
        if self.lines_read == 0 || secs == 0.0 {
            None
        } else {
            Some(self.lines_read as f64 / secs)
        }
    }
}
