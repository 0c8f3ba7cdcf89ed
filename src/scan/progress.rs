//! Shared completion counter

use std::fmt;
use std::sync::Mutex;

/// Post-increment snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.done, self.total)
    }
}

#[derive(Debug)]
pub struct ProgressTracker {
    done: Mutex<usize>,
    total: usize,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self { done: Mutex::new(0), total }
    }

    /// Count one completed target
    pub fn advance(&self) -> Progress {
        let mut done = self.done.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *done += 1;
        Progress { done: *done, total: self.total }
    }
}
