//! Per-target outcomes

use super::error_class::ErrorCategory;
use crate::rule::TechnologyMap;

/// A target that was fetched and classified
#[derive(Debug, Clone, PartialEq)]
pub struct ScanResult {
    /// Normalized target URL
    pub url: String,
    pub final_url: String,
    pub technologies: TechnologyMap,
}

/// A target that failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanError {
    /// Target as supplied
    pub target: String,
    pub category: ErrorCategory,
}

impl ScanError {
    pub fn new(target: impl Into<String>, category: ErrorCategory) -> Self {
        Self { target: target.into(), category }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    Success(ScanResult),
    Failure(ScanError),
}

/// Outcomes of a batch, in completion order
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub results: Vec<ScanResult>,
    pub errors: Vec<ScanError>,
}

impl ScanReport {
    pub fn push(&mut self, outcome: ScanOutcome) {
        match outcome {
            ScanOutcome::Success(result) => self.results.push(result),
            ScanOutcome::Failure(error) => self.errors.push(error),
        }
    }

    pub fn total(&self) -> usize {
        self.results.len() + self.errors.len()
    }
}
