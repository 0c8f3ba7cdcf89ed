//! Scan pipeline: targets, progress, error taxonomy and the orchestrator
pub mod classifier;
pub mod error_class;
pub mod model;
pub mod orchestrator;
pub mod progress;
pub mod target;

pub use self::classifier::Classifier;
pub use self::error_class::ErrorCategory;
pub use self::model::{ScanError, ScanOutcome, ScanReport, ScanResult};
pub use self::orchestrator::{NoopObserver, ScanObserver, ScanOrchestrator};
pub use self::progress::{Progress, ProgressTracker};
pub use self::target::normalize_target;
