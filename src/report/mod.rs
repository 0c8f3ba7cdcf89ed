//! Reporting: console lines, summary and result files
pub mod console;
pub mod summary;
pub mod writer;

pub use self::console::{ConfigEcho, ConsoleReporter};
pub use self::summary::{ScanSummary, TechnologyCount};
pub use self::writer::{format_plain, read_json, write_results, OutputFormat};
