//! Detection: runs every analyzer over a page
pub mod analyzer;
pub mod detector;

pub use self::detector::TechDetector;
