//! Evidence extraction from page markup
pub mod html_extractor;

pub use self::html_extractor::PageEvidence;
