//! Global error type

use thiserror::Error;
use regex::Error as RegexError;
use serde_json::Error as SerdeJsonError;
use std::io::Error as IoError;

#[derive(Error, Debug)]
pub enum RsapplyzerError {
    // Rule errors
    #[error("rule load failed: {0}")]
    RuleLoadError(String),
    #[error("rule parse failed: {0}")]
    RuleParseError(String),

    // Compile errors
    #[error("regex compile failed: {0}")]
    RegexCompileError(#[from] RegexError),

    // Detection errors
    #[error("classification failed: {0}")]
    ClassifyError(String),

    // Network errors
    #[error("http request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    // Serialization
    #[error("json error: {0}")]
    JsonError(#[from] SerdeJsonError),
    #[error("messagepack error: {0}")]
    MsgPackError(String),
    #[error("csv error: {0}")]
    CsvError(#[from] csv::Error),

    // Basic errors
    #[error("io error: {0}")]
    IoError(#[from] IoError),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

// Crate-wide result type
pub type RsaResult<T> = Result<T, RsapplyzerError>;
