//! Error taxonomy shown to the user

use std::fmt;

use crate::error::RsapplyzerError;
use crate::net::{FetchError, TransportError};

const MAX_MESSAGE_CHARS: usize = 80;
const RETRIES_WRAPPER: &str = "max retries exceeded";
const CAUSED_BY: &str = "Caused by ";

/// Closed set of failure reasons
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorCategory {
    DnsFailure,
    Timeout,
    ConnectionRefused,
    TlsError,
    TooManyRedirects,
    ConnectionReset,
    RetriesExhausted,
    /// Unrecognized message, at most 80 characters
    Unclassified(String),
}

impl ErrorCategory {
    pub fn from_fetch_error(err: &FetchError) -> Self {
        match err {
            FetchError::DnsFailure { .. } => ErrorCategory::DnsFailure,
            FetchError::TlsFallbackFailed { .. } => ErrorCategory::TlsError,
            FetchError::Exhausted { last, .. } => Self::from_transport(last, true),
            FetchError::Aborted(err) => Self::from_transport(err, false),
            FetchError::InvalidTarget { .. } => Self::unclassified(&err.to_string()),
        }
    }

    fn from_transport(err: &TransportError, exhausted: bool) -> Self {
        match err {
            TransportError::Timeout => ErrorCategory::Timeout,
            TransportError::Refused => ErrorCategory::ConnectionRefused,
            TransportError::Reset => ErrorCategory::ConnectionReset,
            TransportError::Tls(_) => ErrorCategory::TlsError,
            TransportError::Dns(_) => ErrorCategory::DnsFailure,
            TransportError::Redirects => ErrorCategory::TooManyRedirects,
            TransportError::Connect(message) | TransportError::Other(message) => {
                match Self::from_message(message) {
                    ErrorCategory::Unclassified(_) if exhausted => ErrorCategory::RetriesExhausted,
                    category => category,
                }
            }
        }
    }

    /// Text fallback for errors without structure.
    ///
    /// Markers are searched case-insensitively, in a fixed order, with URLs,
    /// `host=` fields and `url:` paths left out so a target's own name never
    /// decides its category. "Max retries exceeded" wrappers are unwrapped to
    /// their innermost "Caused by" cause.
    ///
    /// # Parameters
    /// - `message`: error text from any layer
    ///
    /// # Returns
    /// A known category, or the message itself cut to 80 characters
    pub fn from_message(message: &str) -> Self {
        let lowered = without_locations(message);
        let has = |markers: &[&str]| markers.iter().any(|marker| lowered.contains(marker));

        if has(&["nameresolutionerror", "getaddrinfo failed", "name or service not known", "dns error", "dns resolution failed", "failed to lookup address"]) {
            return ErrorCategory::DnsFailure;
        }
        if has(&["connecttimeouterror", "timed out"]) {
            return ErrorCategory::Timeout;
        }
        if has(&["connectionrefusederror", "connection refused"]) {
            return ErrorCategory::ConnectionRefused;
        }
        if has(&["ssl", "tls", "certificate"]) {
            return ErrorCategory::TlsError;
        }
        if has(&["toomanyredirects", "too many redirects"]) {
            return ErrorCategory::TooManyRedirects;
        }
        if has(&["connectionreseterror", "connection reset"]) {
            return ErrorCategory::ConnectionReset;
        }
        if lowered.contains(RETRIES_WRAPPER) {
            return match message.rsplit_once(CAUSED_BY) {
                Some((_, inner)) => Self::from_message(inner.trim_end_matches(')')),
                None => ErrorCategory::RetriesExhausted,
            };
        }

        Self::unclassified(message)
    }

    fn unclassified(message: &str) -> Self {
        if message.chars().count() > MAX_MESSAGE_CHARS {
            let head: String = message.chars().take(MAX_MESSAGE_CHARS - 3).collect();
            ErrorCategory::Unclassified(format!("{}...", head))
        } else {
            ErrorCategory::Unclassified(message.to_string())
        }
    }
}

/// Lowercased words of `message` minus anything naming the target
fn without_locations(message: &str) -> String {
    let mut kept = Vec::new();
    let mut skip_next = false;
    for word in message.split_whitespace() {
        if std::mem::take(&mut skip_next) {
            continue;
        }
        let word = word.to_lowercase();
        if word == "url:" {
            skip_next = true;
        } else if !word.contains("://") && !word.contains("host=") {
            kept.push(word);
        }
    }
    kept.join(" ")
}

impl From<&FetchError> for ErrorCategory {
    fn from(err: &FetchError) -> Self {
        Self::from_fetch_error(err)
    }
}

impl From<&RsapplyzerError> for ErrorCategory {
    fn from(err: &RsapplyzerError) -> Self {
        Self::from_message(&err.to_string())
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ErrorCategory::DnsFailure => "DNS resolution failed",
            ErrorCategory::Timeout => "Connection timed out",
            ErrorCategory::ConnectionRefused => "Connection refused",
            ErrorCategory::TlsError => "SSL/TLS error",
            ErrorCategory::TooManyRedirects => "Too many redirects",
            ErrorCategory::ConnectionReset => "Connection reset by host",
            ErrorCategory::RetriesExhausted => "Max retries exceeded",
            ErrorCategory::Unclassified(message) => message,
        };
        f.write_str(text)
    }
}
