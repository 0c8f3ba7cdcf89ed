//! Transport and fetch errors

use std::error::Error as StdError;
use std::io;

use thiserror::Error;

/// Failure of a single HTTP attempt
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("connection timed out")]
    Timeout,
    #[error("connection refused")]
    Refused,
    #[error("connection reset by peer")]
    Reset,
    #[error("tls error: {0}")]
    Tls(String),
    #[error("dns error: {0}")]
    Dns(String),
    #[error("connect error: {0}")]
    Connect(String),
    #[error("too many redirects")]
    Redirects,
    #[error("{0}")]
    Other(String),
}

/// Matched against the error's causes, never against the request URL
const TLS_MARKERS: [&str; 4] = ["certificate", "tls", "ssl", "handshake"];
const DNS_MARKERS: [&str; 4] = [
    "dns error",
    "failed to lookup address",
    "name or service not known",
    "no such host",
];

impl TransportError {
    /// Retried with backoff, with an insecure fallback on the last attempt
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            TransportError::Refused | TransportError::Reset | TransportError::Dns(_) | TransportError::Connect(_)
        )
    }

    /// Maps a reqwest failure onto the transport taxonomy.
    ///
    /// Checked in order: reqwest's timeout and redirect flags, then the
    /// `io::ErrorKind` and `rustls::Error` found in the source chain, then
    /// marker text in the causes. Send failures that fit nothing more
    /// specific (refused streams, a peer hanging up before the response)
    /// are generic connection errors.
    ///
    /// # Parameters
    /// - `err`: the error returned by `send()` or while reading the body
    ///
    /// # Returns
    /// The category the fetcher's retry policy works on. The carried message
    /// never contains the target URL or host.
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return TransportError::Timeout;
        }
        if err.is_redirect() {
            return TransportError::Redirects;
        }

        let mut io_kind = None;
        let mut rustls_failure = false;
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            if let Some(io_err) = cause.downcast_ref::<io::Error>() {
                io_kind.get_or_insert(io_err.kind());
                // io::Error::source skips the wrapped error itself
                rustls_failure |= io_err.get_ref().is_some_and(|inner| inner.is::<rustls::Error>());
            }
            rustls_failure |= cause.is::<rustls::Error>();
            causes.push(cause.to_string());
            source = cause.source();
        }

        match io_kind {
            Some(io::ErrorKind::ConnectionRefused) => return TransportError::Refused,
            Some(io::ErrorKind::TimedOut) => return TransportError::Timeout,
            _ => {}
        }

        let host = err.url().and_then(|url| url.host_str());
        let detail = without_host(&causes.join(": "), host);
        let message = if detail.is_empty() {
            summary(err)
        } else {
            format!("{}: {}", summary(err), detail)
        };

        let lowered = detail.to_lowercase();
        if rustls_failure || TLS_MARKERS.iter().any(|marker| lowered.contains(marker)) {
            return TransportError::Tls(message);
        }
        if matches!(
            io_kind,
            Some(io::ErrorKind::ConnectionReset) | Some(io::ErrorKind::ConnectionAborted)
        ) {
            return TransportError::Reset;
        }
        if DNS_MARKERS.iter().any(|marker| lowered.contains(marker)) {
            return TransportError::Dns(message);
        }
        if err.is_connect() || err.is_request() {
            return TransportError::Connect(message);
        }

        TransportError::Other(message)
    }
}

/// reqwest's own message minus the ` for url (...)` suffix
fn summary(err: &reqwest::Error) -> String {
    let text = err.to_string();
    match err.url() {
        Some(url) => text.replace(&format!(" for url ({})", url), ""),
        None => text,
    }
}

fn without_host(text: &str, host: Option<&str>) -> String {
    match host {
        Some(host) if !host.is_empty() => text.replace(host, "<host>"),
        _ => text.to_string(),
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::from_reqwest(&err)
    }
}

/// Final outcome of a failed fetch
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The resolver guard rejected the host, no request was sent
    #[error("DNS resolution failed for {host}")]
    DnsFailure { host: String },
    /// TLS failure on the secure scheme; `fallback` is the insecure retry's error
    #[error("SSL/TLS error on {url} (HTTP fallback also failed)")]
    TlsFallbackFailed {
        url: String,
        cause: TransportError,
        fallback: Option<TransportError>,
    },
    #[error("Max retries exceeded after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: TransportError },
    /// Non-retryable error
    #[error(transparent)]
    Aborted(TransportError),
    #[error("invalid target {target}: {reason}")]
    InvalidTarget { target: String, reason: String },
}
