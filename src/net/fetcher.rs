//! Fetcher: DNS guard, retry loop with linear backoff, insecure-scheme fallbacks

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use url::Host;

use super::error::{FetchError, TransportError};
use super::resolver::Resolver;
use super::transport::{FetchRequest, FetchedPage, HttpTransport};

/// What to do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// TLS failure: one http request, then stop
    TlsFallback,
    /// Connection failure on the last attempt: one http request, then stop
    InsecureFallback,
    Backoff(Duration),
    GiveUp,
    Abort,
}

fn decide(error: &TransportError, attempt: u32, retries: u32, secure: bool, backoff_base: Duration) -> Step {
    let last_attempt = attempt >= retries;
    let backoff = backoff_base * (attempt + 1);

    match error {
        TransportError::Tls(_) => Step::TlsFallback,
        err if err.is_connection_error() => {
            if !last_attempt {
                Step::Backoff(backoff)
            } else if secure {
                Step::InsecureFallback
            } else {
                Step::GiveUp
            }
        }
        TransportError::Timeout if !last_attempt => Step::Backoff(backoff),
        TransportError::Timeout => Step::GiveUp,
        _ => Step::Abort,
    }
}

/// Fetches one page per target
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn HttpTransport>,
    resolver: Arc<dyn Resolver>,
    backoff_base: Duration,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn HttpTransport>, resolver: Arc<dyn Resolver>, backoff_base: Duration) -> Self {
        Self { transport, resolver, backoff_base }
    }

    /// Fetch one page with the retry policy applied.
    ///
    /// Domain hosts go through the resolver first and are never requested
    /// when they do not resolve. Afterwards:
    /// - timeouts and connection errors are retried up to `request.retries`
    ///   times, sleeping `backoff_base * attempt` between attempts
    /// - a TLS error makes one plain-http request at once and ends the fetch
    /// - a connection error on the last https attempt makes one plain-http
    ///   request before giving up
    /// - redirect loops and anything unrecognized end the fetch immediately
    ///
    /// # Parameters
    /// - `request`: the target URL with its headers, timeout and retry budget
    ///
    /// # Returns
    /// The first page received, or the [`FetchError`] describing why none was
    pub async fn fetch(&self, request: FetchRequest) -> Result<FetchedPage, FetchError> {
        match request.url.host() {
            Some(Host::Domain(domain)) => {
                if !self.resolver.resolves(domain).await {
                    return Err(FetchError::DnsFailure { host: domain.to_string() });
                }
            }
            Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => {}
            None => {
                return Err(FetchError::InvalidTarget {
                    target: request.url.to_string(),
                    reason: "missing host".to_string(),
                });
            }
        }

        let secure = request.is_secure();
        let mut attempt = 0;
        loop {
            let error = match self.transport.get(&request).await {
                Ok(page) => return Ok(page),
                Err(e) => e,
            };

            let step = decide(&error, attempt, request.retries, secure, self.backoff_base);
            debug!("{} attempt {} failed ({}), next: {:?}", request.url, attempt + 1, error, step);

            match step {
                Step::TlsFallback => {
                    let fallback = match request.insecure_fallback() {
                        Some(fallback_request) => match self.transport.get(&fallback_request).await {
                            Ok(page) => return Ok(page),
                            Err(e) => Some(e),
                        },
                        None => None,
                    };
                    return Err(FetchError::TlsFallbackFailed {
                        url: request.url.to_string(),
                        cause: error,
                        fallback,
                    });
                }
                Step::InsecureFallback => {
                    if let Some(fallback_request) = request.insecure_fallback() {
                        match self.transport.get(&fallback_request).await {
                            Ok(page) => return Ok(page),
                            Err(e) => debug!("{} http fallback failed: {}", request.url, e),
                        }
                    }
                    return Err(FetchError::Exhausted { attempts: attempt + 1, last: error });
                }
                Step::Backoff(delay) => {
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Step::GiveUp => {
                    return Err(FetchError::Exhausted { attempts: attempt + 1, last: error });
                }
                Step::Abort => return Err(FetchError::Aborted(error)),
            }
        }
    }
}
