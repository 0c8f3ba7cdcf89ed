//! HTTP transport

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, USER_AGENT};
use reqwest::{redirect, Client};
use url::Url;

use super::error::{FetchError, TransportError};
use crate::error::RsaResult;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE_EN: &str = "en-US,en;q=0.9";
const MAX_REDIRECTS: usize = 10;

/// One GET, built per target at dispatch time
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: Url,
    pub headers: HeaderMap,
    pub timeout: Duration,
    pub tls_verify: bool,
    /// Attempts after the first
    pub retries: u32,
}

impl FetchRequest {
    pub fn new(
        url: &str,
        user_agent: &'static str,
        timeout: Duration,
        tls_verify: bool,
        retries: u32,
    ) -> Result<Self, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidTarget {
            target: url.to_string(),
            reason: e.to_string(),
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(user_agent));
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_EN));
        // Accept-Encoding comes from the client's gzip/deflate support
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        Ok(Self {
            url: parsed,
            headers,
            timeout,
            tls_verify,
            retries,
        })
    }

    pub fn is_secure(&self) -> bool {
        self.url.scheme() == "https"
    }

    /// Same request on plain http, `None` unless the scheme is https
    pub fn insecure_fallback(&self) -> Option<Self> {
        if !self.is_secure() {
            return None;
        }
        let mut fallback = self.clone();
        fallback.url.set_scheme("http").ok()?;
        Some(fallback)
    }
}

/// A fetched page, consumed once by the classifier
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after redirects
    pub final_url: String,
    pub body: String,
    pub headers: HeaderMap,
}

/// Performs a single HTTP GET
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, request: &FetchRequest) -> Result<FetchedPage, TransportError>;
}

/// reqwest-backed transport with one client per TLS verification mode
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    verifying: Client,
    insecure: Client,
}

impl ReqwestTransport {
    pub fn new() -> RsaResult<Self> {
        Ok(Self {
            verifying: Self::build_client(true)?,
            insecure: Self::build_client(false)?,
        })
    }

    fn build_client(tls_verify: bool) -> RsaResult<Client> {
        let client = Client::builder()
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .danger_accept_invalid_certs(!tls_verify)
            .gzip(true)
            .deflate(true)
            .build()?;
        Ok(client)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, request: &FetchRequest) -> Result<FetchedPage, TransportError> {
        let client = if request.tls_verify { &self.verifying } else { &self.insecure };

        let response = client
            .get(request.url.clone())
            .headers(request.headers.clone())
            .timeout(request.timeout)
            .send()
            .await?;

        let final_url = response.url().to_string();
        let headers = response.headers().clone();
        let body = response.text().await?;

        Ok(FetchedPage { final_url, body, headers })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(url: &str) -> FetchRequest {
        FetchRequest::new(url, "test-agent", Duration::from_secs(5), false, 2).unwrap()
    }

    #[test]
    fn test_request_headers() {
        let req = request("https://example.com/");
        assert_eq!(req.headers[USER_AGENT], "test-agent");
        assert_eq!(req.headers[ACCEPT_LANGUAGE], ACCEPT_LANGUAGE_EN);
        assert_eq!(req.headers[CONNECTION], "keep-alive");
        assert!(!req.headers.contains_key(reqwest::header::ACCEPT_ENCODING));
        assert!(req.is_secure());
    }

    #[test]
    fn test_insecure_fallback_keeps_host_and_path() {
        let fallback = request("https://example.com/index.php?a=1").insecure_fallback().unwrap();
        assert_eq!(fallback.url.as_str(), "http://example.com/index.php?a=1");
        assert!(request("http://example.com/").insecure_fallback().is_none());
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let err = FetchRequest::new("https://exa mple.com", "ua", Duration::from_secs(1), false, 0).unwrap_err();
        assert!(matches!(err, FetchError::InvalidTarget { .. }));
    }
}
