//! DNS pre-check

use async_trait::async_trait;
use tokio::net::lookup_host;
use tracing::debug;

/// Resolves hostnames without connecting
#[async_trait]
pub trait Resolver: Send + Sync {
    /// `false` on any resolution failure
    async fn resolves(&self, host: &str) -> bool;
}

/// System resolver (getaddrinfo via tokio's blocking pool)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl Resolver for SystemResolver {
    async fn resolves(&self, host: &str) -> bool {
        match lookup_host((host, 0)).await {
            Ok(mut addrs) => addrs.next().is_some(),
            Err(e) => {
                debug!("{} does not resolve: {}", host, e);
                false
            }
        }
    }
}
