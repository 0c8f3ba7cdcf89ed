//! Configuration for scans and rule loading

use std::path::PathBuf;
use std::time::Duration;

use crate::net::UserAgentMode;

/// Default wappalyzergo fingerprint file.
pub const DEFAULT_RULE_SOURCE: &str =
    "https://raw.githubusercontent.com/projectdiscovery/wappalyzergo/refs/heads/main/fingerprints_data.json";

/// Scan configuration
#[derive(Debug, Clone)]
pub struct ScanConfig {
    // Worker pool size
    pub concurrency: usize,
    // Per-request timeout
    pub timeout: Duration,
    // Retries after the first attempt
    pub retries: u32,
    // Linear backoff unit: attempt i sleeps backoff_base * (i + 1)
    pub backoff_base: Duration,
    pub user_agent: UserAgentMode,
    pub tls_verify: bool,
    // Hide per-target error lines
    pub suppress_errors: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            timeout: Duration::from_secs(10),
            retries: 2,
            backoff_base: Duration::from_secs(1),
            user_agent: UserAgentMode::default(),
            tls_verify: false,
            suppress_errors: false,
        }
    }
}

/// A remote rule file
#[derive(Debug, Clone)]
pub struct RemoteRuleSource {
    /// Name used in logs
    pub name: String,
    pub raw_url: String,
}

/// Rule loading configuration
#[derive(Debug, Clone)]
pub struct RuleConfig {
    // MessagePack cache of the last downloaded library
    pub rule_cache_path: PathBuf,
    // Local rule file, bypasses cache and remote sources
    pub rules_file: Option<PathBuf>,
    // Tried in order
    pub remote_sources: Vec<RemoteRuleSource>,
    // GitHub mirror prefix used when a raw URL is unreachable
    pub gh_proxy_url: String,
    // Rule download timeout
    pub http_timeout: Duration,
    // Ignore the cache and download again
    pub refresh: bool,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            rule_cache_path: PathBuf::from("rsapplyzer_rules.mp"),
            rules_file: None,
            remote_sources: vec![RemoteRuleSource {
                name: "wappalyzergo".to_string(),
                raw_url: DEFAULT_RULE_SOURCE.to_string(),
            }],
            gh_proxy_url: "https://ghfast.top/".to_string(),
            http_timeout: Duration::from_secs(30),
            refresh: false,
        }
    }
}

/// Configuration entry point
pub struct ConfigManager;

impl ConfigManager {
    pub fn custom() -> CustomConfigBuilder {
        CustomConfigBuilder::new()
    }
}

/// Builder for [`ScanConfig`]
#[derive(Debug, Clone, Default)]
pub struct CustomConfigBuilder {
    config: ScanConfig,
}

impl CustomConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Values below one are raised to one.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency.max(1);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.config.retries = retries;
        self
    }

    pub fn backoff_base(mut self, base: Duration) -> Self {
        self.config.backoff_base = base;
        self
    }

    pub fn user_agent(mut self, mode: UserAgentMode) -> Self {
        self.config.user_agent = mode;
        self
    }

    pub fn tls_verify(mut self, verify: bool) -> Self {
        self.config.tls_verify = verify;
        self
    }

    pub fn suppress_errors(mut self, suppress: bool) -> Self {
        self.config.suppress_errors = suppress;
        self
    }

    pub fn build(self) -> ScanConfig {
        self.config
    }
}
