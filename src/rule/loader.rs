//! Rule loader
//! Local rule file, local cache or remote download, in that order

use std::collections::HashMap;
use std::path::Path;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::cache::RuleCacheManager;
use super::model::{CategoryRule, RuleLibrary, TechRule};
use crate::config::RuleConfig;
use crate::error::{RsaResult, RsapplyzerError};

/// On-disk rule layout. Wappalyzer uses `technologies`, wappalyzergo uses `apps`.
#[derive(Debug, Deserialize)]
struct RuleFile {
    #[serde(alias = "apps")]
    technologies: HashMap<String, TechRule>,
    #[serde(default)]
    categories: HashMap<String, CategoryRule>,
}

/// Rule loader
pub struct RuleLoader;

impl RuleLoader {
    /// Load the rule library.
    ///
    /// An explicit rule file wins. Otherwise the MessagePack cache is used
    /// unless `refresh` is set, and the remote sources are the last resort.
    /// A fresh download is written back to the cache; failing to write it
    /// only logs a warning.
    pub async fn load(config: &RuleConfig) -> RsaResult<RuleLibrary> {
        if let Some(path) = &config.rules_file {
            let rule_lib = Self::load_file(path).await?;
            info!("loaded {} technology rules from {}", rule_lib.tech_rules.len(), path.display());
            return Ok(rule_lib);
        }

        if !config.refresh {
            match RuleCacheManager::load_from_cache(config).await {
                Ok(rule_lib) => {
                    info!("loaded {} technology rules from cache", rule_lib.tech_rules.len());
                    return Ok(rule_lib);
                }
                Err(e) => warn!("rule cache unavailable ({}), downloading rules", e),
            }
        }

        let rule_lib = Self::fetch_remote(config).await?;

        if let Err(e) = RuleCacheManager::save_to_cache(config, &rule_lib).await {
            warn!("failed to cache rule library: {}", e);
        } else {
            debug!("rule library cached at {}", config.rule_cache_path.display());
        }

        Ok(rule_lib)
    }

    /// Load a Wappalyzer or wappalyzergo JSON file
    pub async fn load_file(path: &Path) -> RsaResult<RuleLibrary> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            RsapplyzerError::RuleLoadError(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::parse_rule_json(&bytes)
    }

    /// Parse rule JSON
    pub fn parse_rule_json(bytes: &[u8]) -> RsaResult<RuleLibrary> {
        let file: RuleFile = serde_json::from_slice(bytes)
            .map_err(|e| RsapplyzerError::RuleParseError(e.to_string()))?;

        let mut category_rules = Self::get_default_categories();
        for (key, mut category) in file.categories {
            if category.id == 0 {
                category.id = key.parse().unwrap_or(0);
            }
            category_rules.insert(key, category);
        }

        Ok(RuleLibrary {
            tech_rules: file.technologies,
            category_rules,
        })
    }

    /// Download rules, trying each source directly and then through the proxy
    pub async fn fetch_remote(config: &RuleConfig) -> RsaResult<RuleLibrary> {
        let client = Client::builder().timeout(config.http_timeout).build()?;

        for source in &config.remote_sources {
            let proxy_path = source.raw_url.trim_start_matches("https://");
            let fallback_url = format!("{}{}", config.gh_proxy_url, proxy_path);

            debug!("fetching rules [{}] from {}", source.name, source.raw_url);
            match Self::fetch_rule_file(&client, &source.raw_url).await {
                Ok(rule_lib) => {
                    info!("downloaded [{}], {} technology rules", source.name, rule_lib.tech_rules.len());
                    return Ok(rule_lib);
                }
                Err(e) => {
                    warn!("fetching [{}] failed: {}, trying mirror {}", source.name, e, fallback_url);
                    match Self::fetch_rule_file(&client, &fallback_url).await {
                        Ok(rule_lib) => {
                            info!("downloaded [{}] via mirror, {} technology rules", source.name, rule_lib.tech_rules.len());
                            return Ok(rule_lib);
                        }
                        Err(proxy_e) => {
                            warn!("mirror for [{}] failed too: {}", source.name, proxy_e);
                            continue;
                        }
                    }
                }
            }
        }

        Err(RsapplyzerError::RuleLoadError(
            "all remote rule sources failed, check the network or pass --rules".to_string(),
        ))
    }

    async fn fetch_rule_file(client: &Client, url: &str) -> RsaResult<RuleLibrary> {
        let response = client
            .get(url)
            .header("User-Agent", concat!("rsapplyzer/", env!("CARGO_PKG_VERSION")))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RsapplyzerError::RuleLoadError(format!(
                "{} returned status {}",
                url,
                response.status()
            )));
        }

        let bytes = response.bytes().await?;
        Self::parse_rule_json(&bytes)
    }

    /// Well-known Wappalyzer categories; wappalyzergo files carry ids only
    fn get_default_categories() -> HashMap<String, CategoryRule> {
        let default_cats = [
            (1, "CMS"), (2, "Message boards"), (3, "Database managers"), (4, "Documentation"),
            (5, "Widgets"), (6, "Ecommerce"), (7, "Photo galleries"), (8, "Wikis"),
            (9, "Hosting panels"), (10, "Analytics"), (11, "Blogs"), (12, "JavaScript frameworks"),
            (13, "Issue trackers"), (14, "Video players"), (15, "Comment systems"), (16, "Security"),
            (17, "Font scripts"), (18, "Web frameworks"), (19, "Miscellaneous"), (20, "Editors"),
            (21, "LMS"), (22, "Web servers"), (23, "Caching"), (24, "Rich text editors"),
            (25, "JavaScript graphics"), (26, "Mobile frameworks"), (27, "Programming languages"),
            (28, "Operating systems"), (29, "Search engines"), (30, "Webmail"), (31, "CDN"),
            (32, "Marketing automation"), (33, "Web server extensions"), (34, "Databases"),
            (35, "Maps"), (36, "Advertising"), (41, "Payment processors"), (42, "Tag managers"),
            (59, "JavaScript libraries"), (62, "PaaS"), (64, "Reverse proxies"),
            (66, "UI frameworks"), (67, "Cookie compliance"),
        ];

        default_cats
            .into_iter()
            .map(|(id, name)| {
                (id.to_string(), CategoryRule { name: name.to_string(), priority: None, id })
            })
            .collect()
    }
}
