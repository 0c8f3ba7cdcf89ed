//! Rule cache
//! Local MessagePack (de)serialization of the rule library

use rmp_serde::{Serializer, from_slice};
use serde::Serialize;
use tracing::debug;

use super::model::RuleLibrary;
use crate::config::RuleConfig;
use crate::error::{RsaResult, RsapplyzerError};

/// Rule cache manager
pub struct RuleCacheManager;

impl RuleCacheManager {
    /// Load the rule library from the local cache
    pub async fn load_from_cache(config: &RuleConfig) -> RsaResult<RuleLibrary> {
        let cache_data = tokio::fs::read(&config.rule_cache_path).await?;

        let rule_lib: RuleLibrary = from_slice(&cache_data)
            .map_err(|e| RsapplyzerError::MsgPackError(format!("decode failed: {}", e)))?;

        debug!(
            "cache decoded, tech rules: {}, categories: {}",
            rule_lib.tech_rules.len(),
            rule_lib.category_rules.len()
        );

        Ok(rule_lib)
    }

    /// Write the rule library to the local cache
    pub async fn save_to_cache(config: &RuleConfig, rule_lib: &RuleLibrary) -> RsaResult<()> {
        let mut cache_data = Vec::new();

        rule_lib
            .serialize(&mut Serializer::new(&mut cache_data))
            .map_err(|e| RsapplyzerError::MsgPackError(format!("encode failed: {}", e)))?;

        debug!("rule library encoded, {} bytes", cache_data.len());

        tokio::fs::write(&config.rule_cache_path, cache_data).await?;
        Ok(())
    }
}
