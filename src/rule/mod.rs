//! Rules: data model, loading and caching
pub mod model;
pub mod cache;
pub mod loader;

pub use self::model::{CategoryRule, RuleLibrary, TechRule, TechnologyMap, TechnologyMatch};
pub use self::loader::RuleLoader;
pub use self::cache::RuleCacheManager;
