//! rsapplyzer - concurrent web technology detection with Wappalyzer rules

pub use self::error::{RsaResult, RsapplyzerError};

pub use self::config::{ConfigManager, CustomConfigBuilder, RemoteRuleSource, RuleConfig, ScanConfig};

pub use self::rule::{
    CategoryRule, RuleCacheManager, RuleLibrary, RuleLoader, TechRule, TechnologyMap, TechnologyMatch,
};

pub use self::compiler::{CompiledPattern, CompiledRuleLibrary, CompiledTechRule, RuleCompiler};

pub use self::detector::TechDetector;

pub use self::net::{
    FetchError, FetchRequest, FetchedPage, Fetcher, HttpTransport, ReqwestTransport, Resolver, SystemResolver,
    TransportError, UserAgentMode,
};

pub use self::scan::{
    Classifier, ErrorCategory, NoopObserver, Progress, ProgressTracker, ScanError, ScanObserver, ScanOrchestrator,
    ScanOutcome, ScanReport, ScanResult,
};

pub use self::report::{OutputFormat, ScanSummary};

pub mod cli;
pub mod compiler;
pub mod config;
pub mod detector;
pub mod error;
pub mod extractor;
pub mod logging;
pub mod net;
pub mod report;
pub mod rule;
pub mod scan;
pub mod utils;
