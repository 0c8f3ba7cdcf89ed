//! Command-line arguments

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;

use crate::config::{ConfigManager, RuleConfig, ScanConfig};
use crate::error::{RsaResult, RsapplyzerError};
use crate::net::UserAgentMode;
use crate::report::OutputFormat;

#[derive(Debug, Clone, Parser)]
#[command(name = "rsapplyzer", version, about = "Web technology detection powered by Wappalyzer rules")]
pub struct Cli {
    /// Single domain to analyze
    #[arg(short = 'd', long)]
    pub domain: Option<String>,

    /// File containing domains, one per line
    #[arg(short = 'f', long)]
    pub file: Option<PathBuf>,

    /// Number of concurrent workers
    #[arg(short = 't', long, default_value_t = 5)]
    pub threads: usize,

    /// Save results to a file
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Output file format
    #[arg(short = 'F', long, value_enum, default_value_t = OutputFormat::Txt)]
    pub format: OutputFormat,

    /// Request timeout in seconds
    #[arg(short = 'T', long, default_value_t = 10)]
    pub timeout: u64,

    /// Retries per domain
    #[arg(short = 'r', long, default_value_t = 2)]
    pub retries: u32,

    /// Suppress per-domain error lines
    #[arg(short = 'i', long)]
    pub ignore: bool,

    /// User-Agent mode
    #[arg(long = "ua", value_enum, default_value_t = UserAgentMode::Googlebot)]
    pub user_agent: UserAgentMode,

    /// Verify TLS certificates
    #[arg(long)]
    pub verify_ssl: bool,

    /// Local rule file (Wappalyzer or wappalyzergo JSON)
    #[arg(long, value_name = "FILE")]
    pub rules: Option<PathBuf>,

    /// Rule cache location
    #[arg(long, value_name = "PATH")]
    pub rules_cache: Option<PathBuf>,

    /// Download rules again instead of using the cache
    #[arg(long)]
    pub refresh_rules: bool,

    /// Debug logging on stderr
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Skip the banner
    #[arg(long)]
    pub no_banner: bool,
}

impl Cli {
    pub fn scan_config(&self) -> ScanConfig {
        ConfigManager::custom()
            .concurrency(self.threads)
            .timeout(Duration::from_secs(self.timeout))
            .retries(self.retries)
            .user_agent(self.user_agent)
            .tls_verify(self.verify_ssl)
            .suppress_errors(self.ignore)
            .build()
    }

    pub fn rule_config(&self) -> RuleConfig {
        let mut config = RuleConfig {
            rules_file: self.rules.clone(),
            refresh: self.refresh_rules,
            ..RuleConfig::default()
        };
        if let Some(path) = &self.rules_cache {
            config.rule_cache_path = path.clone();
        }
        config
    }

    /// Targets from `--file`, else `--domain`. `None` when neither is given.
    pub fn load_targets(&self) -> Option<RsaResult<Vec<String>>> {
        if let Some(path) = &self.file {
            return Some(read_target_file(path));
        }
        self.domain.as_ref().map(|domain| {
            let domain = domain.trim();
            Ok(if domain.is_empty() { Vec::new() } else { vec![domain.to_string()] })
        })
    }
}

/// One target per line; blank lines and `#` comments are skipped
pub fn read_target_file(path: &Path) -> RsaResult<Vec<String>> {
    if !path.is_file() {
        return Err(RsapplyzerError::InvalidInput(format!("File not found: {}", path.display())));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(parse_targets(&content))
}

pub fn parse_targets(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["rsapplyzer", "-d", "example.com"]).unwrap();
        assert_eq!(cli.threads, 5);
        assert_eq!(cli.timeout, 10);
        assert_eq!(cli.retries, 2);
        assert_eq!(cli.format, OutputFormat::Txt);
        assert_eq!(cli.user_agent, UserAgentMode::Googlebot);
        assert!(!cli.verify_ssl);

        let config = cli.scan_config();
        assert_eq!(config.concurrency, 5);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(!config.tls_verify);
    }

    #[test]
    fn test_flags_map_to_configs() {
        let cli = Cli::try_parse_from([
            "rsapplyzer", "-f", "hosts.txt", "-t", "20", "-F", "csv", "-T", "3", "-r", "0", "-i",
            "--ua", "rotate", "--verify-ssl", "--rules", "rules.json", "--rules-cache", "cache.mp",
            "--refresh-rules",
        ])
        .unwrap();

        let scan = cli.scan_config();
        assert_eq!(scan.concurrency, 20);
        assert_eq!(scan.retries, 0);
        assert_eq!(scan.user_agent, UserAgentMode::Rotate);
        assert!(scan.tls_verify);
        assert!(scan.suppress_errors);
        assert_eq!(cli.format, OutputFormat::Csv);

        let rules = cli.rule_config();
        assert_eq!(rules.rules_file, Some(PathBuf::from("rules.json")));
        assert_eq!(rules.rule_cache_path, PathBuf::from("cache.mp"));
        assert!(rules.refresh);
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["rsapplyzer", "-d", "x", "-F", "xml"]).is_err());
    }

    #[test]
    fn test_target_file_skips_comments_and_blanks() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# corp hosts\nexample.com\n\n  shop.example.com  \n#old.example.com").unwrap();

        let cli = Cli::try_parse_from(["rsapplyzer", "-f", file.path().to_str().unwrap(), "-d", "ignored.com"]).unwrap();
        let targets = cli.load_targets().unwrap().unwrap();
        assert_eq!(targets, vec!["example.com".to_string(), "shop.example.com".to_string()]);
    }

    #[test]
    fn test_missing_file_and_missing_source() {
        let cli = Cli::try_parse_from(["rsapplyzer", "-f", "/definitely/not/here.txt"]).unwrap();
        assert!(matches!(cli.load_targets(), Some(Err(RsapplyzerError::InvalidInput(_)))));

        let cli = Cli::try_parse_from(["rsapplyzer"]).unwrap();
        assert!(cli.load_targets().is_none());
    }
}
