//! Colored console output

use std::path::Path;

use colored::Colorize;

use super::summary::ScanSummary;
use super::writer::OutputFormat;
use crate::net::UserAgentMode;
use crate::rule::TechnologyMatch;
use crate::scan::{Progress, ScanError, ScanObserver, ScanResult};

const BANNER: &str = r#"
                            _
  _ __ ___  __ _ _ __  _ __ | |_   _ _______ _ __
 | '__/ __|/ _` | '_ \| '_ \| | | | |_  / _ \ '__|
 | |  \__ \ (_| | |_) | |_) | | |_| |/ /  __/ |
 |_|  |___/\__,_| .__/| .__/|_|\__, /___\___|_|
                |_|   |_|      |___/
"#;

const RULE_WIDTH: usize = 50;

pub fn print_banner() {
    println!("{}", BANNER.bright_blue());
}

/// Echo of the effective settings before the scan starts
pub struct ConfigEcho<'a> {
    pub targets: usize,
    pub threads: usize,
    pub user_agent: UserAgentMode,
    pub timeout_secs: u64,
    pub output: Option<(&'a Path, OutputFormat)>,
}

pub fn print_config(echo: &ConfigEcho<'_>) {
    println!("  {}    {} domain(s)", "Targets:".green(), echo.targets.to_string().bold());
    println!("  {}    {}", "Threads:".green(), echo.threads.to_string().bold());
    println!("  {} {}", "User-Agent:".green(), echo.user_agent.as_str().bold());
    println!("  {}    {}", "Timeout:".green(), format!("{}s", echo.timeout_secs).bold());
    if let Some((path, format)) = echo.output {
        println!("  {}     {} ({})", "Output:".green(), path.display().to_string().bold(), format);
    }
    println!();
    println!("{}\n", " Scanning...".purple().bold());
}

/// `name version [categories]`
pub fn format_technology(tech: &TechnologyMatch) -> String {
    let mut line = tech.name.blue().bold().to_string();
    if !tech.versions.is_empty() {
        line.push(' ');
        line.push_str(&tech.versions.join(", ").yellow().to_string());
    }
    if !tech.categories.is_empty() {
        let categories: Vec<&str> = tech.categories.iter().map(String::as_str).collect();
        line.push(' ');
        line.push_str(&format!("[{}]", categories.join(", ")).dimmed().to_string());
    }
    line
}

/// Streams per-target lines as outcomes arrive
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter {
    pub suppress_errors: bool,
}

impl ConsoleReporter {
    pub fn new(suppress_errors: bool) -> Self {
        Self { suppress_errors }
    }
}

impl ScanObserver for ConsoleReporter {
    fn on_result(&self, progress: Progress, result: &ScanResult) {
        let tech_line = if result.technologies.is_empty() {
            "No technologies detected".dimmed().to_string()
        } else {
            result
                .technologies
                .values()
                .map(format_technology)
                .collect::<Vec<_>>()
                .join(", ")
        };
        println!("  {} {}", format!("[{}]", progress).green(), result.url.bold());
        println!("         {}", tech_line);
    }

    fn on_error(&self, progress: Progress, error: &ScanError) {
        if self.suppress_errors {
            return;
        }
        println!(
            "  {} {} > {}",
            format!("[{}] Error:", progress).purple(),
            error.target.bold(),
            error.category.to_string().dimmed()
        );
    }
}

pub fn print_saved(path: &Path) {
    println!("\n  {} {}", "Results saved to:".green(), path.display().to_string().bold());
}

pub fn print_summary(summary: &ScanSummary) {
    let rule = "─".repeat(RULE_WIDTH);
    println!("\n{}", rule.purple());
    println!("{}", " Summary".purple().bold());
    println!("{}", rule.purple());
    println!("  Targets:      {}", summary.targets.to_string().bold());
    println!("  Successful:   {}", summary.successful.to_string().green().bold());
    println!("  Failed:       {}", summary.failed.to_string().purple().bold());
    if summary.unique_technologies > 0 {
        println!("  Technologies: {} unique", summary.unique_technologies.to_string().bold());
    }

    if !summary.error_breakdown.is_empty() {
        println!("\n  {}", "Errors:".bold());
        for (reason, count) in &summary.error_breakdown {
            println!("    {} {}", format!("{:>4}x", count).purple(), reason);
        }
    }

    if !summary.top_technologies.is_empty() {
        println!("\n  {}", "Most common:".bold());
        for tech in &summary.top_technologies {
            let categories = if tech.categories.is_empty() {
                String::new()
            } else {
                let names: Vec<&str> = tech.categories.iter().map(String::as_str).collect();
                format!(" {}", format!("({})", names.join(", ")).dimmed())
            };
            println!("    {} {}{} ({})", tech.bar().green(), tech.name, categories, tech.count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_technology_contains_parts() {
        let mut tech = TechnologyMatch::from_name("Nginx");
        tech.add_version("1.24.0".to_string());
        tech.categories.insert("Web servers".to_string());

        let line = format_technology(&tech);
        assert!(line.contains("Nginx"));
        assert!(line.contains("1.24.0"));
        assert!(line.contains("[Web servers]"));
    }

    #[test]
    fn test_bare_technology() {
        let line = format_technology(&TechnologyMatch::from_name("PHP"));
        assert!(line.contains("PHP"));
        assert!(!line.contains('['));
    }
}
