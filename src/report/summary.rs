//! Batch summary aggregation

use std::collections::{BTreeSet, HashMap};

use crate::scan::ScanReport;

/// How many technologies the summary lists
pub const TOP_TECHNOLOGIES: usize = 10;
/// Longest frequency bar
pub const MAX_BAR_WIDTH: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TechnologyCount {
    pub name: String,
    pub count: usize,
    /// Categories from the first result that reported the technology
    pub categories: BTreeSet<String>,
}

impl TechnologyCount {
    pub fn bar(&self) -> String {
        "█".repeat(self.count.min(MAX_BAR_WIDTH))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSummary {
    pub targets: usize,
    pub successful: usize,
    pub failed: usize,
    pub unique_technologies: usize,
    /// Reason text and count, most frequent first, ties by text
    pub error_breakdown: Vec<(String, usize)>,
    /// Most common first, ties by name
    pub top_technologies: Vec<TechnologyCount>,
}

impl ScanSummary {
    pub fn from_report(report: &ScanReport) -> Self {
        let mut error_counts: HashMap<String, usize> = HashMap::new();
        for error in &report.errors {
            *error_counts.entry(error.category.to_string()).or_default() += 1;
        }
        let mut error_breakdown: Vec<(String, usize)> = error_counts.into_iter().collect();
        error_breakdown.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let mut tech_counts: HashMap<&str, TechnologyCount> = HashMap::new();
        for result in &report.results {
            for (name, tech) in &result.technologies {
                tech_counts
                    .entry(name.as_str())
                    .or_insert_with(|| TechnologyCount {
                        name: name.clone(),
                        count: 0,
                        categories: tech.categories.clone(),
                    })
                    .count += 1;
            }
        }
        let unique_technologies = tech_counts.len();
        let mut top_technologies: Vec<TechnologyCount> = tech_counts.into_values().collect();
        top_technologies.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        top_technologies.truncate(TOP_TECHNOLOGIES);

        Self {
            targets: report.total(),
            successful: report.results.len(),
            failed: report.errors.len(),
            unique_technologies,
            error_breakdown,
            top_technologies,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{TechnologyMap, TechnologyMatch};
    use crate::scan::{ErrorCategory, ScanError, ScanResult};

    fn result(url: &str, techs: &[&str]) -> ScanResult {
        let technologies: TechnologyMap = techs
            .iter()
            .map(|name| {
                let mut tech = TechnologyMatch::from_name(*name);
                tech.categories.insert(format!("{} cat", name));
                (name.to_string(), tech)
            })
            .collect();
        ScanResult { url: url.to_string(), final_url: url.to_string(), technologies }
    }

    #[test]
    fn test_counts_and_ordering() {
        let report = ScanReport {
            results: vec![
                result("https://a", &["Nginx", "PHP"]),
                result("https://b", &["Nginx", "React"]),
                result("https://c", &["Nginx", "PHP"]),
            ],
            errors: vec![
                ScanError::new("d", ErrorCategory::Timeout),
                ScanError::new("e", ErrorCategory::DnsFailure),
                ScanError::new("f", ErrorCategory::Timeout),
                ScanError::new("g", ErrorCategory::ConnectionRefused),
            ],
        };

        let summary = ScanSummary::from_report(&report);

        assert_eq!(summary.targets, 7);
        assert_eq!(summary.successful, 3);
        assert_eq!(summary.failed, 4);
        assert_eq!(summary.unique_technologies, 3);
        assert_eq!(
            summary.error_breakdown,
            vec![
                ("Connection timed out".to_string(), 2),
                ("Connection refused".to_string(), 1),
                ("DNS resolution failed".to_string(), 1),
            ]
        );
        let top: Vec<(&str, usize)> = summary.top_technologies.iter().map(|t| (t.name.as_str(), t.count)).collect();
        assert_eq!(top, vec![("Nginx", 3), ("PHP", 2), ("React", 1)]);
        assert!(summary.top_technologies[0].categories.contains("Nginx cat"));
    }

    #[test]
    fn test_top_list_and_bar_are_capped() {
        let names: Vec<String> = (0..15).map(|i| format!("T{:02}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let report = ScanReport {
            results: (0..40).map(|i| result(&format!("https://{}", i), &refs)).collect(),
            errors: Vec::new(),
        };

        let summary = ScanSummary::from_report(&report);

        assert_eq!(summary.unique_technologies, 15);
        assert_eq!(summary.top_technologies.len(), TOP_TECHNOLOGIES);
        assert_eq!(summary.top_technologies[0].name, "T00");
        assert_eq!(summary.top_technologies[0].bar().chars().count(), MAX_BAR_WIDTH);
        assert!(summary.error_breakdown.is_empty());
    }
}
