//! Technology detector: runs the analyzers and returns the detection result
use std::sync::Arc;

use reqwest::header::HeaderMap;
use tracing::debug;

use super::analyzer::{CookieAnalyzer, HeaderAnalyzer, HtmlAnalyzer, MetaAnalyzer, ScriptAnalyzer, UrlAnalyzer};
use crate::compiler::{CompiledRuleLibrary, RuleCompiler};
use crate::config::RuleConfig;
use crate::error::{RsaResult, RsapplyzerError};
use crate::extractor::PageEvidence;
use crate::net::FetchedPage;
use crate::rule::{RuleLibrary, RuleLoader, TechnologyMap};
use crate::scan::Classifier;
use crate::utils::{DetectionUpdater, HeaderConverter};

/// Technology detector, cheap to clone
#[derive(Debug, Clone)]
pub struct TechDetector {
    compiled_lib: Arc<CompiledRuleLibrary>,
}

impl TechDetector {
    /// Load and compile rules
    pub async fn new(config: &RuleConfig) -> RsaResult<Self> {
        let rule_lib = RuleLoader::load(config).await?;
        if rule_lib.tech_rules.is_empty() {
            return Err(RsapplyzerError::RuleLoadError("rule library is empty".to_string()));
        }
        Ok(Self::from_library(&rule_lib))
    }

    pub fn from_library(rule_lib: &RuleLibrary) -> Self {
        Self {
            compiled_lib: Arc::new(RuleCompiler::compile(rule_lib)),
        }
    }

    /// Number of technologies known to the detector
    pub fn technology_count(&self) -> usize {
        self.compiled_lib.tech_patterns.len()
    }

    /// Detect technologies from response headers, page URLs and body
    pub fn detect(&self, headers: &HeaderMap, urls: &[&str], body: &[u8]) -> TechnologyMap {
        let header_hashmap = HeaderConverter::to_hashmap(headers);
        let single_header_map = HeaderConverter::to_single_value(&header_hashmap);
        let cookies = HeaderConverter::cookies(headers);

        let html = String::from_utf8_lossy(body);
        let evidence = PageEvidence::from_html(&html);

        let mut detected = TechnologyMap::new();
        let lib = self.compiled_lib.as_ref();

        UrlAnalyzer::analyze(lib, urls, &mut detected);
        HeaderAnalyzer::analyze(lib, &single_header_map, &mut detected);
        CookieAnalyzer::analyze(lib, &cookies, &mut detected);
        HtmlAnalyzer::analyze(lib, &html, &mut detected);
        ScriptAnalyzer::analyze(lib, &evidence.script_srcs, &mut detected);
        MetaAnalyzer::analyze(lib, &evidence.metas, &mut detected);

        DetectionUpdater::apply_implies(lib, &mut detected);

        debug!("{} technologies detected on {:?}", detected.len(), urls);
        detected
    }
}

impl Classifier for TechDetector {
    fn classify(&self, page: &FetchedPage) -> RsaResult<TechnologyMap> {
        Ok(self.detect(&page.headers, &[page.final_url.as_str()], page.body.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderValue, SERVER, SET_COOKIE};

    const RULES: &[u8] = br#"{
        "technologies": {
            "Nginx": {"cats": [22], "headers": {"Server": "nginx(?:/([\\d.]+))?\\;version:\\1"}},
            "WordPress": {
                "cats": [1, 11],
                "meta": {"generator": "^WordPress ?([\\d.]+)?\\;version:\\1"},
                "html": "<link[^>]+/wp-content/",
                "implies": ["PHP", "MySQL\\;confidence:50"]
            },
            "PHP": {"cats": [27], "cookies": {"PHPSESSID": ""}},
            "MySQL": {"cats": [34]},
            "jQuery": {"cats": [59], "scriptSrc": "jquery[.-]([\\d.]+)(?:\\.min)?\\.js\\;version:\\1"}
        },
        "categories": {}
    }"#;

    fn detector() -> TechDetector {
        TechDetector::from_library(&RuleLoader::parse_rule_json(RULES).unwrap())
    }

    const PAGE: &str = r#"<html><head>
        <meta name="generator" content="WordPress 6.4.2">
        <link rel="stylesheet" href="/wp-content/themes/x/style.css">
        <script src="/wp-includes/js/jquery/jquery-3.7.1.min.js"></script>
    </head></html>"#;

    #[test]
    fn test_detect_full_page() {
        let mut headers = HeaderMap::new();
        headers.insert(SERVER, HeaderValue::from_static("nginx/1.24.0"));
        headers.append(SET_COOKIE, HeaderValue::from_static("PHPSESSID=abc; path=/"));

        let detected = detector().detect(&headers, &["https://blog.example/"], PAGE.as_bytes());

        assert_eq!(
            detected.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["MySQL", "Nginx", "PHP", "WordPress", "jQuery"]
        );
        assert_eq!(detected["Nginx"].versions, vec!["1.24.0".to_string()]);
        assert_eq!(detected["WordPress"].versions, vec!["6.4.2".to_string()]);
        assert_eq!(detected["jQuery"].versions, vec!["3.7.1".to_string()]);
        assert!(detected["WordPress"].categories.contains("CMS"));
        assert!(detected["WordPress"].categories.contains("Blogs"));
        assert!(detected["MySQL"].categories.contains("Databases"));
    }

    #[test]
    fn test_technology_count() {
        assert_eq!(detector().technology_count(), 5);
    }

    #[test]
    fn test_implied_technology_without_direct_evidence() {
        let detected = detector().detect(&HeaderMap::new(), &[], PAGE.as_bytes());
        assert!(detected.contains_key("PHP"));
        assert!(detected["PHP"].versions.is_empty());
    }

    #[test]
    fn test_classifier_uses_final_url_headers_and_body() {
        let mut headers = HeaderMap::new();
        headers.insert(SERVER, HeaderValue::from_static("nginx"));
        let page = FetchedPage {
            final_url: "http://plain.example/".to_string(),
            body: "<html>hello</html>".to_string(),
            headers,
        };

        let detected = detector().classify(&page).unwrap();
        assert_eq!(detected.len(), 1);
        assert!(detected["Nginx"].versions.is_empty());
    }
}
