//! Analyzers: one per evidence source (URL, headers, cookies, HTML, scripts, meta)
use std::collections::HashMap;

use tracing::debug;

use crate::compiler::{CompiledPattern, CompiledRuleLibrary, CompiledTechRule};
use crate::rule::TechnologyMap;
use crate::utils::{DetectionUpdater, VersionExtractor};

/// Run `patterns` against `input` and record every hit for `tech_name`
fn match_patterns(
    compiled_lib: &CompiledRuleLibrary,
    detected: &mut TechnologyMap,
    tech_name: &str,
    patterns: &[CompiledPattern],
    input: &str,
) -> bool {
    let mut matched = false;
    for pattern in patterns {
        if let Some(captures) = pattern.regex.captures(input) {
            let version = VersionExtractor::extract(&pattern.version_template, &captures);
            DetectionUpdater::update(compiled_lib, detected, tech_name, version);
            matched = true;
        }
    }
    matched
}

/// Keyed lookup shared by the header, cookie and meta analyzers
fn match_keyed(
    compiled_lib: &CompiledRuleLibrary,
    detected: &mut TechnologyMap,
    values: &HashMap<String, String>,
    select: impl Fn(&CompiledTechRule) -> &HashMap<String, Vec<CompiledPattern>>,
    source: &str,
) {
    for compiled_tech in compiled_lib.tech_patterns.values() {
        for (key, patterns) in select(compiled_tech) {
            let Some(value) = values.get(key) else {
                continue;
            };
            if match_patterns(compiled_lib, detected, &compiled_tech.name, patterns, value) {
                debug!("{} match: {} via {}", source, compiled_tech.name, key);
            }
        }
    }
}

/// URL analyzer
pub struct UrlAnalyzer;

impl UrlAnalyzer {
    pub fn analyze(compiled_lib: &CompiledRuleLibrary, urls: &[&str], detected: &mut TechnologyMap) {
        for url in urls {
            for compiled_tech in compiled_lib.tech_patterns.values() {
                if match_patterns(compiled_lib, detected, &compiled_tech.name, &compiled_tech.url_patterns, url) {
                    debug!("url match: {} on {}", compiled_tech.name, url);
                }
            }
        }
    }
}

/// Header analyzer, keys are lowercase header names
pub struct HeaderAnalyzer;

impl HeaderAnalyzer {
    pub fn analyze(
        compiled_lib: &CompiledRuleLibrary,
        headers: &HashMap<String, String>,
        detected: &mut TechnologyMap,
    ) {
        match_keyed(compiled_lib, detected, headers, |tech| &tech.header_patterns, "header");
    }
}

/// Cookie analyzer, keys are lowercase cookie names
pub struct CookieAnalyzer;

impl CookieAnalyzer {
    pub fn analyze(
        compiled_lib: &CompiledRuleLibrary,
        cookies: &HashMap<String, String>,
        detected: &mut TechnologyMap,
    ) {
        match_keyed(compiled_lib, detected, cookies, |tech| &tech.cookie_patterns, "cookie");
    }
}

/// HTML body analyzer
pub struct HtmlAnalyzer;

impl HtmlAnalyzer {
    pub fn analyze(compiled_lib: &CompiledRuleLibrary, html: &str, detected: &mut TechnologyMap) {
        for compiled_tech in compiled_lib.tech_patterns.values() {
            match_patterns(compiled_lib, detected, &compiled_tech.name, &compiled_tech.html_patterns, html);
        }
    }
}

/// `<script src>` analyzer
pub struct ScriptAnalyzer;

impl ScriptAnalyzer {
    pub fn analyze(compiled_lib: &CompiledRuleLibrary, script_srcs: &[String], detected: &mut TechnologyMap) {
        for src in script_srcs {
            for compiled_tech in compiled_lib.tech_patterns.values() {
                if match_patterns(compiled_lib, detected, &compiled_tech.name, &compiled_tech.script_patterns, src) {
                    debug!("script match: {} on {}", compiled_tech.name, src);
                }
            }
        }
    }
}

/// `<meta>` analyzer
pub struct MetaAnalyzer;

impl MetaAnalyzer {
    pub fn analyze(compiled_lib: &CompiledRuleLibrary, metas: &HashMap<String, String>, detected: &mut TechnologyMap) {
        match_keyed(compiled_lib, detected, metas, |tech| &tech.meta_patterns, "meta");
    }
}
