//! Rule compiler
//! Turns raw rules into executable regex patterns

use std::collections::{BTreeSet, HashMap};
use std::time::Instant;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use tracing::debug;

use super::pattern::{CompiledPattern, CompiledRuleLibrary, CompiledTechRule};
use crate::error::RsaResult;
use crate::rule::{RuleLibrary, TechRule};

/// Rule compiler
pub struct RuleCompiler;

impl RuleCompiler {
    /// Compile a rule library
    pub fn compile(rule_lib: &RuleLibrary) -> CompiledRuleLibrary {
        let start = Instant::now();
        let category_map = rule_lib.category_names();

        let mut stats = CompileStats::default();
        let tech_patterns = rule_lib
            .tech_rules
            .iter()
            .map(|(tech_name, tech_rule)| {
                let compiled = Self::compile_tech_rule(tech_name, tech_rule, &category_map, &mut stats);
                (tech_name.clone(), compiled)
            })
            .collect();

        debug!("rules compiled in {:?}", start.elapsed());
        debug!(
            "patterns: url {}, html {}, script {}, header {}, meta {}, cookie {}, skipped {}",
            stats.url_count,
            stats.html_count,
            stats.script_count,
            stats.header_count,
            stats.meta_count,
            stats.cookie_count,
            stats.skipped
        );

        CompiledRuleLibrary { tech_patterns }
    }

    /// Compile a single technology rule
    fn compile_tech_rule(
        tech_name: &str,
        tech_rule: &TechRule,
        category_map: &HashMap<u32, String>,
        stats: &mut CompileStats,
    ) -> CompiledTechRule {
        let mut script_patterns = Self::compile_pattern_list(tech_rule.scripts.as_ref(), stats, PatternKind::Script);
        script_patterns.extend(Self::compile_pattern_list(tech_rule.script_src.as_ref(), stats, PatternKind::Script));

        let categories: BTreeSet<String> = tech_rule
            .category_ids
            .iter()
            .filter_map(|id| category_map.get(id).cloned())
            .collect();

        CompiledTechRule {
            name: tech_name.to_string(),
            url_patterns: Self::compile_pattern_list(tech_rule.url.as_ref(), stats, PatternKind::Url),
            html_patterns: Self::compile_pattern_list(tech_rule.html.as_ref(), stats, PatternKind::Html),
            script_patterns,
            meta_patterns: Self::compile_keyed_patterns(tech_rule.meta.as_ref(), stats, PatternKind::Meta),
            header_patterns: Self::compile_keyed_patterns(tech_rule.headers.as_ref(), stats, PatternKind::Header),
            cookie_patterns: Self::compile_keyed_patterns(tech_rule.cookies.as_ref(), stats, PatternKind::Cookie),
            categories,
            implies: Self::parse_implies(tech_rule.implies.as_ref()),
        }
    }

    /// String or array of strings
    fn compile_pattern_list(
        value: Option<&Value>,
        stats: &mut CompileStats,
        kind: PatternKind,
    ) -> Vec<CompiledPattern> {
        let raw_patterns: Vec<&str> = match value {
            Some(Value::String(s)) => vec![s.as_str()],
            Some(Value::Array(arr)) => arr.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        };

        let mut patterns = Vec::with_capacity(raw_patterns.len());
        for raw in raw_patterns {
            match Self::compile_single_pattern(raw) {
                Ok(pattern) => {
                    patterns.push(pattern);
                    stats.record(kind);
                }
                Err(e) => {
                    debug!("skipping {:?} pattern {:?}: {}", kind, raw, e);
                    stats.skipped += 1;
                }
            }
        }
        patterns
    }

    /// meta / headers / cookies
    fn compile_keyed_patterns(
        value: Option<&HashMap<String, Value>>,
        stats: &mut CompileStats,
        kind: PatternKind,
    ) -> HashMap<String, Vec<CompiledPattern>> {
        let Some(value) = value else {
            return HashMap::new();
        };

        value
            .iter()
            .filter_map(|(key, val)| {
                let patterns = Self::compile_pattern_list(Some(val), stats, kind);
                (!patterns.is_empty()).then(|| (key.to_lowercase(), patterns))
            })
            .collect()
    }

    /// Compile one pattern of the form `regex\;version:\1\;confidence:50`
    pub fn compile_single_pattern(raw_pattern: &str) -> RsaResult<CompiledPattern> {
        static LOOK_AROUND_REGEX: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r#"\s*\(\?(?:[=!]|<[=!])[^)]*\)\s*"#).unwrap()
        });

        let mut parts = raw_pattern.split("\\;");
        let body = parts.next().unwrap_or_default();
        let version_template = parts
            .filter_map(|tag| tag.split_once(':'))
            .find(|(key, _)| *key == "version")
            .map(|(_, template)| template.to_string())
            .filter(|template| !template.trim().is_empty());

        let mut cleaned_pattern = body.to_string();

        // PCRE delimiters
        if cleaned_pattern.len() > 1 && cleaned_pattern.starts_with('/') && cleaned_pattern.ends_with('/') {
            cleaned_pattern = cleaned_pattern[1..cleaned_pattern.len() - 1].to_string();
        }

        cleaned_pattern = LOOK_AROUND_REGEX.replace_all(&cleaned_pattern, "").to_string();
        cleaned_pattern = Self::clean_invalid_escapes(&cleaned_pattern);
        cleaned_pattern = Self::fix_charset_hyphen(&cleaned_pattern);
        cleaned_pattern = Self::fix_unbalanced_groups(&cleaned_pattern);

        let regex = RegexBuilder::new(&cleaned_pattern)
            .case_insensitive(true)
            .size_limit(1 << 20)
            .build()?;

        Ok(CompiledPattern { regex, version_template })
    }

    /// Drop escapes the regex crate rejects
    fn clean_invalid_escapes(s: &str) -> String {
        let mut cleaned = String::with_capacity(s.len());
        let mut chars = s.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '\\' {
                cleaned.push(c);
                continue;
            }
            match chars.peek() {
                Some(next_c)
                    if matches!(
                        next_c,
                        'd' | 'D' | 'w' | 'W' | 's' | 'S' | 'b' | 'B' | 'n' | 'r' | 't' | '\\'
                            | '.' | '+' | '*' | '?' | '(' | ')' | '[' | ']' | '{' | '}'
                            | '^' | '$' | '|' | '/' | '-'
                    ) =>
                {
                    cleaned.push(c);
                    cleaned.push(*next_c);
                    chars.next();
                }
                Some(next_c) => {
                    cleaned.push(*next_c);
                    chars.next();
                }
                None => {}
            }
        }

        cleaned
    }

    /// Escape hyphens in the middle of a character class that cannot form a range
    fn fix_charset_hyphen(s: &str) -> String {
        let mut chars = s.chars().peekable();
        let mut result = String::with_capacity(s.len());
        let mut in_charset = false;
        let mut prev_escaped_class = false;

        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    result.push(c);
                    if let Some(next_c) = chars.next() {
                        result.push(next_c);
                        prev_escaped_class = in_charset && matches!(next_c, 'd' | 'D' | 'w' | 'W' | 's' | 'S');
                    }
                    continue;
                }
                '[' if !in_charset => {
                    in_charset = true;
                    result.push(c);
                }
                ']' if in_charset => {
                    in_charset = false;
                    result.push(c);
                }
                '-' if in_charset => {
                    let is_first = result.ends_with('[') || result.ends_with("[^");
                    let is_last = chars.peek() == Some(&']');
                    // `\w-x` is not a valid range
                    if is_first || is_last || !prev_escaped_class {
                        result.push('-');
                    } else {
                        result.push_str("\\-");
                    }
                }
                _ => result.push(c),
            }
            prev_escaped_class = false;
        }

        result
    }

    /// Remove unmatched parentheses
    fn fix_unbalanced_groups(s: &str) -> String {
        let mut result: Vec<char> = Vec::with_capacity(s.len());
        let mut open_positions = Vec::new();
        let mut chars = s.chars();

        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    result.push(c);
                    if let Some(next_c) = chars.next() {
                        result.push(next_c);
                    }
                }
                '(' => {
                    open_positions.push(result.len());
                    result.push(c);
                }
                ')' => {
                    if open_positions.pop().is_some() {
                        result.push(c);
                    }
                }
                _ => result.push(c),
            }
        }

        for pos in open_positions.into_iter().rev() {
            result.remove(pos);
        }

        result.into_iter().collect()
    }

    /// `implies` entries, without `\;confidence:` tags
    fn parse_implies(implies: Option<&Value>) -> Vec<String> {
        let raw: Vec<&str> = match implies {
            Some(Value::String(s)) => vec![s.as_str()],
            Some(Value::Array(arr)) => arr.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        };

        raw.into_iter()
            .filter_map(|entry| entry.split("\\;").next())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
enum PatternKind {
    Url,
    Html,
    Script,
    Header,
    Meta,
    Cookie,
}

/// Compile statistics
#[derive(Debug, Clone, Default)]
struct CompileStats {
    url_count: usize,
    html_count: usize,
    script_count: usize,
    header_count: usize,
    meta_count: usize,
    cookie_count: usize,
    skipped: usize,
}

impl CompileStats {
    fn record(&mut self, kind: PatternKind) {
        match kind {
            PatternKind::Url => self.url_count += 1,
            PatternKind::Html => self.html_count += 1,
            PatternKind::Script => self.script_count += 1,
            PatternKind::Header => self.header_count += 1,
            PatternKind::Meta => self.meta_count += 1,
            PatternKind::Cookie => self.cookie_count += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::RuleLoader;

    #[test]
    fn test_version_tag_is_split_off() {
        let pattern = RuleCompiler::compile_single_pattern("nginx(?:/([\\d.]+))?\\;version:\\1").unwrap();
        assert_eq!(pattern.version_template.as_deref(), Some("\\1"));
        let caps = pattern.regex.captures("NGINX/1.25.3").unwrap();
        assert_eq!(caps.get(1).unwrap().as_str(), "1.25.3");
    }

    #[test]
    fn test_confidence_tag_is_ignored() {
        let pattern = RuleCompiler::compile_single_pattern("wp-content\\;confidence:50").unwrap();
        assert!(pattern.version_template.is_none());
        assert!(pattern.regex.is_match("/wp-content/themes/x.css"));
    }

    #[test]
    fn test_look_around_is_removed() {
        let pattern = RuleCompiler::compile_single_pattern("react(?!-native)\\.js").unwrap();
        assert!(pattern.regex.is_match("react.js"));
    }

    #[test]
    fn test_charset_hyphen_after_class_is_escaped() {
        let pattern = RuleCompiler::compile_single_pattern("id=\"[\\w-.]+\"").unwrap();
        assert!(pattern.regex.is_match("id=\"a-b.c\""));
        // Plain ranges are left alone
        let range = RuleCompiler::compile_single_pattern("v[0-9]+").unwrap();
        assert!(range.regex.is_match("v12"));
    }

    #[test]
    fn test_unbalanced_groups_are_repaired() {
        assert_eq!(RuleCompiler::fix_unbalanced_groups("(a(b)"), "a(b)");
        assert_eq!(RuleCompiler::fix_unbalanced_groups("a)b"), "ab");
        assert_eq!(RuleCompiler::fix_unbalanced_groups("\\(a"), "\\(a");
    }

    #[test]
    fn test_compile_library_resolves_categories_and_implies() {
        let lib = RuleLoader::parse_rule_json(
            br#"{"technologies": {
                "WordPress": {"cats": [1, 11], "meta": {"Generator": "WordPress ?([\\d.]+)?\\;version:\\1"}, "implies": ["PHP\\;confidence:50", "MySQL"]},
                "Broken": {"cats": [19], "html": "(?P<"}
            }}"#,
        )
        .unwrap();
        let compiled = RuleCompiler::compile(&lib);
        assert_eq!(compiled.tech_patterns.len(), 2);

        let wp = &compiled.tech_patterns["WordPress"];
        assert!(wp.meta_patterns.contains_key("generator"));
        assert_eq!(wp.implies, vec!["PHP".to_string(), "MySQL".to_string()]);
        assert!(wp.categories.contains("CMS"));
        assert!(wp.categories.contains("Blogs"));

        // Invalid regex is skipped, the technology survives
        assert!(compiled.tech_patterns["Broken"].html_patterns.is_empty());
    }
}
