//! Compiled pattern model

use std::collections::{BTreeSet, HashMap};
use regex::Regex;

/// A compiled Wappalyzer pattern
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub regex: Regex,
    /// `\1` / `$1` style template taken from the `\;version:` tag
    pub version_template: Option<String>,
}

/// Compiled rule of one technology
#[derive(Debug, Clone, Default)]
pub struct CompiledTechRule {
    pub name: String,
    pub url_patterns: Vec<CompiledPattern>,
    pub html_patterns: Vec<CompiledPattern>,
    pub script_patterns: Vec<CompiledPattern>,
    // Keys are lowercased
    pub meta_patterns: HashMap<String, Vec<CompiledPattern>>,
    pub header_patterns: HashMap<String, Vec<CompiledPattern>>,
    pub cookie_patterns: HashMap<String, Vec<CompiledPattern>>,
    pub categories: BTreeSet<String>,
    pub implies: Vec<String>,
}

/// Compiled rule library, read-only after construction
#[derive(Debug, Clone, Default)]
pub struct CompiledRuleLibrary {
    pub tech_patterns: HashMap<String, CompiledTechRule>,
}
