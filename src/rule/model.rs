//! Rule data model and detection result types
//! Pure data, (de)serializable

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use serde::{Deserialize, Serialize};

/// A detected technology
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnologyMatch {
    pub name: String,
    /// Distinct versions in discovery order
    #[serde(default)]
    pub versions: Vec<String>,
    #[serde(default)]
    pub categories: BTreeSet<String>,
}

impl TechnologyMatch {
    pub fn from_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            versions: Vec::new(),
            categories: BTreeSet::new(),
        }
    }

    /// Records a version unless it is already known.
    pub fn add_version(&mut self, version: String) {
        if !self.versions.contains(&version) {
            self.versions.push(version);
        }
    }
}

impl fmt::Display for TechnologyMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.versions.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} ({})", self.name, self.versions.join(", "))
        }
    }
}

/// Technology name -> match, ordered by name
pub type TechnologyMap = BTreeMap<String, TechnologyMatch>;

/// Technology rule (Wappalyzer / wappalyzergo JSON)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TechRule {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(rename = "cats", default, alias = "categories")]
    pub category_ids: Vec<u32>,

    // Detection patterns: string or array of strings
    #[serde(default)]
    pub url: Option<serde_json::Value>,
    #[serde(default)]
    pub html: Option<serde_json::Value>,
    #[serde(default)]
    pub scripts: Option<serde_json::Value>,
    #[serde(rename = "scriptSrc", default)]
    pub script_src: Option<serde_json::Value>,
    #[serde(default)]
    pub meta: Option<HashMap<String, serde_json::Value>>,
    #[serde(default)]
    pub headers: Option<HashMap<String, serde_json::Value>>,
    #[serde(default)]
    pub cookies: Option<HashMap<String, serde_json::Value>>,

    #[serde(default)]
    pub implies: Option<serde_json::Value>,
}

/// Category rule
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CategoryRule {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub priority: Option<u32>,
    #[serde(default)]
    pub id: u32,
}

/// Full rule library
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RuleLibrary {
    pub tech_rules: HashMap<String, TechRule>,
    pub category_rules: HashMap<String, CategoryRule>,
}

impl RuleLibrary {
    /// Category id -> name
    pub fn category_names(&self) -> HashMap<u32, String> {
        self.category_rules
            .iter()
            .map(|(key, rule)| {
                let id = if rule.id != 0 { rule.id } else { key.parse().unwrap_or(0) };
                (id, rule.name.clone())
            })
            .collect()
    }
}
