//! Detection result updates
//! Merges matches into the result map and applies `implies`

use std::collections::btree_map::Entry;

use crate::compiler::CompiledRuleLibrary;
use crate::rule::{TechnologyMap, TechnologyMatch};

/// Detection result updater
pub struct DetectionUpdater;

impl DetectionUpdater {
    /// Record a match for `tech_name`, keeping every distinct version
    pub fn update(
        compiled_lib: &CompiledRuleLibrary,
        detected: &mut TechnologyMap,
        tech_name: &str,
        version: Option<String>,
    ) {
        let tech = match detected.entry(tech_name.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(Self::new_match(compiled_lib, tech_name)),
        };

        if let Some(version) = version {
            tech.add_version(version);
        }
    }

    /// Add implied technologies until nothing new appears. Cycles terminate
    /// because a technology is only added once.
    pub fn apply_implies(compiled_lib: &CompiledRuleLibrary, detected: &mut TechnologyMap) {
        let mut pending: Vec<String> = detected.keys().cloned().collect();

        while let Some(tech_name) = pending.pop() {
            let Some(compiled_tech) = compiled_lib.tech_patterns.get(&tech_name) else {
                continue;
            };

            for implied in &compiled_tech.implies {
                if !detected.contains_key(implied) {
                    detected.insert(implied.clone(), Self::new_match(compiled_lib, implied));
                    pending.push(implied.clone());
                }
            }
        }
    }

    fn new_match(compiled_lib: &CompiledRuleLibrary, tech_name: &str) -> TechnologyMatch {
        let mut tech = TechnologyMatch::from_name(tech_name);
        if let Some(compiled_tech) = compiled_lib.tech_patterns.get(tech_name) {
            tech.categories = compiled_tech.categories.clone();
        }
        tech
    }
}
