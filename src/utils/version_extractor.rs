//! Version extraction
//! Fills a `\1` / `$1` version template from regex captures

use regex::Captures;

/// Version extractor
pub struct VersionExtractor;

impl VersionExtractor {
    /// Extract a version from `captures` using `version_template`.
    ///
    /// Returns `None` when there is no template, no group was substituted,
    /// the result is empty, or placeholders are left over.
    pub fn extract(version_template: &Option<String>, captures: &Captures) -> Option<String> {
        let template = version_template.as_ref().filter(|t| !t.trim().is_empty())?;

        let mut version = template.clone();
        let mut replaced = false;

        // Group 0 is the whole match
        for group_index in (1..captures.len()).rev() {
            // Highest index first so `\1` does not eat the prefix of `\10`
            let placeholder_backslash = format!("\\{}", group_index);
            let placeholder_dollar = format!("${}", group_index);

            let matched_str = captures.get(group_index).map(|m| m.as_str().trim()).unwrap_or("");
            if !matched_str.is_empty() && (version.contains(&placeholder_backslash) || version.contains(&placeholder_dollar)) {
                replaced = true;
            }
            version = version.replace(&placeholder_backslash, matched_str);
            version = version.replace(&placeholder_dollar, matched_str);
        }

        let final_version = version.trim().to_string();

        let is_valid_version = replaced
            && !final_version.is_empty()
            && !final_version.contains('\\')
            && !final_version.contains('$');

        is_valid_version.then_some(final_version)
    }
}
