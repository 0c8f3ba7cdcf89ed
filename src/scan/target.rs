//! Target normalization

/// Prefix `https://` unless the target already carries an http(s) scheme
pub fn normalize_target(target: &str) -> String {
    let target = target.trim();
    let lowered = target.to_ascii_lowercase();
    if lowered.starts_with("http://") || lowered.starts_with("https://") {
        target.to_string()
    } else {
        format!("https://{}", target)
    }
}
