//! Header conversion helpers

use std::collections::HashMap;
use reqwest::header::{HeaderMap, SET_COOKIE};
use tracing::warn;

const MAX_HEADERS: usize = 1000;

/// Header converter
pub struct HeaderConverter;

impl HeaderConverter {
    /// `HeaderMap` -> lowercase name -> all values
    pub fn to_hashmap(header_map: &HeaderMap) -> HashMap<String, Vec<String>> {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();

        for (iter_count, (key, value)) in header_map.iter().enumerate() {
            if iter_count >= MAX_HEADERS {
                warn!("more than {} headers, ignoring the rest", MAX_HEADERS);
                break;
            }

            let value_str = String::from_utf8_lossy(value.as_bytes()).into_owned();
            map.entry(key.as_str().to_lowercase()).or_default().push(value_str);
        }

        map
    }

    /// Keep the first non-empty value of every header
    pub fn to_single_value(hashmap: &HashMap<String, Vec<String>>) -> HashMap<String, String> {
        hashmap
            .iter()
            .filter_map(|(key, values)| {
                values.iter().find(|v| !v.is_empty()).map(|v| (key.clone(), v.clone()))
            })
            .collect()
    }

    /// Cookie name (lowercase) -> value, from `Set-Cookie`
    pub fn cookies(header_map: &HeaderMap) -> HashMap<String, String> {
        header_map
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|cookie| {
                let pair = cookie.split(';').next()?;
                let (name, value) = pair.split_once('=')?;
                let name = name.trim();
                (!name.is_empty()).then(|| (name.to_lowercase(), value.trim().to_string()))
            })
            .collect()
    }
}
