//! Key normalisation for decoded API responses.
//!
//! The API speaks camelCase; records expose snake_case keys. Some subtrees
//! hold user-defined labels as keys (custom tags, per-term statistics) and
//! are left untouched.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static WORD_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(.)([A-Z][a-z]+)").expect("valid regex"));
static LOWER_UPPER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("valid regex"));

/// Subtrees whose keys are kept verbatim.
pub const BLACKLIST: &[&[&str]] = &[&["hits", "radar", "tag"], &["radar", "tag"], &["dots", "stats"]];

/// Convert an identifier to snake_case (`docCount` -> `doc_count`,
/// `geo-digging` -> `geo_digging`).
pub fn to_snake_case(name: &str) -> String {
    let name = name.replace('-', "_");
    let name = WORD_BOUNDARY.replace_all(&name, "${1}_${2}");
    LOWER_UPPER.replace_all(&name, "${1}_${2}").to_lowercase()
}

/// Recursively snake_case every object key, except below blacklisted paths.
///
/// Paths are expressed with the original (un-normalised) keys; lists are
/// transparent.
pub fn snake_keys(value: Value, blacklist: &[&[&str]]) -> Value {
    let mut path = Vec::new();
    convert(value, blacklist, &mut path)
}

fn convert(value: Value, blacklist: &[&[&str]], path: &mut Vec<String>) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| convert(item, blacklist, path))
                .collect(),
        ),
        Value::Object(map) if !is_blacklisted(path, blacklist) => {
            let mut converted = Map::with_capacity(map.len());
            for (key, child) in map {
                path.push(key.clone());
                let child = convert(child, blacklist, path);
                path.pop();
                converted.insert(to_snake_case(&key), child);
            }
            Value::Object(converted)
        }
        other => other,
    }
}

fn is_blacklisted(path: &[String], blacklist: &[&[&str]]) -> bool {
    blacklist
        .iter()
        .any(|entry| entry.len() == path.len() && entry.iter().zip(path).all(|(a, b)| a == b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("docCount"), "doc_count");
        assert_eq!(to_snake_case("geo-digging"), "geo_digging");
        assert_eq!(to_snake_case("HTTPResponse"), "http_response");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
        assert_eq!(to_snake_case("id"), "id");
    }

    #[test]
    fn test_snake_keys_recurses_into_lists() {
        let value = json!({"focuses": [{"docCount": 3, "createdAt": "x"}]});
        let converted = snake_keys(value, BLACKLIST);
        assert_eq!(converted, json!({"focuses": [{"doc_count": 3, "created_at": "x"}]}));
    }

    #[test]
    fn test_snake_keys_respects_blacklist() {
        let value = json!({
            "hits": [{
                "radar": {"tag": {"myCustomTag": ["A"]}, "keyWords": []}
            }],
            "dots": [{"stats": {"topTerms": 1}, "dotDate": "d"}]
        });
        let converted = snake_keys(value, BLACKLIST);
        assert_eq!(
            converted,
            json!({
                "hits": [{
                    "radar": {"tag": {"myCustomTag": ["A"]}, "key_words": []}
                }],
                "dots": [{"stats": {"topTerms": 1}, "dot_date": "d"}]
            })
        );
    }
}
