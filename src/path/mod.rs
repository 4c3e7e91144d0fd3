//! Path queries over decoded API data.
//!
//! ```text
//! $.focuses[0].query               strict: missing keys are errors
//! $$.dashboards(label=DEMO).id     lenient: missing keys yield null
//! $.hits(radar.rating>=3)          filters keep matching list elements
//! label                            bare key lookup
//! ```
//!
//! A list reached without an index or filter is broadcast: the rest of the
//! path is applied to each element and the results are collected in a list.
//! A filter that leaves exactly one element yields that element itself.

mod filter;
mod parse;

use serde_json::Value;

use crate::error::{RadarlyError, Result};

pub use filter::{Filter, Literal, Operator};
pub use parse::{QueryPath, Segment, Strictness};

/// Resolve `path` against `source`.
///
/// Text starting with `$` is parsed as a path expression; anything else is a
/// strict lookup of a single key.
///
/// # Errors
///
/// * [`RadarlyError::MalformedPath`] if the expression does not parse
/// * [`RadarlyError::PathNotFound`] for a missing key or index in strict mode
/// * [`RadarlyError::FilterMismatch`] for an ordering filter on mismatched types
pub fn lookup(source: &Value, path: &str) -> Result<Value> {
    let parsed = if path.starts_with('$') {
        QueryPath::parse(path)?
    } else {
        QueryPath::bare(path)
    };
    resolve(source, &parsed)
}

/// Resolve an already parsed path.
pub fn resolve(source: &Value, path: &QueryPath) -> Result<Value> {
    walk(source, &path.segments, path.is_strict())
}

fn walk(element: &Value, segments: &[Segment], strict: bool) -> Result<Value> {
    let Some((segment, rest)) = segments.split_first() else {
        return Ok(element.clone());
    };

    match element {
        Value::Null => Ok(Value::Null),
        Value::Array(items) => items
            .iter()
            .map(|item| walk(item, segments, strict))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        _ => {
            let selected = select(element, segment, strict)?;
            walk(&selected, rest, strict)
        }
    }
}

fn select(element: &Value, segment: &Segment, strict: bool) -> Result<Value> {
    let value = match element.as_object().and_then(|map| map.get(&segment.key)) {
        Some(value) => value,
        None if strict => {
            return Err(RadarlyError::PathNotFound {
                key: segment.key.clone(),
            })
        }
        None => return Ok(Value::Null),
    };

    let Value::Array(items) = value else {
        return Ok(value.clone());
    };

    let mut current = match &segment.filter {
        Some(filter) => {
            let mut kept = Vec::new();
            for item in items {
                if filter.matches(item, strict)? {
                    kept.push(item.clone());
                }
            }
            if kept.len() == 1 {
                kept.pop().unwrap_or(Value::Null)
            } else {
                Value::Array(kept)
            }
        }
        None => value.clone(),
    };

    if let (Some(index), Value::Array(items)) = (segment.index, &mut current) {
        let len = items.len() as i64;
        let position = if index < 0 { len + index } else { index };
        if (0..len).contains(&position) {
            current = items.swap_remove(position as usize);
        } else if strict {
            return Err(RadarlyError::PathNotFound {
                key: format!("{}[{}]", segment.key, index),
            });
        } else {
            current = Value::Null;
        }
    }

    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn project() -> Value {
        json!({
            "label": "Brand watch",
            "focuses": [
                {"id": 1, "label": "DEMO", "query": "brand", "count": 12},
                {"id": 2, "label": "Competitors", "query": "rival", "count": 3},
                {"id": 3, "label": "DEMO old", "query": "old", "count": 8}
            ],
            "dashboards": [],
            "owner": null
        })
    }

    #[test]
    fn test_bare_key() {
        assert_eq!(lookup(&project(), "label").unwrap(), json!("Brand watch"));
        assert!(matches!(
            lookup(&project(), "missing").unwrap_err(),
            RadarlyError::PathNotFound { .. }
        ));
    }

    #[test]
    fn test_root_returns_source() {
        assert_eq!(lookup(&project(), "$").unwrap(), project());
    }

    #[test]
    fn test_index_and_negative_index() {
        assert_eq!(lookup(&project(), "$.focuses[0].query").unwrap(), json!("brand"));
        assert_eq!(lookup(&project(), "$.focuses[-1].id").unwrap(), json!(3));
    }

    #[test]
    fn test_out_of_range_index() {
        assert!(matches!(
            lookup(&project(), "$.focuses[5].id").unwrap_err(),
            RadarlyError::PathNotFound { .. }
        ));
        assert_eq!(lookup(&project(), "$$.focuses[5].id").unwrap(), Value::Null);
    }

    #[test]
    fn test_broadcast_over_list() {
        assert_eq!(lookup(&project(), "$.focuses.id").unwrap(), json!([1, 2, 3]));
    }

    #[test]
    fn test_filter_single_match_unwraps() {
        assert_eq!(
            lookup(&project(), "$.focuses(label=DEMO).id").unwrap(),
            json!(1)
        );
    }

    #[test]
    fn test_filter_multiple_matches_stay_a_list() {
        assert_eq!(
            lookup(&project(), "$.focuses(count>=5).id").unwrap(),
            json!([1, 3])
        );
        assert_eq!(
            lookup(&project(), "$.focuses(DEMO in label).query").unwrap(),
            json!(["brand", "old"])
        );
    }

    #[test]
    fn test_filter_without_match_is_an_empty_list() {
        assert_eq!(
            lookup(&project(), "$.focuses(label=Nope).id").unwrap(),
            json!([])
        );
        assert_eq!(
            lookup(&project(), "$$.focuses(count>100).query").unwrap(),
            json!([])
        );
    }

    #[test]
    fn test_filter_then_index() {
        assert_eq!(
            lookup(&project(), "$.focuses[1](count>=5).id").unwrap(),
            json!(3)
        );
    }

    #[test]
    fn test_lenient_missing_key_short_circuits() {
        assert_eq!(lookup(&project(), "$$.nothing.here").unwrap(), Value::Null);
        assert_eq!(lookup(&project(), "$.owner.name").unwrap(), Value::Null);
    }

    #[test]
    fn test_strict_missing_key_fails() {
        assert!(lookup(&project(), "$.nothing.here").is_err());
    }

    #[test]
    fn test_empty_list_broadcast() {
        assert_eq!(lookup(&project(), "$.dashboards.id").unwrap(), json!([]));
    }

    #[test]
    fn test_empty_object_strictness() {
        let empty = json!({});
        assert!(lookup(&empty, "$.a").is_err());
        assert_eq!(lookup(&empty, "$$.a").unwrap(), Value::Null);
    }

    #[test]
    fn test_filter_type_mismatch() {
        let err = lookup(&project(), "$.focuses(label>3)").unwrap_err();
        assert!(matches!(err, RadarlyError::FilterMismatch { .. }));
    }

    #[test]
    fn test_malformed_path() {
        assert!(matches!(
            lookup(&project(), "$.focuses[x]").unwrap_err(),
            RadarlyError::MalformedPath { .. }
        ));
    }
}
