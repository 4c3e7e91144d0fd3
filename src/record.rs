//! Generic record wrapper and path-query access for decoded data.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::path;

/// Path-query access for anything that serializes to JSON.
///
/// ```ignore
/// let label = project.query("$.focuses(id=1234).label")?;
/// let maybe = project.query("$$.dashboards[0].label")?; // Null if absent
/// ```
pub trait Queryable: Serialize {
    /// Resolve a `$`/`$$` path (or a bare key) against this value.
    ///
    /// # Errors
    ///
    /// See [`path::lookup`].
    fn query(&self, path: &str) -> Result<Value> {
        let value = serde_json::to_value(self)?;
        path::lookup(&value, path)
    }
}

impl Queryable for Value {
    fn query(&self, path: &str) -> Result<Value> {
        path::lookup(self, path)
    }
}

/// A decoded JSON object with no dedicated type.
///
/// Typed entities keep unknown fields in an `extra` map; `Record` is the
/// fully dynamic counterpart, used for sub-resources whose shape the API
/// does not document (metrics, raw documents, etc.).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Wrap a value; non-object values are stored under `value`.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                Self(map)
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Field names, excluding private (`_`-prefixed) ones.
    pub fn keys(&self) -> BTreeSet<&str> {
        self.0
            .keys()
            .map(String::as_str)
            .filter(|key| !key.starts_with('_'))
            .collect()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.0)?)
    }

    /// Render the indented type tree of the record.
    pub fn draw_structure(&self, max_depth: usize, show_type: bool) -> String {
        draw_structure("Record", &Value::Object(self.0.clone()), max_depth, show_type)
    }
}

impl Queryable for Record {
    fn query(&self, path: &str) -> Result<Value> {
        path::lookup(&Value::Object(self.0.clone()), path)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record.0)
    }
}

/// Render the structure of `value` as an indented tree.
///
/// Each line shows a field name and, with `show_type`, its JSON type; lists
/// are described by their first element.
///
/// ```text
/// Project (object)
/// | id (integer)
/// | focuses (list[object])
/// | | id (integer)
/// ```
pub fn draw_structure(name: &str, value: &Value, max_depth: usize, show_type: bool) -> String {
    let mut out = String::new();
    draw(&mut out, Some(name), value, 0, max_depth, show_type);
    out
}

fn draw(
    out: &mut String,
    name: Option<&str>,
    value: &Value,
    level: usize,
    max_depth: usize,
    show_type: bool,
) {
    if let Some(name) = name {
        out.push_str(&"| ".repeat(level));
        out.push_str(name);
        if show_type {
            let _ = match value {
                Value::Array(items) if !items.is_empty() => {
                    write!(out, " (list[{}])", type_name(&items[0]))
                }
                other => write!(out, " ({})", type_name(other)),
            };
        }
        out.push('\n');
    }

    if level == max_depth {
        return;
    }
    match value {
        Value::Array(items) => {
            if let Some(first) = items.first() {
                draw(out, None, first, level, max_depth, show_type);
            }
        }
        Value::Object(map) => {
            for (key, child) in map {
                draw(out, Some(key), child, level + 1, max_depth, show_type);
            }
        }
        _ => {}
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> Record {
        serde_json::from_value(json!({
            "id": 7,
            "label": "Brand",
            "_private": true,
            "focuses": [{"id": 1, "score": 0.5}, {"id": 2, "score": 1.5}]
        }))
        .unwrap()
    }

    #[test]
    fn test_keys_skip_private_fields() {
        let record = record();
        let keys: Vec<_> = record.keys().into_iter().collect();
        assert_eq!(keys, vec!["focuses", "id", "label"]);
    }

    #[test]
    fn test_query_record() {
        let record = record();
        assert_eq!(record.query("label").unwrap(), json!("Brand"));
        assert_eq!(record.query("$.focuses[1].id").unwrap(), json!(2));
        assert_eq!(record.query("$.focuses(score>1).id").unwrap(), json!(2));
    }

    #[test]
    fn test_json_round_trip() {
        let record = record();
        let text = record.to_json().unwrap();
        let back: Record = serde_json::from_str(&text).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_draw_structure() {
        let drawn = record().draw_structure(5, true);
        let expected = "\
Record (object)
| id (integer)
| label (string)
| _private (bool)
| focuses (list[object])
| | id (integer)
| | score (float)
";
        assert_eq!(drawn, expected);
    }

    #[test]
    fn test_draw_structure_depth_and_types() {
        let drawn = record().draw_structure(1, false);
        assert_eq!(drawn, "Record\n| id\n| label\n| _private\n| focuses\n");
    }

    #[test]
    fn test_from_scalar_value() {
        let record = Record::from_value(json!(3));
        assert_eq!(record.get("value"), Some(&json!(3)));
    }
}
