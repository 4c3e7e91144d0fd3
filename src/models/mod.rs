//! Radarly API model types.
//!
//! Entities keep the documented fields as typed members and every other
//! field of the response in an `extra` map. Insight types reshape their
//! responses into rows or nested series that are easy to tabulate.

mod analytics;
mod cluster;
mod corpus;
mod influencer;
mod insights;
mod project;
mod publication;
mod user;

pub use analytics::*;
pub use cluster::*;
pub use corpus::*;
pub use influencer::*;
pub use insights::*;
pub use project::*;
pub use publication::*;
pub use user::*;

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::{RadarlyError, Result};
use crate::record::Record;

/// Id -> label translation table (focus ids, custom field ids).
pub type Labels = BTreeMap<String, String>;

/// Dates as sent by the API: RFC 3339, or naive ISO-8601 read as UTC.
pub(crate) mod datetime {
    use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer};

    const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    pub fn parse(text: &str) -> Option<DateTime<FixedOffset>> {
        if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
            return Some(datetime);
        }
        if let Ok(datetime) = DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f%z") {
            return Some(datetime);
        }
        for format in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
                return Some(naive.and_utc().fixed_offset());
            }
        }
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc().fixed_offset())
    }

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<FixedOffset>>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        match value {
            Some(datetime) => serializer.serialize_str(&datetime.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    /// Unparseable dates decode as `None`.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Option<DateTime<FixedOffset>>, D::Error> {
        let text = Option::<String>::deserialize(deserializer)?;
        Ok(text.as_deref().and_then(parse))
    }
}

/// Identifiers the API sends either as strings or as numbers.
pub(crate) mod id {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<String, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(text) => Ok(text),
            Value::Number(number) => Ok(number.to_string()),
            other => Err(D::Error::custom(format!("expected an identifier, found {other}"))),
        }
    }
}

/// Textual form of a scalar (`"abc"` -> `abc`, `12` -> `12`).
pub(crate) fn text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Label of `term`, or the term itself when it has none.
pub(crate) fn translate(labels: &Labels, term: &Value) -> String {
    let term = text(term);
    labels.get(&term).cloned().unwrap_or(term)
}

/// Remove `key` from an object and decode it as a list.
pub(crate) fn take_array(value: &mut Value, key: &str) -> Result<Vec<Value>> {
    let field = value
        .as_object_mut()
        .and_then(|object| object.remove(key))
        .ok_or_else(|| missing(key))?;
    Ok(serde_json::from_value(field)?)
}

/// Decode a list response, unwrapping `{key: [...]}` envelopes.
pub(crate) fn into_array(mut value: Value, key: &str) -> Result<Vec<Value>> {
    if value.is_object() {
        return take_array(&mut value, key);
    }
    Ok(serde_json::from_value(value)?)
}

/// Build a row from `base`, hoisting the fields of the nested objects named
/// in `nested` to the top level.
pub(crate) fn flatten_row(base: Value, nested: &[&str]) -> Record {
    let mut row = match base {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    for key in nested {
        if let Some(Value::Object(fields)) = row.remove(*key) {
            row.extend(fields);
        }
    }
    Record::new(row)
}

pub(crate) fn missing(key: &str) -> RadarlyError {
    RadarlyError::Parse(serde::de::Error::custom(format!("missing field `{key}`")))
}
