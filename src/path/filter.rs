//! Filter predicates used inside path segments, e.g. `(count>=5)`.

use std::cmp::Ordering;
use std::fmt;

use serde_json::Value;

use crate::error::{RadarlyError, Result};

/// Comparison operator of a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// `X in field`: the field contains `X`.
    In,
    /// `X notin field`: the field does not contain `X`.
    NotIn,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::In => "in",
            Operator::NotIn => "notin",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Longer tokens first so that ties on position resolve to `>=` over `>`.
const OPERATORS: &[(&str, Operator)] = &[
    (" notin ", Operator::NotIn),
    (" in ", Operator::In),
    ("!=", Operator::Ne),
    ("<=", Operator::Le),
    (">=", Operator::Ge),
    ("==", Operator::Eq),
    ("<", Operator::Lt),
    (">", Operator::Gt),
    ("=", Operator::Eq),
];

/// Right-hand side of a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Literal {
    /// `True`/`False` become booleans, then anything that parses as a float
    /// becomes a number; everything else stays text.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "True" => Literal::Bool(true),
            "False" => Literal::Bool(false),
            _ => raw
                .parse::<f64>()
                .map(Literal::Number)
                .unwrap_or_else(|_| Literal::Text(raw.to_string())),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Number(n) => write!(f, "{n}"),
            Literal::Text(s) => f.write_str(s),
        }
    }
}

/// A parsed `key OP value` predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Field of each list element that is tested.
    pub key: String,
    pub operator: Operator,
    pub value: Literal,
}

impl Filter {
    /// Parse the text between the parentheses of a segment.
    ///
    /// For `in`/`notin` the operands are swapped so that `DEMO in label`
    /// tests whether the (lower-cased) `label` field contains `DEMO`; the
    /// literal is never coerced in that case.
    pub fn parse(raw: &str) -> Result<Self> {
        let (pos, token, operator) = OPERATORS
            .iter()
            .filter_map(|(token, op)| raw.find(token).map(|pos| (pos, *token, *op)))
            .min_by(|a, b| a.0.cmp(&b.0).then(b.1.len().cmp(&a.1.len())))
            .ok_or_else(|| malformed(raw, "no comparison operator"))?;

        let left = raw[..pos].trim();
        let right = raw[pos + token.len()..].trim();

        match operator {
            Operator::In | Operator::NotIn => {
                if right.is_empty() {
                    return Err(malformed(raw, "missing field name"));
                }
                Ok(Self {
                    key: right.to_lowercase(),
                    operator,
                    value: Literal::Text(left.to_string()),
                })
            }
            _ => {
                if left.is_empty() {
                    return Err(malformed(raw, "missing field name"));
                }
                Ok(Self {
                    key: left.to_string(),
                    operator,
                    value: Literal::parse(right),
                })
            }
        }
    }

    /// Evaluate the predicate on one list element.
    ///
    /// A missing field is an error in strict mode and compares as null in
    /// lenient mode. Equality across types is `false`; ordering across types
    /// is a [`RadarlyError::FilterMismatch`].
    pub fn matches(&self, item: &Value, strict: bool) -> Result<bool> {
        let field = match item.as_object().and_then(|map| map.get(&self.key)) {
            Some(field) => field,
            None if strict => {
                return Err(RadarlyError::PathNotFound {
                    key: self.key.clone(),
                })
            }
            None => &Value::Null,
        };

        match self.operator {
            Operator::Eq => Ok(equals(field, &self.value)),
            Operator::Ne => Ok(!equals(field, &self.value)),
            Operator::Lt => Ok(self.order(field)? == Ordering::Less),
            Operator::Le => Ok(self.order(field)? != Ordering::Greater),
            Operator::Gt => Ok(self.order(field)? == Ordering::Greater),
            Operator::Ge => Ok(self.order(field)? != Ordering::Less),
            Operator::In => self.contains(field),
            Operator::NotIn => self.contains(field).map(|found| !found),
        }
    }

    fn order(&self, field: &Value) -> Result<Ordering> {
        let ordering = match (field, &self.value) {
            (Value::Number(n), Literal::Number(lit)) => {
                n.as_f64().and_then(|n| n.partial_cmp(lit))
            }
            (Value::String(s), Literal::Text(lit)) => Some(s.as_str().cmp(lit.as_str())),
            (Value::Bool(b), Literal::Bool(lit)) => Some(b.cmp(lit)),
            _ => None,
        };
        ordering.ok_or_else(|| self.mismatch())
    }

    fn contains(&self, field: &Value) -> Result<bool> {
        let needle = self.value.to_string();
        match field {
            Value::String(s) => Ok(s.contains(&needle)),
            Value::Array(items) => Ok(items.iter().any(|item| item.as_str() == Some(&needle))),
            Value::Object(map) => Ok(map.contains_key(&needle)),
            Value::Null => Ok(false),
            _ => Err(self.mismatch()),
        }
    }

    fn mismatch(&self) -> RadarlyError {
        RadarlyError::FilterMismatch {
            key: self.key.clone(),
            operator: self.operator.to_string(),
        }
    }
}

fn equals(field: &Value, literal: &Literal) -> bool {
    match (field, literal) {
        (Value::Number(n), Literal::Number(lit)) => n.as_f64() == Some(*lit),
        (Value::String(s), Literal::Text(lit)) => s == lit,
        (Value::Bool(b), Literal::Bool(lit)) => b == lit,
        _ => false,
    }
}

fn malformed(filter: &str, reason: &str) -> RadarlyError {
    RadarlyError::MalformedPath {
        path: format!("({filter})"),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_numeric_filter() {
        let filter = Filter::parse("count>=5").unwrap();
        assert_eq!(filter.key, "count");
        assert_eq!(filter.operator, Operator::Ge);
        assert_eq!(filter.value, Literal::Number(5.0));
    }

    #[test]
    fn test_parse_text_filter() {
        let filter = Filter::parse("label=DEMO").unwrap();
        assert_eq!(filter.key, "label");
        assert_eq!(filter.operator, Operator::Eq);
        assert_eq!(filter.value, Literal::Text("DEMO".to_string()));
    }

    #[test]
    fn test_parse_bool_and_single_char_ops() {
        let filter = Filter::parse("active=True").unwrap();
        assert_eq!(filter.value, Literal::Bool(true));

        assert_eq!(Filter::parse("id<3").unwrap().operator, Operator::Lt);
        assert_eq!(Filter::parse("id>3").unwrap().operator, Operator::Gt);
        assert_eq!(Filter::parse("id<=3").unwrap().operator, Operator::Le);
        assert_eq!(Filter::parse("id!=3").unwrap().operator, Operator::Ne);
    }

    #[test]
    fn test_parse_in_swaps_operands() {
        let filter = Filter::parse("DEMO in Label").unwrap();
        assert_eq!(filter.key, "label");
        assert_eq!(filter.operator, Operator::In);
        assert_eq!(filter.value, Literal::Text("DEMO".to_string()));

        let filter = Filter::parse("12 notin tags").unwrap();
        assert_eq!(filter.operator, Operator::NotIn);
        // never coerced to a number
        assert_eq!(filter.value, Literal::Text("12".to_string()));
    }

    #[test]
    fn test_parse_rejects_missing_operator() {
        let err = Filter::parse("label").unwrap_err();
        assert!(matches!(err, RadarlyError::MalformedPath { .. }));
    }

    #[test]
    fn test_parse_rejects_missing_key() {
        assert!(Filter::parse("=5").is_err());
    }

    #[test]
    fn test_matches_comparisons() {
        let item = json!({"count": 7, "label": "DEMO project", "tags": ["a", "b"]});
        assert!(Filter::parse("count>=5").unwrap().matches(&item, true).unwrap());
        assert!(!Filter::parse("count<5").unwrap().matches(&item, true).unwrap());
        assert!(Filter::parse("count=7").unwrap().matches(&item, true).unwrap());
        assert!(Filter::parse("DEMO in label").unwrap().matches(&item, true).unwrap());
        assert!(Filter::parse("a in tags").unwrap().matches(&item, true).unwrap());
        assert!(Filter::parse("c notin tags").unwrap().matches(&item, true).unwrap());
    }

    #[test]
    fn test_type_mismatch() {
        let item = json!({"label": "DEMO"});
        // equality across types is simply false
        assert!(!Filter::parse("label=5").unwrap().matches(&item, true).unwrap());
        // ordering across types fails
        let err = Filter::parse("label>5").unwrap().matches(&item, true).unwrap_err();
        assert!(matches!(err, RadarlyError::FilterMismatch { .. }));
    }

    #[test]
    fn test_missing_field_strictness() {
        let item = json!({"id": 1});
        let filter = Filter::parse("label=DEMO").unwrap();
        assert!(matches!(
            filter.matches(&item, true).unwrap_err(),
            RadarlyError::PathNotFound { .. }
        ));
        assert!(!filter.matches(&item, false).unwrap());
    }
}
