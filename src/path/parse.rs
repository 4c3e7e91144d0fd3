//! Parser for the `$.a.b[0].c(key=value)` path syntax.

use std::str::FromStr;

use crate::error::{RadarlyError, Result};

use super::filter::Filter;

/// How a path treats keys that are missing along the way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strictness {
    /// `$`: a missing key or an out-of-range index is an error.
    Strict,
    /// `$$`: a missing key or an out-of-range index yields null.
    Lenient,
}

/// One `.key[index](filter)` step.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub key: String,
    pub index: Option<i64>,
    pub filter: Option<Filter>,
}

impl Segment {
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            index: None,
            filter: None,
        }
    }
}

/// A parsed path expression.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPath {
    pub strictness: Strictness,
    pub segments: Vec<Segment>,
}

impl QueryPath {
    /// Parse a `$`/`$$` expression.
    ///
    /// # Errors
    ///
    /// Returns [`RadarlyError::MalformedPath`] when the text does not follow
    /// the grammar.
    pub fn parse(path: &str) -> Result<Self> {
        let (strictness, rest) = if let Some(rest) = path.strip_prefix("$$") {
            (Strictness::Lenient, rest)
        } else if let Some(rest) = path.strip_prefix('$') {
            (Strictness::Strict, rest)
        } else {
            return Err(malformed(path, "a path must start with `$` or `$$`"));
        };

        let mut segments = Vec::new();
        let mut cursor = Cursor { path, rest };
        while !cursor.rest.is_empty() {
            segments.push(cursor.segment()?);
        }

        Ok(Self {
            strictness,
            segments,
        })
    }

    /// A strict single-key path, used for bare lookups such as `"label"`.
    pub fn bare(key: &str) -> Self {
        Self {
            strictness: Strictness::Strict,
            segments: vec![Segment::key(key)],
        }
    }

    pub fn is_strict(&self) -> bool {
        self.strictness == Strictness::Strict
    }
}

impl FromStr for QueryPath {
    type Err = RadarlyError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

struct Cursor<'a> {
    path: &'a str,
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn segment(&mut self) -> Result<Segment> {
        self.rest = self
            .rest
            .strip_prefix('.')
            .ok_or_else(|| malformed(self.path, "expected `.` before a key"))?;

        let key = self.take_while(|c| c.is_alphanumeric() || c == '_');
        if key.is_empty() {
            return Err(malformed(self.path, "empty key"));
        }

        let index = match self.rest.strip_prefix('[') {
            Some(after) => {
                self.rest = after;
                Some(self.index()?)
            }
            None => None,
        };

        let filter = match self.rest.strip_prefix('(') {
            Some(after) => {
                self.rest = after;
                Some(self.filter()?)
            }
            None => None,
        };

        Ok(Segment {
            key: key.to_string(),
            index,
            filter,
        })
    }

    fn index(&mut self) -> Result<i64> {
        let close = self
            .rest
            .find(']')
            .ok_or_else(|| malformed(self.path, "unclosed `[`"))?;
        let raw = &self.rest[..close];
        let valid = {
            let digits = raw.strip_prefix('-').unwrap_or(raw);
            !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
        };
        if !valid {
            return Err(malformed(self.path, "index must be an integer"));
        }
        let index = raw
            .parse()
            .map_err(|_| malformed(self.path, "index out of bounds"))?;
        self.rest = &self.rest[close + 1..];
        Ok(index)
    }

    fn filter(&mut self) -> Result<Filter> {
        let mut depth = 1usize;
        let mut close = None;
        for (pos, c) in self.rest.char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(pos);
                        break;
                    }
                }
                _ => {}
            }
        }
        let close = close.ok_or_else(|| malformed(self.path, "unbalanced parentheses"))?;
        let filter = Filter::parse(&self.rest[..close]).map_err(|e| match e {
            RadarlyError::MalformedPath { reason, .. } => malformed(self.path, &reason),
            other => other,
        })?;
        self.rest = &self.rest[close + 1..];
        Ok(filter)
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let end = self
            .rest
            .char_indices()
            .find(|(_, c)| !pred(*c))
            .map(|(pos, _)| pos)
            .unwrap_or(self.rest.len());
        let (taken, rest) = self.rest.split_at(end);
        self.rest = rest;
        taken
    }
}

fn malformed(path: &str, reason: &str) -> RadarlyError {
    RadarlyError::MalformedPath {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}
