//! Client-side rate-limit bookkeeping.
//!
//! The API reports its quotas in the `X-Rate-Limit-*` headers of every
//! response. Endpoints share three quota buckets; the bucket of a request is
//! found by matching its path against the endpoint templates.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::HeaderMap;
use serde::Serialize;

use crate::router;

pub const LIMIT_HEADER: &str = "x-rate-limit-limit";
pub const REMAINING_HEADER: &str = "x-rate-limit-remaining";
pub const RESET_HEADER: &str = "x-rate-limit-reset";

const SLOW_ROUTES: &[&str] = &[
    router::INFLUENCER_SEARCH,
    router::DISTRIBUTION_FETCH,
    router::ANALYTICS_GLOBAL,
    router::CLOUD_FETCH,
    router::LOCALIZATION_FETCH,
];

const MEDIUM_ROUTES: &[&str] = &[
    router::PUBLICATION_SEARCH,
    router::PUBLICATION_METADATA,
    router::PUBLICATION_RAW,
];

static SLOW_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| compile_routes(SLOW_ROUTES));
static MEDIUM_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| compile_routes(MEDIUM_ROUTES));

/// Turn a path template into a regex where each placeholder matches one
/// alphanumeric path component.
fn template_pattern(template: &str) -> String {
    let mut pattern = String::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        pattern.push_str(&regex::escape(&rest[..open]));
        match rest[open..].find('}') {
            Some(close) => {
                pattern.push_str("[a-zA-Z0-9]*");
                rest = &rest[open + close + 1..];
            }
            None => {
                rest = &rest[open..];
                break;
            }
        }
    }
    pattern.push_str(&regex::escape(rest));
    pattern
}

fn compile_routes(templates: &[&str]) -> Vec<Regex> {
    templates
        .iter()
        .filter_map(|template| Regex::new(&template_pattern(template)).ok())
        .collect()
}

/// Quota bucket an endpoint belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RateBucket {
    Slow,
    Medium,
    Default,
}

impl RateBucket {
    /// Classify a request path. Slow patterns take precedence over medium.
    pub fn classify(path: &str) -> Self {
        if SLOW_PATTERNS.iter().any(|re| re.is_match(path)) {
            RateBucket::Slow
        } else if MEDIUM_PATTERNS.iter().any(|re| re.is_match(path)) {
            RateBucket::Medium
        } else {
            RateBucket::Default
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RateBucket::Slow => "slow",
            RateBucket::Medium => "medium",
            RateBucket::Default => "default",
        }
    }
}

impl fmt::Display for RateBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters of one bucket, as last reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quota {
    pub limit: i64,
    pub remaining: i64,
    pub reset: i64,
}

impl Default for Quota {
    fn default() -> Self {
        Self {
            limit: 0,
            remaining: 5000,
            reset: 0,
        }
    }
}

impl Quota {
    fn used_percent(&self) -> f64 {
        let total = self.limit + self.remaining;
        if total == 0 {
            0.0
        } else {
            100.0 * self.limit as f64 / total as f64
        }
    }
}

/// Remaining-quota tracker for the three buckets.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RateLimit {
    pub slow: Quota,
    pub medium: Quota,
    pub default: Quota,
}

impl RateLimit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Quota counters for a bucket.
    pub fn quota(&self, bucket: RateBucket) -> &Quota {
        match bucket {
            RateBucket::Slow => &self.slow,
            RateBucket::Medium => &self.medium,
            RateBucket::Default => &self.default,
        }
    }

    fn quota_mut(&mut self, bucket: RateBucket) -> &mut Quota {
        match bucket {
            RateBucket::Slow => &mut self.slow,
            RateBucket::Medium => &mut self.medium,
            RateBucket::Default => &mut self.default,
        }
    }

    /// Record the rate headers of a response to `path`.
    ///
    /// Missing or unparsable headers keep the previous value.
    pub fn update(&mut self, path: &str, headers: &HeaderMap) {
        let bucket = RateBucket::classify(path);
        let quota = self.quota_mut(bucket);
        let read = |name: &str, previous: i64| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(previous)
        };
        quota.limit = read(LIMIT_HEADER, quota.limit);
        quota.remaining = read(REMAINING_HEADER, quota.remaining);
        quota.reset = read(RESET_HEADER, quota.reset);
        tracing::debug!(
            bucket = %bucket,
            limit = quota.limit,
            remaining = quota.remaining,
            reset = quota.reset,
            "rate limit updated"
        );
    }

    /// Whether the bucket of `path` has no request left.
    pub fn is_reached(&self, path: &str) -> bool {
        self.quota(RateBucket::classify(path)).remaining <= 0
    }
}

impl fmt::Display for RateLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RateLimit(slow: {:.2}%, medium: {:.2}%, default: {:.2}%)",
            self.slow.used_percent(),
            self.medium.used_percent(),
            self.default.used_percent()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_classify_buckets() {
        assert_eq!(
            RateBucket::classify("projects/123/influencers.json"),
            RateBucket::Slow
        );
        assert_eq!(
            RateBucket::classify("projects/123/insights/geo/region.json"),
            RateBucket::Slow
        );
        assert_eq!(
            RateBucket::classify("projects/123/inbox/search.json"),
            RateBucket::Medium
        );
        assert_eq!(
            RateBucket::classify("projects/123/documents/raw.json"),
            RateBucket::Medium
        );
        assert_eq!(RateBucket::classify("users.json"), RateBucket::Default);
        assert_eq!(
            RateBucket::classify("projects/123.json"),
            RateBucket::Default
        );
    }

    #[test]
    fn test_template_pattern_escapes_literals() {
        assert_eq!(
            template_pattern("projects/{project_id}.json"),
            r"projects/[a-zA-Z0-9]*\.json"
        );
    }

    #[test]
    fn test_update_and_reached() {
        let mut rates = RateLimit::new();
        let path = "projects/1/inbox/search.json";
        assert!(!rates.is_reached(path));

        let mut headers = HeaderMap::new();
        headers.insert(LIMIT_HEADER, HeaderValue::from_static("100"));
        headers.insert(REMAINING_HEADER, HeaderValue::from_static("0"));
        headers.insert(RESET_HEADER, HeaderValue::from_static("1700000000"));
        rates.update(path, &headers);

        assert!(rates.is_reached(path));
        assert_eq!(rates.medium.limit, 100);
        assert_eq!(rates.medium.reset, 1_700_000_000);
        // Other buckets are untouched
        assert!(!rates.is_reached("users.json"));
        assert_eq!(rates.default, Quota::default());
    }

    #[test]
    fn test_update_keeps_previous_on_missing_headers() {
        let mut rates = RateLimit::new();
        let mut headers = HeaderMap::new();
        headers.insert(REMAINING_HEADER, HeaderValue::from_static("12"));
        rates.update("users.json", &headers);
        assert_eq!(rates.default.remaining, 12);
        assert_eq!(rates.default.limit, 0);
    }
}
