//! Error types for Radarly API operations.

use thiserror::Error;

use crate::auth::AuthErrorKind;
use crate::rate::RateBucket;

/// Errors that can occur during Radarly API operations.
#[derive(Debug, Error)]
pub enum RadarlyError {
    /// Configuration is missing or incomplete.
    #[error("Radarly configuration required: {0}")]
    ConfigMissing(String),

    /// No default client has been registered.
    #[error("No default Radarly client has been initialized")]
    NoDefaultClient,

    /// A parameter setter or constant check rejected a value.
    #[error("Invalid value for '{parameter}': {message}")]
    Validation {
        parameter: String,
        message: String,
    },

    /// A query path does not follow the path grammar.
    #[error("Malformed path '{path}': {reason}")]
    MalformedPath { path: String, reason: String },

    /// A strict (`$`) query path walked into a missing key.
    #[error("Key '{key}' not found")]
    PathNotFound { key: String },

    /// A filter compared values whose types cannot be ordered.
    #[error("Cannot apply '{operator}' to field '{key}': incompatible types")]
    FilterMismatch { key: String, operator: String },

    /// Credential exchange was rejected by the identity endpoint.
    #[error("Authentication failed: {0}")]
    Authentication(AuthErrorKind),

    /// The data API answered with a non-2xx status.
    #[error("Radarly API error ({status_code} {reason}) on {url}: {message}")]
    Api {
        status_code: u16,
        reason: String,
        url: String,
        message: String,
    },

    /// Local bookkeeping shows no remaining quota for this bucket.
    #[error("Rate limit reached for the {bucket} bucket")]
    RateReached { bucket: RateBucket },

    /// The server did not apply every requested field.
    #[error("Update not applied for fields: {}", fields.join(", "))]
    PartialUpdate { fields: Vec<String> },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Filesystem error while saving downloaded media.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RadarlyError {
    /// Shorthand for a [`RadarlyError::Validation`] error.
    pub fn validation(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Whether this error was raised by local validation (no request sent).
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

/// Result type alias for Radarly operations.
pub type Result<T> = core::result::Result<T, RadarlyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_names_value_and_parameter() {
        let err = RadarlyError::validation("platforms", "'myspace' is not a known option");
        let msg = err.to_string();
        assert!(msg.contains("platforms"));
        assert!(msg.contains("myspace"));
        assert!(err.is_validation());
    }

    #[test]
    fn test_partial_update_lists_fields() {
        let err = RadarlyError::PartialUpdate {
            fields: vec!["tone".to_string(), "favorite".to_string()],
        };
        assert_eq!(err.to_string(), "Update not applied for fields: tone, favorite");
    }

    #[test]
    fn test_rate_reached_names_bucket() {
        let err = RadarlyError::RateReached {
            bucket: RateBucket::Slow,
        };
        assert!(err.to_string().contains("slow"));
    }
}
