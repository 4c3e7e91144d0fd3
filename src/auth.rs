//! OAuth2 client-credentials exchange.
//!
//! Radarly authenticates with a Bearer token obtained from the Linkfluence
//! identity endpoint. [`fetch_token`] performs the exchange; most users will
//! go through [`RadarlyClient::authenticate`](crate::RadarlyClient::authenticate).

use std::fmt;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{RadarlyError, Result};

pub const DEFAULT_OAUTH_URL: &str = "https://oauth.linkfluence.com/oauth2/token";

/// Category of a rejected credential exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthErrorKind {
    InvalidClient,
    InvalidScope,
    UnsupportedGrantType,
    UnauthorizedClient,
    Other(String),
}

impl AuthErrorKind {
    /// Map the `error` field of an OAuth2 error response.
    pub fn from_code(code: &str) -> Self {
        match code {
            "invalid_client" => Self::InvalidClient,
            "invalid_scope" => Self::InvalidScope,
            "unsupported_grant_type" => Self::UnsupportedGrantType,
            "unauthorized_client" => Self::UnauthorizedClient,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidClient => f.write_str("The client_id or the client_secret is invalid."),
            Self::InvalidScope => f.write_str(
                "The asked scopes are incompatible with the scopes linked to your account.",
            ),
            Self::UnsupportedGrantType => {
                f.write_str("The grant_type is not currently supported.")
            }
            Self::UnauthorizedClient => {
                f.write_str("The client is not authorized to use this grant type.")
            }
            Self::Other(code) => write!(f, "Uncategorized error ({code})."),
        }
    }
}

/// Token returned by the identity endpoint.
#[derive(Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let preview: String = self.access_token.chars().take(8).collect();
        f.debug_struct("AccessToken")
            .field("access_token", &format!("{preview}..."))
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<String>,
}

#[derive(Deserialize)]
struct TokenError {
    error: String,
}

/// Exchange client credentials for an access token.
///
/// # Errors
///
/// Returns [`RadarlyError::Authentication`] when the identity endpoint
/// rejects the credentials, or an HTTP error when it cannot be reached.
#[tracing::instrument(skip(http, client_secret))]
pub async fn fetch_token(
    http: &Client,
    oauth_url: &str,
    client_id: &str,
    client_secret: &str,
    scopes: &[&str],
) -> Result<AccessToken> {
    let request = TokenRequest {
        grant_type: "client_credentials",
        client_id,
        client_secret,
        scope: (!scopes.is_empty()).then(|| scopes.join(" ")),
    };

    let response = http
        .post(oauth_url)
        .form(&request)
        .send()
        .await
        .map_err(RadarlyError::Http)?;

    let status = response.status();
    let body = response.text().await.map_err(RadarlyError::Http)?;

    if status.is_success() {
        return Ok(serde_json::from_str(&body)?);
    }

    let kind = serde_json::from_str::<TokenError>(&body)
        .map(|e| AuthErrorKind::from_code(&e.error))
        .unwrap_or_else(|_| AuthErrorKind::Other(format!("HTTP {status}")));
    Err(RadarlyError::Authentication(kind))
}
