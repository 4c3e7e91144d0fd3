//! Radarly API client.
//!
//! Low-level HTTP client that handles authentication, rate-limit bookkeeping
//! and raw requests. Higher-level operations are implemented via traits on
//! entity types.

use std::env;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use reqwest::{Client, Method, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::auth::{self, DEFAULT_OAUTH_URL};
use crate::decode::{snake_keys, BLACKLIST};
use crate::error::{RadarlyError, Result};
use crate::rate::{RateBucket, RateLimit};

const DEFAULT_API_URL: &str = "https://radarly.linkfluence.com/1.0";
const USER_AGENT: &str = concat!("radarly/", env!("CARGO_PKG_VERSION"));

static DEFAULT_CLIENT: RwLock<Option<RadarlyClient>> = RwLock::new(None);

/// Low-level Radarly API client.
///
/// Handles authentication and HTTP requests. Entity-specific operations
/// are implemented via the `Find`, `Fetch`, `Search` and `Update` traits on
/// model types.
///
/// Every JSON response goes through the key normaliser, so callers see
/// snake_case keys.
///
/// This struct is cheaply cloneable; clones share the connection pool and
/// the rate-limit counters.
///
/// # Example
///
/// ```no_run
/// use radarly::RadarlyClient;
///
/// # async fn example() -> radarly::Result<()> {
/// // Create from environment variables
/// let client = RadarlyClient::from_env()?;
///
/// // Or exchange client credentials for a token
/// let client = RadarlyClient::authenticate("client-id", "client-secret", &[]).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RadarlyClient {
    http: Client,
    base_url: Arc<Url>,
    token: String,
    rates: Arc<Mutex<RateLimit>>,
}

impl std::fmt::Debug for RadarlyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RadarlyClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl RadarlyClient {
    /// Create a client from environment variables.
    ///
    /// Uses `RADARLY_ACCESS_TOKEN` for authentication and optionally
    /// `RADARLY_API_URL` for the base URL (defaults to
    /// `https://radarly.linkfluence.com/1.0`).
    ///
    /// # Errors
    ///
    /// Returns an error if `RADARLY_ACCESS_TOKEN` is not set.
    pub fn from_env() -> Result<Self> {
        let token = env::var("RADARLY_ACCESS_TOKEN").map_err(|_| {
            RadarlyError::ConfigMissing(
                "RADARLY_ACCESS_TOKEN environment variable not set".to_string(),
            )
        })?;

        let base_url =
            env::var("RADARLY_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        Self::new(&token, &base_url)
    }

    /// Create a new client with the provided token and base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid.
    pub fn new(token: &str, base_url: &str) -> Result<Self> {
        let http = Self::http_client()?;
        Self::with_http(http, token, base_url)
    }

    /// Exchange client credentials for a token and build a client.
    ///
    /// The identity endpoint defaults to the Linkfluence OAuth server and can
    /// be overridden with `RADARLY_OAUTH_URL`; the API root follows
    /// `RADARLY_API_URL` like [`RadarlyClient::from_env`].
    ///
    /// # Errors
    ///
    /// Returns [`RadarlyError::Authentication`] if the credentials are
    /// rejected.
    pub async fn authenticate(
        client_id: &str,
        client_secret: &str,
        scopes: &[&str],
    ) -> Result<Self> {
        let oauth_url =
            env::var("RADARLY_OAUTH_URL").unwrap_or_else(|_| DEFAULT_OAUTH_URL.to_string());
        let base_url =
            env::var("RADARLY_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::authenticate_with(&oauth_url, &base_url, client_id, client_secret, scopes).await
    }

    /// Like [`RadarlyClient::authenticate`] with explicit endpoints.
    pub async fn authenticate_with(
        oauth_url: &str,
        base_url: &str,
        client_id: &str,
        client_secret: &str,
        scopes: &[&str],
    ) -> Result<Self> {
        let http = Self::http_client()?;
        let token = auth::fetch_token(&http, oauth_url, client_id, client_secret, scopes).await?;
        Self::with_http(http, &token.access_token, base_url)
    }

    fn http_client() -> Result<Client> {
        Client::builder()
            .user_agent(USER_AGENT)
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(RadarlyError::Http)
    }

    fn with_http(http: Client, token: &str, base_url: &str) -> Result<Self> {
        // Ensure base URL ends with / so relative routes are appended
        let base_url_str = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };

        Ok(Self {
            http,
            base_url: Arc::new(Url::parse(&base_url_str)?),
            token: token.to_string(),
            rates: Arc::new(Mutex::new(RateLimit::new())),
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Snapshot of the rate-limit counters.
    pub fn rate_limit(&self) -> RateLimit {
        self.rates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Make a GET request and decode the JSON body.
    #[tracing::instrument(skip(self))]
    pub async fn get_json(&self, path: &str) -> Result<Value> {
        self.request_json(Method::GET, path, None::<&()>, None::<&()>)
            .await
    }

    /// Make a GET request with query parameters and decode the JSON body.
    #[tracing::instrument(skip(self, query))]
    pub async fn get_json_with_query<Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<Value> {
        self.request_json(Method::GET, path, Some(query), None::<&()>)
            .await
    }

    /// Make a POST request with a JSON body and decode the JSON response.
    #[tracing::instrument(skip(self, body))]
    pub async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        self.request_json(Method::POST, path, None::<&()>, Some(body))
            .await
    }

    /// Make a POST request with both query parameters and a JSON body.
    #[tracing::instrument(skip(self, query, body))]
    pub async fn post_json_with_query<Q, B>(&self, path: &str, query: &Q, body: &B) -> Result<Value>
    where
        Q: Serialize + ?Sized,
        B: Serialize + ?Sized,
    {
        self.request_json(Method::POST, path, Some(query), Some(body))
            .await
    }

    /// Stream an absolute URL (media CDN), without API credentials.
    #[tracing::instrument(skip(self))]
    pub async fn get_absolute(&self, url: &str) -> Result<Response> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(RadarlyError::Http)?;
        Self::check_response(response).await
    }

    async fn request_json<Q, B>(
        &self,
        method: Method,
        path: &str,
        query: Option<&Q>,
        body: Option<&B>,
    ) -> Result<Value>
    where
        Q: Serialize + ?Sized,
        B: Serialize + ?Sized,
    {
        self.ensure_quota(path)?;
        let url = self.base_url.join(path)?;

        let mut request = self
            .http
            .request(method, url)
            .bearer_auth(&self.token);
        if let Some(query) = query {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(RadarlyError::Http)?;
        self.rates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .update(path, response.headers());

        let response = Self::check_response(response).await?;
        let value: Value = response.json().await.map_err(RadarlyError::Http)?;
        Ok(snake_keys(value, BLACKLIST))
    }

    /// Fail fast when the bucket of `path` is exhausted.
    fn ensure_quota(&self, path: &str) -> Result<()> {
        let rates = self.rates.lock().unwrap_or_else(PoisonError::into_inner);
        if rates.is_reached(path) {
            let bucket = RateBucket::classify(path);
            tracing::warn!(%bucket, path, "rate limit reached, request not sent");
            return Err(RadarlyError::RateReached { bucket });
        }
        Ok(())
    }

    /// Check response status and convert errors.
    async fn check_response(response: Response) -> Result<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().to_string();
        let message = Self::extract_error_message(response, status).await;
        Err(RadarlyError::Api {
            status_code: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            url,
            message,
        })
    }

    /// Extract error message from a failed response.
    async fn extract_error_message(response: Response, status: StatusCode) -> String {
        let body = match response.text().await {
            Ok(b) => b,
            Err(_) => return format!("HTTP {status}"),
        };
        error_message_from_body(&body).unwrap_or_else(|| format!("HTTP {status}"))
    }
}

/// Best-effort error message from a JSON or HTML error body.
fn error_message_from_body(body: &str) -> Option<String> {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        for field in ["message", "error_description", "error"] {
            if let Some(msg) = json.get(field).and_then(|m| m.as_str()) {
                return Some(msg.to_string());
            }
        }
    }

    let lower = body.to_ascii_lowercase();
    if let Some(start) = lower.find("<title>").map(|i| i + "<title>".len()) {
        if let Some(len) = lower[start..].find("</title>") {
            let title = body[start..start + len].trim();
            if !title.is_empty() {
                return Some(title.to_string());
            }
        }
    }

    let trimmed = body.trim();
    (!trimmed.is_empty()).then(|| trimmed.chars().take(500).collect())
}

/// Register the process-wide default client.
pub fn set_default_client(client: RadarlyClient) {
    *DEFAULT_CLIENT
        .write()
        .unwrap_or_else(PoisonError::into_inner) = Some(client);
}

/// Get a handle on the process-wide default client.
///
/// # Errors
///
/// Returns [`RadarlyError::NoDefaultClient`] if none has been registered.
pub fn default_client() -> Result<RadarlyClient> {
    DEFAULT_CLIENT
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
        .ok_or(RadarlyError::NoDefaultClient)
}

/// Forget the process-wide default client.
pub fn reset_default_client() {
    DEFAULT_CLIENT
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
}
