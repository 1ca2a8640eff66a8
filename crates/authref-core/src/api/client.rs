//! API client for the authentication backend.
//!
//! This module provides the `ApiClient` struct for logging in and fetching
//! the authenticated user's profile.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Path of the credential exchange endpoint, relative to the base URL
const LOGIN_PATH: &str = "/api/v1/login";

/// Path of the current-user endpoint, relative to the base URL
const ME_PATH: &str = "/api/v1/me";

/// Maximum length for error response bodies in log messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    org_id: Option<&'a str>,
}

/// Optional knobs for building an `ApiClient`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientOptions {
    /// Organization to log into, sent as `org_id` with the credentials
    pub org_id: Option<String>,
    /// Per-request timeout. `None` means requests may wait forever.
    pub timeout_secs: Option<u64>,
}

/// API client for the auth backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    org_id: Option<String>,
}

impl ApiClient {
    /// Create a new API client for the backend at `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_options(base_url, &ClientOptions::default())
    }

    /// Create a new API client with an org id and/or request timeout
    pub fn with_options(base_url: &str, options: &ClientOptions) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = options.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            org_id: options.org_id.clone(),
        })
    }

    /// The base URL requests are sent to, without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Exchange email and password for a token response.
    ///
    /// The body is returned as-is; use [`access_token_of`] to read the token.
    pub async fn login(&self, email: &str, password: &str) -> Result<Value, ApiError> {
        let url = self.url(LOGIN_PATH);
        debug!(url = %url, "Sending login request");

        let body = LoginRequest {
            email,
            password,
            org_id: self.org_id.as_deref(),
        };
        let request = self.client.post(&url).json(&body);

        match Self::execute(request, &url).await {
            Ok(data) => {
                info!("Login succeeded");
                Ok(data)
            }
            Err(e) => {
                warn!(error = %format!("{:#}", e), "Login failed");
                Err(ApiError::LoginFailed)
            }
        }
    }

    /// Fetch the profile of the user the access token belongs to
    pub async fn get_me(&self, access_token: &str) -> Result<Value, ApiError> {
        let url = self.url(ME_PATH);
        debug!(url = %url, "Sending profile request");

        let request = self.client.get(&url).bearer_auth(access_token);

        match Self::execute(request, &url).await {
            Ok(data) => {
                info!("Profile fetched");
                Ok(data)
            }
            Err(e) => {
                warn!(error = %format!("{:#}", e), "Profile fetch failed");
                Err(ApiError::FetchFailed)
            }
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send the request and parse a successful response body as JSON.
    async fn execute(request: RequestBuilder, url: &str) -> Result<Value> {
        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Status {}: {}", status, truncate_body(&body));
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }
}

/// Read the `access_token` string out of a login response
pub fn access_token_of(response: &Value) -> Option<&str> {
    response.get("access_token").and_then(Value::as_str)
}

/// Truncate a response body to avoid logging excessive data
fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
}
