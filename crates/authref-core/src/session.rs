//! Login form and profile state.
//!
//! `Session` holds what the user typed, the access token handed out by the
//! backend, and the last profile fetched with it. Nothing here is written
//! to disk; a session lives as long as the process.
//!
//! Front ends draw [`Session::view`] and call the handlers in response to
//! user actions. Handlers that run the request on another task can feed
//! the response back through [`Session::apply_login`] and
//! [`Session::apply_profile`].

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::api::{access_token_of, ApiClient, ApiError};

/// Shown in place of the profile until one has been fetched
pub const NO_PROFILE_PLACEHOLDER: &str = "No profile loaded";

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    #[error("not logged in - log in before fetching the profile")]
    NotAuthenticated,

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub email: String,
    pub password: String,
    access_token: String,
    profile: Option<Value>,
}

/// Render-ready snapshot of a `Session`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub email: String,
    /// One `*` per password character
    pub masked_password: String,
    pub can_fetch_profile: bool,
    /// Pretty-printed profile JSON, or [`NO_PROFILE_PLACEHOLDER`]
    pub profile_text: String,
}

impl Session {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// The access token from the last successful login, empty before that
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn profile(&self) -> Option<&Value> {
        self.profile.as_ref()
    }

    /// Fetching the profile requires a token
    pub fn can_fetch_profile(&self) -> bool {
        !self.access_token.is_empty()
    }

    /// Log in with the current email and password.
    ///
    /// On failure the stored token is left as it was.
    pub async fn login(&mut self, api: &ApiClient) -> Result<(), SessionError> {
        let data = api.login(&self.email, &self.password).await?;
        self.apply_login(data);
        Ok(())
    }

    /// Fetch the profile with the stored token.
    ///
    /// Returns `NotAuthenticated` without sending anything when no token is
    /// held. On failure the stored profile is left as it was.
    pub async fn fetch_profile(&mut self, api: &ApiClient) -> Result<(), SessionError> {
        if !self.can_fetch_profile() {
            return Err(SessionError::NotAuthenticated);
        }
        let data = api.get_me(&self.access_token).await?;
        self.apply_profile(data);
        Ok(())
    }

    /// Store the token from a successful login response.
    ///
    /// A response without a string `access_token` leaves the session with no
    /// token, so the profile action stays unavailable.
    pub fn apply_login(&mut self, response: Value) {
        self.access_token = access_token_of(&response).unwrap_or_default().to_string();
        debug!(has_token = self.can_fetch_profile(), "Login response applied");
    }

    pub fn apply_profile(&mut self, profile: Value) {
        self.profile = Some(profile);
    }

    /// Project the session into what a front end draws
    pub fn view(&self) -> SessionView {
        let profile_text = match self.profile {
            Some(ref profile) => serde_json::to_string_pretty(profile)
                .unwrap_or_else(|_| profile.to_string()),
            None => NO_PROFILE_PLACEHOLDER.to_string(),
        };

        SessionView {
            email: self.email.clone(),
            masked_password: "*".repeat(self.password.chars().count()),
            can_fetch_profile: self.can_fetch_profile(),
            profile_text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_login(server: &MockServer, status: u16, body: Value) {
        Mock::given(method("POST"))
            .and(path("/api/v1/login"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(server)
            .await;
    }

    #[test]
    fn test_new_session_is_empty() {
        let session = Session::new("a@b.com", "pw");
        assert_eq!(session.access_token(), "");
        assert!(session.profile().is_none());
        assert!(!session.can_fetch_profile());
    }

    #[test]
    fn test_view_placeholder_and_mask() {
        let session = Session::new("a@b.com", "pässword");
        let view = session.view();
        assert_eq!(view.email, "a@b.com");
        assert_eq!(view.masked_password, "********");
        assert!(!view.can_fetch_profile);
        assert_eq!(view.profile_text, NO_PROFILE_PLACEHOLDER);
    }

    #[test]
    fn test_view_renders_profile_pretty() {
        let mut session = Session::default();
        let profile = json!({"id": 1, "email": "a@b.com"});
        session.apply_profile(profile.clone());
        let view = session.view();
        assert_eq!(view.profile_text, serde_json::to_string_pretty(&profile).unwrap());
        assert!(view.profile_text.contains("\"email\": \"a@b.com\""));
    }

    #[test]
    fn test_apply_login_without_token_field() {
        let mut session = Session::default();
        session.apply_login(json!({"access_token": "abc123"}));
        assert_eq!(session.access_token(), "abc123");

        session.apply_login(json!({"detail": "no token here"}));
        assert_eq!(session.access_token(), "");
        assert!(!session.can_fetch_profile());
    }

    #[tokio::test]
    async fn test_login_stores_token() {
        let server = MockServer::start().await;
        mount_login(&server, 200, json!({"access_token": "abc123"})).await;

        let api = ApiClient::new(&server.uri()).unwrap();
        let mut session = Session::new("a@b.com", "pw");
        session.login(&api).await.unwrap();
        assert_eq!(session.access_token(), "abc123");
        assert!(session.view().can_fetch_profile);
    }

    #[tokio::test]
    async fn test_failed_login_keeps_token_empty() {
        let server = MockServer::start().await;
        mount_login(&server, 401, json!({"detail": "Invalid credentials"})).await;

        let api = ApiClient::new(&server.uri()).unwrap();
        let mut session = Session::new("a@b.com", "wrong");
        let result = session.login(&api).await;
        assert_eq!(result, Err(SessionError::Api(ApiError::LoginFailed)));
        assert_eq!(session.access_token(), "");
    }

    #[tokio::test]
    async fn test_fetch_profile_requires_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
            .expect(0)
            .mount(&server)
            .await;

        let api = ApiClient::new(&server.uri()).unwrap();
        let mut session = Session::default();
        assert_eq!(session.fetch_profile(&api).await, Err(SessionError::NotAuthenticated));
        assert!(session.profile().is_none());
    }

    #[tokio::test]
    async fn test_login_then_fetch_profile() {
        let server = MockServer::start().await;
        mount_login(&server, 200, json!({"access_token": "abc123"})).await;
        Mock::given(method("GET"))
            .and(path("/api/v1/me"))
            .and(header("Authorization", "Bearer abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "email": "a@b.com"})))
            .expect(1)
            .mount(&server)
            .await;

        let api = ApiClient::new(&server.uri()).unwrap();
        let mut session = Session::new("a@b.com", "pw");
        session.login(&api).await.unwrap();
        session.fetch_profile(&api).await.unwrap();
        assert_eq!(session.profile(), Some(&json!({"id": 1, "email": "a@b.com"})));
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_profile_unset() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/me"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let api = ApiClient::new(&server.uri()).unwrap();
        let mut session = Session::default();
        session.apply_login(json!({"access_token": "abc123"}));
        let result = session.fetch_profile(&api).await;
        assert_eq!(result, Err(SessionError::Api(ApiError::FetchFailed)));
        assert!(session.profile().is_none());
        assert_eq!(session.view().profile_text, NO_PROFILE_PLACEHOLDER);
    }
}
