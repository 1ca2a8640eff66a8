//! Application state management for authref.
//!
//! This module contains the `App` struct: the login session, which form
//! control has focus, and the channel background requests report back on.

use anyhow::Result;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use authref_core::{ApiClient, Config, Session, SessionError};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
/// Each key press starts at most one request, so a handful is plenty.
const CHANNEL_BUFFER_SIZE: usize = 8;

/// Number of profile lines to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: u16 = 10;

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Quitting,
}

/// Which form control receives key presses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Email,
    Password,
    LoginButton,
    ProfileButton,
}

impl Focus {
    /// Get the next control (wrapping around)
    pub fn next(&self) -> Self {
        match self {
            Focus::Email => Focus::Password,
            Focus::Password => Focus::LoginButton,
            Focus::LoginButton => Focus::ProfileButton,
            Focus::ProfileButton => Focus::Email,
        }
    }

    /// Get the previous control (wrapping around)
    pub fn prev(&self) -> Self {
        match self {
            Focus::Email => Focus::ProfileButton,
            Focus::Password => Focus::Email,
            Focus::LoginButton => Focus::Password,
            Focus::ProfileButton => Focus::LoginButton,
        }
    }
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent from request tasks back to the main loop.
#[derive(Debug)]
enum AuthResult {
    /// Login response body
    LoggedIn(Value),
    /// Profile response body
    Profile(Value),
    /// A request failed
    Failed(SessionError),
}

// ============================================================================
// Main Application Struct
// ============================================================================

/// Main application state container
pub struct App {
    pub api: ApiClient,
    pub session: Session,

    pub state: AppState,
    pub focus: Focus,
    pub status_message: Option<String>,

    /// Requests started but not yet reported back
    pub in_flight: usize,

    /// First visible line of the wrapped profile
    pub profile_scroll: u16,
    /// Inner (width, height) of the profile pane as last laid out
    profile_viewport: (u16, u16),

    result_rx: mpsc::Receiver<AuthResult>,
    result_tx: mpsc::Sender<AuthResult>,
}

impl App {
    /// Create a new application instance
    pub fn new(config: Config) -> Result<Self> {
        debug!(base_url = %config.base_url, "App::new() starting");
        let api = ApiClient::with_options(&config.base_url, &config.client_options())?;

        let session = Session::new(
            config.email.clone().unwrap_or_default(),
            config.password.clone().unwrap_or_default(),
        );

        let focus = if session.email.is_empty() {
            Focus::Email
        } else {
            Focus::Password
        };

        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        Ok(Self {
            api,
            session,
            state: AppState::Normal,
            focus,
            status_message: None,
            in_flight: 0,
            profile_scroll: 0,
            profile_viewport: (0, 0),
            result_rx: rx,
            result_tx: tx,
        })
    }

    // =========================================================================
    // Handlers
    // =========================================================================

    /// Log in with the current form values on a background task
    pub fn start_login(&mut self) {
        let api = self.api.clone();
        let tx = self.result_tx.clone();
        let email = self.session.email.clone();
        let password = self.session.password.clone();

        self.spawn(async move {
            let result = match api.login(&email, &password).await {
                Ok(data) => AuthResult::LoggedIn(data),
                Err(e) => AuthResult::Failed(e.into()),
            };
            Self::send_result(&tx, result).await;
        });
        self.status_message = Some("Logging in...".to_string());
    }

    /// Fetch the profile on a background task. Does nothing without a token.
    pub fn start_fetch_profile(&mut self) {
        if !self.session.can_fetch_profile() {
            self.status_message = Some(SessionError::NotAuthenticated.to_string());
            return;
        }

        let api = self.api.clone();
        let tx = self.result_tx.clone();
        let token = self.session.access_token().to_string();

        self.spawn(async move {
            let result = match api.get_me(&token).await {
                Ok(data) => AuthResult::Profile(data),
                Err(e) => AuthResult::Failed(e.into()),
            };
            Self::send_result(&tx, result).await;
        });
        self.status_message = Some("Fetching profile...".to_string());
    }

    fn spawn<F>(&mut self, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        self.in_flight += 1;
        tokio::spawn(task);
    }

    async fn send_result(tx: &mpsc::Sender<AuthResult>, result: AuthResult) {
        if let Err(e) = tx.send(result).await {
            error!(error = %e, "Failed to send request result - receiver dropped");
        }
    }

    // =========================================================================
    // Profile Scrolling
    // =========================================================================

    /// Record the profile pane size so scrolling can stop at the last line
    pub fn set_profile_viewport(&mut self, width: u16, height: u16) {
        self.profile_viewport = (width, height);
        self.profile_scroll = self.profile_scroll.min(self.max_profile_scroll());
    }

    /// Scroll offset that puts the last profile line at the bottom of the pane
    pub fn max_profile_scroll(&self) -> u16 {
        let (width, height) = self.profile_viewport;
        let lines = wrap_text(&self.session.view().profile_text, width as usize).len();
        u16::try_from(lines.saturating_sub(height as usize)).unwrap_or(u16::MAX)
    }

    pub fn scroll_profile_down(&mut self, lines: u16) {
        self.profile_scroll = self
            .profile_scroll
            .saturating_add(lines)
            .min(self.max_profile_scroll());
    }

    pub fn scroll_profile_up(&mut self, lines: u16) {
        self.profile_scroll = self.profile_scroll.saturating_sub(lines);
    }

    pub fn scroll_profile_to_top(&mut self) {
        self.profile_scroll = 0;
    }

    pub fn scroll_profile_to_bottom(&mut self) {
        self.profile_scroll = self.max_profile_scroll();
    }

    // =========================================================================
    // Background Results
    // =========================================================================

    /// Apply results of finished requests to the session
    pub fn check_background_tasks(&mut self) {
        while let Ok(result) = self.result_rx.try_recv() {
            self.process_result(result);
        }
    }

    fn process_result(&mut self, result: AuthResult) {
        self.in_flight = self.in_flight.saturating_sub(1);

        match result {
            AuthResult::LoggedIn(data) => {
                self.session.apply_login(data);
                if self.session.can_fetch_profile() {
                    info!("Logged in");
                    self.status_message = Some("Logged in".to_string());
                    self.focus = Focus::ProfileButton;
                } else {
                    self.status_message = Some("Login response had no access token".to_string());
                }
            }
            AuthResult::Profile(profile) => {
                self.session.apply_profile(profile);
                self.profile_scroll = 0;
                self.status_message = Some("Profile loaded".to_string());
            }
            AuthResult::Failed(e) => {
                error!(error = %e, "Request failed");
                self.status_message = Some(format!("Error: {}", e));
            }
        }
    }
}

// ============================================================================
// Text layout
// ============================================================================

/// Break text into lines of at most `width` characters.
///
/// Breaks fall on character boundaries, not words, so the count matches
/// exactly what the profile pane draws.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    for line in text.lines() {
        let chars: Vec<char> = line.chars().collect();
        if chars.is_empty() {
            lines.push(String::new());
            continue;
        }
        for chunk in chars.chunks(width) {
            lines.push(chunk.iter().collect());
        }
    }
    lines
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character may be typed into a form field
pub fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

// ============================================================================
// Tests
// ============================================================================
