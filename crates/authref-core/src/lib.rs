//! Core library for authref.
//!
//! - `api`: HTTP client for the backend's login and profile endpoints
//! - `session`: the login form / profile state and its render projection
//! - `config`: base URL and form defaults from file and environment

pub mod api;
pub mod config;
pub mod session;

pub use api::{ApiClient, ApiError, ClientOptions};
pub use config::Config;
pub use session::{Session, SessionError, SessionView};
