//! REST API client module for the authentication backend.
//!
//! This module provides the `ApiClient` for the two calls the front end
//! needs: exchanging credentials for an access token, and fetching the
//! profile of the user that token belongs to.
//!
//! Both calls return the response body as untyped JSON. Failures are
//! reported with one generic error per call.

pub mod client;
pub mod error;

pub use client::{access_token_of, ApiClient, ClientOptions};
pub use error::ApiError;
