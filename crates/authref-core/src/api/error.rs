use thiserror::Error;

/// Failure of a backend call.
///
/// Network errors, non-2xx statuses and unreadable bodies all collapse
/// into the variant for the call that failed. The cause is logged where
/// the error is produced.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiError {
    #[error("login failed")]
    LoginFailed,

    #[error("fetch profile failed")]
    FetchFailed,
}
