#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Missing, invalid, or expired credential. Raised by the request
    /// interceptor after session teardown; pages should not display this —
    /// the accompanying navigation to sign-in is the user-visible outcome.
    #[error("not authenticated")]
    Auth,
    /// The refresh exchange was rejected or could not be completed.
    /// The session has already been cleared when this is returned.
    #[error("token refresh failed: {0}")]
    Refresh(String),
    /// The my-status fetch failed. Session state is untouched.
    #[error("status fetch failed: {0}")]
    Status(String),
    /// Client-side field constraint violated (phone format, empty password).
    /// Recovered locally by forms; never reaches the session layer.
    #[error("validation error: {0}")]
    Validation(String),
    /// 5xx from the backend. Transient; session state is untouched.
    #[error("server error: HTTP {status}")]
    Server { status: u16 },
    /// Non-auth 4xx (not found, forbidden, bad request). Surfaced to the
    /// caller as-is with no session side effects.
    #[error("request rejected: HTTP {status}: {detail}")]
    Resource { status: u16, detail: String },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("configuration error: {0}")]
    Config(String),
}
