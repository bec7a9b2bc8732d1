#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("user '{0}' not found")]
    UserNotFound(String),
    #[error("API rate limit exceeded. Please try again later")]
    RateLimited,
    #[error("GitHub API returned status code: {0}")]
    UnexpectedStatus(u16),
    /// Connection, timeout and body read failures. The detail carries its own
    /// context, e.g. `failed to fetch data: ...` or `request timed out after 10s`.
    #[error("{0}")]
    Network(String),
    #[error("failed to parse JSON: {0}")]
    Decode(String),
}
