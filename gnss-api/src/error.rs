//! Error types for the location service client boundary

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors surfaced by a [`LocationClient`](crate::LocationClient) implementation
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The transport refused to open a session
    #[error("session rejected: {0}")]
    SessionRejected(String),

    /// A handle did not correspond to an open session
    #[error("invalid session handle")]
    InvalidHandle,

    /// The engine signalled failure for a request
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// The engine did not answer within the request timeout
    #[error("request timed out")]
    Timeout,
}
