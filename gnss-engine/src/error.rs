//! Error types for the dispatch core

use gnss_api::ClientError;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while driving the location engine
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// `init` was called while the engine is already running
    #[error("engine is already active")]
    AlreadyActive,

    /// An operation needs an open session but none exists
    #[error("engine is not initialized")]
    NotInitialized,

    /// A raw event payload could not be translated; the event is dropped
    /// and the worker keeps running
    #[error("translation failed: {0}")]
    Translation(String),

    /// The location service client signalled failure for a control request
    #[error("control request failed")]
    ControlRequestFailed,

    /// The AGPS server hostname did not resolve
    #[error("server resolution failed: {0}")]
    ResolutionFailed(String),

    /// A value or request kind this core does not handle
    #[error("unsupported: {0}")]
    Unsupported(&'static str),

    /// The deferred worker did not confirm startup within the bounded wait
    #[error("deferred worker did not start")]
    WorkerUnresponsive,

    /// Error from the location service client
    #[error("client error: {0}")]
    Client(#[from] ClientError),
}
