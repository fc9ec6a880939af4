//! Error types for NeetPrep.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The chat-completion call could not be initiated. Nothing has been
    /// sent to the client yet.
    #[error("Upstream open failed: {0}")]
    UpstreamOpen(String),

    /// The chat-completion call failed after fragments started flowing.
    #[error("Upstream stream failed: {0}")]
    UpstreamStream(String),

    /// The client connection refused a write (usually a disconnect).
    #[error("Outgoing write failed: {0}")]
    OutgoingWrite(String),

    #[error("No fragment received within {0:?}")]
    IdleTimeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
