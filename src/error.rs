//! Error types for the chat server
//!
//! Defines connection-level errors, registry send errors and username
//! validation errors. Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Connection-level errors
///
/// Every variant is scoped to a single connection; none of them stop the
/// server.
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error on the client socket (fatal for that connection)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send error (fatal - the server actor is gone)
    #[error("Channel send error")]
    ChannelSend,

    /// The client sent an unusable username
    #[error("Invalid username: {0}")]
    Username(#[from] UsernameError),

    /// The requested username is already registered
    #[error("Username already taken")]
    NameTaken,
}

/// Errors returned when delivering a line to a registered client
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    /// No client is registered under the given name
    #[error("User not found")]
    NotFound,

    /// The client's outbound queue is closed or full
    #[error("Send failed")]
    SendFailed,
}

/// Username validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsernameError {
    /// Nothing left after trimming whitespace
    #[error("username is empty")]
    Empty,
}
