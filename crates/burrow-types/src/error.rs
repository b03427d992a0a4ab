//! Error types for burrow.

use std::io;

/// Errors produced by the burrow client.
///
/// No variant is fatal to a session: every failure is reported at the
/// prompt and leaves the navigator state untouched.
#[derive(Debug, thiserror::Error)]
pub enum BurrowError {
    #[error("address error: {0}")]
    Address(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("transfer error: {0}")]
    Transfer(String),

    #[error("reference error: {0}")]
    Reference(String),

    #[error("command error: {0}")]
    Command(String),

    #[error("no next item in the current menu")]
    NoNextItem,

    #[error("end of tour")]
    EmptyTour,

    #[error("handler error: {0}")]
    Handler(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, BurrowError>;
