use std::str::Utf8Error;

use thiserror::Error;

/// Errors that may occur when decoding a command or a status reply.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("reply does not contain the 'relay' marker: {0:?}")]
    MissingMarker(String),
    #[error("invalid channel state {found:?} at position {position}")]
    InvalidState { position: usize, found: char },
    #[error("expected {expected} channel states, got {actual}")]
    ChannelCountMismatch { expected: usize, actual: usize },
    #[error("received invalid command {0:?}")]
    InvalidCommand(String),
    #[error("{0}")]
    InvalidFormat(String),
    #[error("invalid UTF8: {0}")]
    InvalidUtf8(#[from] Utf8Error),
}
