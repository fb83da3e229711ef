use std::io;

use relay_protocol::error::ParseError;
use thiserror::Error;

/// Errors reported by [`RelayController`](crate::RelayController).
///
/// None of them is retried. Cached channel states keep their last-known values.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The connection could not be opened or the initial status exchange failed.
    #[error("could not connect to relay: {0}")]
    Connection(#[source] io::Error),
    /// Sending a command or receiving its reply failed on an established connection.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),
    /// The reply could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ParseError),
    /// The channel index is not one the relay reported when connecting.
    #[error("unknown channel {index}, relay has {count} channels")]
    UnknownChannel { index: usize, count: usize },
    /// A channel pattern does not have one entry per channel.
    #[error("expected {expected} channel states, got {actual}")]
    PatternLength { expected: usize, actual: usize },
}
