//! # Relay Emulator
//!
//! A software stand-in for a network-attached multi-channel relay board. It accepts TCP
//! connections and answers the same ASCII commands as the hardware, which makes it possible to
//! exercise a client without a physical device.
//!
//! ## Architecture
//!
//! - **[`RelayBoard`] Trait**: the channel storage behind the server
//! - **[`board::MemoryBoard`]**: an in-memory board with timed channels
//! - **[`server::Server`]**: handles connections, decodes commands and sends replies
//!
//! ## Replies
//!
//! Every valid command is answered with the board's current status (`relay<bits>`, channel 1
//! last). Commands that cannot be decoded, or that reference an unknown channel, are answered
//! with `ERROR`.
//!
//! ## Basic Usage
//!
//! ```ignore
//! use relay_emulator::{board::MemoryBoard, server::Server};
//!
//! let server = Server::new(MemoryBoard::new(8), Default::default());
//! server.listen("127.0.0.1:5000")?;
//! ```
//!
//! ## Thread Model
//!
//! The server processes each client connection sequentially in a single thread.
use std::time::Duration;

pub mod board;
pub mod server;

/// Storage for the channel states of an emulated relay.
///
/// Channels are numbered from 1. The server only passes channel indices in
/// `1..=channel_count()` and state slices of length `channel_count()`.
pub trait RelayBoard {
    fn channel_count(&self) -> usize;

    /// Current state of every channel, channel 1 first.
    fn states(&self) -> Box<[bool]>;

    fn set(&self, channel: usize, on: bool);

    /// Switch the channel on. It reverts to off once `duration` elapsed.
    fn set_for(&self, channel: usize, duration: Duration);

    fn set_all(&self, states: &[bool]);
}
