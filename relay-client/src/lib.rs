//! # Relay Client
//!
//! A Rust client library for network-attached multi-channel relay boards
//! (HHC-N8I8OP and compatible devices).
//!
//! ## Overview
//!
//! This crate keeps a persistent connection to a relay board, mirrors the on/off state of every
//! channel locally and issues control commands. The channels are discovered from the status
//! reply received while connecting.
//!
//! For the wire format, see the [`relay_protocol`] crate.
//!
//! ## Basic Usage
//!
//! ### Connecting to a Relay
//!
//! ```ignore
//! use relay_client::RelayController;
//!
//! let mut relay = RelayController::connect("192.168.1.200:5000")?;
//! println!("Relay has {} channels", relay.channel_count());
//! ```
//!
//! ### Switching Channels
//!
//! ```ignore
//! // Channel 3 on
//! relay.set_state(true, Some(3))?;
//! // Channel 1 on, switched off by the relay after 30 seconds
//! relay.set_timer(1, 30)?;
//! // Everything off
//! relay.set_state(false, None)?;
//! ```
//!
//! ### Reading the State
//!
//! ```ignore
//! for (index, on) in relay.status()? {
//!     println!("channel {index}: {on}");
//! }
//! assert!(!relay.channel(3)?.state());
//! ```
//!
//! ## Cache Consistency
//!
//! [`RelayController::status`], [`RelayController::set_all`] and
//! [`RelayController::set_states`] overwrite the cache from the relay's reply. Single channel
//! commands ([`RelayController::set_power`], [`RelayController::set_timer`]) update the cache
//! to the requested value once the relay answered, without looking at the reply.
//!
//! ## Pacing
//!
//! Relay boards need time to process a command. A [`Pacer`] runs before every command; the
//! default [`FixedDelay`] sleeps for 100 ms. Use [`RelayController::with_transport`] to plug in
//! a different pacer or transport.
//!
//! ## Logging
//!
//! This crate uses the `log` crate. Channel switches are logged at `info`, commands at `debug`
//! and raw replies at `trace`.
pub mod channel;
pub mod controller;
pub mod error;
pub mod pacing;
pub mod transport;

pub use channel::ChannelState;
pub use controller::{Builder, Config, RelayController};
pub use error::RelayError;
pub use pacing::{FixedDelay, NoDelay, Pacer};
pub use transport::{TcpTransport, Transport};
