//! # Relay Protocol Library
//!
//! This crate implements the ASCII protocol spoken by network-attached multi-channel relay
//! boards (HHC-N8I8OP and compatible devices).
//!
//! ## Overview
//!
//! A client sends a short text command over a stream connection and receives exactly one
//! text reply. This library provides:
//!
//! - Encoding of the control commands
//! - Decoding of the board's status reply into per-channel states
//! - Decoding of commands on the board side, used by the emulator
//!
//! ## Message Format
//!
//! - **Read**: `read`
//! - **On**: `on<index>`
//! - **Off**: `off<index>`
//! - **Timed on**: `on<index>:<timeout in seconds>`
//! - **All**: `all<bits>` with one bit per channel, channel 1 first
//! - **Status reply**: `relay<bits>` with one bit per channel, channel 1 *last*
//!
//! Channels are numbered from 1.
//!
//! ## Basic Usage
//!
//! ### Writing Commands
//!
//! ```
//! use relay_protocol::Command;
//!
//! let mut buffer = Vec::new();
//! Command::OnFor { channel: 3, timeout_secs: 30 }
//!     .write_to(&mut buffer)
//!     .expect("Writing to vector shouldn't fail");
//! assert_eq!(buffer, b"on3:30");
//!
//! assert_eq!(Command::uniform(4, true).to_string(), "all1111");
//! ```
//!
//! ### Reading a Status Reply
//!
//! ```
//! use relay_protocol::StatusReply;
//!
//! // channel 1 = on, channel 2 = off, channel 3 = off
//! let reply = StatusReply::parse("relay001").expect("Reply should parse");
//! assert_eq!(reply.channel_count(), 3);
//! assert_eq!(reply.state(1), Some(true));
//! assert_eq!(
//!     reply.channels().collect::<Vec<_>>(),
//!     vec![(1, true), (2, false), (3, false)]
//! );
//! ```
//!
//! ## Error Handling
//!
//! Decoding failures are reported as [`error::ParseError`].

pub mod protocol;
pub use protocol::*;
pub mod codec;
pub mod error;
