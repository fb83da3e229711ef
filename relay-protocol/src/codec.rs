/// Text encoding and decoding of commands and status replies
use std::fmt::{self, Display};
use std::io::{self, Write};

use crate::{
    error::ParseError,
    protocol::{Command, StatusReply},
};

const STATUS_MARKER: &str = "relay";

const CMD_READ: &str = "read";
const CMD_ON: &str = "on";
const CMD_OFF: &str = "off";
const CMD_ALL: &str = "all";
const TIMEOUT_DELIMITER: char = ':';

fn bit(state: bool) -> char {
    if state { '1' } else { '0' }
}

impl Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Read => f.write_str(CMD_READ),
            Command::On { channel } => write!(f, "{CMD_ON}{channel}"),
            Command::Off { channel } => write!(f, "{CMD_OFF}{channel}"),
            Command::OnFor {
                channel,
                timeout_secs,
            } => write!(f, "{CMD_ON}{channel}{TIMEOUT_DELIMITER}{timeout_secs}"),
            Command::All { states } => {
                f.write_str(CMD_ALL)?;
                states.iter().try_for_each(|s| write!(f, "{}", bit(*s)))
            }
        }
    }
}

fn parse_channel(text: &str) -> Result<usize, ParseError> {
    let channel = text
        .parse::<usize>()
        .map_err(|e| ParseError::InvalidFormat(format!("Invalid channel {text:?}: {e}")))?;
    if channel == 0 {
        return Err(ParseError::InvalidFormat(
            "Channel indices start at 1".to_string(),
        ));
    }
    Ok(channel)
}

impl Command {
    pub fn write_to(&self, writer: &mut impl Write) -> io::Result<()> {
        write!(writer, "{self}")
    }

    /// Decodes a single command as received by a relay board.
    pub fn parse(text: &str) -> Result<Command, ParseError> {
        let text = text.trim_ascii_end();
        if text == CMD_READ {
            return Ok(Command::Read);
        }
        if let Some(bits) = text.strip_prefix(CMD_ALL) {
            let states = bits
                .chars()
                .map(|c| match c {
                    '1' => Ok(true),
                    '0' => Ok(false),
                    other => Err(ParseError::InvalidFormat(format!(
                        "Invalid channel state {other:?} in all command"
                    ))),
                })
                .collect::<Result<Box<[bool]>, _>>()?;
            return Ok(Command::All { states });
        }
        if let Some(channel) = text.strip_prefix(CMD_OFF) {
            return Ok(Command::Off {
                channel: parse_channel(channel)?,
            });
        }
        if let Some(rest) = text.strip_prefix(CMD_ON) {
            return match rest.split_once(TIMEOUT_DELIMITER) {
                Some((channel, timeout)) => Ok(Command::OnFor {
                    channel: parse_channel(channel)?,
                    timeout_secs: timeout.parse::<u32>().map_err(|e| {
                        ParseError::InvalidFormat(format!("Invalid timeout {timeout:?}: {e}"))
                    })?,
                }),
                None => Ok(Command::On {
                    channel: parse_channel(rest)?,
                }),
            };
        }
        Err(ParseError::InvalidCommand(text.to_string()))
    }
}

impl Display for StatusReply {
    /// Formats the reply the way the board sends it: the highest channel comes first.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(STATUS_MARKER)?;
        self.states()
            .iter()
            .rev()
            .try_for_each(|s| write!(f, "{}", bit(*s)))
    }
}

impl StatusReply {
    pub fn write_to(&self, writer: &mut impl Write) -> io::Result<()> {
        write!(writer, "{self}")
    }

    /// Decodes a status reply.
    ///
    /// Everything after the first `relay` marker is the channel bit string. The last character
    /// is channel 1, the one before it channel 2 and so on. Any character other than `0` or `1`,
    /// line terminators included, is rejected. No bits at all means a board without channels.
    pub fn parse(text: &str) -> Result<StatusReply, ParseError> {
        let (_, bits) = text
            .split_once(STATUS_MARKER)
            .ok_or_else(|| ParseError::MissingMarker(text.to_string()))?;

        let len = bits.chars().count();
        let states = bits
            .chars()
            .rev()
            .enumerate()
            .map(|(i, c)| match c {
                '1' => Ok(true),
                '0' => Ok(false),
                found => Err(ParseError::InvalidState {
                    position: len - 1 - i,
                    found,
                }),
            })
            .collect::<Result<Box<[bool]>, _>>()?;

        Ok(StatusReply::new(states))
    }

    /// Fails unless the reply reports exactly `expected` channels.
    pub fn ensure_channels(&self, expected: usize) -> Result<(), ParseError> {
        if self.channel_count() != expected {
            return Err(ParseError::ChannelCountMismatch {
                expected,
                actual: self.channel_count(),
            });
        }
        Ok(())
    }
}

#[test]
fn write_status_reply() {
    let mut out = Vec::new();
    StatusReply::new(vec![true, false, false])
        .write_to(&mut out)
        .unwrap();
    assert_eq!(out, b"relay001".to_vec());
}

#[test]
fn read_status_reply() {
    let reply = StatusReply::parse("relay101").unwrap();
    assert_eq!(reply.channel_count(), 3);
    assert_eq!(
        reply.channels().collect::<Vec<_>>(),
        vec![(1, true), (2, false), (3, true)]
    )
}
