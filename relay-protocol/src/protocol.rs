/// A command is sent from the client to the relay board.
/// For each command, the client is expected to send the command and wait for exactly one reply.
/// The board processes commands in the order received and answers each one before the next.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
    /// Queries the current state of every channel.
    Read,
    /// Switches a single channel on.
    On { channel: usize },
    /// Switches a single channel off.
    Off { channel: usize },
    /// Switches a single channel on. The board switches it off again once `timeout_secs` elapsed.
    OnFor { channel: usize, timeout_secs: u32 },
    /// Sets every channel at once.
    All {
        /// One entry per channel, in ascending channel order (channel 1 first).
        states: Box<[bool]>,
    },
}

impl Command {
    /// Returns [Command::On] or [Command::Off] depending on `on`.
    pub fn power(channel: usize, on: bool) -> Command {
        if on {
            Command::On { channel }
        } else {
            Command::Off { channel }
        }
    }

    /// Returns an [Command::All] command that sets `channel_count` channels to the same state.
    pub fn uniform(channel_count: usize, on: bool) -> Command {
        Command::All {
            states: vec![on; channel_count].into_boxed_slice(),
        }
    }
}

/// The board's answer to a status query.
///
/// Holds the state of every channel, indexed from channel 1 upwards.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StatusReply {
    states: Box<[bool]>,
}

impl StatusReply {
    /// Creates a reply from channel states in ascending channel order.
    pub fn new(states: impl Into<Box<[bool]>>) -> StatusReply {
        StatusReply {
            states: states.into(),
        }
    }

    /// The number of channels reported by the board.
    pub fn channel_count(&self) -> usize {
        self.states.len()
    }

    /// State of the channel with the given 1-based index.
    pub fn state(&self, channel: usize) -> Option<bool> {
        channel
            .checked_sub(1)
            .and_then(|i| self.states.get(i))
            .copied()
    }

    /// Channel states in ascending channel order.
    pub fn states(&self) -> &[bool] {
        &self.states
    }

    /// `(index, state)` pairs, starting at channel 1.
    pub fn channels(&self) -> impl Iterator<Item = (usize, bool)> + '_ {
        self.states
            .iter()
            .enumerate()
            .map(|(i, state)| (i + 1, *state))
    }
}
