use std::fmt::{self, Display};

/// Locally cached power state of one relay channel.
///
/// Instances are owned by a [`RelayController`](crate::RelayController). State-changing requests
/// go through the controller using the channel's index.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ChannelState {
    index: usize,
    state: bool,
}

impl ChannelState {
    pub fn new(index: usize, state: bool) -> ChannelState {
        ChannelState { index, state }
    }

    /// The 1-based channel index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Last known power state, `true` meaning on
    pub fn state(&self) -> bool {
        self.state
    }

    pub fn set_state(&mut self, state: bool) {
        self.state = state;
    }
}

impl Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "channel {}: {}",
            self.index,
            if self.state { "on" } else { "off" }
        )
    }
}

#[test]
fn channel_display() {
    let mut channel = ChannelState::new(3, false);
    assert_eq!(channel.to_string(), "channel 3: off");
    channel.set_state(true);
    assert!(channel.state());
    assert_eq!(channel.index(), 3);
    assert_eq!(channel.to_string(), "channel 3: on");
}
