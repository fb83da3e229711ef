use std::{
    fmt::{self, Display},
    io::{self, ErrorKind},
    net::ToSocketAddrs,
    time::Duration,
};

use relay_protocol::{Command, StatusReply, error::ParseError};

use crate::{
    channel::ChannelState,
    error::RelayError,
    pacing::{FixedDelay, Pacer},
    transport::{TcpTransport, Transport},
};

#[derive(Debug, Clone)]
pub struct Config {
    /// Pause before every command
    pub command_delay: Duration,
    /// Upper bound for a single reply read
    pub max_reply_len: usize,
    pub read_write_timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            command_delay: FixedDelay::DEFAULT_DELAY,
            max_reply_len: 8192,
            read_write_timeout: Some(Duration::from_secs(30)),
            connect_timeout: Some(Duration::from_secs(10)),
        }
    }
}

impl Config {
    /// Fails for settings no connection can work with.
    fn validate(&self) -> io::Result<()> {
        if self.max_reply_len == 0 {
            return Err(io::Error::new(
                ErrorKind::InvalidInput,
                "max_reply_len must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Builder to connect a [RelayController] with modified configuration options
///
/// # Example
///
/// ```ignore
/// use relay_client::Builder;
/// use std::time::Duration;
///
/// let relay = Builder::new()
///     .command_delay(Duration::from_millis(250))
///     .rw_timeout(Duration::from_secs(5))
///     .connect("192.168.1.200:5000")?;
/// ```
#[derive(Default)]
pub struct Builder {
    config: Config,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    /// Set the pause that precedes every command.
    pub fn command_delay(mut self, delay: Duration) -> Self {
        self.config.command_delay = delay;
        self
    }

    /// Set the largest reply that is read in one go.
    pub fn max_reply_len(mut self, len: usize) -> Self {
        self.config.max_reply_len = len;
        self
    }

    /// Set the TCP read and write timeout
    pub fn rw_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_write_timeout = Some(timeout);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = Some(timeout);
        self
    }

    /// Connect to the relay and read its initial status
    pub fn connect(self, addr: impl ToSocketAddrs) -> Result<RelayController, RelayError> {
        RelayController::connect_with(addr, &self.config)
    }
}

/// Connection to a relay board together with the cached state of all its channels.
///
/// The set of channels is taken from the status reply received while connecting and does not
/// change afterwards.
pub struct RelayController<T: Transport = TcpTransport, P: Pacer = FixedDelay> {
    transport: T,
    pacer: P,
    max_reply_len: usize,
    channels: Vec<ChannelState>,
}

impl RelayController {
    /// Connect with the default configuration.
    pub fn connect(addr: impl ToSocketAddrs) -> Result<RelayController, RelayError> {
        RelayController::connect_with(addr, &Config::default())
    }

    pub fn connect_with(
        addr: impl ToSocketAddrs,
        config: &Config,
    ) -> Result<RelayController, RelayError> {
        config.validate().map_err(RelayError::Connection)?;
        let transport = TcpTransport::open(addr, config).map_err(RelayError::Connection)?;
        if let Ok(addr) = transport.peer_addr() {
            log::info!("Connected to relay at {}", addr);
        }
        RelayController::with_transport(transport, FixedDelay::new(config.command_delay), config)
    }
}

impl<T: Transport, P: Pacer> RelayController<T, P> {
    /// Set up a controller on an already open transport.
    ///
    /// Sends `read` and creates one [ChannelState] per channel in the reply.
    ///
    /// Only `config.max_reply_len` is used here. The transport is expected to be open and
    /// configured already, and `pacer` takes the place of `config.command_delay`.
    pub fn with_transport(
        transport: T,
        pacer: P,
        config: &Config,
    ) -> Result<RelayController<T, P>, RelayError> {
        config.validate().map_err(RelayError::Connection)?;
        let mut controller = RelayController {
            transport,
            pacer,
            max_reply_len: config.max_reply_len,
            channels: Vec::new(),
        };
        let reply = match controller.send(&Command::Read) {
            Ok(reply) => reply,
            Err(RelayError::Transport(e)) => return Err(RelayError::Connection(e)),
            Err(other) => return Err(other),
        };
        controller.channels = StatusReply::parse(&reply)?
            .channels()
            .map(|(index, state)| ChannelState::new(index, state))
            .collect();
        log::info!("Relay reports {} channels", controller.channels.len());
        Ok(controller)
    }

    /// Send a raw command and return the raw reply.
    ///
    /// Waits for the pacer, writes the command and performs exactly one read.
    /// Mutating commands are not checked against the reply.
    pub fn execute(&mut self, command: &str) -> Result<String, RelayError> {
        self.pacer.pause();
        log::debug!("Sending command {:?}", command);
        self.transport.send(command.as_bytes())?;
        let reply = self.transport.receive(self.max_reply_len)?;
        let reply = String::from_utf8(reply).map_err(|e| ParseError::from(e.utf8_error()))?;
        log::trace!("Received reply {:?}", reply);
        Ok(reply)
    }

    fn send(&mut self, command: &Command) -> Result<String, RelayError> {
        self.execute(&command.to_string())
    }

    /// Query the relay and update every cached channel state.
    ///
    /// # Returns
    ///
    /// `(index, state)` pairs in ascending channel order.
    pub fn status(&mut self) -> Result<Vec<(usize, bool)>, RelayError> {
        let reply = self.send(&Command::Read)?;
        let status = self.resync(&reply)?;
        Ok(status.channels().collect())
    }

    /// Switch one channel, or every channel if `channel` is `None`.
    pub fn set_state(&mut self, state: bool, channel: Option<usize>) -> Result<(), RelayError> {
        match channel {
            Some(index) => self.set_power(index, state),
            None => self.set_all(state),
        }
    }

    /// Switch every channel and resync the cache from the reply.
    pub fn set_all(&mut self, state: bool) -> Result<(), RelayError> {
        self.apply(Command::uniform(self.channels.len(), state))
    }

    /// Apply one state per channel, channel 1 first, and resync the cache from the reply.
    pub fn set_states(&mut self, states: &[bool]) -> Result<(), RelayError> {
        if states.len() != self.channels.len() {
            return Err(RelayError::PatternLength {
                expected: self.channels.len(),
                actual: states.len(),
            });
        }
        self.apply(Command::All {
            states: states.into(),
        })
    }

    fn apply(&mut self, command: Command) -> Result<(), RelayError> {
        let reply = self.send(&command)?;
        self.resync(&reply)?;
        Ok(())
    }

    /// Switch a single channel.
    ///
    /// The reply is not inspected; once it arrives the cached state is set to `on`.
    pub fn set_power(&mut self, index: usize, on: bool) -> Result<(), RelayError> {
        let position = self.position(index)?;
        log::info!("Set power: {} for channel {}", on, index);
        self.send(&Command::power(index, on))?;
        self.channels[position].set_state(on);
        Ok(())
    }

    /// Switch a single channel on and let the relay switch it off after `timeout_secs`.
    ///
    /// The cache reads `true` afterwards. The automatic switch-off only shows up after the
    /// next [RelayController::status] call.
    pub fn set_timer(&mut self, index: usize, timeout_secs: u32) -> Result<(), RelayError> {
        let position = self.position(index)?;
        log::info!(
            "Set power: true for channel {} timeout: {}s",
            index,
            timeout_secs
        );
        self.send(&Command::OnFor {
            channel: index,
            timeout_secs,
        })?;
        self.channels[position].set_state(true);
        Ok(())
    }

    /// Cached state of one channel
    pub fn channel(&self, index: usize) -> Result<&ChannelState, RelayError> {
        let position = self.position(index)?;
        Ok(&self.channels[position])
    }

    /// Cached states of all channels in ascending order
    pub fn channels(&self) -> &[ChannelState] {
        &self.channels
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    fn position(&self, index: usize) -> Result<usize, RelayError> {
        index
            .checked_sub(1)
            .filter(|position| *position < self.channels.len())
            .ok_or(RelayError::UnknownChannel {
                index,
                count: self.channels.len(),
            })
    }

    /// Overwrite the cache from a status reply.
    // Nothing is written unless the reply covers exactly the known channels.
    fn resync(&mut self, reply: &str) -> Result<StatusReply, RelayError> {
        let status = StatusReply::parse(reply)?;
        status.ensure_channels(self.channels.len())?;
        for (channel, state) in self.channels.iter_mut().zip(status.states()) {
            channel.set_state(*state);
        }
        Ok(status)
    }
}

impl<T: Transport, P: Pacer> Display for RelayController<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, channel) in self.channels.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", channel)?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod test {
    use std::{
        cell::{Cell, RefCell},
        collections::VecDeque,
        io::{self, ErrorKind},
        rc::Rc,
    };

    use relay_protocol::error::ParseError;

    use super::{Config, RelayController};
    use crate::{error::RelayError, pacing::Pacer, transport::Transport};

    /// Answers with canned replies and records every command.
    #[derive(Default)]
    struct ScriptedTransport {
        replies: VecDeque<io::Result<Vec<u8>>>,
        sent: Rc<RefCell<Vec<String>>>,
        max_bytes: Rc<Cell<usize>>,
    }

    impl ScriptedTransport {
        fn new(replies: &[&str]) -> ScriptedTransport {
            ScriptedTransport {
                replies: replies.iter().map(|r| Ok(r.as_bytes().to_vec())).collect(),
                ..Default::default()
            }
        }

        fn then_fail(mut self, kind: ErrorKind) -> Self {
            self.replies.push_back(Err(io::Error::from(kind)));
            self
        }

        fn then_bytes(mut self, bytes: &[u8]) -> Self {
            self.replies.push_back(Ok(bytes.to_vec()));
            self
        }
    }

    impl Transport for ScriptedTransport {
        fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
            self.sent
                .borrow_mut()
                .push(String::from_utf8_lossy(bytes).to_string());
            Ok(())
        }

        fn receive(&mut self, max_bytes: usize) -> io::Result<Vec<u8>> {
            self.max_bytes.set(max_bytes);
            self.replies
                .pop_front()
                .unwrap_or_else(|| Err(io::Error::from(ErrorKind::UnexpectedEof)))
        }
    }

    #[derive(Default, Clone)]
    struct CountingPacer {
        pauses: Rc<Cell<usize>>,
    }

    impl Pacer for CountingPacer {
        fn pause(&mut self) {
            self.pauses.set(self.pauses.get() + 1);
        }
    }

    type TestController = RelayController<ScriptedTransport, CountingPacer>;

    fn connect(
        transport: ScriptedTransport,
    ) -> (TestController, Rc<RefCell<Vec<String>>>, CountingPacer) {
        let sent = transport.sent.clone();
        let pacer = CountingPacer::default();
        let controller =
            RelayController::with_transport(transport, pacer.clone(), &Config::default())
                .unwrap();
        (controller, sent, pacer)
    }

    fn states(controller: &TestController) -> Vec<bool> {
        controller.channels().iter().map(|c| c.state()).collect()
    }

    #[test]
    fn connect_reads_channels() {
        let (relay, sent, _) = connect(ScriptedTransport::new(&["relay0001"]));
        assert_eq!(*sent.borrow(), vec!["read"]);
        assert_eq!(relay.channel_count(), 4);
        let indices: Vec<usize> = relay.channels().iter().map(|c| c.index()).collect();
        assert_eq!(indices, vec![1, 2, 3, 4]);
        assert_eq!(states(&relay), vec![true, false, false, false]);
    }

    #[test]
    fn end_to_end_scenario() {
        let (mut relay, sent, _) = connect(ScriptedTransport::new(&[
            "relay0000",
            "relay1111",
            "whatever",
        ]));
        assert_eq!(states(&relay), vec![false; 4]);

        relay.set_state(true, None).unwrap();
        assert_eq!(sent.borrow().last().unwrap(), "all1111");
        assert_eq!(states(&relay), vec![true; 4]);

        relay.set_power(2, false).unwrap();
        assert_eq!(sent.borrow().last().unwrap(), "off2");
        assert_eq!(states(&relay), vec![true, false, true, true]);
    }

    #[test]
    fn set_all_trusts_the_reply() {
        // the relay only switched channel 1
        let (mut relay, _, _) = connect(ScriptedTransport::new(&["relay000", "relay001"]));
        relay.set_all(true).unwrap();
        assert_eq!(states(&relay), vec![true, false, false]);
    }

    #[test]
    fn status_updates_cache() {
        let (mut relay, sent, _) = connect(ScriptedTransport::new(&["relay0000", "relay0101"]));
        let status = relay.status().unwrap();
        assert_eq!(status, vec![(1, true), (2, false), (3, true), (4, false)]);
        assert_eq!(states(&relay), vec![true, false, true, false]);
        assert_eq!(*sent.borrow(), vec!["read", "read"]);
    }

    #[test]
    fn set_state_on_single_channel() {
        let (mut relay, sent, _) = connect(ScriptedTransport::new(&["relay0000", "on3"]));
        relay.set_state(true, Some(3)).unwrap();
        assert_eq!(sent.borrow().last().unwrap(), "on3");
        assert!(relay.channel(3).unwrap().state());
    }

    #[test]
    fn power_is_optimistic() {
        // the reply claims everything is off, the cache still follows the request
        let (mut relay, _, _) = connect(ScriptedTransport::new(&["relay00", "relay00"]));
        relay.set_power(1, true).unwrap();
        assert!(relay.channel(1).unwrap().state());
    }

    #[test]
    fn timer_is_optimistic() {
        let (mut relay, sent, _) = connect(ScriptedTransport::new(&["relay0000", ""]));
        relay.set_timer(4, 30).unwrap();
        assert_eq!(sent.borrow().last().unwrap(), "on4:30");
        assert_eq!(states(&relay), vec![false, false, false, true]);
    }

    #[test]
    fn unknown_channel_sends_nothing() {
        let (mut relay, sent, _) = connect(ScriptedTransport::new(&["relay0000"]));
        match relay.set_state(true, Some(999)) {
            Err(RelayError::UnknownChannel { index, count }) => {
                assert_eq!(index, 999);
                assert_eq!(count, 4);
            }
            other => panic!("expected UnknownChannel, got {:?}", other),
        }
        assert!(matches!(
            relay.set_timer(0, 5),
            Err(RelayError::UnknownChannel { index: 0, .. })
        ));
        assert!(matches!(
            relay.channel(5),
            Err(RelayError::UnknownChannel { index: 5, .. })
        ));
        assert_eq!(sent.borrow().len(), 1);
    }

    #[test]
    fn malformed_status_keeps_cache() {
        let (mut relay, _, _) = connect(ScriptedTransport::new(&[
            "relay0011",
            "error",
            "relay111111",
            "relay1121",
        ]));
        assert!(matches!(
            relay.status(),
            Err(RelayError::Protocol(ParseError::MissingMarker(_)))
        ));
        assert!(matches!(
            relay.status(),
            Err(RelayError::Protocol(ParseError::ChannelCountMismatch {
                expected: 4,
                actual: 6
            }))
        ));
        assert!(matches!(
            relay.status(),
            Err(RelayError::Protocol(ParseError::InvalidState { found: '2', .. }))
        ));
        assert_eq!(relay.channel_count(), 4);
        assert_eq!(states(&relay), vec![true, true, false, false]);
    }

    #[test]
    fn transport_failure_keeps_cache() {
        let (mut relay, _, _) =
            connect(ScriptedTransport::new(&["relay01"]).then_fail(ErrorKind::ConnectionReset));
        assert!(matches!(
            relay.set_power(1, false),
            Err(RelayError::Transport(_))
        ));
        assert!(relay.channel(1).unwrap().state());
    }

    #[test]
    fn invalid_utf8_reply() {
        let (mut relay, _, _) =
            connect(ScriptedTransport::new(&["relay01"]).then_bytes(&[b'r', 0xff, 0xfe]));
        assert!(matches!(
            relay.execute("read"),
            Err(RelayError::Protocol(ParseError::InvalidUtf8(_)))
        ));
    }

    #[test]
    fn initial_transport_failure_is_connection_error() {
        let transport = ScriptedTransport::default().then_fail(ErrorKind::TimedOut);
        let result =
            RelayController::with_transport(transport, CountingPacer::default(), &Config::default());
        assert!(matches!(result, Err(RelayError::Connection(_))));
    }

    #[test]
    fn initial_garbage_is_protocol_error() {
        let transport = ScriptedTransport::new(&["hello"]);
        let result =
            RelayController::with_transport(transport, CountingPacer::default(), &Config::default());
        assert!(matches!(
            result,
            Err(RelayError::Protocol(ParseError::MissingMarker(_)))
        ));
    }

    #[test]
    fn set_states_checks_pattern_length() {
        let (mut relay, sent, _) = connect(ScriptedTransport::new(&["relay0000", "relay1001"]));
        assert!(matches!(
            relay.set_states(&[true]),
            Err(RelayError::PatternLength {
                expected: 4,
                actual: 1
            })
        ));
        assert_eq!(sent.borrow().len(), 1);

        relay.set_states(&[true, false, false, true]).unwrap();
        assert_eq!(sent.borrow().last().unwrap(), "all1001");
        assert_eq!(states(&relay), vec![true, false, false, true]);
    }

    #[test]
    fn pacer_runs_before_every_command() {
        let (mut relay, _, pacer) = connect(ScriptedTransport::new(&[
            "relay00", "relay00", "ok", "relay11",
        ]));
        relay.status().unwrap();
        relay.set_power(1, true).unwrap();
        relay.set_all(true).unwrap();
        assert_eq!(pacer.pauses.get(), 4);
    }

    #[test]
    fn receive_uses_max_reply_len() {
        let transport = ScriptedTransport::new(&["relay0"]);
        let max_bytes = transport.max_bytes.clone();
        let config = Config {
            max_reply_len: 64,
            ..Config::default()
        };
        RelayController::with_transport(transport, CountingPacer::default(), &config).unwrap();
        assert_eq!(max_bytes.get(), 64);
    }

    #[test]
    fn zero_reply_len_is_rejected() {
        let transport = ScriptedTransport::new(&["relay0"]);
        let sent = transport.sent.clone();
        let config = Config {
            max_reply_len: 0,
            ..Config::default()
        };
        match RelayController::with_transport(transport, CountingPacer::default(), &config) {
            Err(RelayError::Connection(e)) => assert_eq!(e.kind(), ErrorKind::InvalidInput),
            Err(other) => panic!("expected Connection, got {:?}", other),
            Ok(_) => panic!("expected Connection error"),
        }
        assert!(sent.borrow().is_empty());
    }

    #[test]
    fn display_lists_channels() {
        let (relay, _, _) = connect(ScriptedTransport::new(&["relay10"]));
        assert_eq!(relay.to_string(), "[channel 1: off, channel 2: on]");
    }
}
