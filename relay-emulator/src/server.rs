use std::{
    io::{self, ErrorKind, Read, Write},
    net::{TcpListener, TcpStream, ToSocketAddrs},
    time::Duration,
};

use crate::RelayBoard;
use relay_protocol::{Command, StatusReply};

/// Reply to commands the board cannot process.
pub const ERROR_REPLY: &str = "ERROR";

#[derive(Debug, Clone)]
pub struct Config {
    pub max_command_len: usize,
    pub read_write_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_command_len: 256,
            read_write_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug)]
pub struct Server<B: RelayBoard> {
    board: B,
    config: Config,
}

/// Builder to create a [Server] instance and modify configuration options
///
/// # Example
///
/// ```ignore
/// use relay_emulator::{board::MemoryBoard, server::Builder};
/// use std::time::Duration;
///
/// let server = Builder::new()
///     .max_command_len(64)
///     .rw_timeout(Duration::from_secs(20))
///     .build(MemoryBoard::new(8));
/// ```
#[derive(Default)]
pub struct Builder {
    config: Config,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    /// Set the largest command read in one go.
    pub fn max_command_len(mut self, len: usize) -> Self {
        self.config.max_command_len = len;
        self
    }

    /// Set the TCP read and write timeout
    pub fn rw_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_write_timeout = timeout;
        self
    }

    /// Build and return the server
    pub fn build<B: RelayBoard>(self, board: B) -> Server<B> {
        Server::new(board, self.config)
    }
}

impl<B: RelayBoard> Server<B> {
    pub fn new(board: B, config: Config) -> Server<B> {
        Server { board, config }
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn listen(&self, addr: impl ToSocketAddrs) -> Result<(), Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(addr)?;
        self.serve(listener)
    }

    /// Serve clients on an already bound listener, one at a time.
    pub fn serve(&self, listener: TcpListener) -> Result<(), Box<dyn std::error::Error>> {
        log::info!(
            "Relay emulator with {} channels listening on {}",
            self.board.channel_count(),
            listener.local_addr()?
        );

        for stream in listener.incoming() {
            match stream {
                Ok(tcp) => {
                    if let Ok(addr) = tcp.peer_addr() {
                        log::info!("New client connection from {}", addr);
                    }
                    if let Err(e) = self.handle_client(tcp) {
                        log::error!("Client error: {}", e);
                    }
                }
                Err(e) => log::error!("Connection error: {}", e),
            }
        }
        Ok(())
    }

    fn handle_client(&self, mut tcp: TcpStream) -> io::Result<()> {
        tcp.set_read_timeout(Some(self.config.read_write_timeout))?;
        tcp.set_write_timeout(Some(self.config.read_write_timeout))?;

        let mut buf = vec![0u8; self.config.max_command_len];
        loop {
            let n = match tcp.read(&mut buf) {
                Ok(0) => break, // Client disconnected
                Ok(n) => n,
                Err(err) if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    log::error!("Client read timeout, closing connection");
                    break;
                }
                Err(err)
                    if err.kind() == ErrorKind::ConnectionAborted
                        || err.kind() == ErrorKind::ConnectionReset =>
                {
                    break;
                }
                Err(other) => return Err(other),
            };
            let reply = self.process(&buf[..n]);
            tcp.write_all(reply.as_bytes())?;
        }
        Ok(())
    }

    /// Decode one command, apply it to the board and build the reply text.
    pub fn process(&self, bytes: &[u8]) -> String {
        let command = match str::from_utf8(bytes)
            .map_err(|e| e.to_string())
            .and_then(|text| Command::parse(text).map_err(|e| e.to_string()))
        {
            Ok(command) => command,
            Err(e) => {
                log::warn!("Rejecting command: {}", e);
                return ERROR_REPLY.to_string();
            }
        };
        match self.process_command(command) {
            Ok(status) => status.to_string(),
            Err(reason) => {
                log::warn!("Rejecting command: {}", reason);
                ERROR_REPLY.to_string()
            }
        }
    }

    fn process_command(&self, command: Command) -> Result<StatusReply, String> {
        let channel_count = self.board.channel_count();
        let check_channel = |channel: usize| {
            if (1..=channel_count).contains(&channel) {
                Ok(channel)
            } else {
                Err(format!("unknown channel {}", channel))
            }
        };

        match command {
            Command::Read => {
                log::debug!("Received read");
            }
            Command::On { channel } => {
                log::debug!("Received on: channel={}", channel);
                self.board.set(check_channel(channel)?, true);
            }
            Command::Off { channel } => {
                log::debug!("Received off: channel={}", channel);
                self.board.set(check_channel(channel)?, false);
            }
            Command::OnFor {
                channel,
                timeout_secs,
            } => {
                log::debug!(
                    "Received timed on: channel={}, timeout_secs={}",
                    channel,
                    timeout_secs
                );
                self.board.set_for(
                    check_channel(channel)?,
                    Duration::from_secs(u64::from(timeout_secs)),
                );
            }
            Command::All { states } => {
                log::debug!("Received all: {} states", states.len());
                if states.len() != channel_count {
                    return Err(format!(
                        "expected {} channel states, got {}",
                        channel_count,
                        states.len()
                    ));
                }
                self.board.set_all(&states);
            }
        }
        let status = StatusReply::new(self.board.states());
        log::trace!("Status after command: {}", status);
        Ok(status)
    }
}
