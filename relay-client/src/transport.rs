use std::{
    io::{self, ErrorKind, Read, Write},
    net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs},
    time::Duration,
};

use crate::controller::Config;

/// Byte-level request/response channel to a relay board.
///
/// The connection is closed when the transport is dropped.
pub trait Transport {
    /// Write the complete command.
    fn send(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Perform one blocking read of at most `max_bytes` bytes.
    fn receive(&mut self, max_bytes: usize) -> io::Result<Vec<u8>>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).send(bytes)
    }

    fn receive(&mut self, max_bytes: usize) -> io::Result<Vec<u8>> {
        (**self).receive(max_bytes)
    }
}

/// TCP connection to a relay board.
#[derive(Debug)]
pub struct TcpTransport {
    tcp: TcpStream,
}

impl TcpTransport {
    /// Opens a connection and applies the timeouts from `config`.
    pub fn open(addr: impl ToSocketAddrs, config: &Config) -> io::Result<TcpTransport> {
        let tcp = match config.connect_timeout {
            Some(timeout) => connect_timeout(addr, timeout)?,
            None => TcpStream::connect(addr)?,
        };
        tcp.set_read_timeout(config.read_write_timeout)?;
        tcp.set_write_timeout(config.read_write_timeout)?;
        tcp.set_nodelay(true)?;
        Ok(TcpTransport { tcp })
    }

    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.tcp.peer_addr()
    }
}

/// Tries every resolved address in turn.
fn connect_timeout(addr: impl ToSocketAddrs, timeout: Duration) -> io::Result<TcpStream> {
    let mut last_err = None;
    for addr in addr.to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(tcp) => return Ok(tcp),
            Err(e) => {
                log::debug!("Connecting to {} failed: {}", addr, e);
                last_err = Some(e);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(
            ErrorKind::InvalidInput,
            "could not resolve to any address",
        )
    }))
}

impl Transport for TcpTransport {
    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.tcp.write_all(bytes)
    }

    fn receive(&mut self, max_bytes: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0; max_bytes];
        let n = self.tcp.read(&mut buf)?;
        if n == 0 {
            return Err(io::Error::new(
                ErrorKind::UnexpectedEof,
                "relay closed the connection",
            ));
        }
        buf.truncate(n);
        Ok(buf)
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        // The peer may already be gone
        let _ = self.tcp.shutdown(Shutdown::Both);
        log::debug!("Closed relay connection");
    }
}

#[cfg(test)]
mod test {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use super::{TcpTransport, Transport};
    use crate::controller::Config;

    #[test]
    fn exchange_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let device = thread::spawn(move || {
            let (mut tcp, _) = listener.accept().unwrap();
            let mut buf = [0u8; 16];
            let n = tcp.read(&mut buf).unwrap();
            assert_eq!(&buf[..n], b"read");
            tcp.write_all(b"relay0110").unwrap();
        });

        let mut transport = TcpTransport::open(addr, &Config::default()).unwrap();
        transport.send(b"read").unwrap();
        assert_eq!(transport.receive(8192).unwrap(), b"relay0110".to_vec());
        device.join().unwrap();
    }

    #[test]
    fn receive_after_close_fails() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let device = thread::spawn(move || {
            let (tcp, _) = listener.accept().unwrap();
            drop(tcp);
        });

        let mut transport = TcpTransport::open(addr, &Config::default()).unwrap();
        device.join().unwrap();
        let err = transport.receive(8192).unwrap_err();
        assert!(matches!(
            err.kind(),
            std::io::ErrorKind::UnexpectedEof | std::io::ErrorKind::ConnectionReset
        ));
    }
}
