//! Helpers shared by the integration tests.
use std::{
    net::{SocketAddr, TcpListener},
    thread,
    time::Duration,
};

use relay_client::{Config, NoDelay, RelayController, TcpTransport};
use relay_emulator::{board::MemoryBoard, server::Server};

/// Start an emulated relay on a free local port and return its address.
pub fn spawn_emulator(channels: usize) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Binding a local port should work");
    let addr = listener
        .local_addr()
        .expect("Bound listener has an address");
    thread::spawn(move || {
        let server = Server::new(MemoryBoard::new(channels), Default::default());
        if let Err(e) = server.serve(listener) {
            eprintln!("emulator stopped: {e}");
        }
    });
    addr
}

/// Controller that sends commands back-to-back.
pub type FastRelay = RelayController<TcpTransport, NoDelay>;

/// Connect without the pause between commands.
pub fn connect_fast(addr: SocketAddr) -> FastRelay {
    let config = Config {
        read_write_timeout: Some(Duration::from_secs(5)),
        ..Config::default()
    };
    let transport =
        TcpTransport::open(addr, &config).expect("Connecting to the emulator should work");
    RelayController::with_transport(transport, NoDelay, &config)
        .expect("Emulator should report its channels")
}
