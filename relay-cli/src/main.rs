//! # Relay Command Line Tool
//!
//! Switches the channels of a network-attached relay board and prints the resulting channel
//! table. The `emulate` subcommand runs an in-memory relay board on the given address instead,
//! which is handy to try the other subcommands without hardware.
use std::error::Error;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;
use relay_client::{Builder, RelayController};
use relay_emulator::{board::MemoryBoard, server};

#[derive(ValueEnum, Clone, Copy, Debug, Eq, PartialEq)]
enum Power {
    On,
    Off,
}

#[derive(Subcommand, Eq, PartialEq, Clone)]
enum Action {
    /// Print the state of every channel
    Status,
    /// Switch a channel on
    On { channel: usize },
    /// Switch a channel off
    Off { channel: usize },
    /// Switch a channel on and let the relay switch it off again
    Timer { channel: usize, seconds: u32 },
    /// Switch every channel
    All { power: Power },
    /// Run an emulated relay board on ip:port
    Emulate {
        #[arg(short, long, default_value = "8")]
        channels: usize,
    },
}

#[derive(Parser)]
#[command(about = "Control a network-attached multi-channel relay board", long_about=None)]
struct Args {
    #[arg(short, long, default_value = "5000")]
    port: u16,

    #[arg(short, long, default_value = "192.168.1.200")]
    ip: IpAddr,

    #[arg(
        short,
        long,
        help = "Pause before every command in milliseconds",
        default_value = "100"
    )]
    delay_ms: u64,

    #[arg(short, long, help = "Socket timeout in seconds", default_value = "30")]
    timeout_secs: u64,

    #[clap(subcommand)]
    action: Action,
}

fn emulate(addr: SocketAddr, channels: usize) -> Result<(), Box<dyn Error>> {
    log::info!("Starting relay emulator with {} channels", channels);
    let server = server::Builder::new().build(MemoryBoard::new(channels));
    server.listen(addr)
}

fn control(relay: &mut RelayController, action: Action) -> Result<(), Box<dyn Error>> {
    match action {
        Action::Status => {
            relay.status()?;
        }
        Action::On { channel } => relay.set_state(true, Some(channel))?,
        Action::Off { channel } => relay.set_state(false, Some(channel))?,
        Action::Timer { channel, seconds } => relay.set_timer(channel, seconds)?,
        Action::All { power } => relay.set_state(power == Power::On, None)?,
        Action::Emulate { .. } => return Err("emulate does not connect to a relay".into()),
    }
    for channel in relay.channels() {
        println!("{}", channel);
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::debug!("Parsed arguments: ip={}, port={}", args.ip, args.port);

    let addr = SocketAddr::new(args.ip, args.port);
    match args.action {
        Action::Emulate { channels } => emulate(addr, channels),
        action => {
            log::info!("Connecting to relay at {}", addr);
            let mut relay = Builder::new()
                .command_delay(Duration::from_millis(args.delay_ms))
                .rw_timeout(Duration::from_secs(args.timeout_secs))
                .connect(addr)?;
            control(&mut relay, action)
        }
    }
}
