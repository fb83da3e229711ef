use std::{thread, time::Duration};

/// Strategy that runs before every command is sent.
///
/// Relay boards need some processing time between two commands. The controller calls
/// [Pacer::pause] right before writing each command.
pub trait Pacer {
    fn pause(&mut self);
}

/// Sleeps for a fixed duration before every command.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    /// The delay the relay boards need between two commands
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(100);

    pub fn new(delay: Duration) -> FixedDelay {
        FixedDelay { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for FixedDelay {
    fn default() -> Self {
        FixedDelay::new(Self::DEFAULT_DELAY)
    }
}

impl Pacer for FixedDelay {
    fn pause(&mut self) {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
    }
}

/// Sends commands back-to-back.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl Pacer for NoDelay {
    fn pause(&mut self) {}
}

#[test]
fn fixed_delay_sleeps() {
    let mut pacer = FixedDelay::new(Duration::from_millis(20));
    let start = std::time::Instant::now();
    pacer.pause();
    assert!(start.elapsed() >= Duration::from_millis(20));
    assert_eq!(FixedDelay::default().delay(), Duration::from_millis(100));
}
