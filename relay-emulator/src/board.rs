use std::{
    sync::{Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use crate::RelayBoard;

#[derive(Debug, Default, Clone, Copy)]
struct Slot {
    on: bool,
    off_at: Option<Instant>,
}

impl Slot {
    fn is_on(&self, now: Instant) -> bool {
        match self.off_at {
            Some(deadline) => self.on && now < deadline,
            None => self.on,
        }
    }
}

/// Relay board held in memory. All channels start switched off.
#[derive(Debug)]
pub struct MemoryBoard {
    slots: Mutex<Vec<Slot>>,
}

impl MemoryBoard {
    pub fn new(channel_count: usize) -> MemoryBoard {
        MemoryBoard {
            slots: Mutex::new(vec![Slot::default(); channel_count]),
        }
    }

    fn slots(&self) -> MutexGuard<'_, Vec<Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn replace(&self, channel: usize, slot: Slot) {
        let mut slots = self.slots();
        if let Some(current) = channel.checked_sub(1).and_then(|i| slots.get_mut(i)) {
            *current = slot;
        }
    }
}

impl RelayBoard for MemoryBoard {
    fn channel_count(&self) -> usize {
        self.slots().len()
    }

    fn states(&self) -> Box<[bool]> {
        let now = Instant::now();
        self.slots().iter().map(|slot| slot.is_on(now)).collect()
    }

    fn set(&self, channel: usize, on: bool) {
        self.replace(channel, Slot { on, off_at: None });
    }

    fn set_for(&self, channel: usize, duration: Duration) {
        self.replace(
            channel,
            Slot {
                on: true,
                off_at: Some(Instant::now() + duration),
            },
        );
    }

    fn set_all(&self, states: &[bool]) {
        for (slot, on) in self.slots().iter_mut().zip(states) {
            *slot = Slot {
                on: *on,
                off_at: None,
            };
        }
    }
}
