use crate::channel::{Channel, ChannelFilter};
use crate::midi::{ClockOutput, ControlChange, MidiError, MidiInput, Result};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct MockShared {
    clocks: AtomicU64,
    busy: AtomicBool,
    queue: Mutex<VecDeque<ControlChange>>,
    filter: Mutex<ChannelFilter>,
}

/// In-process MIDI transport. Clones share counters and queues, so a test can
/// keep one handle while the device owns another.
#[derive(Clone, Default)]
pub struct MockMidi {
    shared: Arc<MockShared>,
}

impl MockMidi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of clock bytes that made it out.
    pub fn clocks_sent(&self) -> u64 {
        self.shared.clocks.load(Ordering::SeqCst)
    }

    /// While busy, every clock send fails with [`MidiError::Busy`].
    pub fn set_busy(&self, busy: bool) {
        self.shared.busy.store(busy, Ordering::SeqCst);
    }

    /// Queues an incoming Control Change on the given one based channel.
    pub fn push_control_change(&self, channel: u8, controller: u8, value: u8) {
        if let Ok(mut queue) = self.shared.queue.lock() {
            queue.push_back(ControlChange {
                channel: channel.saturating_sub(1),
                controller,
                value,
            });
        }
    }

    pub fn input_channel(&self) -> Channel {
        self.shared
            .filter
            .lock()
            .map(|filter| filter.channel())
            .unwrap_or_default()
    }
}

impl ClockOutput for MockMidi {
    fn send_clock(&self) -> Result<()> {
        if self.shared.busy.load(Ordering::SeqCst) {
            return Err(MidiError::Busy);
        }
        self.shared.clocks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl MidiInput for MockMidi {
    fn poll_control_change(&mut self) -> Option<ControlChange> {
        let filter = *self.shared.filter.lock().ok()?;
        let mut queue = self.shared.queue.lock().ok()?;
        while let Some(cc) = queue.pop_front() {
            if filter.accepts(cc.channel) {
                return Some(cc);
            }
        }
        None
    }

    fn set_input_channel(&mut self, channel: Channel) {
        if let Ok(mut filter) = self.shared.filter.lock() {
            filter.set_channel(channel);
        }
    }
}
