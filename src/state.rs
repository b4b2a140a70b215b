use crate::channel::Channel;
use crate::settings::Settings;
use std::sync::atomic::{AtomicBool, Ordering};

/// Device values edited from the polling loop.
///
/// Tempo arithmetic wraps at the `u16` boundary in both directions, matching
/// the firmware's unchecked edits.
pub struct DeviceState {
    tempo: u16,
    channel: Channel,
    tempo_changed: AtomicBool,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::from_settings(Settings::default())
    }
}

impl DeviceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: Settings) -> Self {
        Self {
            tempo: settings.tempo,
            channel: settings.channel,
            tempo_changed: AtomicBool::new(false),
        }
    }

    pub fn tempo(&self) -> u16 {
        self.tempo
    }

    pub fn set_tempo(&mut self, bpm: u16) {
        self.tempo = bpm;
        self.mark_tempo_changed();
    }

    pub fn nudge_tempo(&mut self, steps: i16) {
        self.set_tempo(self.tempo.wrapping_add_signed(steps));
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn step_channel(&mut self, steps: i16) {
        self.channel = self.channel.step(steps);
    }

    pub fn settings(&self) -> Settings {
        Settings {
            tempo: self.tempo,
            channel: self.channel,
        }
    }

    pub fn mark_tempo_changed(&self) {
        self.tempo_changed.store(true, Ordering::Release);
    }

    /// Returns and clears the tempo changed flag.
    pub fn take_tempo_changed(&self) -> bool {
        self.tempo_changed.swap(false, Ordering::AcqRel)
    }
}
