// clock.rs

mod timer;

pub use timer::{ManualTimer, PulseCallback, ThreadTimer, Timer, TimerError};

use crate::midi::ClockOutput;
use log::{error, info};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

/// MIDI standard PPQ (Pulses Per Quarter Note)
pub const PULSES_PER_BEAT: u8 = 24;

/// Clock pulse rate for a tempo: 24 pulses per beat.
pub fn pulse_frequency(tempo: u16) -> f64 {
    f64::from(tempo) * f64::from(PULSES_PER_BEAT) / 60.0
}

/// The part of the clock that runs in timer context.
///
/// It is the only writer of the beat counter and the only setter of the beat
/// edge; the polling loop only reads the counter and clears the edge.
pub struct PulseHandler {
    output: Arc<dyn ClockOutput>,
    beat_counter: AtomicU8,
    beat_edge: AtomicBool,
    pulses: AtomicU64,
}

impl PulseHandler {
    pub fn new(output: Arc<dyn ClockOutput>) -> Self {
        Self {
            output,
            beat_counter: AtomicU8::new(0),
            beat_edge: AtomicBool::new(false),
            pulses: AtomicU64::new(0),
        }
    }

    pub fn on_pulse(&self) {
        // A busy port loses this pulse.
        let _ = self.output.send_clock();
        self.pulses.fetch_add(1, Ordering::AcqRel);

        let count = self.beat_counter.load(Ordering::Acquire) + 1;
        if count >= PULSES_PER_BEAT {
            self.beat_counter.store(0, Ordering::Release);
            self.beat_edge.store(true, Ordering::Release);
        } else {
            self.beat_counter.store(count, Ordering::Release);
        }
    }

    /// Only called while the timer is stopped.
    fn reset(&self) {
        self.beat_counter.store(0, Ordering::Release);
        self.beat_edge.store(false, Ordering::Release);
    }

    pub fn take_beat_edge(&self) -> bool {
        self.beat_edge.swap(false, Ordering::AcqRel)
    }

    pub fn beat_counter(&self) -> u8 {
        self.beat_counter.load(Ordering::Acquire)
    }

    pub fn pulses(&self) -> u64 {
        self.pulses.load(Ordering::Acquire)
    }
}

/// Periodic clock pulse generator driven by tempo.
pub struct ClockEngine<T: Timer> {
    timer: T,
    pulse: Arc<PulseHandler>,
    frequency_hz: f64,
    running: bool,
}

impl<T: Timer> ClockEngine<T> {
    /// Binds the pulse handler to the timer. A timer that cannot be set up
    /// leaves the device without a clock, so the error is returned as is.
    pub fn new(mut timer: T, output: Arc<dyn ClockOutput>) -> Result<Self, TimerError> {
        let pulse = Arc::new(PulseHandler::new(output));
        let handler = Arc::clone(&pulse);
        timer.init(Arc::new(move || handler.on_pulse()))?;
        info!("Clock engine initialized");

        Ok(Self {
            timer,
            pulse,
            frequency_hz: 0.0,
            running: false,
        })
    }

    pub fn start(&mut self, tempo: u16) -> Result<(), TimerError> {
        if self.running {
            return Ok(());
        }

        let frequency_hz = pulse_frequency(tempo);
        self.pulse.reset();
        self.timer.start(frequency_hz)?;
        self.frequency_hz = frequency_hz;
        self.running = true;
        info!("Clock started at {} BPM ({:.3} Hz)", tempo, frequency_hz);
        Ok(())
    }

    pub fn stop(&mut self) {
        self.timer.stop();
        if self.running {
            info!("Clock stopped");
        }
        self.running = false;
    }

    /// Reprograms the running timer in place. A stopped engine picks the new
    /// tempo up on the next `start`.
    pub fn retune(&mut self, tempo: u16) {
        if !self.running {
            return;
        }

        let frequency_hz = pulse_frequency(tempo);
        match self.timer.set_frequency(frequency_hz) {
            Ok(()) => {
                self.frequency_hz = frequency_hz;
                info!("Clock retuned to {} BPM ({:.3} Hz)", tempo, frequency_hz);
            }
            Err(e) => error!("Failed to retune clock to {} BPM: {}", tempo, e),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn frequency_hz(&self) -> f64 {
        self.frequency_hz
    }

    pub fn take_beat_edge(&self) -> bool {
        self.pulse.take_beat_edge()
    }

    pub fn beat_counter(&self) -> u8 {
        self.pulse.beat_counter()
    }

    pub fn pulses_emitted(&self) -> u64 {
        self.pulse.pulses()
    }
}
