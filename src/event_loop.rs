// event_loop.rs

use crate::clock::Timer;
use crate::control::ControlSurface;
use crate::input::Input;
use crate::midi::MidiInput;
use crate::settings::Storage;
use crate::ui::Display;
use log::info;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// The polling context: feeds input into the control surface until told to stop.
pub struct EventLoop<T, S, M, D, I>
where
    T: Timer,
    S: Storage,
    M: MidiInput,
    D: Display,
    I: Input,
{
    surface: ControlSurface<T, S, M, D>,
    input: I,
    poll_interval: Duration,
}

impl<T, S, M, D, I> EventLoop<T, S, M, D, I>
where
    T: Timer,
    S: Storage,
    M: MidiInput,
    D: Display,
    I: Input,
{
    pub fn new(surface: ControlSurface<T, S, M, D>, input: I, poll_interval: Duration) -> Self {
        EventLoop {
            surface,
            input,
            poll_interval,
        }
    }

    pub fn tick(&mut self) {
        self.surface.on_tick(&mut self.input);
    }

    pub fn run(&mut self, shutdown: &AtomicBool) {
        info!(
            "Event loop running, polling every {:?}",
            self.poll_interval
        );
        while !shutdown.load(Ordering::Acquire) {
            self.tick();
            if !self.poll_interval.is_zero() {
                thread::sleep(self.poll_interval);
            }
        }
        info!("Event loop stopped");
    }

    pub fn surface(&self) -> &ControlSurface<T, S, M, D> {
        &self.surface
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }
}
