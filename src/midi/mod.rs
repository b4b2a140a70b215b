//! MIDI transport for the beat clock
//!
//! This module provides the two halves of MIDI communication the device needs:
//! - [`ClockOutput`] sends clock bytes and is safe to call from the timer context
//! - [`MidiInput`] delivers filtered Control Change events to the polling loop
//!
//! The main components are:
//! - [`MidirClockOutput`] and [`MidirInput`] for real MIDI ports via midir
//! - [`MockMidi`] for testing
mod engine;
pub mod midir_engine;
pub mod mock_engine;

pub use engine::{
    ClockOutput, ControlChange, MidiError, MidiInput, MidiMessage, Result, CLOCK_BYTE,
};

pub use midir_engine::{list_ports, output_port_names, MidirClockOutput, MidirInput};
pub use mock_engine::MockMidi;
