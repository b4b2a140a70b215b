use crate::channel::Channel;
use std::error::Error;
use std::fmt;

/// Custom error type for MIDI operations
#[derive(Debug)]
pub enum MidiError {
    /// Error when sending a MIDI message
    SendError(String),
    /// The output port is in use by another context
    Busy,
    /// Error when connecting to a MIDI device
    ConnectionError(String),
}

impl fmt::Display for MidiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MidiError::SendError(msg) => write!(f, "MIDI send error: {}", msg),
            MidiError::Busy => write!(f, "MIDI output busy"),
            MidiError::ConnectionError(msg) => write!(f, "MIDI connection error: {}", msg),
        }
    }
}

impl Error for MidiError {}

/// Result type for MIDI operations
pub type Result<T> = std::result::Result<T, MidiError>;

/// A decoded Control Change event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlChange {
    /// Zero based channel nibble
    pub channel: u8,
    pub controller: u8,
    pub value: u8,
}

/// The messages this device reads or writes
#[derive(Debug, Clone, PartialEq)]
pub enum MidiMessage {
    ControlChange(ControlChange),
    /// MIDI Clock timing message
    Clock,
    Start,
    Stop,
    Continue,
}

pub const CLOCK_BYTE: u8 = 0xF8;

impl MidiMessage {
    pub fn parse(data: &[u8]) -> Option<MidiMessage> {
        let status = *data.first()?;

        match status {
            CLOCK_BYTE => return Some(MidiMessage::Clock),
            0xFA => return Some(MidiMessage::Start),
            0xFC => return Some(MidiMessage::Stop),
            0xFB => return Some(MidiMessage::Continue),
            _ => {}
        }

        match status & 0xF0 {
            0xB0 if data.len() >= 3 => Some(MidiMessage::ControlChange(ControlChange {
                channel: status & 0x0F,
                controller: data[1] & 0x7F,
                value: data[2] & 0x7F,
            })),
            _ => None,
        }
    }
}

/// Send half used from the timer context. Implementations must not block.
pub trait ClockOutput: Send + Sync {
    fn send_clock(&self) -> Result<()>;
}

/// Receive half used from the polling loop. Implementations must not block.
pub trait MidiInput {
    /// Returns the next Control Change accepted by the channel filter, if any.
    fn poll_control_change(&mut self) -> Option<ControlChange>;

    fn set_input_channel(&mut self, channel: Channel);
}
