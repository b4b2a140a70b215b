//! MIDI listen channel
//!
//! The device listens for tempo control on one of eighteen settings: no
//! channel at all, every channel, or one of the sixteen MIDI channels. The
//! encoder walks these settings as a ring:
//!
//! `All -> Ch01 -> ... -> Ch16 -> Off -> All`

use std::fmt;

/// Raw value of [`Channel::Omni`] in the persisted record and the input filter.
pub const RAW_OMNI: i8 = 0;
/// Raw value of [`Channel::Off`] in the persisted record and the input filter.
pub const RAW_OFF: i8 = 17;

const RING_LEN: i32 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Ignore all incoming control changes
    Off,
    /// Listen on every channel
    Omni,
    /// Listen on a single channel, 1..=16
    Specific(u8),
}

impl Default for Channel {
    fn default() -> Self {
        Channel::Specific(16)
    }
}

impl Channel {
    /// Builds a specific channel, rejecting anything outside 1..=16.
    pub fn specific(number: u8) -> Option<Self> {
        (1..=16).contains(&number).then_some(Channel::Specific(number))
    }

    fn ring_position(self) -> i32 {
        match self {
            Channel::Omni => 0,
            Channel::Specific(n) => i32::from(n),
            Channel::Off => 17,
        }
    }

    fn from_ring_position(position: i32) -> Self {
        match position.rem_euclid(RING_LEN) {
            0 => Channel::Omni,
            17 => Channel::Off,
            n => Channel::Specific(n as u8),
        }
    }

    /// Moves `delta` positions around the ring, wrapping at either end.
    pub fn step(self, delta: i16) -> Self {
        Self::from_ring_position(self.ring_position() + i32::from(delta))
    }

    pub fn successor(self) -> Self {
        self.step(1)
    }

    pub fn predecessor(self) -> Self {
        self.step(-1)
    }

    pub fn to_raw(self) -> i8 {
        match self {
            Channel::Omni => RAW_OMNI,
            Channel::Off => RAW_OFF,
            Channel::Specific(n) => n as i8,
        }
    }

    pub fn from_raw(raw: i8) -> Option<Self> {
        match raw {
            RAW_OMNI => Some(Channel::Omni),
            RAW_OFF => Some(Channel::Off),
            1..=16 => Some(Channel::Specific(raw as u8)),
            _ => None,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Off => write!(f, "Off"),
            Channel::Omni => write!(f, "All"),
            Channel::Specific(n) => write!(f, "Ch{:02}", n),
        }
    }
}

/// Input filter applied to incoming channel messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelFilter {
    channel: Channel,
}

impl ChannelFilter {
    pub fn new(channel: Channel) -> Self {
        Self { channel }
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn set_channel(&mut self, channel: Channel) {
        self.channel = channel;
    }

    /// `wire_channel` is the zero based channel nibble of the status byte.
    pub fn accepts(&self, wire_channel: u8) -> bool {
        match self.channel {
            Channel::Off => false,
            Channel::Omni => true,
            Channel::Specific(n) => wire_channel + 1 == n,
        }
    }
}
