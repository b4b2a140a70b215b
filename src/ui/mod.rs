//! User interface
//!
//! This module decides what the device shows and how the button maps onto
//! UI mode changes:
//! - [`UiStateMachine`] tracks the Main / SetChannel mode and renders a frame
//! - [`Display`] is the screen capability the frame is drawn on
//! - [`TerminalDisplay`] shows the frame as a status line via indicatif

mod display;
mod progress;

pub use display::{Display, DrawColor, DrawOp, FontSize, RecordingDisplay};
pub use progress::TerminalDisplay;

use crate::channel::Channel;
use log::debug;

pub const TEMPO_POS: (i32, i32) = (64, 32);
pub const CHANNEL_LABEL_POS: (i32, i32) = (40, 10);
pub const CHANNEL_EDIT_POS: (i32, i32) = (5, 32);
pub const INDICATOR_POS: (i32, i32) = (16, 16);
pub const INDICATOR_RADIUS: i32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UiState {
    #[default]
    Main,
    SetChannel,
}

/// What a short press in SetChannel does. The two boards disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShortPressMode {
    /// Same as a long press: commit and return to Main
    #[default]
    Commit,
    /// Nothing
    Ignore,
}

/// Outcome of a button event, carried out by the control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    None,
    ToggleRunning,
    EnterSetChannel,
    Commit,
}

/// Values a frame is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct View {
    pub tempo: u16,
    pub channel: Channel,
    pub running: bool,
}

#[derive(Debug)]
pub struct UiStateMachine {
    state: UiState,
    short_press: ShortPressMode,
    indicator: DrawColor,
}

impl UiStateMachine {
    pub fn new(short_press: ShortPressMode) -> Self {
        Self {
            state: UiState::Main,
            short_press,
            indicator: DrawColor::On,
        }
    }

    pub fn state(&self) -> UiState {
        self.state
    }

    pub fn on_short_press(&self, running: bool) -> UiAction {
        match self.state {
            UiState::Main => UiAction::ToggleRunning,
            UiState::SetChannel => match self.short_press {
                ShortPressMode::Commit => self.on_long_press(running),
                ShortPressMode::Ignore => UiAction::None,
            },
        }
    }

    /// Mode changes only happen while the clock is stopped.
    pub fn on_long_press(&self, running: bool) -> UiAction {
        if running {
            return UiAction::None;
        }
        match self.state {
            UiState::Main => UiAction::EnterSetChannel,
            UiState::SetChannel => UiAction::Commit,
        }
    }

    pub fn enter(&mut self, state: UiState) {
        debug!("UI state {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    /// Full redraw of the current mode.
    pub fn render(&mut self, display: &mut dyn Display, view: &View) {
        self.indicator = DrawColor::On;
        display.clear();
        display.set_draw_color(DrawColor::On);

        let label = format!("{:>4}", view.channel.to_string());
        match self.state {
            UiState::Main => {
                // The readout holds four characters; wrapped tempos above 9999 are cut.
                let mut tempo = format!("{:4}", view.tempo);
                tempo.truncate(4);
                display.draw_text(TEMPO_POS.0, TEMPO_POS.1, &tempo, FontSize::Large);
                display.draw_text(
                    CHANNEL_LABEL_POS.0,
                    CHANNEL_LABEL_POS.1,
                    &label,
                    FontSize::Small,
                );
                if view.running {
                    display.draw_indicator(INDICATOR_POS.0, INDICATOR_POS.1, INDICATOR_RADIUS);
                }
            }
            UiState::SetChannel => {
                display.draw_text(
                    CHANNEL_EDIT_POS.0,
                    CHANNEL_EDIT_POS.1,
                    &label,
                    FontSize::Large,
                );
            }
        }
        display.present();
    }

    /// Blinks the running indicator on a visual beat without a full redraw.
    pub fn on_beat(&mut self, display: &mut dyn Display) {
        self.indicator = self.indicator.inverted();
        display.set_draw_color(self.indicator);
        display.draw_indicator(INDICATOR_POS.0, INDICATOR_POS.1, INDICATOR_RADIUS);
        display.present();
    }

    pub fn indicator_color(&self) -> DrawColor {
        self.indicator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(running: bool) -> View {
        View {
            tempo: 120,
            channel: Channel::Specific(5),
            running,
        }
    }

    #[test]
    fn test_long_press_ignored_while_running() {
        let ui = UiStateMachine::new(ShortPressMode::Commit);
        assert_eq!(ui.on_long_press(true), UiAction::None);
        assert_eq!(ui.on_long_press(false), UiAction::EnterSetChannel);
    }

    #[test]
    fn test_short_press_variants_in_set_channel() {
        let mut commit = UiStateMachine::new(ShortPressMode::Commit);
        commit.enter(UiState::SetChannel);
        assert_eq!(commit.on_short_press(false), UiAction::Commit);

        let mut ignore = UiStateMachine::new(ShortPressMode::Ignore);
        ignore.enter(UiState::SetChannel);
        assert_eq!(ignore.on_short_press(false), UiAction::None);
    }

    #[test]
    fn test_main_frame_layout() {
        let mut ui = UiStateMachine::new(ShortPressMode::Commit);
        let mut display = RecordingDisplay::new();
        ui.render(&mut display, &view(true));
        assert_eq!(
            display.ops(),
            &[
                DrawOp::Clear,
                DrawOp::SetDrawColor(DrawColor::On),
                DrawOp::Text {
                    x: 64,
                    y: 32,
                    text: " 120".to_string(),
                    font: FontSize::Large
                },
                DrawOp::Text {
                    x: 40,
                    y: 10,
                    text: "Ch05".to_string(),
                    font: FontSize::Small
                },
                DrawOp::Indicator {
                    x: 16,
                    y: 16,
                    radius: 8
                },
                DrawOp::Present,
            ]
        );
    }

    #[test]
    fn test_set_channel_frame_replaces_tempo() {
        let mut ui = UiStateMachine::new(ShortPressMode::Commit);
        ui.enter(UiState::SetChannel);
        let mut display = RecordingDisplay::new();
        ui.render(
            &mut display,
            &View {
                tempo: 120,
                channel: Channel::Omni,
                running: false,
            },
        );
        assert_eq!(display.current_texts(), vec![" All"]);
    }

    #[test]
    fn test_tempo_readout_keeps_four_characters() {
        let mut ui = UiStateMachine::new(ShortPressMode::Commit);
        let mut display = RecordingDisplay::new();
        for (tempo, readout) in [(7, "   7"), (9999, "9999"), (12700, "1270"), (65535, "6553")] {
            ui.render(
                &mut display,
                &View {
                    tempo,
                    channel: Channel::Off,
                    running: false,
                },
            );
            assert_eq!(display.current_texts(), vec![readout, " Off"]);
        }
    }

    #[test]
    fn test_beat_toggles_indicator_without_clear() {
        let mut ui = UiStateMachine::new(ShortPressMode::Commit);
        let mut display = RecordingDisplay::new();
        ui.on_beat(&mut display);
        assert_eq!(ui.indicator_color(), DrawColor::Off);
        ui.on_beat(&mut display);
        assert_eq!(ui.indicator_color(), DrawColor::On);
        assert_eq!(display.clears(), 0);
        assert_eq!(display.presents(), 2);
    }
}
