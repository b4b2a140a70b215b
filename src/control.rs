//! Control surface
//!
//! The single owner of tempo, listen channel and the run state. Encoder
//! steps, button events and MIDI Control Changes all land here and are turned
//! into state changes, clock engine calls and redraw requests.

use crate::channel::Channel;
use crate::clock::{ClockEngine, Timer};
use crate::input::{ButtonEvent, Input};
use crate::midi::{ControlChange, MidiInput};
use crate::settings::{SettingsStore, Storage};
use crate::state::DeviceState;
use crate::ui::{Display, ShortPressMode, UiAction, UiState, UiStateMachine, View};
use log::{debug, error, info, trace};

/// value > 63: tempo + 1, else tempo - 1
pub const CC_TEMPO_FINE: u8 = 11;
/// value > 63: tempo + 10, else tempo - 10
pub const CC_TEMPO_COARSE: u8 = 12;
/// tempo = value * 100
pub const CC_TEMPO_HUNDREDS: u8 = 13;
/// tempo += value
pub const CC_TEMPO_ADD: u8 = 14;
/// value > 63: start, else stop
pub const CC_TRANSPORT: u8 = 15;

fn is_on(value: u8) -> bool {
    value > 63
}

pub struct ControlSurface<T: Timer, S: Storage, M: MidiInput, D: Display> {
    state: DeviceState,
    engine: ClockEngine<T>,
    settings: SettingsStore<S>,
    midi_in: M,
    display: D,
    ui: UiStateMachine,
    redraw: bool,
}

impl<T, S, M, D> ControlSurface<T, S, M, D>
where
    T: Timer,
    S: Storage,
    M: MidiInput,
    D: Display,
{
    /// Loads the stored settings, applies the listen channel and draws the
    /// first frame.
    pub fn new(
        engine: ClockEngine<T>,
        storage: S,
        mut midi_in: M,
        display: D,
        short_press: ShortPressMode,
    ) -> Self {
        let mut settings = SettingsStore::new(storage);
        let loaded = settings.load();
        midi_in.set_input_channel(loaded.channel);

        let mut surface = Self {
            state: DeviceState::from_settings(loaded),
            engine,
            settings,
            midi_in,
            display,
            ui: UiStateMachine::new(short_press),
            redraw: false,
        };
        surface.render();
        surface
    }

    pub fn on_encoder_delta(&mut self, steps: i16) {
        if steps == 0 {
            return;
        }
        match self.ui.state() {
            UiState::Main => {
                self.state.nudge_tempo(steps);
                debug!("Encoder moved tempo to {}", self.state.tempo());
            }
            UiState::SetChannel => {
                self.state.step_channel(steps);
                debug!("Encoder moved channel to {}", self.state.channel());
                self.redraw = true;
            }
        }
    }

    pub fn on_short_press(&mut self) {
        let action = self.ui.on_short_press(self.engine.is_running());
        self.perform(action);
    }

    pub fn on_long_press(&mut self) {
        let action = self.ui.on_long_press(self.engine.is_running());
        self.perform(action);
    }

    pub fn on_button(&mut self, event: ButtonEvent) {
        match event {
            ButtonEvent::Click => self.on_short_press(),
            ButtonEvent::LongPress => self.on_long_press(),
        }
    }

    /// Applies one Control Change. Tempo edits only raise the tempo changed
    /// flag; the retune and redraw happen once per batch in [`Self::apply_tempo_change`].
    pub fn on_control_change(&mut self, controller: u8, value: u8) {
        let tempo = self.state.tempo();
        match controller {
            CC_TEMPO_FINE => self.state.nudge_tempo(if is_on(value) { 1 } else { -1 }),
            CC_TEMPO_COARSE => self.state.nudge_tempo(if is_on(value) { 10 } else { -10 }),
            CC_TEMPO_HUNDREDS => self.state.set_tempo(u16::from(value) * 100),
            CC_TEMPO_ADD => self.state.set_tempo(tempo.wrapping_add(u16::from(value))),
            CC_TRANSPORT => {
                if is_on(value) {
                    self.start_clock();
                } else {
                    self.stop_clock();
                }
                return;
            }
            _ => {
                trace!("Ignoring CC {} = {}", controller, value);
                return;
            }
        }
        debug!(
            "CC {} = {} moved tempo {} -> {}",
            controller,
            value,
            tempo,
            self.state.tempo()
        );
    }

    /// Retunes the clock and schedules a redraw if the tempo changed since
    /// the last call.
    pub fn apply_tempo_change(&mut self) {
        if self.state.take_tempo_changed() {
            self.engine.retune(self.state.tempo());
            self.redraw = true;
        }
    }

    /// One polling loop iteration. Never blocks.
    pub fn on_tick<I: Input + ?Sized>(&mut self, input: &mut I) {
        while let Some(ControlChange {
            controller, value, ..
        }) = self.midi_in.poll_control_change()
        {
            self.on_control_change(controller, value);
        }

        while let Some(event) = input.poll_button() {
            self.on_button(event);
        }
        self.on_encoder_delta(input.poll_delta());

        self.apply_tempo_change();
        if self.redraw {
            self.render();
        }

        if self.engine.take_beat_edge() && self.engine.is_running() {
            self.ui.on_beat(&mut self.display);
        }
    }

    fn perform(&mut self, action: UiAction) {
        match action {
            UiAction::None => debug!("Button ignored in {:?}", self.ui.state()),
            UiAction::ToggleRunning => {
                if self.engine.is_running() {
                    self.stop_clock();
                } else {
                    self.start_clock();
                }
            }
            UiAction::EnterSetChannel => {
                self.ui.enter(UiState::SetChannel);
                self.redraw = true;
            }
            UiAction::Commit => self.commit(),
        }
    }

    fn commit(&mut self) {
        let settings = self.state.settings();
        if let Err(e) = self.settings.save(settings.tempo, settings.channel) {
            error!("Failed to persist settings: {}", e);
        }
        self.midi_in.set_input_channel(settings.channel);
        self.ui.enter(UiState::Main);
        self.redraw = true;
        info!(
            "Committed tempo {} and channel {}",
            settings.tempo, settings.channel
        );
    }

    fn start_clock(&mut self) {
        if let Err(e) = self.engine.start(self.state.tempo()) {
            error!("Failed to start clock: {}", e);
        }
        self.redraw = true;
    }

    fn stop_clock(&mut self) {
        self.engine.stop();
        self.redraw = true;
    }

    fn render(&mut self) {
        let view = View {
            tempo: self.state.tempo(),
            channel: self.state.channel(),
            running: self.engine.is_running(),
        };
        self.ui.render(&mut self.display, &view);
        self.redraw = false;
    }

    pub fn tempo(&self) -> u16 {
        self.state.tempo()
    }

    pub fn channel(&self) -> Channel {
        self.state.channel()
    }

    pub fn is_running(&self) -> bool {
        self.engine.is_running()
    }

    pub fn ui_state(&self) -> UiState {
        self.ui.state()
    }

    pub fn engine(&self) -> &ClockEngine<T> {
        &self.engine
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }
}
