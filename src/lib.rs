pub mod channel;
pub mod cli;
pub mod clock;
pub mod config;
pub mod control;
pub mod event_loop;
pub mod input;
pub mod logging;
pub mod midi;
pub mod scheduler;
pub mod settings;
pub mod state;
pub mod ui;

pub use channel::{Channel, ChannelFilter};
pub use cli::{validate_device, Args};
pub use clock::{pulse_frequency, ClockEngine, ManualTimer, ThreadTimer, Timer, TimerError};
pub use crate::config::AppConfig;
pub use control::ControlSurface;
pub use event_loop::EventLoop;
pub use input::{ButtonEvent, Input, ScriptedInput};
pub use scheduler::{Scheduler, ThreadScheduler};
pub use settings::{FileStorage, MemoryStorage, Settings, SettingsStore, Storage};
pub use ui::{Display, RecordingDisplay, ShortPressMode, UiState};

pub fn create_scheduler() -> ThreadScheduler {
    ThreadScheduler::new()
}

pub fn handle_device_list() -> Vec<String> {
    midi::list_ports()
}
