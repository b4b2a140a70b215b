use beatclockrs::control::{
    CC_TEMPO_ADD, CC_TEMPO_COARSE, CC_TEMPO_FINE, CC_TEMPO_HUNDREDS, CC_TRANSPORT,
};
use beatclockrs::midi::MockMidi;
use beatclockrs::settings::RECORD_MARKER;
use beatclockrs::ui::{DrawColor, DrawOp};
use beatclockrs::{
    ButtonEvent, Channel, ClockEngine, ControlSurface, ManualTimer, MemoryStorage,
    RecordingDisplay, ScriptedInput, Settings, ShortPressMode, UiState,
};
use std::sync::Arc;

type Surface = ControlSurface<ManualTimer, MemoryStorage, MockMidi, RecordingDisplay>;

struct Rig {
    surface: Surface,
    timer: ManualTimer,
    storage: MemoryStorage,
    midi: MockMidi,
}

fn rig_with(storage: MemoryStorage, short_press: ShortPressMode) -> Rig {
    let timer = ManualTimer::new();
    let midi = MockMidi::new();
    let engine = ClockEngine::new(timer.clone(), Arc::new(midi.clone())).unwrap();
    let surface = ControlSurface::new(
        engine,
        storage.clone(),
        midi.clone(),
        RecordingDisplay::new(),
        short_press,
    );
    Rig {
        surface,
        timer,
        storage,
        midi,
    }
}

fn rig() -> Rig {
    rig_with(MemoryStorage::new(), ShortPressMode::Commit)
}

fn stored(storage: &MemoryStorage) -> Option<Settings> {
    storage.record().and_then(|record| Settings::decode(&record))
}

#[test]
fn test_startup_with_empty_storage_uses_and_stores_defaults() {
    let rig = rig();
    assert_eq!(rig.surface.tempo(), 100);
    assert_eq!(rig.surface.channel(), Channel::Specific(16));
    assert_eq!(rig.surface.ui_state(), UiState::Main);
    assert!(!rig.surface.is_running());
    assert_eq!(stored(&rig.storage), Some(Settings::default()));
    assert_eq!(rig.midi.input_channel(), Channel::Specific(16));
    assert_eq!(rig.surface.display().presents(), 1);
}

#[test]
fn test_startup_restores_stored_settings() {
    let record = Settings {
        tempo: 140,
        channel: Channel::Specific(5),
    }
    .encode();
    let rig = rig_with(MemoryStorage::with_record(record), ShortPressMode::Commit);
    assert_eq!(rig.surface.tempo(), 140);
    assert_eq!(rig.surface.channel(), Channel::Specific(5));
    assert_eq!(rig.midi.input_channel(), Channel::Specific(5));
    assert_eq!(rig.storage.writes(), 0);
}

#[test]
fn test_cc_dispatch_table() {
    let cases: [(u8, u8, u16); 6] = [
        (CC_TEMPO_FINE, 127, 101),
        (CC_TEMPO_FINE, 0, 99),
        (CC_TEMPO_COARSE, 127, 110),
        (CC_TEMPO_COARSE, 63, 90),
        (CC_TEMPO_HUNDREDS, 2, 200),
        (CC_TEMPO_ADD, 7, 107),
    ];
    for (controller, value, expected) in cases {
        let mut rig = rig();
        rig.surface.on_control_change(controller, value);
        assert_eq!(
            rig.surface.tempo(),
            expected,
            "CC {} = {}",
            controller,
            value
        );
    }
}

#[test]
fn test_cc_transport() {
    let mut rig = rig();
    rig.surface.on_control_change(CC_TRANSPORT, 127);
    assert!(rig.surface.is_running());
    assert!(rig.timer.is_running());
    assert_eq!(rig.timer.frequency_hz(), 40.0);

    rig.surface.on_control_change(CC_TRANSPORT, 0);
    assert!(!rig.surface.is_running());
    assert!(!rig.timer.is_running());
}

#[test]
fn test_unknown_controllers_are_ignored() {
    let mut rig = rig();
    for controller in [0, 10, 16, 64, 127] {
        rig.surface.on_control_change(controller, 127);
    }
    assert_eq!(rig.surface.tempo(), 100);
    assert!(!rig.surface.is_running());
}

#[test]
fn test_tempo_arithmetic_wraps() {
    let record = Settings {
        tempo: 0,
        channel: Channel::Omni,
    }
    .encode();
    let mut rig = rig_with(MemoryStorage::with_record(record), ShortPressMode::Commit);
    rig.surface.on_control_change(CC_TEMPO_FINE, 0);
    assert_eq!(rig.surface.tempo(), u16::MAX);
    rig.surface.on_control_change(CC_TEMPO_ADD, 3);
    assert_eq!(rig.surface.tempo(), 2);
}

#[test]
fn test_cc_batch_retunes_and_redraws_once() {
    let mut rig = rig();
    rig.surface.on_control_change(CC_TRANSPORT, 127);
    let mut input = ScriptedInput::new();
    rig.surface.on_tick(&mut input);
    rig.surface.display_mut().take_ops();

    rig.midi.push_control_change(16, CC_TEMPO_FINE, 127);
    rig.midi.push_control_change(16, CC_TEMPO_COARSE, 127);
    rig.midi.push_control_change(16, CC_TEMPO_FINE, 127);
    rig.surface.on_tick(&mut input);

    assert_eq!(rig.surface.tempo(), 112);
    assert_eq!(rig.timer.frequency_hz(), 44.8);
    assert_eq!(rig.surface.display().clears(), 1, "one redraw for the batch");
    assert_eq!(rig.surface.display().current_texts(), vec![" 112", "Ch16"]);
}

#[test]
fn test_cc_on_other_channel_is_filtered() {
    let mut rig = rig();
    rig.midi.push_control_change(3, CC_TEMPO_FINE, 127);
    rig.surface.on_tick(&mut ScriptedInput::new());
    assert_eq!(rig.surface.tempo(), 100);
}

#[test]
fn test_encoder_edits_tempo_in_main() {
    let mut rig = rig();
    let mut input = ScriptedInput::new();
    input.turn(5).turn(-2);
    rig.surface.on_tick(&mut input);
    assert_eq!(rig.surface.tempo(), 105);
    rig.surface.on_tick(&mut input);
    assert_eq!(rig.surface.tempo(), 103);
    assert_eq!(rig.surface.display().current_texts(), vec![" 103", "Ch16"]);
}

#[test]
fn test_encoder_retunes_running_clock() {
    let mut rig = rig();
    let mut input = ScriptedInput::new();
    input.press(ButtonEvent::Click).turn(20);
    rig.surface.on_tick(&mut input);
    assert!(rig.surface.is_running());
    assert_eq!(rig.surface.tempo(), 120);
    assert_eq!(rig.timer.frequency_hz(), 48.0);
}

#[test]
fn test_short_press_toggles_clock_in_main() {
    let mut rig = rig();
    rig.surface.on_short_press();
    assert!(rig.surface.is_running());
    rig.surface.on_short_press();
    assert!(!rig.surface.is_running());
}

#[test]
fn test_long_press_ignored_while_running() {
    let mut rig = rig();
    rig.surface.on_short_press();
    rig.surface.on_long_press();
    assert_eq!(rig.surface.ui_state(), UiState::Main);
    assert!(rig.surface.is_running());
}

#[test]
fn test_channel_edit_and_commit() {
    let mut rig = rig();
    let writes_after_startup = rig.storage.writes();
    let mut input = ScriptedInput::new();

    input.press(ButtonEvent::LongPress);
    rig.surface.on_tick(&mut input);
    assert_eq!(rig.surface.ui_state(), UiState::SetChannel);
    assert_eq!(rig.surface.display().current_texts(), vec!["Ch16"]);

    // Ch16 -> Off -> All -> Ch01 -> Ch02
    input.turn(4);
    rig.surface.on_tick(&mut input);
    assert_eq!(rig.surface.channel(), Channel::Specific(2));
    assert_eq!(rig.surface.tempo(), 100, "encoder edits the channel, not the tempo");
    assert_eq!(rig.surface.display().current_texts(), vec!["Ch02"]);
    assert_eq!(rig.midi.input_channel(), Channel::Specific(16), "not applied yet");
    assert_eq!(rig.storage.writes(), writes_after_startup);

    input.press(ButtonEvent::LongPress);
    rig.surface.on_tick(&mut input);
    assert_eq!(rig.surface.ui_state(), UiState::Main);
    assert_eq!(rig.midi.input_channel(), Channel::Specific(2));
    assert_eq!(
        stored(&rig.storage),
        Some(Settings {
            tempo: 100,
            channel: Channel::Specific(2)
        })
    );
    assert_eq!(rig.surface.display().current_texts(), vec![" 100", "Ch02"]);
}

#[test]
fn test_channel_wraps_from_off_to_omni() {
    let mut rig = rig();
    rig.surface.on_long_press();
    rig.surface.on_encoder_delta(1);
    assert_eq!(rig.surface.channel(), Channel::Off);
    rig.surface.on_encoder_delta(1);
    assert_eq!(rig.surface.channel(), Channel::Omni);
    rig.surface.on_encoder_delta(1);
    assert_eq!(rig.surface.channel(), Channel::Specific(1));
    rig.surface.on_encoder_delta(-2);
    assert_eq!(rig.surface.channel(), Channel::Off);
}

#[test]
fn test_committed_settings_match_displayed_values() {
    let mut rig = rig();
    rig.surface.on_encoder_delta(40);
    rig.surface.on_long_press();
    rig.surface.on_encoder_delta(-15);
    rig.surface.on_long_press();

    let settings = stored(&rig.storage).unwrap();
    assert_eq!(settings.tempo, rig.surface.tempo());
    assert_eq!(settings.channel, rig.surface.channel());
    assert_eq!(settings.tempo, 140);
    assert_eq!(settings.channel, Channel::Specific(1));
}

#[test]
fn test_short_press_commits_in_set_channel() {
    let mut rig = rig_with(MemoryStorage::new(), ShortPressMode::Commit);
    rig.surface.on_long_press();
    rig.surface.on_encoder_delta(2);
    rig.surface.on_short_press();
    assert_eq!(rig.surface.ui_state(), UiState::Main);
    assert_eq!(rig.midi.input_channel(), Channel::Omni);
    assert!(!rig.surface.is_running(), "the commit does not start the clock");
}

#[test]
fn test_short_press_ignored_in_set_channel() {
    let mut rig = rig_with(MemoryStorage::new(), ShortPressMode::Ignore);
    rig.surface.on_long_press();
    rig.surface.on_encoder_delta(2);
    rig.surface.on_short_press();
    assert_eq!(rig.surface.ui_state(), UiState::SetChannel);
    assert_eq!(rig.midi.input_channel(), Channel::Specific(16));
    assert!(!rig.surface.is_running());
}

#[test]
fn test_commit_survives_storage_failure() {
    let mut rig = rig();
    rig.storage.fail_writes(true);
    rig.surface.on_long_press();
    rig.surface.on_encoder_delta(1);
    rig.surface.on_long_press();
    assert_eq!(rig.surface.ui_state(), UiState::Main);
    assert_eq!(rig.midi.input_channel(), Channel::Off);
    assert_eq!(stored(&rig.storage), Some(Settings::default()));
}

#[test]
fn test_beat_edge_blinks_indicator() {
    let mut rig = rig();
    let mut input = ScriptedInput::new();
    rig.surface.on_short_press();
    rig.surface.on_tick(&mut input);
    rig.surface.display_mut().take_ops();

    rig.timer.fire_n(24);
    rig.surface.on_tick(&mut input);
    assert_eq!(
        rig.surface.display().ops(),
        &[
            DrawOp::SetDrawColor(DrawColor::Off),
            DrawOp::Indicator {
                x: 16,
                y: 16,
                radius: 8
            },
            DrawOp::Present,
        ]
    );

    rig.timer.fire_n(23);
    rig.surface.on_tick(&mut input);
    assert_eq!(rig.surface.display().presents(), 1, "no blink before the next beat");
}

#[test]
fn test_stopped_frame_has_no_indicator() {
    let mut rig = rig();
    rig.surface.on_short_press();
    rig.surface.on_short_press();
    rig.surface.on_tick(&mut ScriptedInput::new());
    let ops = rig.surface.display().ops();
    let last_clear = ops.iter().rposition(|op| *op == DrawOp::Clear).unwrap();
    assert!(!ops[last_clear..]
        .iter()
        .any(|op| matches!(op, DrawOp::Indicator { .. })));
}

#[test]
fn test_corrupted_record_falls_back_to_defaults() {
    let mut record = Settings {
        tempo: 140,
        channel: Channel::Specific(5),
    }
    .encode();
    record[3] = RECORD_MARKER ^ 0xFF;
    let rig = rig_with(MemoryStorage::with_record(record), ShortPressMode::Commit);
    assert_eq!(rig.surface.tempo(), 100);
    assert_eq!(rig.surface.channel(), Channel::Specific(16));
}
