//! Encoder and button input
//!
//! The control surface consumes already decoded input: a signed step count per
//! poll and discrete button events. Nothing here ever blocks.

use crate::scheduler::Scheduler;
use crossbeam::channel::{unbounded, Receiver, Sender};
use log::{debug, info, warn};
use std::collections::VecDeque;
use std::io::{self, BufRead};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    Click,
    /// Reported when the button is released after a long hold
    LongPress,
}

pub trait Input {
    /// Encoder steps since the last poll, positive clockwise.
    fn poll_delta(&mut self) -> i16;

    fn poll_button(&mut self) -> Option<ButtonEvent>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Turn(i16),
    Button(ButtonEvent),
}

/// Maps a console line to a command.
///
/// `+`, `++`, `-`: one step per sign. `+10`, `-3`: that many steps.
/// `c` / `click`: short press. `l` / `long`: long press.
pub fn parse_command(line: &str) -> Option<ConsoleCommand> {
    let line = line.trim();
    match line {
        "" => return None,
        "c" | "click" => return Some(ConsoleCommand::Button(ButtonEvent::Click)),
        "l" | "long" => return Some(ConsoleCommand::Button(ButtonEvent::LongPress)),
        _ => {}
    }

    if line.chars().all(|c| c == '+') {
        return i16::try_from(line.len()).ok().map(ConsoleCommand::Turn);
    }
    if line.chars().all(|c| c == '-') {
        return i16::try_from(line.len())
            .ok()
            .map(|steps| ConsoleCommand::Turn(-steps));
    }
    if line.starts_with('+') || line.starts_with('-') {
        return line.parse::<i16>().ok().map(ConsoleCommand::Turn);
    }
    None
}

/// Reads commands from stdin on a background thread.
pub struct ConsoleInput {
    rx: Receiver<ConsoleCommand>,
    buttons: VecDeque<ButtonEvent>,
    delta: i16,
}

fn read_commands<R: BufRead>(reader: R, tx: Sender<ConsoleCommand>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("Console input error: {}", e);
                break;
            }
        };
        match parse_command(&line) {
            Some(command) => {
                debug!("Console command: {:?}", command);
                if tx.send(command).is_err() {
                    break;
                }
            }
            None => warn!("Unrecognised console input: {:?}", line),
        }
    }
    info!("Console input closed");
}

impl ConsoleInput {
    pub fn spawn<S: Scheduler>(scheduler: &S) -> Self {
        let (tx, rx) = unbounded();
        scheduler.spawn("console-input", move || {
            read_commands(io::stdin().lock(), tx)
        });
        Self::from_receiver(rx)
    }

    pub fn from_receiver(rx: Receiver<ConsoleCommand>) -> Self {
        Self {
            rx,
            buttons: VecDeque::new(),
            delta: 0,
        }
    }

    fn drain(&mut self) {
        for command in self.rx.try_iter() {
            match command {
                ConsoleCommand::Turn(steps) => self.delta = self.delta.saturating_add(steps),
                ConsoleCommand::Button(event) => self.buttons.push_back(event),
            }
        }
    }
}

impl Input for ConsoleInput {
    fn poll_delta(&mut self) -> i16 {
        self.drain();
        std::mem::take(&mut self.delta)
    }

    fn poll_button(&mut self) -> Option<ButtonEvent> {
        self.drain();
        self.buttons.pop_front()
    }
}

/// Input fed from a script, for tests.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    deltas: VecDeque<i16>,
    buttons: VecDeque<ButtonEvent>,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues one poll worth of encoder steps.
    pub fn turn(&mut self, steps: i16) -> &mut Self {
        self.deltas.push_back(steps);
        self
    }

    pub fn press(&mut self, event: ButtonEvent) -> &mut Self {
        self.buttons.push_back(event);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty() && self.buttons.is_empty()
    }
}

impl Input for ScriptedInput {
    fn poll_delta(&mut self) -> i16 {
        self.deltas.pop_front().unwrap_or(0)
    }

    fn poll_button(&mut self) -> Option<ButtonEvent> {
        self.buttons.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_turns() {
        assert_eq!(parse_command("+"), Some(ConsoleCommand::Turn(1)));
        assert_eq!(parse_command("---"), Some(ConsoleCommand::Turn(-3)));
        assert_eq!(parse_command("+10"), Some(ConsoleCommand::Turn(10)));
        assert_eq!(parse_command(" -4 "), Some(ConsoleCommand::Turn(-4)));
    }

    #[test]
    fn test_parse_buttons() {
        assert_eq!(
            parse_command("c"),
            Some(ConsoleCommand::Button(ButtonEvent::Click))
        );
        assert_eq!(
            parse_command("long"),
            Some(ConsoleCommand::Button(ButtonEvent::LongPress))
        );
    }

    #[test]
    fn test_parse_rejects_other_input() {
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("x"), None);
        assert_eq!(parse_command("+-"), None);
        assert_eq!(parse_command("12"), None);
    }

    #[test]
    fn test_console_input_sums_turns_and_queues_buttons() {
        let (tx, rx) = unbounded();
        read_commands(Cursor::new("+\n+5\nc\n--\nl\nnonsense\n"), tx);

        let mut input = ConsoleInput::from_receiver(rx);
        assert_eq!(input.poll_delta(), 4);
        assert_eq!(input.poll_delta(), 0);
        assert_eq!(input.poll_button(), Some(ButtonEvent::Click));
        assert_eq!(input.poll_button(), Some(ButtonEvent::LongPress));
        assert_eq!(input.poll_button(), None);
    }
}
