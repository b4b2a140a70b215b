use crate::channel::{Channel, ChannelFilter};
use crate::midi::{ClockOutput, ControlChange, MidiError, MidiInput, MidiMessage, Result};
use crossbeam::channel::{unbounded, Receiver};
use log::{debug, info};
use midir::{Ignore, MidiInputConnection, MidiOutput, MidiOutputConnection};
use std::sync::Mutex;

const CLIENT_NAME: &str = "beatclockrs";

/// Clock output on a midir port. Sends from the timer thread never wait for
/// the port; a held lock means the pulse is dropped.
pub struct MidirClockOutput {
    connection: Mutex<MidiOutputConnection>,
    port_name: String,
}

impl MidirClockOutput {
    /// Connects to the first output port whose name contains `device_name`,
    /// or to the first available port when no name is given.
    pub fn connect(device_name: Option<&str>) -> Result<Self> {
        let midi_out = MidiOutput::new(CLIENT_NAME)
            .map_err(|e| MidiError::ConnectionError(e.to_string()))?;

        let out_ports = midi_out.ports();
        let port = match device_name {
            Some(name) => out_ports
                .iter()
                .find(|p| midi_out.port_name(p).unwrap_or_default().contains(name)),
            None => out_ports.first(),
        }
        .ok_or_else(|| {
            MidiError::ConnectionError(format!(
                "output device '{}' not found",
                device_name.unwrap_or("<any>")
            ))
        })?;

        let port_name = midi_out
            .port_name(port)
            .map_err(|e| MidiError::ConnectionError(e.to_string()))?;
        info!("Connecting to MIDI output port: {}", port_name);

        let connection = midi_out
            .connect(port, "beatclockrs-clock")
            .map_err(|e| MidiError::ConnectionError(e.to_string()))?;

        Ok(Self {
            connection: Mutex::new(connection),
            port_name,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

impl ClockOutput for MidirClockOutput {
    fn send_clock(&self) -> Result<()> {
        let mut connection = self.connection.try_lock().map_err(|_| MidiError::Busy)?;
        connection
            .send(&[crate::midi::CLOCK_BYTE])
            .map_err(|e| MidiError::SendError(e.to_string()))
    }
}

/// Control Change input on a midir port. Without a device it never yields.
pub struct MidirInput {
    #[allow(dead_code)]
    connection: Option<MidiInputConnection<()>>,
    rx: Option<Receiver<Vec<u8>>>,
    filter: ChannelFilter,
}

impl MidirInput {
    pub fn connect(device_name: Option<&str>) -> Result<Self> {
        let Some(name) = device_name else {
            info!("No MIDI input device configured, remote control disabled");
            return Ok(Self {
                connection: None,
                rx: None,
                filter: ChannelFilter::default(),
            });
        };

        let mut midi_in = midir::MidiInput::new(CLIENT_NAME)
            .map_err(|e| MidiError::ConnectionError(e.to_string()))?;
        midi_in.ignore(Ignore::All);

        let in_ports = midi_in.ports();
        let in_port = in_ports
            .iter()
            .find(|p| midi_in.port_name(p).unwrap_or_default().contains(name))
            .ok_or_else(|| {
                MidiError::ConnectionError(format!("input device '{}' not found", name))
            })?
            .clone();

        info!(
            "Connecting to MIDI input port: {}",
            midi_in.port_name(&in_port).unwrap_or_default()
        );

        let (tx, rx) = unbounded();
        let connection = midi_in
            .connect(
                &in_port,
                "beatclockrs-control",
                move |_stamp, message, _| {
                    let _ = tx.send(message.to_vec());
                },
                (),
            )
            .map_err(|e| MidiError::ConnectionError(e.to_string()))?;

        Ok(Self {
            connection: Some(connection),
            rx: Some(rx),
            filter: ChannelFilter::default(),
        })
    }
}

impl MidiInput for MidirInput {
    fn poll_control_change(&mut self) -> Option<ControlChange> {
        let rx = self.rx.as_ref()?;
        while let Ok(data) = rx.try_recv() {
            if let Some(MidiMessage::ControlChange(cc)) = MidiMessage::parse(&data) {
                if self.filter.accepts(cc.channel) {
                    return Some(cc);
                }
                debug!("Filtered control change on channel {}", cc.channel + 1);
            }
        }
        None
    }

    fn set_input_channel(&mut self, channel: Channel) {
        info!("MIDI input channel set to {}", channel);
        self.filter.set_channel(channel);
    }
}

/// Lists output and input ports as `name [Output]` / `name [Input]`.
pub fn list_ports() -> Vec<String> {
    let mut devices = Vec::new();

    if let Ok(midi_out) = MidiOutput::new("beatclockrs-list") {
        for port in midi_out.ports() {
            if let Ok(name) = midi_out.port_name(&port) {
                devices.push(format!("{} [Output]", name));
            }
        }
    }

    if let Ok(midi_in) = midir::MidiInput::new("beatclockrs-list") {
        for port in midi_in.ports() {
            if let Ok(name) = midi_in.port_name(&port) {
                devices.push(format!("{} [Input]", name));
            }
        }
    }

    devices
}

/// Names of the available output ports.
pub fn output_port_names() -> Vec<String> {
    match MidiOutput::new("beatclockrs-list") {
        Ok(midi_out) => midi_out
            .ports()
            .iter()
            .filter_map(|p| midi_out.port_name(p).ok())
            .collect(),
        Err(_) => vec![],
    }
}
