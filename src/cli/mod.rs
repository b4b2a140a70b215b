use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// List available MIDI devices
    #[arg(long)]
    pub list_devices: bool,

    /// MIDI output device for the clock (substring match)
    #[arg(long)]
    pub midi_out: Option<String>,

    /// MIDI input device for remote tempo control (substring match)
    #[arg(long)]
    pub midi_in: Option<String>,

    /// Choose the MIDI output device from a list
    #[arg(long)]
    pub select_device: bool,

    /// Settings record location
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// What a short press does on the channel screen: commit or ignore
    #[arg(long)]
    pub short_press: Option<String>,

    /// Polling loop interval in milliseconds
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Log level: error, warn, info, debug or trace
    #[arg(long)]
    pub log_level: Option<String>,
}

pub fn validate_device(device_name: &str, devices: &[String]) -> Result<(), String> {
    if !devices.iter().any(|d| d.contains(device_name)) {
        let mut error_msg = format!(
            "Error: Device '{}' not found in available devices:\n",
            device_name
        );
        for device in devices {
            error_msg.push_str(&format!("  - {}\n", device));
        }
        return Err(error_msg);
    }
    Ok(())
}
