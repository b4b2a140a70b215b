// config.rs

use crate::cli::Args;
use crate::ui::ShortPressMode;
use config::{ConfigError, Environment, File};
use log::{debug, LevelFilter};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const ENV_PREFIX: &str = "BEATCLOCK";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub midi_output: Option<String>,
    pub midi_input: Option<String>,
    pub select_device: bool,
    pub settings_path: PathBuf,
    pub short_press: ShortPressMode,
    pub poll_interval: Duration,
    pub log_level: LevelFilter,
}

fn data_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
        .join(".local")
        .join("share")
        .join("beatclockrs")
}

pub fn default_settings_path() -> PathBuf {
    data_dir().join("settings.cfg")
}

pub fn default_config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
        .join(".config")
        .join("beatclockrs")
        .join("config.toml")
}

pub fn parse_short_press(value: &str) -> Result<ShortPressMode, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "commit" => Ok(ShortPressMode::Commit),
        "ignore" => Ok(ShortPressMode::Ignore),
        other => Err(ConfigError::Message(format!(
            "short_press must be 'commit' or 'ignore', got '{}'",
            other
        ))),
    }
}

fn parse_level(value: &str) -> Result<LevelFilter, ConfigError> {
    LevelFilter::from_str(value.trim())
        .map_err(|_| ConfigError::Message(format!("unknown log level '{}'", value)))
}

impl AppConfig {
    /// Defaults, then the config file, then `BEATCLOCK_*` variables, then flags.
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let config_path = args.config.clone().unwrap_or_else(default_config_path);
        debug!("Reading configuration from {}", config_path.display());

        let mut builder = config::Config::builder()
            .set_default(
                "settings_path",
                default_settings_path().to_string_lossy().into_owned(),
            )?
            .set_default("short_press", "commit")?
            .set_default("poll_interval_ms", DEFAULT_POLL_INTERVAL_MS as i64)?
            .set_default("log_level", "debug")?
            .set_default("select_device", false)?
            .add_source(File::from(config_path.as_path()).required(args.config.is_some()))
            .add_source(Environment::with_prefix(ENV_PREFIX));

        if let Some(device) = &args.midi_out {
            builder = builder.set_override("midi_output", device.as_str())?;
        }
        if let Some(device) = &args.midi_in {
            builder = builder.set_override("midi_input", device.as_str())?;
        }
        if let Some(path) = &args.settings {
            builder = builder.set_override("settings_path", path.to_string_lossy().into_owned())?;
        }
        if let Some(mode) = &args.short_press {
            builder = builder.set_override("short_press", mode.as_str())?;
        }
        if let Some(ms) = args.poll_interval_ms {
            let ms = i64::try_from(ms).unwrap_or(i64::MAX);
            builder = builder.set_override("poll_interval_ms", ms)?;
        }
        if let Some(level) = &args.log_level {
            builder = builder.set_override("log_level", level.as_str())?;
        }
        if args.select_device {
            builder = builder.set_override("select_device", true)?;
        }

        let settings = builder.build()?;

        let poll_interval_ms = settings.get_int("poll_interval_ms")?;
        let poll_interval_ms = u64::try_from(poll_interval_ms).map_err(|_| {
            ConfigError::Message(format!(
                "poll_interval_ms must not be negative, got {}",
                poll_interval_ms
            ))
        })?;

        let config = AppConfig {
            midi_output: settings.get_string("midi_output").ok(),
            midi_input: settings.get_string("midi_input").ok(),
            select_device: settings.get_bool("select_device")?,
            settings_path: PathBuf::from(settings.get_string("settings_path")?),
            short_press: parse_short_press(&settings.get_string("short_press")?)?,
            poll_interval: Duration::from_millis(poll_interval_ms),
            log_level: parse_level(&settings.get_string("log_level")?)?,
        };
        debug!("Effective configuration: {:?}", config);
        Ok(config)
    }
}
