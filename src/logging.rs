use log::LevelFilter;
use simplelog::*;
use std::fs::{self, OpenOptions};
use std::io::{Error, ErrorKind};
use std::path::PathBuf;
use std::sync::Once;

static INIT: Once = Once::new();
static mut LOGGER_INITIALIZED: bool = false;

pub fn log_dir() -> Result<PathBuf, Error> {
    let home = std::env::var("HOME")
        .map_err(|_| Error::new(ErrorKind::NotFound, "HOME environment variable not set"))?;

    Ok(PathBuf::from(home)
        .join(".local")
        .join("share")
        .join("beatclockrs")
        .join("logs"))
}

/// Starts the file logger at `~/.local/share/beatclockrs/logs/app.log`.
pub fn init_logger(level: LevelFilter) -> Result<(), Error> {
    let log_dir = log_dir()?;
    fs::create_dir_all(&log_dir)?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("app.log"))?;

    let config = ConfigBuilder::new()
        .set_thread_level(LevelFilter::Error)
        .build();

    // Safe to use unsafe here as we're using Once to ensure single initialization
    unsafe {
        INIT.call_once(|| {
            if let Ok(()) = CombinedLogger::init(vec![WriteLogger::new(level, config, log_file)]) {
                LOGGER_INITIALIZED = true;
            }
        });

        if LOGGER_INITIALIZED {
            log::info!(
                "Logging session started at {}",
                chrono::Local::now().to_rfc3339()
            );
            Ok(())
        } else {
            Err(Error::new(ErrorKind::Other, "Logger initialization failed"))
        }
    }
}

/// Stderr logger for when the log file cannot be opened.
pub fn init_fallback_logger(level: LevelFilter) {
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp_millis()
        .try_init();
}
