//! Persisted tempo and listen channel
//!
//! The record is four bytes: tempo (u16, little endian), raw channel (i8) and
//! a marker byte. A record whose marker does not match is treated as absent.

use crate::channel::Channel;
use log::{debug, info, warn};
use std::error::Error;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const RECORD_LEN: usize = 4;
pub const RECORD_MARKER: u8 = 0xAB;

pub const DEFAULT_TEMPO: u16 = 100;
pub const DEFAULT_CHANNEL: Channel = Channel::Specific(16);

pub type Record = [u8; RECORD_LEN];

#[derive(Debug)]
pub enum StorageError {
    /// Error reading the stored record
    Read(String),
    /// Error writing the record
    Write(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Read(msg) => write!(f, "settings read error: {}", msg),
            StorageError::Write(msg) => write!(f, "settings write error: {}", msg),
        }
    }
}

impl Error for StorageError {}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Backing store for the settings record.
pub trait Storage {
    /// Returns `None` when nothing has been stored yet.
    fn read(&mut self) -> Result<Option<Record>>;

    fn write(&mut self, record: &Record) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub tempo: u16,
    pub channel: Channel,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tempo: DEFAULT_TEMPO,
            channel: DEFAULT_CHANNEL,
        }
    }
}

impl Settings {
    pub fn encode(&self) -> Record {
        let tempo = self.tempo.to_le_bytes();
        [
            tempo[0],
            tempo[1],
            self.channel.to_raw() as u8,
            RECORD_MARKER,
        ]
    }

    pub fn decode(record: &Record) -> Option<Self> {
        if record[3] != RECORD_MARKER {
            return None;
        }
        let channel = Channel::from_raw(record[2] as i8)?;
        Some(Self {
            tempo: u16::from_le_bytes([record[0], record[1]]),
            channel,
        })
    }
}

pub struct SettingsStore<S: Storage> {
    storage: S,
}

impl<S: Storage> SettingsStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Loads the stored settings, falling back to the defaults (and trying to
    /// store them) when the record is missing, unreadable or invalid.
    pub fn load(&mut self) -> Settings {
        let stored = match self.storage.read() {
            Ok(Some(record)) => Settings::decode(&record),
            Ok(None) => None,
            Err(e) => {
                warn!("Could not read settings, using defaults: {}", e);
                None
            }
        };

        if let Some(settings) = stored {
            info!(
                "Loaded settings: tempo={} channel={}",
                settings.tempo, settings.channel
            );
            return settings;
        }

        let defaults = Settings::default();
        debug!("No valid settings record, storing defaults");
        if let Err(e) = self.save(defaults.tempo, defaults.channel) {
            warn!("Could not store default settings: {}", e);
        }
        defaults
    }

    pub fn save(&mut self, tempo: u16, channel: Channel) -> Result<()> {
        let record = Settings { tempo, channel }.encode();
        self.storage.write(&record)?;
        info!("Saved settings: tempo={} channel={}", tempo, channel);
        Ok(())
    }
}

/// Settings record kept in a file. Writes replace the file via rename.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("tmp")
    }
}

impl Storage for FileStorage {
    fn read(&mut self) -> Result<Option<Record>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::Read(e.to_string())),
        };

        let record: Record = bytes.as_slice().try_into().map_err(|_| {
            StorageError::Read(format!(
                "expected {} bytes in {}, found {}",
                RECORD_LEN,
                self.path.display(),
                bytes.len()
            ))
        })?;
        Ok(Some(record))
    }

    fn write(&mut self, record: &Record) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::Write(e.to_string()))?;
        }
        let temp = self.temp_path();
        fs::write(&temp, record).map_err(|e| StorageError::Write(e.to_string()))?;
        fs::rename(&temp, &self.path).map_err(|e| StorageError::Write(e.to_string()))
    }
}

#[derive(Debug, Default)]
struct MemoryCell {
    record: Option<Record>,
    fail_reads: bool,
    fail_writes: bool,
    writes: usize,
}

/// In-memory record. Clones share the same cell.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    cell: Arc<Mutex<MemoryCell>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: Record) -> Self {
        let storage = Self::new();
        storage.set_record(Some(record));
        storage
    }

    pub fn record(&self) -> Option<Record> {
        self.cell.lock().map(|cell| cell.record).unwrap_or(None)
    }

    pub fn set_record(&self, record: Option<Record>) {
        if let Ok(mut cell) = self.cell.lock() {
            cell.record = record;
        }
    }

    pub fn writes(&self) -> usize {
        self.cell.lock().map(|cell| cell.writes).unwrap_or(0)
    }

    pub fn fail_reads(&self, fail: bool) {
        if let Ok(mut cell) = self.cell.lock() {
            cell.fail_reads = fail;
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        if let Ok(mut cell) = self.cell.lock() {
            cell.fail_writes = fail;
        }
    }
}

impl Storage for MemoryStorage {
    fn read(&mut self) -> Result<Option<Record>> {
        let cell = self
            .cell
            .lock()
            .map_err(|e| StorageError::Read(e.to_string()))?;
        if cell.fail_reads {
            return Err(StorageError::Read("storage unavailable".to_string()));
        }
        Ok(cell.record)
    }

    fn write(&mut self, record: &Record) -> Result<()> {
        let mut cell = self
            .cell
            .lock()
            .map_err(|e| StorageError::Write(e.to_string()))?;
        if cell.fail_writes {
            return Err(StorageError::Write("storage unavailable".to_string()));
        }
        cell.record = Some(*record);
        cell.writes += 1;
        Ok(())
    }
}
