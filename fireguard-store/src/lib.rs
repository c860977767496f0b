//! File-Backed Calibration Storage
//!
//! ## Overview
//!
//! [`FileStore`] persists FireGuard calibration records on a host or Linux
//! gateway filesystem. Each key maps to one small text file holding the
//! record's comma-separated form:
//!
//! ```text
//! <dir>/smoke_cal_v1.txt      180,220,200,240,280,360
//! <dir>/gas_cal_v1.txt        290,310,300,330,360,400,420
//! <dir>/env_baseline_v1.txt   21.00,40.00,1001.50
//! ```
//!
//! The store knows nothing about record layouts. Parsing and validation stay
//! in `fireguard_core::calibration`; a corrupt file surfaces there as a
//! rejected record and the channel falls back to defaults.
//!
//! ## Write Strategy
//!
//! Records are written to `<key>.tmp` and renamed over `<key>.txt`. A crash
//! mid-write leaves the previous record intact instead of a truncated one.
//!
//! ## Errors
//!
//! Filesystem faults are reported as [`FileStoreError`] by the inherent
//! methods and collapsed to [`StoreError`] at the [`CalibrationStore`]
//! boundary, with the detail logged.
//!
//! ## Example Usage
//!
//! ```no_run
//! use fireguard_core::calibration::{self, SmokeCalibration};
//! use fireguard_store::FileStore;
//!
//! let mut store = FileStore::open("/var/lib/fireguard")?;
//! let cal = calibration::load::<SmokeCalibration, _>(&mut store)?;
//! println!("stored smoke calibration: {:?}", cal);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::{
    fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};

use fireguard_core::{errors::StoreResult, traits::RecordText, CalibrationStore, StoreError};
use log::{debug, warn};
use thiserror::Error;

/// Extension of committed records
const RECORD_EXTENSION: &str = "txt";

/// Extension of records being written
const PENDING_EXTENSION: &str = "tmp";

/// Filesystem store errors
#[derive(Debug, Error)]
pub enum FileStoreError {
    /// Filesystem call failed on `path`
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Key with characters outside `[a-z0-9_]`
    #[error("Invalid record key {0:?}")]
    InvalidKey(String),

    #[error("Record {0} is not valid UTF-8")]
    NotUtf8(String),

    /// Record longer than the core's record buffer
    #[error("Record {key} is {len} bytes, limit is {limit}")]
    TooLong { key: String, len: usize, limit: usize },
}

impl FileStoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl From<&FileStoreError> for StoreError {
    fn from(error: &FileStoreError) -> Self {
        match error {
            FileStoreError::Io { source, .. } => match source.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => StoreError::Unavailable,
                _ => StoreError::Io { reason: "filesystem error" },
            },
            FileStoreError::InvalidKey(_) => StoreError::Io { reason: "invalid key" },
            FileStoreError::NotUtf8(_) => StoreError::Io { reason: "record is not UTF-8" },
            FileStoreError::TooLong { .. } => StoreError::Capacity,
        }
    }
}

/// One text file per record key inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Use `dir`, creating it if needed
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, FileStoreError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| FileStoreError::io(dir, e))?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Directory holding the records
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the committed record for `key`
    ///
    /// Keys are restricted to `[a-z0-9_]` so they can never name a file
    /// outside the store directory.
    pub fn record_path(&self, key: &str) -> Result<PathBuf, FileStoreError> {
        let valid = !key.is_empty()
            && key
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_');
        if !valid {
            return Err(FileStoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(key).with_extension(RECORD_EXTENSION))
    }

    /// Record text for `key`, `None` when never written
    pub fn read_record(&self, key: &str) -> Result<Option<String>, FileStoreError> {
        let path = self.record_path(key)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(FileStoreError::io(&path, e)),
        };
        let text = String::from_utf8(bytes).map_err(|_| FileStoreError::NotUtf8(key.to_string()))?;
        Ok(Some(text.trim_end().to_string()))
    }

    /// Replace the record for `key`
    pub fn write_record(&self, key: &str, text: &str) -> Result<(), FileStoreError> {
        let path = self.record_path(key)?;
        let pending = path.with_extension(PENDING_EXTENSION);

        fs::write(&pending, format!("{text}\n")).map_err(|e| FileStoreError::io(&pending, e))?;
        fs::rename(&pending, &path).map_err(|e| FileStoreError::io(&path, e))?;

        debug!("store: wrote {} ({} bytes)", path.display(), text.len());
        Ok(())
    }

    /// Delete the record for `key`; `false` when there was none
    pub fn remove(&self, key: &str) -> Result<bool, FileStoreError> {
        let path = self.record_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(FileStoreError::io(&path, e)),
        }
    }
}

impl CalibrationStore for FileStore {
    fn read(&mut self, key: &str) -> StoreResult<Option<RecordText>> {
        let text = match self.read_record(key) {
            Ok(Some(text)) => text,
            Ok(None) => return Ok(None),
            Err(e) => {
                warn!("store: reading {} failed: {}", key, e);
                return Err(StoreError::from(&e));
            }
        };

        let mut record = RecordText::new();
        if record.push_str(&text).is_err() {
            let e = FileStoreError::TooLong {
                key: key.to_string(),
                len: text.len(),
                limit: record.capacity(),
            };
            warn!("store: {}", e);
            return Err(StoreError::from(&e));
        }
        Ok(Some(record))
    }

    fn write(&mut self, key: &str, text: &str) -> StoreResult<()> {
        self.write_record(key, text).map_err(|e| {
            warn!("store: writing {} failed: {}", key, e);
            StoreError::from(&e)
        })
    }
}
