//! Where formatted lines go.

use crate::error::ConfigError;
use crate::level::Level;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File name used inside a record directory
pub const RECORD_FILE: &str = "records.log";

/// Output sink for a handler.
///
/// In configuration files it is a single string: `stdout`, `stderr`, or a
/// directory for the record file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Destination {
    #[default]
    Stdout,
    Stderr,
    /// Append to `<dir>/records.log`, creating `dir` when missing
    File(PathBuf),
}

impl Destination {
    pub fn open(&self) -> Result<Box<dyn Write + Send>, ConfigError> {
        match self {
            Destination::Stdout => Ok(Box::new(io::stdout())),
            Destination::Stderr => Ok(Box::new(io::stderr())),
            Destination::File(dir) => Ok(Box::new(open_record_file(dir)?)),
        }
    }

    pub fn is_terminal(&self) -> bool {
        use is_terminal::IsTerminal;
        match self {
            Destination::Stdout => io::stdout().is_terminal(),
            Destination::Stderr => io::stderr().is_terminal(),
            Destination::File(_) => false,
        }
    }
}

impl From<String> for Destination {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "stdout" | "-" => Destination::Stdout,
            "stderr" => Destination::Stderr,
            _ => Destination::File(PathBuf::from(s)),
        }
    }
}

impl From<Destination> for String {
    fn from(dest: Destination) -> Self {
        match dest {
            Destination::Stdout => "stdout".to_string(),
            Destination::Stderr => "stderr".to_string(),
            Destination::File(dir) => dir.display().to_string(),
        }
    }
}

/// Record-file rule: a copy of every line at or above `trigger` is appended
/// to `<dir>/records.log`, next to the handler's main destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordFile {
    pub dir: PathBuf,
    #[serde(default = "RecordFile::default_trigger")]
    pub trigger: Level,
}

impl RecordFile {
    pub fn new(dir: impl Into<PathBuf>, trigger: Level) -> Self {
        Self {
            dir: dir.into(),
            trigger,
        }
    }

    fn default_trigger() -> Level {
        Level::Trace
    }

    pub fn should_record(&self, level: Level) -> bool {
        level.is_enabled(self.trigger)
    }

    pub fn open(&self) -> Result<File, ConfigError> {
        open_record_file(&self.dir)
    }
}

/// Open `<dir>/records.log` for appending.
pub fn open_record_file(dir: &Path) -> Result<File, ConfigError> {
    let path = dir.join(RECORD_FILE);
    let map_err = |source: io::Error| ConfigError::Destination {
        path: path.display().to_string(),
        source,
    };
    fs::create_dir_all(dir).map_err(map_err)?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(map_err)
}

/// In-memory sink whose clones share one byte vector.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    pub fn clear(&self) {
        self.bytes.lock().clear();
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
