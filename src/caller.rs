//! Call-site capture and path rendering for the position field.

use std::ffi::OsStr;
use std::panic::Location;
use std::path::{Path, PathBuf};

const UNKNOWN_FILE: &str = "<unknown>";

/// Source position a record was logged from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub file: String,
    pub line: u32,
}

impl CallSite {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// Position of the nearest caller not marked `#[track_caller]`.
    #[track_caller]
    pub fn caller() -> Self {
        Self::from_location(Location::caller())
    }

    pub fn from_location(location: &Location<'_>) -> Self {
        Self::new(location.file(), location.line())
    }

    /// Placeholder for records without source information, e.g. from the
    /// `log` bridge. Rendered as-is, never joined to the project root.
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_FILE, 0)
    }

    pub fn is_unknown(&self) -> bool {
        self.file == UNKNOWN_FILE && self.line == 0
    }
}

/// Facade sources that must never appear as a record's call site. Seeing one
/// means a wrapper dropped `#[track_caller]` somewhere in the chain.
const FACADE_SOURCES: [&str; 3] = ["logger.rs", "classic.rs", "global.rs"];

pub fn is_internal_frame(file: &str) -> bool {
    let Some(src_dir) = Path::new(file!()).parent() else {
        return false;
    };
    FACADE_SOURCES
        .iter()
        .any(|name| Path::new(file) == src_dir.join(name))
}

/// Directory positions are reported relative to, plus its base name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRoot {
    dir: PathBuf,
    name: String,
}

impl ProjectRoot {
    /// The current working directory, if it can be read.
    pub fn detect() -> Option<Self> {
        let dir = std::env::current_dir().ok()?;
        Self::from_dir(dir)
    }

    pub fn from_dir(dir: impl Into<PathBuf>) -> Option<Self> {
        let dir = dir.into();
        let name = dir.file_name()?.to_str()?.to_string();
        Some(Self { dir, name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `file` starting at the project directory name, e.g. `app/src/main.rs`.
    pub fn relative(&self, file: &str) -> String {
        let path = Path::new(file);
        if path.is_relative() {
            return Path::new(&self.name).join(path).to_string_lossy().into_owned();
        }

        let components: Vec<_> = path.components().collect();
        match components
            .iter()
            .position(|c| c.as_os_str() == OsStr::new(&self.name))
        {
            Some(start) => components[start..]
                .iter()
                .collect::<PathBuf>()
                .to_string_lossy()
                .into_owned(),
            None => file.to_string(),
        }
    }

    pub fn absolute(&self, file: &str) -> String {
        let path = Path::new(file);
        if path.is_absolute() {
            file.to_string()
        } else {
            self.dir.join(path).to_string_lossy().into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_captures_this_file() {
        let site = CallSite::caller();
        assert!(site.file.ends_with("caller.rs"));
        assert!(site.line > 0);
    }

    #[test]
    fn test_internal_frames() {
        let src_dir = Path::new(file!()).parent().unwrap();
        let logger = src_dir.join("logger.rs");
        assert!(is_internal_frame(logger.to_str().unwrap()));
        assert!(!is_internal_frame("tests/logger.rs"));
        assert!(!is_internal_frame(file!()));
    }

    #[test]
    fn test_relative_paths() {
        let root = ProjectRoot::from_dir("/work/app").unwrap();
        assert_eq!(root.name(), "app");
        assert_eq!(root.relative("src/main.rs"), "app/src/main.rs");
        assert_eq!(root.relative("/work/app/src/main.rs"), "app/src/main.rs");
        assert_eq!(root.relative("/elsewhere/lib.rs"), "/elsewhere/lib.rs");
    }

    #[test]
    fn test_absolute_paths() {
        let root = ProjectRoot::from_dir("/work/app").unwrap();
        assert_eq!(root.absolute("src/main.rs"), "/work/app/src/main.rs");
        assert_eq!(root.absolute("/opt/x.rs"), "/opt/x.rs");
    }

    #[test]
    fn test_root_without_name() {
        assert_eq!(ProjectRoot::from_dir("/"), None);
    }
}
