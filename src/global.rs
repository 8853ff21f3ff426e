//! Process-wide default logger.
//!
//! Nothing is global until asked for. [`default_logger`] installs a stdout
//! logger with default settings on first use; [`init`] replaces whatever is
//! installed. Loggers are cheap handles, so a clone obtained before a
//! reassignment keeps writing through the handler it was created with; only
//! later lookups see the new one.

use crate::classic::Classic;
use crate::error::LogError;
use crate::handler::Handler;
use crate::level::Level;
use crate::logger::Logger;
use crate::mode::RenderMode;
use crate::value::Value;
use once_cell::sync::Lazy;
use parking_lot::RwLock;

static DEFAULT: Lazy<RwLock<Option<Logger>>> = Lazy::new(|| RwLock::new(None));

/// Install `logger` as the default, returning the previous one.
pub fn init(logger: Logger) -> Option<Logger> {
    DEFAULT.write().replace(logger)
}

/// Remove the default. The next [`default_logger`] call installs a fresh one.
pub fn teardown() -> Option<Logger> {
    DEFAULT.write().take()
}

pub fn is_initialized() -> bool {
    DEFAULT.read().is_some()
}

/// The installed default, installing a stdout logger if there is none.
pub fn default_logger() -> Logger {
    if let Some(logger) = DEFAULT.read().as_ref() {
        return logger.clone();
    }
    DEFAULT
        .write()
        .get_or_insert_with(|| Logger::new(Handler::stdout()))
        .clone()
}

/// A classic logger on stdout with simplified rendering. It does not touch
/// the installed default.
pub fn default_classic() -> Classic {
    Classic::new(Handler::stdout().with_render(RenderMode::Simplified))
}

/// Log through the default logger.
#[track_caller]
pub fn log(level: Level, msg: &str, args: &[Value]) -> Result<(), LogError> {
    default_logger().log(level, msg, args)
}
