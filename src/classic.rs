//! Chained-call logging: `classic.info().str("loaded").int(3).emit()`.

use crate::error::LogError;
use crate::handler::Handler;
use crate::level::Level;
use crate::record::{Context, Record};
use std::fmt::{self, Write as _};
use std::sync::Arc;

/// Joins appended segments
pub const SEGMENT_SEPARATOR: &str = " - ";

/// Rendered by [`ClassicEntry::ctx`] when the key is missing
pub const MISSING_CONTEXT_VALUE: &str = "<none>";

#[derive(Debug, Clone)]
pub struct Classic {
    handler: Arc<Handler>,
}

impl Classic {
    pub fn new(handler: Handler) -> Self {
        Self::from_shared(Arc::new(handler))
    }

    pub fn from_shared(handler: Arc<Handler>) -> Self {
        Classic { handler }
    }

    pub fn handler(&self) -> &Arc<Handler> {
        &self.handler
    }

    /// Start an empty entry at `level`.
    pub fn level(&self, level: Level) -> ClassicEntry<'_> {
        ClassicEntry {
            classic: self,
            level,
            message: None,
            context: None,
        }
    }

    pub fn trace(&self) -> ClassicEntry<'_> {
        self.level(Level::Trace)
    }

    pub fn debug(&self) -> ClassicEntry<'_> {
        self.level(Level::Debug)
    }

    pub fn info(&self) -> ClassicEntry<'_> {
        self.level(Level::Info)
    }

    pub fn notice(&self) -> ClassicEntry<'_> {
        self.level(Level::Notice)
    }

    pub fn warn(&self) -> ClassicEntry<'_> {
        self.level(Level::Warn)
    }

    pub fn error(&self) -> ClassicEntry<'_> {
        self.level(Level::Error)
    }

    pub fn fatal(&self) -> ClassicEntry<'_> {
        self.level(Level::Fatal)
    }
}

/// A message under construction. Each chained call appends one segment.
#[must_use = "an entry does nothing until `emit` is called"]
#[derive(Debug)]
pub struct ClassicEntry<'a> {
    classic: &'a Classic,
    level: Level,
    message: Option<String>,
    context: Option<Context>,
}

impl ClassicEntry<'_> {
    pub fn str(self, s: &str) -> Self {
        self.segment(format_args!("{}", s))
    }

    pub fn strf(self, args: fmt::Arguments<'_>) -> Self {
        self.segment(args)
    }

    pub fn int(self, i: i64) -> Self {
        self.segment(format_args!("{}", i))
    }

    pub fn err(self, err: &(dyn std::error::Error + '_)) -> Self {
        self.segment(format_args!("{}", err))
    }

    pub fn obj(self, obj: &dyn fmt::Display) -> Self {
        self.segment(format_args!("{}", obj))
    }

    /// Append the value stored under `key`. The context is also the one the
    /// fatal hook sees.
    pub fn ctx(self, ctx: &Context, key: &str) -> Self {
        let value = ctx
            .value(key)
            .map_or_else(|| MISSING_CONTEXT_VALUE.to_string(), |v| v.to_string());
        let mut entry = self.segment(format_args!("{}", value));
        entry.context = Some(ctx.clone());
        entry
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// Text accumulated so far.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Log the accumulated message. Nothing is logged if nothing was appended.
    #[track_caller]
    pub fn emit(self) -> Result<(), LogError> {
        let Some(message) = self.message else {
            return Ok(());
        };
        let handler = &self.classic.handler;
        if !handler.enabled(self.level) {
            return Ok(());
        }
        let record = Record::new(self.level, message);
        let ctx = self.context.unwrap_or_default();
        handler.handle(&ctx, &record)
    }

    fn segment(mut self, args: fmt::Arguments<'_>) -> Self {
        if let Some(message) = self.message.as_mut() {
            message.push_str(SEGMENT_SEPARATOR);
        }
        let message = self.message.get_or_insert_with(String::new);
        // Writing into a String cannot fail
        let _ = message.write_fmt(args);
        self
    }
}
