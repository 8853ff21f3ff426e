//! Per-level logging calls.
//!
//! Every method is `#[track_caller]`, so the position field names the line
//! that called the logger. Wrappers around a [`Logger`] must be
//! `#[track_caller]` too; otherwise the handler panics with
//! "invalid handler usage" when it resolves the position.

use crate::error::LogError;
use crate::handler::Handler;
use crate::level::Level;
use crate::record::{Attrs, Context, Record};
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Logger {
    handler: Arc<Handler>,
}

impl Logger {
    pub fn new(handler: Handler) -> Self {
        Self::from_shared(Arc::new(handler))
    }

    pub fn from_shared(handler: Arc<Handler>) -> Self {
        Logger { handler }
    }

    pub fn handler(&self) -> &Arc<Handler> {
        &self.handler
    }

    pub fn enabled(&self, level: Level) -> bool {
        self.handler.enabled(level)
    }

    /// `args` alternate keys and values; see [`Attrs::from_args`].
    #[track_caller]
    pub fn log(&self, level: Level, msg: &str, args: &[Value]) -> Result<(), LogError> {
        self.log_ctx(&Context::background(), level, msg, args)
    }

    #[track_caller]
    pub fn log_ctx(
        &self,
        ctx: &Context,
        level: Level,
        msg: &str,
        args: &[Value],
    ) -> Result<(), LogError> {
        if !self.enabled(level) {
            return Ok(());
        }
        let record = Record::new(level, msg).with_attrs(Attrs::from_args(args));
        self.handler.handle(ctx, &record)
    }

    /// Formatted message, no attributes. Arguments are not formatted when
    /// `level` is disabled.
    #[track_caller]
    pub fn logf(&self, level: Level, args: fmt::Arguments<'_>) -> Result<(), LogError> {
        if !self.enabled(level) {
            return Ok(());
        }
        let record = Record::new(level, fmt::format(args));
        self.handler.handle(&Context::background(), &record)
    }
}

macro_rules! level_methods {
    ($($level:ident => $plain:ident, $fmt:ident, $ctx:ident;)+) => {
        impl Logger {
            $(
                #[track_caller]
                pub fn $plain(&self, msg: &str, args: &[Value]) -> Result<(), LogError> {
                    self.log(Level::$level, msg, args)
                }

                #[track_caller]
                pub fn $fmt(&self, args: fmt::Arguments<'_>) -> Result<(), LogError> {
                    self.logf(Level::$level, args)
                }

                #[track_caller]
                pub fn $ctx(&self, ctx: &Context, msg: &str, args: &[Value]) -> Result<(), LogError> {
                    self.log_ctx(ctx, Level::$level, msg, args)
                }
            )+
        }
    };
}

level_methods! {
    Trace => trace, tracef, trace_ctx;
    Debug => debug, debugf, debug_ctx;
    Info => info, infof, info_ctx;
    Notice => notice, noticef, notice_ctx;
    Warn => warn, warnf, warn_ctx;
    Error => error, errorf, error_ctx;
    Fatal => fatal, fatalf, fatal_ctx;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatters::line::FieldKind;
    use crate::mode::RenderMode;
    use crate::writer::SharedBuffer;

    // Positions are left out here: a call site inside this file is internal.
    fn logger(sink: &SharedBuffer, level: Level) -> Logger {
        Logger::new(
            Handler::new(sink.clone())
                .with_fields(vec![FieldKind::Level])
                .with_level(level),
        )
    }

    #[test]
    fn test_level_methods_tag_lines() {
        let sink = SharedBuffer::new();
        let log = logger(&sink, Level::Trace);
        log.trace("t", &[]).unwrap();
        log.debug("d", &[]).unwrap();
        log.info("i", &[]).unwrap();
        log.notice("n", &[]).unwrap();
        log.warn("w", &[]).unwrap();
        log.error("e", &[]).unwrap();
        let tags: Vec<String> = sink
            .lines()
            .iter()
            .map(|line| line.split(' ').next().unwrap_or_default().to_string())
            .collect();
        assert_eq!(
            tags,
            vec!["[TRACE]", "[DEBUG]", "[INFO]", "[NOTICE]", "[WARN]", "[ERROR]"]
        );
    }

    #[test]
    fn test_args_become_attributes() {
        let sink = SharedBuffer::new();
        let log = logger(&sink, Level::Debug);
        log.info("Personnel introduction", &crate::args!("username", "John", "age", 30))
            .unwrap();
        assert_eq!(
            sink.contents(),
            "[INFO] | \"msg\":\"Personnel introduction\" | \"text\":\"username=John age=30\"\n"
        );
    }

    #[test]
    fn test_non_string_key_is_marked() {
        let sink = SharedBuffer::new();
        let log = Logger::new(
            Handler::new(sink.clone())
                .with_fields(vec![])
                .with_render(RenderMode::Simplified),
        );
        log.warn("odd", &crate::args!(42, "k", "v")).unwrap();
        assert_eq!(sink.contents(), "odd | !BAD-KEY=42 k=v\n");
    }

    #[test]
    fn test_disabled_levels_skip_formatting() {
        struct Loud;
        impl fmt::Display for Loud {
            fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
                panic!("formatted a disabled record")
            }
        }
        let sink = SharedBuffer::new();
        let log = logger(&sink, Level::Warn);
        log.debugf(format_args!("{}", Loud)).unwrap();
        log.info("quiet", &[]).unwrap();
        assert_eq!(sink.contents(), "");
    }

    #[test]
    fn test_formatted_and_context_variants() {
        let sink = SharedBuffer::new();
        let log = Logger::new(
            Handler::new(sink.clone())
                .with_fields(vec![FieldKind::Level])
                .with_render(RenderMode::Simplified),
        );
        log.errorf(format_args!("{} of {}", 3, 4)).unwrap();
        let ctx = Context::background().with_value("trace", "abc");
        log.notice_ctx(&ctx, "with ctx", &crate::args!("ok", true)).unwrap();
        assert_eq!(sink.lines(), vec!["[ERROR] | 3 of 4", "[NOTICE] | with ctx | ok=true"]);
    }

    #[test]
    #[should_panic(expected = "invalid handler usage")]
    fn test_call_site_inside_facade_panics() {
        let log = Logger::new(Handler::new(std::io::sink()).with_fields(vec![FieldKind::Position]));
        let _ = log.info("x", &[]);
    }
}
