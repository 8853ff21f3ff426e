//! Format, write, and the fatal path.

use crate::buffer::BufferPool;
use crate::caller::ProjectRoot;
use crate::colors::{ColorScale, Theme};
use crate::config::{HandlerConfig, DEFAULT_EXIT_CODE};
use crate::error::{ConfigError, LogError};
use crate::formatters::line::{FieldKind, LineFormatter};
use crate::formatters::RecordFormatter;
use crate::level::Level;
use crate::mode::{Encoding, Mode, RenderMode};
use crate::record::{Context, Record};
use crate::tty::should_use_colors;
use crate::writer::RecordFile;
use parking_lot::Mutex;
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

/// Runs once for a fatal record, before the process exits. Its error is
/// reported on stderr and otherwise ignored.
pub type FatalHook = Arc<dyn Fn(&Context, &Record) -> anyhow::Result<()> + Send + Sync>;

/// Terminates after a fatal record.
pub type ExitFn = fn(i32) -> !;

fn no_hook() -> FatalHook {
    Arc::new(|_: &Context, _: &Record| -> anyhow::Result<()> { Ok(()) })
}

/// Second sink that only receives records at or above `trigger`.
struct RecordCopy {
    trigger: Level,
    writer: Mutex<Box<dyn Write + Send>>,
}

/// Owns the destination and the formatting settings. Share it with `Arc`.
pub struct Handler {
    formatter: LineFormatter,
    level: Level,
    exit_code: i32,
    on_fatal: FatalHook,
    exit: ExitFn,
    pool: BufferPool,
    writer: Mutex<Box<dyn Write + Send>>,
    record_copy: Option<RecordCopy>,
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("formatter", &self.formatter)
            .field("level", &self.level)
            .field("exit_code", &self.exit_code)
            .field("record_trigger", &self.record_copy.as_ref().map(|copy| copy.trigger))
            .finish_non_exhaustive()
    }
}

impl Handler {
    /// Default settings: time, level and position fields, detailed text,
    /// Debug and above, no color, exit code 1.
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self::from_boxed(Box::new(writer))
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    fn from_boxed(writer: Box<dyn Write + Send>) -> Self {
        Handler {
            formatter: LineFormatter::new(),
            level: Level::Debug,
            exit_code: DEFAULT_EXIT_CODE,
            on_fatal: no_hook(),
            exit: std::process::exit,
            pool: BufferPool::new(),
            writer: Mutex::new(writer),
            record_copy: None,
        }
    }

    /// Open the configured destination and apply every setting.
    pub fn from_config(config: &HandlerConfig) -> Result<Self, LogError> {
        let writer = config.destination.open()?;
        let colorful = should_use_colors(config.color, &config.destination);
        let mut handler = Self::with_config(config, writer)?;
        handler.formatter.set_colorful(colorful);
        Ok(handler)
    }

    /// Apply `config` to a caller-supplied writer; `destination` is ignored
    /// and `color: null` means no color. A `record` rule still opens its file.
    pub fn with_config(
        config: &HandlerConfig,
        writer: Box<dyn Write + Send>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut handler = Self::from_boxed(writer);
        handler
            .formatter
            .set_fields(config.fields.clone())
            .set_time_layout(&config.time_format)
            .set_separator(config.separator)
            .set_abs_path(config.abs_path)
            .set_colorful(config.color.unwrap_or(false))
            .set_color_scale(config.color_scale()?)
            .set_mode(config.mode());
        handler.level = config.level;
        handler.exit_code = config.exit_code;
        match &config.record {
            Some(rule) => handler.with_record_file(rule),
            None => Ok(handler),
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_fields(mut self, fields: Vec<FieldKind>) -> Self {
        self.formatter.set_fields(fields);
        self
    }

    /// Panics on a layout chrono cannot render.
    pub fn with_time_layout(mut self, layout: &str) -> Self {
        self.formatter.set_time_layout(layout);
        self
    }

    pub fn with_separator(mut self, separator: char) -> Self {
        self.formatter.set_separator(separator);
        self
    }

    pub fn with_abs_path(mut self, abs_path: bool) -> Self {
        self.formatter.set_abs_path(abs_path);
        self
    }

    /// Replace the root captured when the handler was built.
    pub fn with_project_root(mut self, root: Option<ProjectRoot>) -> Self {
        self.formatter.set_project_root(root);
        self
    }

    pub fn with_colorful(mut self, colorful: bool) -> Self {
        self.formatter.set_colorful(colorful);
        self
    }

    pub fn with_color_scale(mut self, scale: ColorScale) -> Self {
        self.formatter.set_color_scale(scale);
        self
    }

    pub fn with_theme(self, theme: Theme) -> Self {
        self.with_color_scale(ColorScale::from_theme(theme))
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.formatter.set_mode(mode);
        self
    }

    pub fn with_render(mut self, render: RenderMode) -> Self {
        self.formatter.mode_mut().set_render(render);
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.formatter.mode_mut().set_encoding(encoding);
        self
    }

    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    /// Also append lines at or above `rule.trigger` to `<rule.dir>/records.log`.
    /// The copy carries the same bytes as the main line, color escapes included.
    pub fn with_record_file(self, rule: &RecordFile) -> Result<Self, ConfigError> {
        let file = rule.open()?;
        Ok(self.with_record_writer(rule.trigger, file))
    }

    /// Like [`Handler::with_record_file`] with a caller-supplied writer.
    pub fn with_record_writer(mut self, trigger: Level, writer: impl Write + Send + 'static) -> Self {
        self.record_copy = Some(RecordCopy {
            trigger,
            writer: Mutex::new(Box::new(writer)),
        });
        self
    }

    pub fn with_fatal_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Context, &Record) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_fatal = Arc::new(hook);
        self
    }

    /// Replace `std::process::exit` on the fatal path, e.g. with a function
    /// that panics so an embedding test harness can observe the exit.
    pub fn with_exit_handler(mut self, exit: ExitFn) -> Self {
        self.exit = exit;
        self
    }

    pub fn set_level(&mut self, level: Level) -> &mut Self {
        self.level = level;
        self
    }

    pub fn set_exit_code(&mut self, code: i32) -> &mut Self {
        self.exit_code = code;
        self
    }

    pub fn set_fatal_hook<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&Context, &Record) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_fatal = Arc::new(hook);
        self
    }

    pub fn formatter_mut(&mut self) -> &mut LineFormatter {
        &mut self.formatter
    }

    /// Switch between relative and absolute positions.
    pub fn toggle_path(&mut self) -> &mut Self {
        let abs = self.formatter.abs_path();
        self.formatter.set_abs_path(!abs);
        self
    }

    pub fn toggle_render(&mut self) -> &mut Self {
        self.formatter.mode_mut().toggle_render();
        self
    }

    pub fn toggle_encoding(&mut self) -> &mut Self {
        self.formatter.mode_mut().toggle_encoding();
        self
    }

    pub fn toggle_colorful(&mut self) -> &mut Self {
        let colorful = self.formatter.is_colorful();
        self.formatter.set_colorful(!colorful);
        self
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    pub fn formatter(&self) -> &LineFormatter {
        &self.formatter
    }

    pub fn enabled(&self, level: Level) -> bool {
        level.is_enabled(self.level)
    }

    /// Write one record.
    ///
    /// A fatal record never returns: the line is written and flushed, the
    /// hook runs, and the process exits with the configured code.
    pub fn handle(&self, ctx: &Context, record: &Record) -> Result<(), LogError> {
        if !self.enabled(record.level()) {
            return Ok(());
        }
        let fatal = record.level() == Level::Fatal;

        let mut buf = self.pool.acquire();
        self.formatter.format_record(record, &mut buf);
        let written = self.write_line(buf.as_bytes(), fatal);
        let copied = self.copy_line(record.level(), buf.as_bytes(), fatal);
        drop(buf);

        if fatal {
            self.terminate(ctx, record);
        }
        written.and(copied)
    }

    pub fn flush(&self) -> Result<(), LogError> {
        self.writer.lock().flush()?;
        if let Some(copy) = &self.record_copy {
            copy.writer.lock().flush()?;
        }
        Ok(())
    }

    fn write_line(&self, line: &[u8], flush: bool) -> Result<(), LogError> {
        let mut writer = self.writer.lock();
        writer.write_all(line)?;
        if flush {
            writer.flush()?;
        }
        Ok(())
    }

    fn copy_line(&self, level: Level, line: &[u8], flush: bool) -> Result<(), LogError> {
        let Some(copy) = &self.record_copy else {
            return Ok(());
        };
        if !level.is_enabled(copy.trigger) {
            return Ok(());
        }
        let mut writer = copy.writer.lock();
        writer.write_all(line)?;
        if flush {
            writer.flush()?;
        }
        Ok(())
    }

    fn terminate(&self, ctx: &Context, record: &Record) -> ! {
        if let Err(e) = (self.on_fatal)(ctx, record) {
            eprintln!("linelog: fatal hook failed: {:#}", e);
        }
        (self.exit)(self.exit_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caller::CallSite;
    use crate::colors::{ColorItem, ColorRepr, Rgb, RESET};
    use crate::writer::SharedBuffer;
    use chrono::{Local, TimeZone};
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn exit_by_panic(code: i32) -> ! {
        panic!("exit({})", code)
    }

    fn record(level: Level, message: &str) -> Record {
        Record::new(level, message)
            .with_time(Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap())
            .with_call_site(CallSite::new("src/app.rs", 7))
    }

    fn handler(sink: &SharedBuffer) -> Handler {
        Handler::new(sink.clone())
            .with_fields(vec![FieldKind::Level])
            .with_render(RenderMode::Simplified)
    }

    #[test]
    fn test_writes_one_line_per_record() {
        let sink = SharedBuffer::new();
        let h = handler(&sink);
        h.handle(&Context::background(), &record(Level::Info, "a")).unwrap();
        h.handle(&Context::background(), &record(Level::Warn, "b")).unwrap();
        assert_eq!(sink.lines(), vec!["[INFO] | a", "[WARN] | b"]);
    }

    #[test]
    fn test_records_below_minimum_are_dropped() {
        let sink = SharedBuffer::new();
        let h = handler(&sink).with_level(Level::Warn);
        for level in Level::ALL {
            if level != Level::Fatal {
                h.handle(&Context::background(), &record(level, "x")).unwrap();
            }
        }
        assert_eq!(sink.lines(), vec!["[WARN] | x", "[ERROR] | x"]);
        assert!(!h.enabled(Level::Notice));
        assert!(h.enabled(Level::Warn));
    }

    #[test]
    fn test_fatal_writes_runs_hook_once_and_exits() {
        let sink = SharedBuffer::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let h = handler(&sink)
            .with_exit_code(7)
            .with_exit_handler(exit_by_panic)
            .with_fatal_hook(move |ctx, rec| {
                seen.fetch_add(1, Ordering::SeqCst);
                assert_eq!(ctx.value("request").map(|v| v.to_string()), Some("r1".to_string()));
                assert_eq!(rec.message(), "boom");
                Ok(())
            });
        let ctx = Context::background().with_value("request", "r1");

        let err = catch_unwind(AssertUnwindSafe(|| {
            let _ = h.handle(&ctx, &record(Level::Fatal, "boom"));
        }))
        .unwrap_err();

        assert_eq!(err.downcast_ref::<String>().map(String::as_str), Some("exit(7)"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(sink.lines(), vec!["[FATAL] | boom"]);
    }

    #[test]
    fn test_failing_hook_still_exits() {
        let sink = SharedBuffer::new();
        let h = handler(&sink)
            .with_exit_handler(exit_by_panic)
            .with_fatal_hook(|_, _| Err(anyhow::anyhow!("hook broke")));

        let err = catch_unwind(AssertUnwindSafe(|| {
            let _ = h.handle(&Context::background(), &record(Level::Fatal, "boom"));
        }))
        .unwrap_err();

        assert_eq!(err.downcast_ref::<String>().map(String::as_str), Some("exit(1)"));
        assert_eq!(sink.lines().len(), 1);
    }

    #[test]
    fn test_toggles() {
        let mut h = Handler::new(io::sink());
        h.toggle_path().toggle_render().toggle_encoding().toggle_colorful();
        assert!(h.formatter().abs_path());
        assert!(h.formatter().is_colorful());
        assert_eq!(
            h.formatter().mode(),
            Mode::new(RenderMode::Simplified, Encoding::Json)
        );
        h.toggle_render();
        assert_eq!(h.formatter().mode().render, RenderMode::Detailed);
    }

    #[test]
    fn test_with_config_applies_settings() {
        let sink = SharedBuffer::new();
        let config = HandlerConfig {
            fields: vec![FieldKind::Time, FieldKind::Level],
            time_format: "%H:%M".to_string(),
            separator: '>',
            render: RenderMode::Simplified,
            encoding: Encoding::Json,
            level: Level::Info,
            exit_code: 9,
            ..HandlerConfig::default()
        };
        let h = Handler::with_config(&config, Box::new(sink.clone())).unwrap();
        assert_eq!(h.exit_code(), 9);
        h.handle(&Context::background(), &record(Level::Debug, "hidden")).unwrap();
        h.handle(
            &Context::background(),
            &record(Level::Info, "shown").with_attr("k", 1),
        )
        .unwrap();
        assert_eq!(sink.contents(), "[03:04] [INFO] > shown > {\"k\":\"1\"}\n");
    }

    #[test]
    fn test_with_config_rejects_bad_layout() {
        let config = HandlerConfig {
            time_format: "%Q".to_string(),
            ..HandlerConfig::default()
        };
        let err = Handler::with_config(&config, Box::new(io::sink())).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeLayout(_)));
    }

    #[test]
    fn test_record_copy_only_gets_lines_at_trigger() {
        let sink = SharedBuffer::new();
        let copy = SharedBuffer::new();
        let h = handler(&sink).with_record_writer(Level::Warn, copy.clone());
        for level in [Level::Debug, Level::Info, Level::Warn, Level::Error] {
            h.handle(&Context::background(), &record(level, "x")).unwrap();
        }
        assert_eq!(sink.lines().len(), 4);
        assert_eq!(copy.lines(), vec!["[WARN] | x", "[ERROR] | x"]);
    }

    #[test]
    fn test_record_rule_from_config_appends_to_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let sink = SharedBuffer::new();
        let config = HandlerConfig {
            fields: vec![FieldKind::Level],
            render: RenderMode::Simplified,
            record: Some(RecordFile::new(tmp.path().join("logs"), Level::Error)),
            ..HandlerConfig::default()
        };
        let h = Handler::with_config(&config, Box::new(sink.clone())).unwrap();
        h.handle(&Context::background(), &record(Level::Info, "kept local")).unwrap();
        h.handle(&Context::background(), &record(Level::Error, "recorded")).unwrap();
        h.flush().unwrap();

        let recorded =
            std::fs::read_to_string(tmp.path().join("logs").join(crate::writer::RECORD_FILE)).unwrap();
        assert_eq!(recorded, "[ERROR] | recorded\n");
        assert_eq!(sink.lines(), vec!["[INFO] | kept local", "[ERROR] | recorded"]);
    }

    #[test]
    #[should_panic(expected = "invalid hexadecimal color code")]
    fn test_malformed_hex_scale_fails_during_setup() {
        let _ = Handler::new(io::sink()).with_colorful(true).with_color_scale(
            ColorScale::with_items(ColorRepr::Hex, vec![ColorItem::hex("INFO", "red")]),
        );
    }

    #[test]
    fn test_hex_scale_colors_handled_records() {
        let sink = SharedBuffer::new();
        let h = handler(&sink).with_colorful(true).with_color_scale(ColorScale::with_items(
            ColorRepr::Hex,
            vec![ColorItem::hex("INFO", "#f03752")],
        ));
        h.handle(&Context::background(), &record(Level::Info, "x")).unwrap();
        assert_eq!(
            sink.contents(),
            format!("{}[INFO]{} | x\n", Rgb(240, 55, 82).to_ansi_background(), RESET)
        );
    }

    #[test]
    fn test_write_error_is_returned() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }
        let h = Handler::new(Broken).with_fields(Vec::new());
        let err = h.handle(&Context::background(), &record(Level::Info, "x")).unwrap_err();
        assert!(matches!(err, LogError::Io(_)));
    }
}
