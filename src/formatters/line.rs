//! The line layout:
//!
//! ```text
//! [<time>] [<LEVEL>] <path>:<line> | "msg":"<message>" | "text":"<k1>=<v1> <k2>=<v2>"
//! ```
//!
//! The bracketed prefix follows the configured field order. Simplified mode
//! drops the labels and quotes; JSON encoding replaces the pair list with an
//! object.

use crate::buffer::Buffer;
use crate::caller::{is_internal_frame, CallSite, ProjectRoot};
use crate::colors::{ColorScale, RESET};
use crate::error::ConfigError;
use crate::formatters::{json, text, RecordFormatter, BAD_FIELD, BAD_TIME};
use crate::level::Level;
use crate::mode::{Encoding, Mode, RenderMode};
use crate::record::Record;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt::{self, Write as _};

/// `2024-01-02 15:04:05.000`
pub const DEFAULT_TIME_LAYOUT: &str = "%Y-%m-%d %H:%M:%S%.3f";
pub const DEFAULT_SEPARATOR: char = '|';

/// One entry of the field order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Time,
    Level,
    Position,
    /// Any other tag; renders as a placeholder
    Other(String),
}

impl FieldKind {
    pub fn defaults() -> Vec<FieldKind> {
        vec![FieldKind::Time, FieldKind::Level, FieldKind::Position]
    }

    pub fn as_str(&self) -> &str {
        match self {
            FieldKind::Time => "time",
            FieldKind::Level => "level",
            FieldKind::Position => "position",
            FieldKind::Other(tag) => tag,
        }
    }
}

impl From<&str> for FieldKind {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "time" => FieldKind::Time,
            "level" => FieldKind::Level,
            "position" | "pos" => FieldKind::Position,
            _ => FieldKind::Other(s.to_string()),
        }
    }
}

impl std::str::FromStr for FieldKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(FieldKind::from(s))
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FieldKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(FieldKind::from(s.as_str()))
    }
}

/// Check a strftime layout without formatting anything.
pub fn validate_time_layout(layout: &str) -> Result<(), ConfigError> {
    if StrftimeItems::new(layout).any(|item| matches!(item, Item::Error)) {
        return Err(ConfigError::InvalidTimeLayout(layout.to_string()));
    }
    Ok(())
}

/// Renders records as single lines.
#[derive(Debug, Clone)]
pub struct LineFormatter {
    fields: Vec<FieldKind>,
    time_layout: String,
    separator: char,
    abs_path: bool,
    project_root: Option<ProjectRoot>,
    colorful: bool,
    color_scale: ColorScale,
    mode: Mode,
}

impl Default for LineFormatter {
    fn default() -> Self {
        Self {
            fields: FieldKind::defaults(),
            time_layout: DEFAULT_TIME_LAYOUT.to_string(),
            separator: DEFAULT_SEPARATOR,
            abs_path: false,
            project_root: ProjectRoot::detect(),
            colorful: false,
            color_scale: ColorScale::new(),
            mode: Mode::default(),
        }
    }
}

impl LineFormatter {
    /// Default settings. The project root is the working directory at this
    /// call, captured once.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fields(&mut self, fields: Vec<FieldKind>) -> &mut Self {
        self.fields = fields;
        self
    }

    /// Panics on a layout chrono cannot render; use [`validate_time_layout`]
    /// first for untrusted input.
    pub fn set_time_layout(&mut self, layout: &str) -> &mut Self {
        if let Err(e) = validate_time_layout(layout) {
            panic!("{}", e);
        }
        self.time_layout = layout.to_string();
        self
    }

    pub fn set_separator(&mut self, separator: char) -> &mut Self {
        self.separator = separator;
        self
    }

    pub fn set_abs_path(&mut self, abs_path: bool) -> &mut Self {
        self.abs_path = abs_path;
        self
    }

    /// The root is fixed here; later working-directory changes do not
    /// affect it. `None` prints call-site paths unchanged.
    pub fn set_project_root(&mut self, root: Option<ProjectRoot>) -> &mut Self {
        self.project_root = root;
        self
    }

    pub fn set_colorful(&mut self, colorful: bool) -> &mut Self {
        self.colorful = colorful;
        self
    }

    pub fn set_color_scale(&mut self, scale: ColorScale) -> &mut Self {
        self.color_scale = scale;
        self
    }

    pub fn set_mode(&mut self, mode: Mode) -> &mut Self {
        self.mode = mode;
        self
    }

    pub fn mode_mut(&mut self) -> &mut Mode {
        &mut self.mode
    }

    pub fn fields(&self) -> &[FieldKind] {
        &self.fields
    }

    pub fn time_layout(&self) -> &str {
        &self.time_layout
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    pub fn abs_path(&self) -> bool {
        self.abs_path
    }

    pub fn is_colorful(&self) -> bool {
        self.colorful
    }

    pub fn color_scale(&self) -> &ColorScale {
        &self.color_scale
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    fn write_time(&self, buf: &mut Buffer, time: &DateTime<Local>) {
        buf.push_byte(b'[');
        let start = buf.len();
        if write!(buf, "{}", time.format(&self.time_layout)).is_err() {
            buf.truncate(start);
            buf.push_str(BAD_TIME);
        }
        buf.push_byte(b']');
    }

    /// Color wraps the brackets too: `<escape>[INFO]<reset>`.
    fn write_level(&self, buf: &mut Buffer, level: Level) {
        let name = level.name();
        if self.colorful {
            buf.push_str(&self.color_scale.escape_for(name));
        }
        buf.push_byte(b'[');
        buf.push_str(name);
        buf.push_byte(b']');
        if self.colorful {
            buf.push_str(RESET);
        }
    }

    fn write_position(&self, buf: &mut Buffer, call_site: &CallSite) {
        if is_internal_frame(&call_site.file) {
            panic!(
                "invalid handler usage: call site {}:{} is inside linelog; \
                 wrappers around the logger must be #[track_caller]",
                call_site.file, call_site.line
            );
        }
        match (&self.project_root, self.abs_path) {
            _ if call_site.is_unknown() => buf.push_str(&call_site.file),
            (Some(root), true) => buf.push_str(&root.absolute(&call_site.file)),
            (Some(root), false) => buf.push_str(&root.relative(&call_site.file)),
            (None, _) => buf.push_str(&call_site.file),
        }
        buf.push_byte(b':');
        buf.push_uint(call_site.line as u64);
    }

    fn write_separator(&self, buf: &mut Buffer) {
        let mut sep = [0u8; 4];
        buf.push_byte(b' ');
        buf.push_str(self.separator.encode_utf8(&mut sep));
        buf.push_byte(b' ');
    }

    fn write_message(&self, buf: &mut Buffer, message: &str) {
        match self.mode.render {
            RenderMode::Simplified => buf.push_str(message),
            RenderMode::Detailed => {
                buf.push_str("\"msg\":");
                json::write_quoted(buf, message);
            }
        }
    }
}

impl RecordFormatter for LineFormatter {
    fn format_record(&self, record: &Record, buf: &mut Buffer) {
        for (idx, field) in self.fields.iter().enumerate() {
            match field {
                FieldKind::Time => self.write_time(buf, record.time()),
                FieldKind::Level => self.write_level(buf, record.level()),
                FieldKind::Position => self.write_position(buf, record.call_site()),
                FieldKind::Other(_) => buf.push_str(BAD_FIELD),
            }
            if idx + 1 < self.fields.len() {
                buf.push_byte(b' ');
            }
        }

        if !self.fields.is_empty() {
            self.write_separator(buf);
        }
        self.write_message(buf, record.message());

        let attrs = record.attrs();
        if !attrs.is_empty() {
            self.write_separator(buf);
            match self.mode.encoding {
                Encoding::Text => text::write_attrs(buf, attrs, self.mode.render),
                Encoding::Json => json::write_attrs(buf, attrs, self.mode.render),
            }
        }

        buf.push_byte(b'\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::{ColorItem, ColorRepr, Rgb};
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
    }

    fn formatter(render: RenderMode, encoding: Encoding) -> LineFormatter {
        let mut f = LineFormatter::new();
        f.set_project_root(ProjectRoot::from_dir("/work/app"))
            .set_mode(Mode::new(render, encoding));
        f
    }

    fn record(level: Level, message: &str) -> Record {
        Record::new(level, message)
            .with_time(fixed_time())
            .with_call_site(CallSite::new("src/app.rs", 42))
    }

    fn person(level: Level) -> Record {
        record(level, "Personnel introduction")
            .with_attr("username", "John")
            .with_attr("age", 30)
    }

    #[test]
    fn test_simplified_text_no_attrs() {
        let f = formatter(RenderMode::Simplified, Encoding::Text);
        assert_eq!(
            f.format_to_string(&record(Level::Info, "hello")),
            "[2024-01-02 03:04:05.000] [INFO] app/src/app.rs:42 | hello\n"
        );
    }

    #[test]
    fn test_detailed_text_no_attrs() {
        let f = formatter(RenderMode::Detailed, Encoding::Text);
        assert_eq!(
            f.format_to_string(&record(Level::Warn, "disk \"sda\" full")),
            "[2024-01-02 03:04:05.000] [WARN] app/src/app.rs:42 | \"msg\":\"disk \\\"sda\\\" full\"\n"
        );
    }

    #[test]
    fn test_detailed_text_attrs() {
        let f = formatter(RenderMode::Detailed, Encoding::Text);
        let line = f.format_to_string(&person(Level::Info));
        assert_eq!(
            line,
            "[2024-01-02 03:04:05.000] [INFO] app/src/app.rs:42 | \"msg\":\"Personnel introduction\" | \"text\":\"username=John age=30\"\n"
        );
    }

    #[test]
    fn test_simplified_text_attrs() {
        let f = formatter(RenderMode::Simplified, Encoding::Text);
        let line = f.format_to_string(&person(Level::Debug));
        assert!(line.ends_with("| Personnel introduction | username=John age=30\n"));
    }

    #[test]
    fn test_json_attrs_in_both_renderings() {
        let detailed = formatter(RenderMode::Detailed, Encoding::Json);
        assert!(detailed
            .format_to_string(&person(Level::Info))
            .ends_with(" | \"text\":{\"username\":\"John\",\"age\":\"30\"}\n"));

        let simplified = formatter(RenderMode::Simplified, Encoding::Json);
        assert!(simplified
            .format_to_string(&person(Level::Info))
            .ends_with("| Personnel introduction | {\"username\":\"John\",\"age\":\"30\"}\n"));
    }

    #[test]
    fn test_empty_attrs_have_no_block_or_separator() {
        for render in [RenderMode::Simplified, RenderMode::Detailed] {
            for encoding in [Encoding::Text, Encoding::Json] {
                let line = formatter(render, encoding).format_to_string(&record(Level::Info, "m"));
                assert_eq!(line.matches(" | ").count(), 1, "{:?}/{:?}: {}", render, encoding, line);
                assert!(!line.contains("\"text\""));
            }
        }
    }

    #[test]
    fn test_empty_field_order_has_no_leading_separator() {
        let mut f = formatter(RenderMode::Simplified, Encoding::Text);
        f.set_fields(Vec::new());
        assert_eq!(f.format_to_string(&record(Level::Info, "hello")), "hello\n");

        let with_attrs = record(Level::Info, "hello").with_attr("k", "v");
        assert_eq!(f.format_to_string(&with_attrs), "hello | k=v\n");
    }

    #[test]
    fn test_field_order_is_respected() {
        let mut f = formatter(RenderMode::Simplified, Encoding::Text);
        f.set_fields(vec![FieldKind::Position, FieldKind::Level]);
        assert_eq!(
            f.format_to_string(&record(Level::Error, "boom")),
            "app/src/app.rs:42 [ERROR] | boom\n"
        );
    }

    #[test]
    fn test_unknown_field_renders_placeholder() {
        let mut f = formatter(RenderMode::Simplified, Encoding::Text);
        f.set_fields(vec![
            FieldKind::Level,
            "hostname".parse().unwrap(),
            FieldKind::Time,
        ]);
        assert_eq!(
            f.format_to_string(&record(Level::Info, "hi")),
            "[INFO] !BAD-BUILD-IN [2024-01-02 03:04:05.000] | hi\n"
        );
    }

    #[test]
    fn test_colored_level_wraps_brackets() {
        let mut f = formatter(RenderMode::Simplified, Encoding::Text);
        f.set_fields(vec![FieldKind::Level]).set_colorful(true);
        let expected_escape = Rgb(240, 55, 82).to_ansi_background();
        assert_eq!(
            f.format_to_string(&record(Level::Error, "x")),
            format!("{}[ERROR]{} | x\n", expected_escape, RESET)
        );
    }

    #[test]
    fn test_colored_level_without_scale_entry() {
        let mut f = formatter(RenderMode::Simplified, Encoding::Text);
        f.set_fields(vec![FieldKind::Level])
            .set_colorful(true)
            .set_color_scale(ColorScale::with_items(
                ColorRepr::Hex,
                vec![ColorItem::hex("ERROR", "#f03752")],
            ));
        assert_eq!(
            f.format_to_string(&record(Level::Info, "x")),
            format!("[INFO]{} | x\n", RESET)
        );
    }

    #[test]
    fn test_absolute_path_mode() {
        let mut f = formatter(RenderMode::Simplified, Encoding::Text);
        f.set_fields(vec![FieldKind::Position]).set_abs_path(true);
        assert_eq!(
            f.format_to_string(&record(Level::Info, "x")),
            "/work/app/src/app.rs:42 | x\n"
        );
    }

    #[test]
    fn test_unknown_call_site_is_not_joined_to_root() {
        let mut f = formatter(RenderMode::Simplified, Encoding::Text);
        f.set_fields(vec![FieldKind::Position]);
        let rec = record(Level::Info, "x").with_call_site(CallSite::unknown());
        assert_eq!(f.format_to_string(&rec), "<unknown>:0 | x\n");
        f.set_abs_path(true);
        assert_eq!(f.format_to_string(&rec), "<unknown>:0 | x\n");
    }

    #[test]
    fn test_custom_time_layout_and_separator() {
        let mut f = formatter(RenderMode::Simplified, Encoding::Text);
        f.set_fields(vec![FieldKind::Time])
            .set_time_layout("%H:%M")
            .set_separator('>');
        assert_eq!(f.format_to_string(&record(Level::Info, "x")), "[03:04] > x\n");
    }

    #[test]
    #[should_panic(expected = "Invalid time layout")]
    fn test_bad_time_layout_panics_at_setup() {
        let mut f = LineFormatter::new();
        f.set_time_layout("%Q");
    }

    #[test]
    fn test_validate_time_layout() {
        assert!(validate_time_layout(DEFAULT_TIME_LAYOUT).is_ok());
        assert!(validate_time_layout("%Y-%").is_err());
    }

    #[test]
    #[should_panic(expected = "invalid handler usage")]
    fn test_internal_call_site_panics() {
        let internal = std::path::Path::new(file!()).parent().unwrap().parent().unwrap().join("logger.rs");
        let f = formatter(RenderMode::Simplified, Encoding::Text);
        let rec = record(Level::Info, "x")
            .with_call_site(CallSite::new(internal.to_string_lossy(), 1));
        f.format_to_string(&rec);
    }

    #[test]
    fn test_field_kind_round_trip_names() {
        assert_eq!("TIME".parse::<FieldKind>().unwrap(), FieldKind::Time);
        assert_eq!("pos".parse::<FieldKind>().unwrap(), FieldKind::Position);
        assert_eq!(FieldKind::Other("x".into()).to_string(), "x");
    }
}
