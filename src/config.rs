use crate::colors::{ColorItem, ColorRepr, ColorScale, Theme};
use crate::error::ConfigError;
use crate::formatters::line::{validate_time_layout, FieldKind, DEFAULT_SEPARATOR, DEFAULT_TIME_LAYOUT};
use crate::level::Level;
use crate::mode::{Encoding, Mode, RenderMode};
use crate::writer::{Destination, RecordFile};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Exit status used after a fatal record unless configured otherwise
pub const DEFAULT_EXIT_CODE: i32 = 1;

/// One custom palette entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub level: String,
    /// `#rrggbb`
    pub color: String,
}

/// Handler settings as read from a YAML or JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HandlerConfig {
    pub fields: Vec<FieldKind>,
    pub level: Level,
    pub time_format: String,
    pub abs_path: bool,
    /// `None` colors only when the destination is a terminal
    pub color: Option<bool>,
    pub theme: Theme,
    /// Replaces the theme when non-empty
    pub palette: Vec<PaletteEntry>,
    pub render: RenderMode,
    pub encoding: Encoding,
    pub separator: char,
    pub exit_code: i32,
    pub destination: Destination,
    /// Extra copy of lines at or above a trigger level in `<dir>/records.log`
    pub record: Option<RecordFile>,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        HandlerConfig {
            fields: FieldKind::defaults(),
            level: Level::Debug,
            time_format: DEFAULT_TIME_LAYOUT.to_string(),
            abs_path: false,
            color: Some(false),
            theme: Theme::default(),
            palette: Vec::new(),
            render: RenderMode::Detailed,
            encoding: Encoding::Text,
            separator: DEFAULT_SEPARATOR,
            exit_code: DEFAULT_EXIT_CODE,
            destination: Destination::Stdout,
            record: None,
        }
    }
}

impl HandlerConfig {
    /// Second-resolution timestamps, colored arco levels.
    pub fn dev() -> Self {
        HandlerConfig {
            time_format: "%Y-%m-%d %H:%M:%S".to_string(),
            color: Some(true),
            theme: Theme::Arco,
            ..Self::default()
        }
    }

    /// Default layout, Info and above.
    pub fn prod() -> Self {
        HandlerConfig {
            level: Level::Info,
            ..Self::default()
        }
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: HandlerConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: HandlerConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// `.json` files are read as JSON, anything else as YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::Parse(format!("cannot read '{}': {}", path.display(), e))
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_str(&text),
            _ => Self::from_yaml_str(&text),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_time_layout(&self.time_format)?;
        self.color_scale()?;
        Ok(())
    }

    pub fn mode(&self) -> Mode {
        Mode::new(self.render, self.encoding)
    }

    /// The custom palette if one is given, otherwise the theme.
    pub fn color_scale(&self) -> Result<ColorScale, ConfigError> {
        if self.palette.is_empty() {
            return Ok(ColorScale::from_theme(self.theme));
        }
        let items = self
            .palette
            .iter()
            .map(|entry| ColorItem::try_hex(&entry.level, &entry.color))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ColorScale::with_items(ColorRepr::Hex, items))
    }
}
