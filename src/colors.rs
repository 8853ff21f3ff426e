//! Level color scales and their ANSI 256-color background escapes.

use serde::{Deserialize, Serialize};

/// Reset sequence written after a colored level tag
pub const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorError {
    #[error("hex color must be 7 characters starting with '#', got '{0}'")]
    HexFormat(String),

    #[error("invalid hex digits in '{0}'")]
    HexDigits(String),
}

/// An RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parse `#RRGGBB`.
    pub fn from_hex(hex: &str) -> Result<Rgb, ColorError> {
        if hex.len() != 7 || !hex.starts_with('#') {
            return Err(ColorError::HexFormat(hex.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            hex.get(range)
                .and_then(|digits| u8::from_str_radix(digits, 16).ok())
                .ok_or_else(|| ColorError::HexDigits(hex.to_string()))
        };
        Ok(Rgb(channel(1..3)?, channel(3..5)?, channel(5..7)?))
    }

    /// Index of the nearest entry in the 6x6x6 cube of the 256-color palette.
    pub fn ansi_index(self) -> u8 {
        let q = |c: u8| (c as u16 * 6 / 256) as u8;
        16 + 36 * q(self.0) + 6 * q(self.1) + q(self.2)
    }

    pub fn to_ansi_background(self) -> String {
        format!("\x1b[48;5;{}m", self.ansi_index())
    }
}

/// Which representation of a [`ColorItem`] a scale uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorRepr {
    Rgb,
    Hex,
}

/// A `#RRGGBB` code, parsed once when it is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexColor {
    code: String,
    rgb: Rgb,
}

impl HexColor {
    pub fn parse(code: &str) -> Result<HexColor, ColorError> {
        let rgb = Rgb::from_hex(code)?;
        Ok(HexColor {
            code: code.to_string(),
            rgb,
        })
    }

    /// The code as written.
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn rgb(&self) -> Rgb {
        self.rgb
    }
}

/// Color for one level name. Hex codes are validated when the item is built,
/// so a scale can never hold a color it cannot render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorItem {
    level: String,
    rgb: Option<Rgb>,
    hex: Option<HexColor>,
}

impl ColorItem {
    pub fn rgb(level: &str, r: u8, g: u8, b: u8) -> Self {
        Self {
            level: level.to_string(),
            rgb: Some(Rgb(r, g, b)),
            hex: None,
        }
    }

    /// Panics on a malformed hex code: scales are static setup, not runtime data.
    pub fn hex(level: &str, hex: &str) -> Self {
        Self {
            level: level.to_string(),
            rgb: None,
            hex: Some(validated_hex(hex)),
        }
    }

    /// Hex item from untrusted input.
    pub fn try_hex(level: &str, hex: &str) -> Result<Self, ColorError> {
        Ok(Self {
            level: level.to_string(),
            rgb: None,
            hex: Some(HexColor::parse(hex)?),
        })
    }

    /// Attach a hex form to an RGB item. Panics on a malformed hex code.
    pub fn with_hex(mut self, hex: &str) -> Self {
        self.hex = Some(validated_hex(hex));
        self
    }

    pub fn level(&self) -> &str {
        &self.level
    }

    pub fn as_rgb(&self) -> Option<Rgb> {
        self.rgb
    }

    pub fn as_hex(&self) -> Option<&HexColor> {
        self.hex.as_ref()
    }

    fn resolve(&self, repr: ColorRepr) -> ColorSpec {
        match (repr, &self.rgb, &self.hex) {
            (ColorRepr::Rgb, Some(rgb), _) => ColorSpec::Rgb(*rgb),
            (ColorRepr::Hex, _, Some(hex)) => ColorSpec::Hex(hex.clone()),
            // Fall back to whichever form the item has
            (_, Some(rgb), None) => ColorSpec::Rgb(*rgb),
            (_, None, Some(hex)) => ColorSpec::Hex(hex.clone()),
            _ => ColorSpec::None,
        }
    }
}

fn validated_hex(hex: &str) -> HexColor {
    match HexColor::parse(hex) {
        Ok(color) => color,
        Err(e) => panic!("invalid hexadecimal color code: {}", e),
    }
}

/// A resolved color, or no color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorSpec {
    Rgb(Rgb),
    Hex(HexColor),
    None,
}

impl ColorSpec {
    /// Background escape for this color; empty for [`ColorSpec::None`].
    pub fn escape(&self) -> String {
        match self {
            ColorSpec::Rgb(rgb) => rgb.to_ansi_background(),
            ColorSpec::Hex(hex) => hex.rgb().to_ansi_background(),
            ColorSpec::None => String::new(),
        }
    }

    pub fn hex_code(&self) -> Option<&str> {
        match self {
            ColorSpec::Hex(hex) => Some(hex.code()),
            _ => None,
        }
    }
}

/// Built-in palettes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Theme {
    /// Traditional Chinese colors (zhongguose.com)
    #[default]
    China,
    /// arco.design button colors
    Arco,
    /// ant.design tag colors
    Ant,
    /// element-plus colors
    Element,
}

impl Theme {
    /// Unknown names select the default palette.
    pub fn from_name(name: &str) -> Theme {
        match name.to_lowercase().as_str() {
            "arco" => Theme::Arco,
            "ant" => Theme::Ant,
            "element" => Theme::Element,
            _ => Theme::China,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::China => "china",
            Theme::Arco => "arco",
            Theme::Ant => "ant",
            Theme::Element => "element",
        }
    }
}

impl From<String> for Theme {
    fn from(name: String) -> Self {
        Theme::from_name(&name)
    }
}

impl From<Theme> for String {
    fn from(theme: Theme) -> Self {
        theme.as_str().to_string()
    }
}

const CHINA: [(&str, [u8; 3], &str); 7] = [
    ("Trace", [178, 187, 190], "#b2bbbe"),  // star gray
    ("Debug", [18, 107, 174], "#126bae"),   // berlin blue
    ("Info", [92, 179, 204], "#5cb3cc"),    // jade green
    ("Notice", [69, 183, 135], "#45b787"),  // frog green
    ("Warn", [254, 215, 26], "#fed71a"),    // buddha's hand yellow
    ("Error", [240, 55, 82], "#f03752"),    // crabapple red
    ("Fatal", [104, 23, 82], "#681752"),    // morning glory purple
];

const ARCO: [(&str, [u8; 3]); 7] = [
    ("TRACE", [201, 205, 212]), // gray
    ("DEBUG", [22, 93, 255]),   // blue
    ("INFO", [20, 201, 201]),   // cyan
    ("NOTICE", [0, 180, 42]),   // success
    ("WARN", [255, 125, 0]),    // warn
    ("ERROR", [245, 63, 63]),   // danger
    ("FATAL", [245, 49, 157]),  // magenta
];

const ANT: [(&str, &str); 7] = [
    ("TRACE", "#d4380d"),  // volcano
    ("DEBUG", "#1677ff"),  // processing
    ("INFO", "#08979c"),   // cyan
    ("NOTICE", "#7cb305"), // lime
    ("WARN", "#faad14"),   // warning
    ("ERROR", "#ff4d4f"),  // error
    ("FATAL", "#531dab"),  // purple
];

const ELEMENT: [(&str, &str); 7] = [
    ("TRACE", "#FFFFFF"),
    ("DEBUG", "#409EFF"),
    ("INFO", "#79BBFF"),
    ("NOTICE", "#67C23A"),
    ("WARN", "#E6A23C"),
    ("ERROR", "#F56C6C"),
    ("FATAL", "#909399"),
];

/// Level name to color table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorScale {
    repr: ColorRepr,
    colors: Vec<ColorItem>,
}

impl Default for ColorScale {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorScale {
    /// The default palette, RGB representation.
    pub fn new() -> Self {
        Self::from_theme(Theme::China)
    }

    pub fn with_items(repr: ColorRepr, colors: Vec<ColorItem>) -> Self {
        Self { repr, colors }
    }

    /// Palette by theme name; unknown names fall back to the default palette.
    pub fn theme(name: &str) -> Self {
        Self::from_theme(Theme::from_name(name))
    }

    pub fn from_theme(theme: Theme) -> Self {
        match theme {
            Theme::China => Self {
                repr: ColorRepr::Rgb,
                colors: CHINA
                    .iter()
                    .map(|(level, [r, g, b], hex)| ColorItem::rgb(level, *r, *g, *b).with_hex(hex))
                    .collect(),
            },
            Theme::Arco => Self {
                repr: ColorRepr::Rgb,
                colors: ARCO
                    .iter()
                    .map(|(level, [r, g, b])| ColorItem::rgb(level, *r, *g, *b))
                    .collect(),
            },
            Theme::Ant => Self {
                repr: ColorRepr::Hex,
                colors: ANT.iter().map(|(level, hex)| ColorItem::hex(level, hex)).collect(),
            },
            Theme::Element => Self {
                repr: ColorRepr::Hex,
                colors: ELEMENT
                    .iter()
                    .map(|(level, hex)| ColorItem::hex(level, hex))
                    .collect(),
            },
        }
    }

    pub fn repr(&self) -> ColorRepr {
        self.repr
    }

    pub fn colors(&self) -> &[ColorItem] {
        &self.colors
    }

    pub fn set_repr(&mut self, repr: ColorRepr) -> &mut Self {
        self.repr = repr;
        self
    }

    /// Color for a level name, compared case-insensitively.
    pub fn color_for(&self, level_name: &str) -> ColorSpec {
        let wanted = level_name.to_uppercase();
        self.colors
            .iter()
            .find(|item| item.level.to_uppercase() == wanted)
            .map_or(ColorSpec::None, |item| item.resolve(self.repr))
    }

    /// Background escape for a level name; empty when the scale has no entry.
    pub fn escape_for(&self, level_name: &str) -> String {
        self.color_for(level_name).escape()
    }
}
