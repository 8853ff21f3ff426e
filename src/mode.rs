use serde::{Deserialize, Serialize};

/// How much decoration the message and attribute block get.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Raw message and bare attributes
    #[serde(alias = "simple", alias = "simplify")]
    Simplified,
    /// `"msg":"..."` and labeled attribute block
    #[default]
    #[serde(alias = "detail")]
    Detailed,
}

/// How attributes are serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for RenderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simplified" | "simple" | "simplify" => Ok(RenderMode::Simplified),
            "detailed" | "detail" => Ok(RenderMode::Detailed),
            _ => Err(format!("Unknown render mode: {}", s)),
        }
    }
}

impl std::str::FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Encoding::Text),
            "json" => Ok(Encoding::Json),
            _ => Err(format!("Unknown attribute encoding: {}", s)),
        }
    }
}

/// Render mode and attribute encoding, switched independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Mode {
    #[serde(default)]
    pub render: RenderMode,
    #[serde(default)]
    pub encoding: Encoding,
}

impl Mode {
    pub fn new(render: RenderMode, encoding: Encoding) -> Self {
        Self { render, encoding }
    }

    pub fn set_render(&mut self, render: RenderMode) -> &mut Self {
        self.render = render;
        self
    }

    pub fn set_encoding(&mut self, encoding: Encoding) -> &mut Self {
        self.encoding = encoding;
        self
    }

    pub fn toggle_render(&mut self) -> &mut Self {
        self.render = match self.render {
            RenderMode::Detailed => RenderMode::Simplified,
            RenderMode::Simplified => RenderMode::Detailed,
        };
        self
    }

    pub fn toggle_encoding(&mut self) -> &mut Self {
        self.encoding = match self.encoding {
            Encoding::Text => Encoding::Json,
            Encoding::Json => Encoding::Text,
        };
        self
    }

    pub fn is_detailed(&self) -> bool {
        self.render == RenderMode::Detailed
    }
}
