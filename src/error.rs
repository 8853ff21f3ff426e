#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Bridge error: {0}")]
    Bridge(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Invalid time layout '{0}'")]
    InvalidTimeLayout(String),

    #[error("Invalid color: {0}")]
    Color(#[from] crate::colors::ColorError),

    #[error("Cannot open destination '{path}': {source}")]
    Destination {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::Parse(format!("{}", err))
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(format!("{}", err))
    }
}
