use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Logging error: {0}")]
    LoggingError(String),
}
