use thiserror::Error;

pub use crate::dns::ParseError;
pub use crate::dnssec::errors::{DenialError, ValidationError};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid NSEC3 iteration limit: {0}")]
    InvalidIterationLimit(String),

    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
