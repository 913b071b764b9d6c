//! Crate-level error types
//!
//! Each subsystem has its own error enum; `Error` wraps them so top-level
//! callers (the server, the binary) can use a single `Result`.

use crate::camera::ConfigError;
use crate::distribution::DistributionError;
use crate::registry::RegistryError;
use crate::source::SourceError;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug)]
pub enum Error {
    /// I/O failure (binding the listener, reading config files)
    Io(std::io::Error),
    /// Invalid camera or server configuration
    Config(ConfigError),
    /// Video source could not be opened or read
    Source(SourceError),
    /// Stream registry refused an operation
    Registry(RegistryError),
    /// No frame could be delivered to a consumer
    Distribution(DistributionError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Source(e) => write!(f, "Source error: {}", e),
            Error::Registry(e) => write!(f, "Registry error: {}", e),
            Error::Distribution(e) => write!(f, "Distribution error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Config(e) => Some(e),
            Error::Source(e) => Some(e),
            Error::Registry(e) => Some(e),
            Error::Distribution(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<SourceError> for Error {
    fn from(e: SourceError) -> Self {
        Error::Source(e)
    }
}

impl From<RegistryError> for Error {
    fn from(e: RegistryError) -> Self {
        Error::Registry(e)
    }
}

impl From<DistributionError> for Error {
    fn from(e: DistributionError) -> Self {
        Error::Distribution(e)
    }
}
