//! Registry error types

use crate::camera::{CameraId, ConfigError};
use crate::source::SourceError;

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryError {
    /// Camera has streaming disabled or no source address
    StreamingDisabled(CameraId),
    /// Camera profile could not be turned into a stream config
    InvalidConfig(CameraId, ConfigError),
    /// Worker could not open its source
    StartFailed(CameraId, SourceError),
    /// Registry is shutting down and accepts no new streams
    Closed(CameraId),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::StreamingDisabled(id) => {
                write!(f, "Streaming not enabled for camera {}", id)
            }
            RegistryError::InvalidConfig(id, e) => {
                write!(f, "Invalid stream config for camera {}: {}", id, e)
            }
            RegistryError::StartFailed(id, e) => {
                write!(f, "Failed to start stream for camera {}: {}", id, e)
            }
            RegistryError::Closed(id) => {
                write!(f, "Registry closed, not starting camera {}", id)
            }
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistryError::StreamingDisabled(_) | RegistryError::Closed(_) => None,
            RegistryError::InvalidConfig(_, e) => Some(e),
            RegistryError::StartFailed(_, e) => Some(e),
        }
    }
}
