//! HTTP error responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::camera::CameraId;
use crate::distribution::DistributionError;
use crate::registry::RegistryError;

/// Error returned by route handlers, rendered as `{"error": "..."}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Streaming is turned off for this server
    StreamingUnavailable,
    /// Camera is not in the directory
    CameraNotFound(CameraId),
    /// Camera has no usable stream configuration
    NotConfigured(CameraId),
    /// Nothing to serve right now
    NoImage(CameraId),
    /// Stream could not be started
    StartFailed(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::StreamingUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::CameraNotFound(_) | ApiError::NoImage(_) => StatusCode::NOT_FOUND,
            ApiError::NotConfigured(_) => StatusCode::BAD_REQUEST,
            ApiError::StartFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::StreamingUnavailable => write!(f, "Camera streaming not available"),
            ApiError::CameraNotFound(id) => write!(f, "Camera {} not found", id),
            ApiError::NotConfigured(id) => write!(f, "Streaming not configured for camera {}", id),
            ApiError::NoImage(_) => write!(f, "No image available"),
            ApiError::StartFailed(msg) => write!(f, "Unable to start stream: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<DistributionError> for ApiError {
    fn from(e: DistributionError) -> Self {
        match e {
            DistributionError::NoStream(id)
            | DistributionError::NotAlive(id)
            | DistributionError::NoFrame(id) => ApiError::NoImage(id),
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::StreamingDisabled(id) | RegistryError::InvalidConfig(id, _) => {
                ApiError::NotConfigured(id)
            }
            RegistryError::StartFailed(..) => ApiError::StartFailed(e.to_string()),
            RegistryError::Closed(_) => ApiError::StreamingUnavailable,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Request failed");
        } else {
            tracing::debug!(status = %status, error = %self, "Request rejected");
        }

        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceError;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::StreamingUnavailable.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ApiError::CameraNotFound(CameraId(1)).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::NotConfigured(CameraId(1)).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NoImage(CameraId(1)).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::StartFailed("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_from_registry_error() {
        let disabled: ApiError = RegistryError::StreamingDisabled(CameraId(2)).into();
        assert_eq!(disabled, ApiError::NotConfigured(CameraId(2)));

        let failed: ApiError = RegistryError::StartFailed(CameraId(2), SourceError::Closed).into();
        assert!(matches!(failed, ApiError::StartFailed(msg) if msg.contains("Source closed")));

        let closed: ApiError = RegistryError::Closed(CameraId(2)).into();
        assert_eq!(closed, ApiError::StreamingUnavailable);
    }

    #[test]
    fn test_no_image_message() {
        let err: ApiError = DistributionError::NotAlive(CameraId(3)).into();
        assert_eq!(err.to_string(), "No image available");
    }
}
