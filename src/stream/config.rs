//! Stream worker configuration

use std::time::Duration;

use crate::camera::{CameraId, Resolution, DEFAULT_FRAME_RATE};

/// Immutable description of one camera stream
///
/// Changing any of these requires stopping the worker and starting a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Camera identity
    pub id: CameraId,

    /// Network video address, credentials embedded
    pub source_uri: String,

    /// Frame size published by the worker
    pub resolution: Resolution,

    /// Target frames per second, always positive
    pub frame_rate: u32,
}

impl StreamConfig {
    /// Create a config with default resolution and frame rate
    pub fn new(id: CameraId, source_uri: impl Into<String>) -> Self {
        Self {
            id,
            source_uri: source_uri.into(),
            resolution: Resolution::default(),
            frame_rate: DEFAULT_FRAME_RATE,
        }
    }

    /// Set the target resolution
    pub fn resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set the target frame rate (0 is raised to 1)
    pub fn frame_rate(mut self, fps: u32) -> Self {
        self.frame_rate = fps.max(1);
        self
    }

    /// Delay between two capture reads
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.frame_rate.max(1)))
    }

    /// Source address with the password masked, for logs and status output
    pub fn redacted_uri(&self) -> String {
        match url::Url::parse(&self.source_uri) {
            Ok(mut uri) if uri.password().is_some() => {
                if uri.set_password(Some("***")).is_ok() {
                    uri.to_string()
                } else {
                    self.source_uri.clone()
                }
            }
            _ => self.source_uri.clone(),
        }
    }
}

/// Timing and failure thresholds shared by every worker
#[derive(Debug, Clone)]
pub struct WorkerTuning {
    /// Consecutive failures after which the worker stops itself
    pub error_ceiling: u32,

    /// A worker with no frame newer than this is considered dead
    pub liveness_timeout: Duration,

    /// Backoff after the source reports no frame
    pub read_backoff: Duration,

    /// Backoff after an unexpected source or conversion fault
    pub fault_backoff: Duration,

    /// How long `stop()` waits for the capture loop before aborting it
    pub stop_timeout: Duration,

    /// Longest a single source read may block before it counts as a failure
    pub read_timeout: Duration,
}

impl Default for WorkerTuning {
    fn default() -> Self {
        Self {
            error_ceiling: 10,
            liveness_timeout: Duration::from_secs(30),
            read_backoff: Duration::from_millis(100),
            fault_backoff: Duration::from_secs(1),
            stop_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(10),
        }
    }
}

impl WorkerTuning {
    /// Set the consecutive-failure ceiling (minimum 1)
    pub fn error_ceiling(mut self, ceiling: u32) -> Self {
        self.error_ceiling = ceiling.max(1);
        self
    }

    /// Set the liveness timeout
    pub fn liveness_timeout(mut self, timeout: Duration) -> Self {
        self.liveness_timeout = timeout;
        self
    }

    /// Set the stop timeout
    pub fn stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    /// Set the source read timeout
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }
}
