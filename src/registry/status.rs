//! Observability view of registered workers

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::stats::WorkerStatsSnapshot;
use crate::stream::StreamWorker;

/// Point-in-time health of one stream
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamStatus {
    /// Capture loop is supposed to run
    pub active: bool,

    /// Active and produced a frame recently
    pub alive: bool,

    /// Time of the most recent frame, if any
    pub last_frame: Option<DateTime<Utc>>,

    /// Consecutive failures since the last frame
    pub error_count: u32,

    /// Source address with the password masked
    pub rtsp_url: String,

    /// Capture and encode counters since the worker was created
    pub stats: WorkerStatsSnapshot,
}

impl StreamStatus {
    /// Capture the current state of a worker
    pub fn of(worker: &StreamWorker) -> Self {
        Self {
            active: worker.is_active(),
            alive: worker.is_alive(),
            last_frame: worker.last_frame_time(),
            error_count: worker.error_count(),
            rtsp_url: worker.config().redacted_uri(),
            stats: worker.stats().snapshot(),
        }
    }
}
