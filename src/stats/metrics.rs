//! Statistics for stream workers

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

/// Live counters for one worker
///
/// Updated by the capture loop and by readers without locking.
#[derive(Debug)]
pub struct WorkerStats {
    /// When the worker was created
    started_at: Instant,
    /// Frames published
    frames_published: AtomicU64,
    /// Reads that returned no frame
    read_failures: AtomicU64,
    /// Reads or conversions that failed unexpectedly
    faults: AtomicU64,
    /// Successful JPEG encodes for readers
    jpeg_encodes: AtomicU64,
    /// JPEG encodes that failed
    jpeg_failures: AtomicU64,
}

impl WorkerStats {
    /// Create new stats tracker
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            frames_published: AtomicU64::new(0),
            read_failures: AtomicU64::new(0),
            faults: AtomicU64::new(0),
            jpeg_encodes: AtomicU64::new(0),
            jpeg_failures: AtomicU64::new(0),
        }
    }

    pub(crate) fn record_frame(&self) -> u64 {
        self.frames_published.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn record_read_failure(&self) {
        self.read_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fault(&self) {
        self.faults.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_encode(&self, ok: bool) {
        if ok {
            self.jpeg_encodes.fetch_add(1, Ordering::Relaxed);
        } else {
            self.jpeg_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Frames published so far
    pub fn frames_published(&self) -> u64 {
        self.frames_published.load(Ordering::Relaxed)
    }

    /// Time since the worker was created
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> WorkerStatsSnapshot {
        let uptime = self.uptime();
        let frames_published = self.frames_published();

        WorkerStatsSnapshot {
            uptime_secs: uptime.as_secs(),
            frames_published,
            read_failures: self.read_failures.load(Ordering::Relaxed),
            faults: self.faults.load(Ordering::Relaxed),
            jpeg_encodes: self.jpeg_encodes.load(Ordering::Relaxed),
            jpeg_failures: self.jpeg_failures.load(Ordering::Relaxed),
            measured_fps: measured_fps(frames_published, uptime),
        }
    }
}

impl Default for WorkerStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable copy of [`WorkerStats`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkerStatsSnapshot {
    pub uptime_secs: u64,
    pub frames_published: u64,
    pub read_failures: u64,
    pub faults: u64,
    pub jpeg_encodes: u64,
    pub jpeg_failures: u64,
    /// Average publish rate since start
    pub measured_fps: f64,
}

fn measured_fps(frames: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        frames as f64 / secs
    } else {
        0.0
    }
}
