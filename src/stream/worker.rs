//! Per-camera capture worker
//!
//! A `StreamWorker` owns one [`FrameSource`] and runs its capture loop as an
//! independent tokio task. The loop is the only writer of the latest-frame
//! slot; any number of readers clone the `Arc<PublishedFrame>` they observe.
//!
//! ```text
//!               start()                       stop()
//!   Idle ──────────────────► Running ──────────────────► Stopped
//!                               │
//!                               │ error ceiling reached
//!                               ▼
//!                         Self-terminated (inactive, source released)
//! ```

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use image::imageops::{self, FilterType};
use image::RgbImage;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::config::{StreamConfig, WorkerTuning};
use super::frame::PublishedFrame;
use crate::camera::{CameraId, Resolution};
use crate::source::{FrameSource, SourceConnector, SourceError, SourceSettings};
use crate::stats::WorkerStats;

/// State shared between the worker handle and its capture loop
struct Shared {
    active: AtomicBool,
    error_count: AtomicU32,
    /// Worker uptime in milliseconds when the source was last opened
    opened_at_ms: AtomicU64,
    latest: watch::Sender<Option<Arc<PublishedFrame>>>,
    stats: WorkerStats,
}

impl Shared {
    fn publish(&self, image: RgbImage) {
        let sequence = self.stats.record_frame();
        self.latest
            .send_replace(Some(Arc::new(PublishedFrame::new(image, sequence))));
        self.error_count.store(0, Ordering::SeqCst);
    }

    /// Count one failure; true when the ceiling is reached
    fn register_failure(&self, ceiling: u32) -> bool {
        self.error_count.fetch_add(1, Ordering::SeqCst) + 1 >= ceiling
    }
}

/// A running capture loop
struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<Box<dyn FrameSource>>,
}

/// Captures frames from one camera and publishes the newest
pub struct StreamWorker {
    config: StreamConfig,
    tuning: WorkerTuning,
    connector: Arc<dyn SourceConnector>,
    shared: Arc<Shared>,
    running: Mutex<Option<Running>>,
}

impl StreamWorker {
    /// Create an idle worker; nothing is opened until [`start`](Self::start)
    pub fn new(config: StreamConfig, tuning: WorkerTuning, connector: Arc<dyn SourceConnector>) -> Self {
        let (latest, _) = watch::channel(None);

        Self {
            config,
            tuning,
            connector,
            shared: Arc::new(Shared {
                active: AtomicBool::new(false),
                error_count: AtomicU32::new(0),
                opened_at_ms: AtomicU64::new(0),
                latest,
                stats: WorkerStats::new(),
            }),
            running: Mutex::new(None),
        }
    }

    /// Camera identity
    pub fn id(&self) -> CameraId {
        self.config.id
    }

    /// Configuration this worker was built from
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Target frames per second
    pub fn frame_rate(&self) -> u32 {
        self.config.frame_rate
    }

    /// Open the source and spawn the capture loop
    ///
    /// No-op when already active. A loop that stopped itself is reclaimed
    /// first, so a worker can be restarted in place.
    pub async fn start(&self) -> Result<(), SourceError> {
        let mut running = self.running.lock().await;

        if self.is_active() {
            return Ok(());
        }

        if let Some(previous) = running.take() {
            self.finish(previous).await;
        }

        let settings = SourceSettings::for_stream(&self.config, &self.tuning);
        let source = match self.connector.open(&self.config, &settings).await {
            Ok(source) => source,
            Err(e) => {
                tracing::error!(
                    camera = %self.config.id,
                    uri = %self.config.redacted_uri(),
                    error = %e,
                    "Cannot open stream source"
                );
                return Err(e);
            }
        };

        self.shared.error_count.store(0, Ordering::SeqCst);
        self.shared
            .opened_at_ms
            .store(self.shared.stats.uptime().as_millis() as u64, Ordering::SeqCst);
        self.shared.active.store(true, Ordering::SeqCst);

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(capture_loop(
            self.config.clone(),
            self.tuning.clone(),
            Arc::clone(&self.shared),
            source,
            cancel.clone(),
        ));

        *running = Some(Running { cancel, handle });

        tracing::info!(
            camera = %self.config.id,
            resolution = %self.config.resolution,
            fps = self.config.frame_rate,
            "Stream started"
        );

        Ok(())
    }

    /// Stop the capture loop and release the source
    ///
    /// Waits up to the stop timeout for the loop to exit, then aborts it.
    /// Safe to call on a worker that never started or already stopped itself.
    pub async fn stop(&self) {
        let previous = self.running.lock().await.take();
        self.shared.active.store(false, Ordering::SeqCst);

        if let Some(previous) = previous {
            self.finish(previous).await;
            tracing::info!(camera = %self.config.id, "Stream stopped");
        }
    }

    async fn finish(&self, running: Running) {
        let Running { cancel, mut handle } = running;
        cancel.cancel();

        match tokio::time::timeout(self.tuning.stop_timeout, &mut handle).await {
            Ok(Ok(mut source)) => source.release().await,
            Ok(Err(e)) => {
                tracing::warn!(camera = %self.config.id, error = %e, "Capture loop ended abnormally");
            }
            Err(_) => {
                tracing::warn!(
                    camera = %self.config.id,
                    timeout_ms = self.tuning.stop_timeout.as_millis() as u64,
                    "Capture loop did not stop in time, aborting"
                );
                // Aborting drops the loop future, and the source with it
                handle.abort();
                let _ = handle.await;
            }
        }
    }

    /// True while the capture loop is supposed to run
    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::SeqCst)
    }

    /// True iff active and a frame was published within the liveness timeout
    pub fn is_alive(&self) -> bool {
        if !self.is_active() {
            return false;
        }

        self.shared
            .latest
            .borrow()
            .as_ref()
            .is_some_and(|frame| frame.captured_at.elapsed() < self.tuning.liveness_timeout)
    }

    /// True while active and waiting for a first frame
    ///
    /// The window is the source read timeout, measured from the last
    /// successful open.
    pub fn is_starting(&self) -> bool {
        if !self.is_active() || self.is_alive() {
            return false;
        }

        let opened_at = Duration::from_millis(self.shared.opened_at_ms.load(Ordering::SeqCst));
        self.shared.stats.uptime().saturating_sub(opened_at) < self.tuning.read_timeout
    }

    /// Consecutive failures since the last published frame
    pub fn error_count(&self) -> u32 {
        self.shared.error_count.load(Ordering::SeqCst)
    }

    /// Most recently published frame
    pub fn latest_frame(&self) -> Option<Arc<PublishedFrame>> {
        self.shared.latest.borrow().clone()
    }

    /// Wait until at least one frame has been published
    ///
    /// Returns false if none arrives within `timeout` or the worker stops.
    pub async fn wait_for_frame(&self, timeout: Duration) -> bool {
        let mut latest = self.shared.latest.subscribe();
        let shared = Arc::clone(&self.shared);

        let first = latest.wait_for(|frame| {
            frame.is_some() || !shared.active.load(Ordering::SeqCst)
        });

        let got = match tokio::time::timeout(timeout, first).await {
            Ok(Ok(frame)) => frame.is_some(),
            _ => false,
        };
        got
    }

    /// Wall-clock time of the most recent frame
    pub fn last_frame_time(&self) -> Option<DateTime<Utc>> {
        self.shared.latest.borrow().as_ref().map(|f| f.captured_wall)
    }

    /// Encode the most recent frame as JPEG
    ///
    /// Returns `None` when nothing was captured yet or encoding fails; an
    /// encoding failure never affects the capture loop.
    pub fn latest_jpeg(&self, quality: u8) -> Option<Bytes> {
        let frame = self.latest_frame()?;

        match frame.encode_jpeg(quality) {
            Ok(jpeg) => {
                self.shared.stats.record_encode(true);
                Some(jpeg)
            }
            Err(e) => {
                self.shared.stats.record_encode(false);
                tracing::error!(
                    camera = %self.config.id,
                    sequence = frame.sequence,
                    error = %e,
                    "JPEG encoding failed"
                );
                None
            }
        }
    }

    /// Most recent frame as base64 JPEG, for inline display in web pages
    pub fn latest_base64(&self, quality: u8) -> Option<String> {
        self.latest_jpeg(quality)
            .map(|jpeg| base64::engine::general_purpose::STANDARD.encode(&jpeg))
    }

    /// Capture counters
    pub fn stats(&self) -> &WorkerStats {
        &self.shared.stats
    }
}

impl Drop for StreamWorker {
    fn drop(&mut self) {
        // The detached loop drops its source when it exits
        if let Some(running) = self.running.get_mut().take() {
            running.cancel.cancel();
        }
    }
}

impl std::fmt::Debug for StreamWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamWorker")
            .field("id", &self.config.id)
            .field("active", &self.is_active())
            .field("error_count", &self.error_count())
            .finish()
    }
}

/// Scale `image` to `target` unless it already matches
fn fit(image: RgbImage, target: Resolution) -> RgbImage {
    if image.dimensions() == (target.width, target.height) {
        image
    } else {
        imageops::resize(&image, target.width, target.height, FilterType::Triangle)
    }
}

async fn capture_loop(
    config: StreamConfig,
    tuning: WorkerTuning,
    shared: Arc<Shared>,
    mut source: Box<dyn FrameSource>,
    cancel: CancellationToken,
) -> Box<dyn FrameSource> {
    let frame_interval = config.frame_interval();

    loop {
        if cancel.is_cancelled() || !shared.active.load(Ordering::SeqCst) {
            break;
        }

        let read = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            read = source.read_frame() => read,
        };

        let pause = match read {
            Ok(Some(image)) => {
                shared.publish(fit(image, config.resolution));
                frame_interval
            }
            Ok(None) => {
                shared.stats.record_read_failure();
                if shared.register_failure(tuning.error_ceiling) {
                    break terminate(&config, &shared, &mut source).await;
                }
                tuning.read_backoff
            }
            Err(e) => {
                shared.stats.record_fault();
                tracing::warn!(
                    camera = %config.id,
                    error = %e,
                    error_count = shared.error_count.load(Ordering::SeqCst) + 1,
                    "Capture error"
                );
                if shared.register_failure(tuning.error_ceiling) {
                    break terminate(&config, &shared, &mut source).await;
                }
                tuning.fault_backoff
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(pause) => {}
        }
    }

    source
}

async fn terminate(config: &StreamConfig, shared: &Shared, source: &mut Box<dyn FrameSource>) {
    shared.active.store(false, Ordering::SeqCst);
    tracing::error!(
        camera = %config.id,
        error_count = shared.error_count.load(Ordering::SeqCst),
        "Too many capture errors, stopping stream"
    );
    source.release().await;
}
