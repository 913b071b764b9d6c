//! Network video sources
//!
//! A [`FrameSource`] wraps one open connection to a camera and yields decoded
//! frames. A [`SourceConnector`] opens them; the registry hands the same
//! connector to every worker it creates.
//!
//! # Read outcomes
//!
//! ```text
//!   read_frame()
//!       │
//!       ├── Ok(Some(image))  frame captured
//!       ├── Ok(None)         no frame this time (timeout, closed pipe)
//!       └── Err(e)           unexpected fault (corrupt data, decode error)
//! ```
//!
//! Workers count both failure kinds toward their error ceiling but back off
//! differently.

pub mod ffmpeg;
pub mod mjpeg;

#[cfg(test)]
pub(crate) mod testing;

use std::time::Duration;

use async_trait::async_trait;
use image::RgbImage;

use crate::camera::Resolution;
use crate::stream::{StreamConfig, WorkerTuning};

pub use ffmpeg::{FfmpegConnector, FfmpegSource};
pub use mjpeg::MjpegSplitter;

/// Capture parameters applied when a source is opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSettings {
    /// Requested frame size
    pub resolution: Resolution,

    /// Requested frames per second
    pub frame_rate: u32,

    /// Frames the source may hold before older ones are dropped
    pub buffer_frames: usize,

    /// Longest a single read may wait for a frame
    pub read_timeout: Duration,
}

impl SourceSettings {
    /// Settings for a stream: target size and rate, single-frame buffer
    pub fn for_stream(config: &StreamConfig, tuning: &WorkerTuning) -> Self {
        Self {
            resolution: config.resolution,
            frame_rate: config.frame_rate,
            buffer_frames: 1,
            read_timeout: tuning.read_timeout,
        }
    }
}

/// One open video connection
#[async_trait]
pub trait FrameSource: Send {
    /// Read the next frame
    ///
    /// `Ok(None)` means no frame was available; `Err` means something broke
    /// while reading or decoding.
    async fn read_frame(&mut self) -> Result<Option<RgbImage>, SourceError>;

    /// Close the connection. Must tolerate repeated calls.
    async fn release(&mut self);
}

/// Opens video connections
#[async_trait]
pub trait SourceConnector: Send + Sync {
    /// Connect to the stream's source address
    async fn open(
        &self,
        config: &StreamConfig,
        settings: &SourceSettings,
    ) -> Result<Box<dyn FrameSource>, SourceError>;
}

/// Error type for video sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Connection could not be established
    Unavailable { uri: String, reason: String },
    /// Source produced data that could not be decoded
    Decode(String),
    /// Connection ended
    Closed,
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Unavailable { uri, reason } => {
                write!(f, "Cannot open source {}: {}", uri, reason)
            }
            SourceError::Decode(msg) => write!(f, "Cannot decode frame: {}", msg),
            SourceError::Closed => write!(f, "Source closed"),
        }
    }
}

impl std::error::Error for SourceError {}
