//! Published frame type
//!
//! A `PublishedFrame` is immutable once built. The worker publishes a new
//! `Arc<PublishedFrame>` per capture, so the image and both timestamps always
//! travel together.

use std::io::Cursor;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use tokio::time::Instant;

/// One decoded frame as seen by readers
#[derive(Debug)]
pub struct PublishedFrame {
    /// Decoded raster at the stream's target resolution
    pub image: RgbImage,

    /// Position in this worker's capture order, starting at 1
    pub sequence: u64,

    /// Monotonic capture time, used for liveness
    pub captured_at: Instant,

    /// Wall-clock capture time, used for reporting
    pub captured_wall: DateTime<Utc>,
}

impl PublishedFrame {
    /// Stamp a freshly captured image
    pub fn new(image: RgbImage, sequence: u64) -> Self {
        Self {
            image,
            sequence,
            captured_at: Instant::now(),
            captured_wall: Utc::now(),
        }
    }

    /// Frame dimensions
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Encode as JPEG; `quality` is clamped to 1..=100
    pub fn encode_jpeg(&self, quality: u8) -> Result<Bytes, image::ImageError> {
        let quality = quality.clamp(1, 100);
        let mut out = Cursor::new(Vec::with_capacity(self.image.len() / 8));

        let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
        encoder.encode_image(&self.image)?;

        Ok(Bytes::from(out.into_inner()))
    }
}
