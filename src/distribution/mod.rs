//! Frame distribution
//!
//! Turns a live worker into something a browser can display: one JPEG on
//! demand, or an endless `multipart/x-mixed-replace` sequence.
//!
//! Both paths read the worker's latest-frame slot and encode at read time.
//! There is no queue between capture and viewers: a slow viewer sees
//! repeated or skipped frames, never a backlog.
//!
//! ```text
//!   StreamWorker ──latest frame──┬──► snapshot()       one JPEG, quality 90
//!                                ├──► live_sequence()  --frame parts, quality 75
//!                                └──► live_sequence()  (each viewer pulls on its own)
//! ```

pub mod live;
pub mod snapshot;

use bytes::{BufMut, Bytes, BytesMut};

use crate::camera::CameraId;

pub use live::live_sequence;
pub use snapshot::snapshot;

/// Multipart boundary used between live frames
pub const MJPEG_BOUNDARY: &str = "frame";

/// Response content type for live sequences
pub const MJPEG_CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=frame";

/// Wrap one JPEG as a multipart part
pub fn multipart_part(jpeg: &[u8]) -> Bytes {
    const HEAD: &[u8] = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n";

    let mut part = BytesMut::with_capacity(HEAD.len() + jpeg.len() + 2);
    part.put_slice(HEAD);
    part.put_slice(jpeg);
    part.put_slice(b"\r\n");
    part.freeze()
}

/// Why a camera has nothing to distribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistributionError {
    /// No worker is registered for the camera
    NoStream(CameraId),
    /// The worker stopped or its camera went quiet
    NotAlive(CameraId),
    /// No frame captured yet, or encoding it failed
    NoFrame(CameraId),
}

impl std::fmt::Display for DistributionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistributionError::NoStream(id) => write!(f, "No stream for camera {}", id),
            DistributionError::NotAlive(id) => write!(f, "Stream for camera {} is not alive", id),
            DistributionError::NoFrame(id) => write!(f, "No image available for camera {}", id),
        }
    }
}

impl std::error::Error for DistributionError {}
