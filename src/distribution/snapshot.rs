//! One-shot JPEG snapshots

use bytes::Bytes;

use super::DistributionError;
use crate::camera::CameraId;
use crate::registry::StreamRegistry;

/// Encode the latest frame of a live camera
///
/// Never returns an empty image: a camera without a live worker or without
/// a frame is reported as unavailable.
pub async fn snapshot(
    registry: &StreamRegistry,
    id: CameraId,
    quality: u8,
) -> Result<Bytes, DistributionError> {
    let worker = registry
        .get(id)
        .await
        .ok_or(DistributionError::NoStream(id))?;

    if !worker.is_alive() {
        return Err(DistributionError::NotAlive(id));
    }

    worker
        .latest_jpeg(quality)
        .filter(|jpeg| !jpeg.is_empty())
        .ok_or(DistributionError::NoFrame(id))
}
