//! Live multipart JPEG sequences

use std::sync::Arc;

use bytes::Bytes;
use futures::stream::{self, Stream};

use super::multipart_part;
use crate::stream::StreamWorker;

/// Endless sequence of multipart JPEG parts for as long as `worker` is alive
///
/// Pull-based: a part is encoded only when the consumer asks for it, and
/// each pull after the first waits one frame interval. The sequence ends
/// (without error) on the first pull that finds the worker not alive. Pulls
/// that find no encodable frame emit nothing and wait for the next interval.
pub fn live_sequence(worker: Arc<StreamWorker>, quality: u8) -> impl Stream<Item = Bytes> + Send + 'static {
    let interval = worker.config().frame_interval();

    stream::unfold((worker, true), move |(worker, first)| async move {
        let mut pace = !first;

        loop {
            if pace {
                tokio::time::sleep(interval).await;
            }
            pace = true;

            if !worker.is_alive() {
                tracing::debug!(camera = %worker.id(), "Live sequence ended");
                return None;
            }

            if let Some(jpeg) = worker.latest_jpeg(quality) {
                return Some((multipart_part(&jpeg), (worker, false)));
            }
        }
    })
}
