//! ffmpeg-backed network video source
//!
//! Decoding RTSP/H.264 is delegated to an `ffmpeg` child process which
//! re-emits the stream as MJPEG on its stdout, already scaled to the target
//! size and rate. A reader task splits that pipe into JPEG images and keeps
//! only the newest one, so a slow consumer never builds a backlog.
//!
//! ```text
//!   camera ──RTSP──► ffmpeg ──MJPEG pipe──► reader task ──► watch slot (depth 1)
//!                                                               │
//!                                              read_frame() ◄───┘  decode JPEG
//! ```

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use image::RgbImage;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::mjpeg::MjpegSplitter;
use super::{FrameSource, SourceConnector, SourceError, SourceSettings};
use crate::stream::StreamConfig;

/// Size of each read from the ffmpeg pipe
const PIPE_CHUNK_SIZE: usize = 16 * 1024;

/// Grace period for ffmpeg to exit after being killed
const EXIT_TIMEOUT: Duration = Duration::from_secs(2);

/// Opens sources by spawning `ffmpeg`
#[derive(Debug, Clone)]
pub struct FfmpegConnector {
    /// Path or name of the ffmpeg binary
    pub binary: PathBuf,

    /// RTSP lower transport ("tcp" or "udp")
    pub rtsp_transport: String,

    /// ffmpeg `-q:v` for the intermediate MJPEG (2 = best, 31 = worst)
    pub pipe_quality: u8,
}

impl Default for FfmpegConnector {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("ffmpeg"),
            rtsp_transport: "tcp".to_string(),
            pipe_quality: 3,
        }
    }
}

impl FfmpegConnector {
    /// Use a specific ffmpeg binary
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            ..Default::default()
        }
    }

    /// Set the RTSP transport
    pub fn rtsp_transport(mut self, transport: impl Into<String>) -> Self {
        self.rtsp_transport = transport.into();
        self
    }

    /// Command-line arguments for one stream
    pub fn args(&self, config: &StreamConfig, settings: &SourceSettings) -> Vec<String> {
        let mut args: Vec<String> = ["-nostdin", "-hide_banner", "-loglevel", "error"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        if config.source_uri.starts_with("rtsp") {
            args.push("-rtsp_transport".into());
            args.push(self.rtsp_transport.clone());
        }

        args.extend(
            [
                "-fflags",
                "+nobuffer+discardcorrupt",
                "-flags",
                "low_delay",
                "-i",
            ]
            .iter()
            .map(|s| s.to_string()),
        );
        args.push(config.source_uri.clone());

        args.push("-an".into());
        args.push("-vf".into());
        args.push(format!(
            "fps={},scale={}:{}",
            settings.frame_rate, settings.resolution.width, settings.resolution.height
        ));
        args.extend(
            ["-f", "image2pipe", "-vcodec", "mjpeg", "-q:v"]
                .iter()
                .map(|s| s.to_string()),
        );
        args.push(self.pipe_quality.clamp(2, 31).to_string());
        args.push("pipe:1".into());

        args
    }
}

#[async_trait]
impl SourceConnector for FfmpegConnector {
    async fn open(
        &self,
        config: &StreamConfig,
        settings: &SourceSettings,
    ) -> Result<Box<dyn FrameSource>, SourceError> {
        let unavailable = |reason: String| SourceError::Unavailable {
            uri: config.redacted_uri(),
            reason,
        };

        let mut child = Command::new(&self.binary)
            .args(self.args(config, settings))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| unavailable(format!("failed to spawn {}: {}", self.binary.display(), e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| unavailable("ffmpeg stdout not captured".into()))?;

        if let Some(stderr) = child.stderr.take() {
            let camera = config.id;
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    tracing::debug!(camera = %camera, ffmpeg = %line, "ffmpeg output");
                }
            });
        }

        let (tx, mut frames) = watch::channel(None);
        let reader = tokio::spawn(pump_frames(stdout, tx));

        // The connection counts as open once the first image arrives
        match tokio::time::timeout(settings.read_timeout, frames.changed()).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => {
                reader.abort();
                let _ = child.start_kill();
                return Err(unavailable("ffmpeg exited before producing a frame".into()));
            }
            Err(_) => {
                reader.abort();
                let _ = child.start_kill();
                return Err(unavailable(format!(
                    "no frame within {:?}",
                    settings.read_timeout
                )));
            }
        }

        tracing::debug!(
            camera = %config.id,
            uri = %config.redacted_uri(),
            pid = ?child.id(),
            "ffmpeg source opened"
        );

        // Hand the first image to the first read
        frames.mark_changed();

        Ok(Box::new(FfmpegSource {
            child: Some(child),
            frames,
            reader: Some(reader),
            read_timeout: settings.read_timeout,
        }))
    }
}

/// Copy images from the pipe into the slot, newest wins
async fn pump_frames<R>(mut pipe: R, slot: watch::Sender<Option<Bytes>>)
where
    R: AsyncRead + Unpin,
{
    let mut splitter = MjpegSplitter::new();
    let mut chunk = vec![0u8; PIPE_CHUNK_SIZE];

    loop {
        match pipe.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                if let Some(latest) = splitter.push(&chunk[..n]).pop() {
                    slot.send_replace(Some(latest));
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "ffmpeg pipe read failed");
                break;
            }
        }
    }
}

/// One running ffmpeg process
pub struct FfmpegSource {
    child: Option<Child>,
    frames: watch::Receiver<Option<Bytes>>,
    reader: Option<JoinHandle<()>>,
    read_timeout: Duration,
}

#[async_trait]
impl FrameSource for FfmpegSource {
    async fn read_frame(&mut self) -> Result<Option<RgbImage>, SourceError> {
        match tokio::time::timeout(self.read_timeout, self.frames.changed()).await {
            Ok(Ok(())) => {}
            // Closed pipe or no frame in time: nothing to read
            Ok(Err(_)) | Err(_) => return Ok(None),
        }

        let jpeg = self.frames.borrow_and_update().clone();
        match jpeg {
            Some(jpeg) => decode_jpeg(&jpeg).map(Some),
            None => Ok(None),
        }
    }

    async fn release(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }

        if let Some(mut child) = self.child.take() {
            let _ = child.start_kill();
            match tokio::time::timeout(EXIT_TIMEOUT, child.wait()).await {
                Ok(Ok(status)) => tracing::debug!(status = %status, "ffmpeg exited"),
                Ok(Err(e)) => tracing::warn!(error = %e, "Failed to reap ffmpeg"),
                Err(_) => tracing::warn!("ffmpeg did not exit after kill"),
            }
        }
    }
}

/// Decode one JPEG image into RGB
pub fn decode_jpeg(jpeg: &[u8]) -> Result<RgbImage, SourceError> {
    image::load_from_memory_with_format(jpeg, image::ImageFormat::Jpeg)
        .map(|img| img.to_rgb8())
        .map_err(|e| SourceError::Decode(e.to_string()))
}
