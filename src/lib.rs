//! Camera stream capture and redistribution
//!
//! One capture worker per camera pulls frames from a network video source
//! and keeps only the newest. Any number of HTTP viewers read that frame as
//! a snapshot or as a live `multipart/x-mixed-replace` sequence, without
//! slowing capture down or queueing behind each other.
//!
//! ```text
//!   CameraDirectory ──profile──► StreamRegistry ──owns──► StreamWorker ──► FrameSource (ffmpeg)
//!                                      │                        │
//!                                      │ get()                  │ latest frame
//!                                      ▼                        ▼
//!                                 HTTP routes ◄──────── distribution (snapshot / live)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use camstream::camera::StaticDirectory;
//! use camstream::source::FfmpegConnector;
//! use camstream::{CamServer, ServerConfig};
//!
//! # async fn run() -> camstream::Result<()> {
//! let directory = StaticDirectory::load("cameras.json").await?;
//! let server = CamServer::new(
//!     ServerConfig::default(),
//!     Arc::new(directory),
//!     Arc::new(FfmpegConnector::default()),
//! );
//!
//! server.run_until(async {
//!     let _ = tokio::signal::ctrl_c().await;
//! }).await
//! # }
//! ```

pub mod camera;
pub mod distribution;
pub mod error;
pub mod registry;
pub mod server;
pub mod source;
pub mod stats;
pub mod stream;

pub use camera::{CameraDirectory, CameraId, CameraProfile, Resolution, StaticDirectory, StreamQuality};
pub use error::{Error, Result};
pub use registry::{RegistryConfig, StreamRegistry, StreamStatus};
pub use server::{CamServer, QualityProfile, ServerConfig};
pub use stream::{PublishedFrame, StreamConfig, StreamWorker, WorkerTuning};
