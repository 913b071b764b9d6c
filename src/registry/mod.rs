//! Stream registry
//!
//! The registry owns one [`StreamWorker`](crate::stream::StreamWorker) per
//! camera and enforces that at most one exists for any id. Starting,
//! stopping and reaping are serialized by a single mutex. The map has its
//! own short-held `RwLock`, so lookups never wait on a camera that is
//! connecting or shutting down; readers clone the worker's `Arc` out and
//! read frames without any registry lock.
//!
//! # Architecture
//!
//! ```text
//!                          Arc<StreamRegistry>
//!                     ┌──────────────────────────┐
//!                     │ changes: Mutex<()>       │
//!                     │ workers: RwLock<HashMap< │
//!                     │   CameraId,              │
//!                     │   Arc<StreamWorker>,     │
//!                     │ >>                       │
//!                     └───────────┬──────────────┘
//!                                 │
//!         ┌───────────────────────┼───────────────────────┐
//!         │                       │                       │
//!         ▼                       ▼                       ▼
//!   [HTTP handlers]          [Reaper task]          [Distribution]
//!   get_or_start/stop_for    reap_stale()           get() ──► latest_jpeg()
//! ```
//!
//! # Reaping
//!
//! A worker that stopped itself after too many errors, or whose camera went
//! quiet, stays registered until the reaper removes it. The reaper runs on a
//! fixed interval, independent of request traffic.

pub mod config;
pub mod error;
pub mod status;
pub mod store;

pub use config::RegistryConfig;
pub use error::RegistryError;
pub use status::StreamStatus;
pub use store::StreamRegistry;
