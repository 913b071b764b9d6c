//! Stream capture
//!
//! One [`StreamWorker`] per camera turns a network video source into a
//! continuously refreshed [`PublishedFrame`].

pub mod config;
pub mod frame;
pub mod worker;

pub use config::{StreamConfig, WorkerTuning};
pub use frame::PublishedFrame;
pub use worker::StreamWorker;
