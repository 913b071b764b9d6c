//! Scripted sources for tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::{Rgb, RgbImage};

use super::{FrameSource, SourceConnector, SourceError, SourceSettings};
use crate::stream::StreamConfig;

/// What a scripted read returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A frame of the script's frame size
    Frame,
    /// `Ok(None)`
    Miss,
    /// `Err(SourceError::Decode)`
    Fault,
    /// Block forever, like a camera that stopped sending
    Stall,
}

/// Shared script and counters, inspected by tests after the fact
#[derive(Debug)]
pub struct Script {
    steps: Mutex<VecDeque<Step>>,
    fallback: Mutex<Step>,
    frame_size: Mutex<(u32, u32)>,
    refuse_open: AtomicBool,
    open_delay: Mutex<Duration>,
    pub opened: AtomicUsize,
    pub released: AtomicUsize,
    pub reads: AtomicUsize,
}

impl Script {
    /// Set what reads return once the queued steps run out
    pub fn set_fallback(&self, step: Step) {
        *self.fallback.lock().unwrap() = step;
    }

    /// Queue steps ahead of the fallback
    pub fn push(&self, steps: impl IntoIterator<Item = Step>) {
        self.steps.lock().unwrap().extend(steps);
    }

    /// Make subsequent opens fail
    pub fn refuse_open(&self, refuse: bool) {
        self.refuse_open.store(refuse, Ordering::SeqCst);
    }

    /// Make subsequent opens take `delay`, like a slow camera handshake
    pub fn set_open_delay(&self, delay: Duration) {
        *self.open_delay.lock().unwrap() = delay;
    }

    /// Size of produced frames
    pub fn set_frame_size(&self, width: u32, height: u32) {
        *self.frame_size.lock().unwrap() = (width, height);
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn next_step(&self) -> Step {
        self.steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| *self.fallback.lock().unwrap())
    }
}

/// Connector whose sources follow a shared [`Script`]
#[derive(Debug, Clone)]
pub struct ScriptedConnector {
    pub script: Arc<Script>,
}

impl ScriptedConnector {
    /// Sources that produce 640x480 frames forever
    pub fn new() -> Self {
        Self {
            script: Arc::new(Script {
                steps: Mutex::new(VecDeque::new()),
                fallback: Mutex::new(Step::Frame),
                frame_size: Mutex::new((640, 480)),
                refuse_open: AtomicBool::new(false),
                open_delay: Mutex::new(Duration::ZERO),
                opened: AtomicUsize::new(0),
                released: AtomicUsize::new(0),
                reads: AtomicUsize::new(0),
            }),
        }
    }

    /// Sources that never produce a frame
    pub fn failing() -> Self {
        let connector = Self::new();
        connector.script.set_fallback(Step::Miss);
        connector
    }

    /// Connector that refuses every open
    pub fn unreachable() -> Self {
        let connector = Self::new();
        connector.script.refuse_open(true);
        connector
    }
}

#[async_trait]
impl SourceConnector for ScriptedConnector {
    async fn open(
        &self,
        config: &StreamConfig,
        _settings: &SourceSettings,
    ) -> Result<Box<dyn FrameSource>, SourceError> {
        let delay = *self.script.open_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.script.refuse_open.load(Ordering::SeqCst) {
            return Err(SourceError::Unavailable {
                uri: config.redacted_uri(),
                reason: "connection refused".into(),
            });
        }

        self.script.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSource {
            script: Arc::clone(&self.script),
            released: false,
        }))
    }
}

struct ScriptedSource {
    script: Arc<Script>,
    released: bool,
}

#[async_trait]
impl FrameSource for ScriptedSource {
    async fn read_frame(&mut self) -> Result<Option<RgbImage>, SourceError> {
        let n = self.script.reads.fetch_add(1, Ordering::SeqCst);

        match self.script.next_step() {
            Step::Frame => {
                let (w, h) = *self.script.frame_size.lock().unwrap();
                let shade = (n % 256) as u8;
                Ok(Some(RgbImage::from_pixel(w, h, Rgb([shade, shade, shade]))))
            }
            Step::Miss => Ok(None),
            Step::Fault => Err(SourceError::Decode("scripted fault".into())),
            Step::Stall => std::future::pending().await,
        }
    }

    async fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.script.released.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl Drop for ScriptedSource {
    fn drop(&mut self) {
        if !self.released {
            self.script.released.fetch_add(1, Ordering::SeqCst);
        }
    }
}
