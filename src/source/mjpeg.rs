//! MJPEG byte-stream splitting
//!
//! An MJPEG pipe is a plain concatenation of JPEG images. Each image starts
//! with SOI (`FF D8`) and ends with EOI (`FF D9`); `FF` bytes inside the
//! entropy-coded data are always stuffed, so EOI cannot appear early.

use bytes::{Bytes, BytesMut};

const SOI: [u8; 2] = [0xFF, 0xD8];
const EOI: [u8; 2] = [0xFF, 0xD9];

/// Default cap on a single image before the buffer is considered garbage
pub const DEFAULT_MAX_FRAME_SIZE: usize = 8 * 1024 * 1024;

/// Incremental JPEG extractor
#[derive(Debug)]
pub struct MjpegSplitter {
    buf: BytesMut,
    /// Offset up to which `buf` has been searched for EOI
    scanned: usize,
    /// Whether `buf` currently starts with SOI
    in_frame: bool,
    max_frame_size: usize,
}

impl MjpegSplitter {
    /// Create a splitter with the default size cap
    pub fn new() -> Self {
        Self::with_max_frame_size(DEFAULT_MAX_FRAME_SIZE)
    }

    /// Create a splitter with a custom size cap
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(64 * 1024),
            scanned: 0,
            in_frame: false,
            max_frame_size,
        }
    }

    /// Bytes held waiting for the rest of an image
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Feed a chunk and collect every image it completes
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Bytes> {
        self.buf.extend_from_slice(chunk);
        let mut frames = Vec::new();

        loop {
            if !self.in_frame {
                match find(&self.buf, &SOI, 0) {
                    Some(start) => {
                        let _ = self.buf.split_to(start);
                        self.in_frame = true;
                        self.scanned = SOI.len();
                    }
                    None => {
                        // Keep a trailing FF, it may be half of the next SOI
                        let keep = usize::from(self.buf.last() == Some(&0xFF));
                        let drop = self.buf.len() - keep;
                        let _ = self.buf.split_to(drop);
                        break;
                    }
                }
            }

            // Back up one byte so an EOI split across chunks is found
            let from = self.scanned.saturating_sub(1).max(SOI.len());
            match find(&self.buf, &EOI, from) {
                Some(end) => {
                    let frame = self.buf.split_to(end + EOI.len()).freeze();
                    frames.push(frame);
                    self.in_frame = false;
                    self.scanned = 0;
                }
                None => {
                    self.scanned = self.buf.len();
                    if self.buf.len() > self.max_frame_size {
                        tracing::warn!(
                            buffered = self.buf.len(),
                            limit = self.max_frame_size,
                            "MJPEG image exceeds size limit, discarding"
                        );
                        self.buf.clear();
                        self.in_frame = false;
                        self.scanned = 0;
                    }
                    break;
                }
            }
        }

        frames
    }
}

impl Default for MjpegSplitter {
    fn default() -> Self {
        Self::new()
    }
}

fn find(haystack: &[u8], needle: &[u8; 2], from: usize) -> Option<usize> {
    if haystack.len() < from + needle.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|pos| pos + from)
}
