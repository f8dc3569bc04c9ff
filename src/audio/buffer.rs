//! Capture-side storage for the caller's audio
//!
//! The audio driver runs on its own cadence and must never wait on the
//! processing side. Chunks travel through a bounded channel
//! ([`capture_channel`]) and a single drain task appends them to the
//! [`AudioBuffer`], which is the only lock shared between the two sides.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Default)]
struct FrameLog {
    active: bool,
    chunks: Vec<Vec<u8>>,
}

/// Append-only store of raw audio chunks for one call
#[derive(Clone, Default)]
pub struct AudioBuffer {
    inner: Arc<Mutex<FrameLog>>,
}

impl AudioBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop any previous frames and begin accepting pushes
    pub fn start(&self) {
        let mut log = self.inner.lock();
        log.chunks.clear();
        log.active = true;
    }

    /// Append one chunk; silently ignored while inactive
    pub fn push(&self, chunk: Vec<u8>) {
        let mut log = self.inner.lock();
        if log.active {
            log.chunks.push(chunk);
        }
    }

    /// Stop accepting pushes. Frames stay in place for the flush.
    pub fn stop(&self) {
        self.inner.lock().active = false;
    }

    pub fn is_active(&self) -> bool {
        self.inner.lock().active
    }

    /// Number of stored chunks
    pub fn len(&self) -> usize {
        self.inner.lock().chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total stored bytes
    pub fn byte_len(&self) -> usize {
        self.inner.lock().chunks.iter().map(Vec::len).sum()
    }

    /// All chunks concatenated in arrival order
    pub fn concat(&self) -> Vec<u8> {
        self.inner.lock().chunks.concat()
    }

    /// Clear stored chunks (after a successful flush)
    pub fn clear(&self) {
        self.inner.lock().chunks.clear();
    }
}

/// Create the bounded channel between the audio driver and the buffer
pub fn capture_channel(capacity: usize) -> (CaptureSink, CaptureDrain) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let dropped = Arc::new(AtomicU64::new(0));
    let closed = Arc::new(AtomicBool::new(false));

    (
        CaptureSink {
            tx,
            dropped: Arc::clone(&dropped),
            closed: Arc::clone(&closed),
        },
        CaptureDrain { rx, dropped, closed },
    )
}

/// Producer half, owned by the audio driver callback
#[derive(Clone)]
pub struct CaptureSink {
    tx: mpsc::Sender<Vec<u8>>,
    dropped: Arc<AtomicU64>,
    closed: Arc<AtomicBool>,
}

impl CaptureSink {
    /// Hand a chunk to the drain without blocking.
    ///
    /// Returns false when the chunk was dropped (channel full or closed).
    pub fn send(&self, chunk: Vec<u8>) -> bool {
        match self.tx.try_send(chunk) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                if total == 1 || total % 100 == 0 {
                    warn!("Capture channel full, dropped {} chunk(s) so far", total);
                }
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                if !self.closed.swap(true, Ordering::Relaxed) {
                    debug!("Capture channel closed, ignoring further chunks");
                }
                false
            }
        }
    }

    pub fn dropped_chunks(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Consumer half, drained into an [`AudioBuffer`]
pub struct CaptureDrain {
    rx: mpsc::Receiver<Vec<u8>>,
    dropped: Arc<AtomicU64>,
    closed: Arc<AtomicBool>,
}

impl CaptureDrain {
    /// Move chunks into the buffer until every sink is dropped.
    ///
    /// Returns the number of chunks received (including ones the buffer
    /// ignored because it was inactive).
    pub async fn run(mut self, buffer: AudioBuffer) -> usize {
        let mut received = 0;

        while let Some(chunk) = self.rx.recv().await {
            buffer.push(chunk);
            received += 1;
        }

        self.closed.store(true, Ordering::Relaxed);

        info!(
            "Capture drain finished: {} chunks received, {} dropped",
            received,
            self.dropped.load(Ordering::Relaxed)
        );

        received
    }
}
