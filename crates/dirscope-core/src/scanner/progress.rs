/// Scan progress reporting — lightweight events sent from the scan
/// thread to the consumer via a crossbeam channel.
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Events sent from the scan thread to the consumer's status display.
///
/// The stream is advisory and lossy (`try_send` on a bounded channel): a
/// slow consumer loses status lines, never stalls the scanner. The
/// authoritative scan result travels only through
/// [`ScanHandle::join`](super::ScanHandle::join), and every event for a
/// subtree is sent before `join` can observe that subtree's node.
#[derive(Debug)]
pub enum ScanEvent {
    /// A directory was entered. Throttled to at most one per
    /// [`PROGRESS_MIN_INTERVAL`](super::PROGRESS_MIN_INTERVAL).
    Visiting { path: PathBuf },
    /// Scanning completed successfully.
    Completed {
        duration: Duration,
        /// Entries recorded with size 0 because their lstat failed.
        error_count: u64,
    },
    /// Scan was cancelled by the consumer; the partial tree was discarded.
    Cancelled,
    /// Scan aborted with a root-level error.
    Failed { message: String },
}

/// Minimum-interval gate for `Visiting` events.
pub(crate) struct Throttle {
    min_interval: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub(crate) fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: None,
        }
    }

    /// `true` if enough time has passed since the last accepted event.
    /// The first call always passes.
    pub(crate) fn ready(&mut self) -> bool {
        let now = Instant::now();
        match self.last {
            Some(last) if now.duration_since(last) < self.min_interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}
