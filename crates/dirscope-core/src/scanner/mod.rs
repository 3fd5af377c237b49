/// Scanner module — orchestrates filesystem scanning.
///
/// The synchronous core lives in [`walk`]: a strict post-order,
/// non-link-following traversal that builds the size tree bottom-up.
/// [`start_scan`] runs it on a dedicated worker thread so the consumer's
/// context stays responsive; only the progress/cancellation hooks and the
/// final tree (or error) cross the boundary. [`ScanSlot`] enforces the
/// one-scan-at-a-time rule.
pub mod progress;
pub mod walk;

pub use progress::ScanEvent;
pub use walk::scan;

use crate::model::SizeTree;
use progress::Throttle;

use crossbeam_channel::Receiver;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::info;

/// Errors that abort a scan. Per-entry failures never appear here — they
/// are recorded in the tree with size 0 and a status flag.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("root path not found: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("root path is not a directory: {}", .0.display())]
    RootNotADirectory(PathBuf),

    /// Permission denied on the scan root itself. Entry-level permission
    /// failures are recovered locally instead.
    #[error("permission denied reading scan root: {}", .0.display())]
    PermissionDenied(PathBuf),

    /// Cooperative cancellation. Distinct from failure so consumers can
    /// reset quietly instead of showing an error.
    #[error("scan cancelled")]
    Cancelled,

    /// Other root-level I/O failure (e.g. a symlink loop on the root path).
    #[error("i/o error on scan root")]
    Io(#[from] std::io::Error),
}

/// Scan configuration, threaded explicitly into every scan so tests can
/// run with custom exclusion sets.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Path prefixes never descended into. Matching directories are
    /// recorded with zero children; the scan root itself is exempt.
    pub excluded: Vec<PathBuf>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            excluded: walk::default_excluded(),
        }
    }
}

impl ScanOptions {
    /// No exclusions at all.
    pub fn none() -> Self {
        Self {
            excluded: Vec::new(),
        }
    }

    /// Component-wise prefix match against the exclusion set.
    pub fn is_excluded(&self, path: &Path) -> bool {
        self.excluded.iter().any(|prefix| path.starts_with(prefix))
    }
}

/// Maximum number of events that may queue up in the channel.
///
/// `Visiting` events are throttled and sent with `try_send`, so the bound
/// never back-pressures the scanner; it only caps memory if the consumer
/// stops draining entirely.
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Minimum interval between `Visiting` events.
pub const PROGRESS_MIN_INTERVAL: Duration = Duration::from_millis(50);

/// Handle to a running or completed scan: progress events, cancellation,
/// and the final result.
pub struct ScanHandle {
    /// Receiver for progress events from the scan thread.
    pub events: Receiver<ScanEvent>,
    /// Flag to request cancellation.
    cancel_flag: Arc<AtomicBool>,
    /// Join handle carrying the authoritative result.
    thread: Option<thread::JoinHandle<Result<SizeTree, ScanError>>>,
}

impl ScanHandle {
    /// Request the scan to stop as soon as possible.
    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::Relaxed);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel_flag.load(Ordering::Relaxed)
    }

    /// `true` once the worker thread has finished (successfully or not).
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(|t| t.is_finished())
    }

    /// Wait for the scan and take its result. All progress events for a
    /// subtree are sent before `join` can observe that subtree completed.
    pub fn join(mut self) -> Result<SizeTree, ScanError> {
        self.thread
            .take()
            .expect("scan result already taken")
            .join()
            .expect("scanner thread panicked")
    }
}

/// Start a new scan on a background worker thread.
pub fn start_scan(root: PathBuf, options: ScanOptions) -> ScanHandle {
    let (tx, rx) = crossbeam_channel::bounded::<ScanEvent>(EVENT_CHANNEL_CAPACITY);
    let cancel_flag = Arc::new(AtomicBool::new(false));
    let cancel_clone = cancel_flag.clone();

    let thread = thread::Builder::new()
        .name("dirscope-scanner".into())
        .spawn(move || {
            info!("starting scan of {}", root.display());
            let start = Instant::now();

            let mut throttle = Throttle::new(PROGRESS_MIN_INTERVAL);
            let mut on_progress = |path: &Path| {
                if throttle.ready() {
                    let _ = tx.try_send(ScanEvent::Visiting {
                        path: path.to_path_buf(),
                    });
                }
            };

            let result = walk::scan(&root, &options, &cancel_clone, &mut on_progress);

            match &result {
                Ok(tree) => {
                    let duration = start.elapsed();
                    info!(
                        "scan of {} complete: {} bytes, {} entry errors in {duration:?}",
                        root.display(),
                        tree.total_size,
                        tree.error_count
                    );
                    let _ = tx.try_send(ScanEvent::Completed {
                        duration,
                        error_count: tree.error_count,
                    });
                }
                Err(ScanError::Cancelled) => {
                    info!("scan of {} cancelled", root.display());
                    let _ = tx.try_send(ScanEvent::Cancelled);
                }
                Err(err) => {
                    info!("scan of {} failed: {err}", root.display());
                    let _ = tx.try_send(ScanEvent::Failed {
                        message: err.to_string(),
                    });
                }
            }

            result
        })
        .expect("failed to spawn scanner thread");

    ScanHandle {
        events: rx,
        cancel_flag,
        thread: Some(thread),
    }
}

/// At most one scan is ever active: starting a new one first cancels the
/// in-flight scan and waits for it to unwind, discarding its result.
#[derive(Default)]
pub struct ScanSlot {
    active: Option<ScanHandle>,
}

impl ScanSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a scan, replacing (cancel + join) any in-flight one.
    pub fn start(&mut self, root: PathBuf, options: ScanOptions) -> &ScanHandle {
        if let Some(prev) = self.active.take() {
            prev.cancel();
            // Partial result of the superseded scan is discarded.
            let _ = prev.join();
        }
        self.active.insert(start_scan(root, options))
    }

    /// Handle of the in-flight scan, if any.
    pub fn handle(&self) -> Option<&ScanHandle> {
        self.active.as_ref()
    }

    /// Take the result once the worker has finished. Returns `None` while
    /// the scan is still running (or none was started).
    pub fn try_finish(&mut self) -> Option<Result<SizeTree, ScanError>> {
        if self.active.as_ref().is_some_and(ScanHandle::is_finished) {
            self.active.take().map(ScanHandle::join)
        } else {
            None
        }
    }

    /// Request cancellation of the in-flight scan, if any.
    pub fn cancel(&self) {
        if let Some(handle) = &self.active {
            handle.cancel();
        }
    }
}
