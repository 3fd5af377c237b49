/// Post-order filesystem walk building the size tree.
///
/// Strictly sequential and deterministic: a directory's aggregate size and
/// sorted child list are finalized before the directory is linked to its
/// parent, so the aggregation invariant holds at every node the moment it
/// exists. Symbolic links are never followed — they become zero-size
/// leaves, which rules out cycles by construction.
use crate::color::{child_hue, hue_for_path};
use crate::model::{EntryMeta, EntryStatus, NodeIndex, NodeKind, SizeNode, SizeTree};
use crate::scanner::{ScanError, ScanOptions};
use compact_str::CompactString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Entries processed between cancellation polls inside a single directory.
/// The flag is also checked unconditionally on every directory entered.
const CANCEL_POLL_EVERY: u32 = 128;

/// Walk `root` and return the completed size tree.
///
/// `on_progress` fires once per directory entered, always before that
/// subtree is finalized. Root-level failures surface before any progress
/// call; per-entry failures are recorded in the tree and never abort the
/// walk. A positive `cancel` flag unwinds promptly with
/// [`ScanError::Cancelled`] and no tree escapes.
pub fn scan(
    root: &Path,
    options: &ScanOptions,
    cancel: &AtomicBool,
    on_progress: &mut dyn FnMut(&Path),
) -> Result<SizeTree, ScanError> {
    let root = std::path::absolute(root)?;

    let meta = fs::symlink_metadata(&root).map_err(|err| root_error(err, &root))?;
    if !meta.is_dir() {
        return Err(ScanError::RootNotADirectory(root.clone()));
    }
    // Probe readability up front so a denied root is a typed error, not a
    // silently empty tree.
    fs::read_dir(&root).map_err(|err| root_error(err, &root))?;

    let mut walker = Walker {
        options,
        cancel,
        on_progress,
        tree: SizeTree::with_capacity(4096),
        steps_since_poll: 0,
        error_count: 0,
    };

    let root_name = root
        .file_name()
        .map(|n| CompactString::new(n.to_string_lossy()))
        .unwrap_or_else(|| CompactString::new(root.to_string_lossy()));
    walker.walk_dir(&root, root_name, hue_for_path(&root), None)?;

    let mut tree = walker.tree;
    tree.total_size = tree.node(tree.root()).size;
    tree.error_count = walker.error_count;
    Ok(tree)
}

fn root_error(err: io::Error, root: &Path) -> ScanError {
    match err.kind() {
        io::ErrorKind::NotFound => ScanError::RootNotFound(root.to_path_buf()),
        io::ErrorKind::PermissionDenied => ScanError::PermissionDenied(root.to_path_buf()),
        _ => ScanError::Io(err),
    }
}

struct Walker<'a> {
    options: &'a ScanOptions,
    cancel: &'a AtomicBool,
    on_progress: &'a mut dyn FnMut(&Path),
    tree: SizeTree,
    steps_since_poll: u32,
    error_count: u64,
}

impl Walker<'_> {
    /// Bounded-interval cancellation poll for large directories.
    fn cancelled_at_step(&mut self) -> bool {
        self.steps_since_poll += 1;
        if self.steps_since_poll >= CANCEL_POLL_EVERY {
            self.steps_since_poll = 0;
            self.cancel.load(Ordering::Relaxed)
        } else {
            false
        }
    }

    /// Recurse into a directory, returning its finalized node.
    fn walk_dir(
        &mut self,
        path: &Path,
        name: CompactString,
        hue: f32,
        parent: Option<NodeIndex>,
    ) -> Result<NodeIndex, ScanError> {
        // Cancellation wins over progress: a scan cancelled before this
        // directory stays silent about it.
        if self.cancel.load(Ordering::Relaxed) {
            return Err(ScanError::Cancelled);
        }
        (self.on_progress)(path);

        let meta = fs::symlink_metadata(path).ok();
        let idx = self.tree.add_node(SizeNode::new_dir(
            name,
            path.to_path_buf(),
            hue,
            meta.as_ref().map(EntryMeta::capture),
            parent,
        ));

        let entries = match fs::read_dir(path) {
            Ok(rd) => rd,
            Err(err) => {
                // Unreadable non-root directory: flagged, zero children.
                debug!("read_dir failed for {}: {err}", path.display());
                self.error_count += 1;
                if let NodeKind::Entry { status, .. } = &mut self.tree.node_mut(idx).kind {
                    *status = EntryStatus::StatFailed;
                }
                self.tree.finalize_children(idx, Vec::new());
                return Ok(idx);
            }
        };

        let mut children: Vec<NodeIndex> = Vec::new();
        for entry in entries {
            if self.cancelled_at_step() {
                return Err(ScanError::Cancelled);
            }

            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    // Entry vanished or was unreadable mid-enumeration.
                    debug!("dir entry error under {}: {err}", path.display());
                    self.error_count += 1;
                    continue;
                }
            };

            let child_path = entry.path();
            let child_name = CompactString::new(entry.file_name().to_string_lossy());
            let hue_below = child_hue(hue, &entry.file_name());

            let child = match entry.file_type() {
                Ok(ft) if ft.is_dir() => {
                    if self.options.is_excluded(&child_path) {
                        self.record_excluded(&child_path, child_name, hue_below, idx)
                    } else {
                        self.walk_dir(&child_path, child_name, hue_below, Some(idx))?
                    }
                }
                Ok(ft) => self.record_leaf(&child_path, child_name, hue_below, ft, idx),
                Err(err) => {
                    debug!("file_type failed for {}: {err}", child_path.display());
                    self.error_count += 1;
                    self.tree.add_node(SizeNode::new_failed(
                        child_name,
                        child_path,
                        hue_below,
                        false,
                        Some(idx),
                    ))
                }
            };
            children.push(child);
        }

        self.tree.finalize_children(idx, children);
        Ok(idx)
    }

    /// Record a directory matched by the exclusion set: zero children,
    /// zero size, present in the tree so totals stay explainable.
    fn record_excluded(
        &mut self,
        path: &Path,
        name: CompactString,
        hue: f32,
        parent: NodeIndex,
    ) -> NodeIndex {
        debug!("excluded: {}", path.display());
        let meta = fs::symlink_metadata(path).ok();
        self.tree.add_node(SizeNode::new_excluded(
            name,
            path.to_path_buf(),
            hue,
            meta.as_ref().map(EntryMeta::capture),
            Some(parent),
        ))
    }

    /// Record a non-directory entry. Symlinks (including links to
    /// directories, possibly an ancestor) are zero-size leaves.
    fn record_leaf(
        &mut self,
        path: &Path,
        name: CompactString,
        hue: f32,
        ftype: fs::FileType,
        parent: NodeIndex,
    ) -> NodeIndex {
        match fs::symlink_metadata(path) {
            Ok(meta) => {
                let own_size = if ftype.is_symlink() { 0 } else { meta.len() };
                self.tree.add_node(SizeNode::new_leaf(
                    name,
                    path.to_path_buf(),
                    hue,
                    own_size,
                    Some(EntryMeta::capture(&meta)),
                    Some(parent),
                ))
            }
            Err(err) => {
                debug!("lstat failed for {}: {err}", path.display());
                self.error_count += 1;
                self.tree.add_node(SizeNode::new_failed(
                    name,
                    path.to_path_buf(),
                    hue,
                    false,
                    Some(parent),
                ))
            }
        }
    }
}

/// Default exclusion prefixes: virtual and volatile filesystems whose
/// contents would distort a disk-usage picture.
pub(crate) fn default_excluded() -> Vec<PathBuf> {
    ["/proc", "/sys", "/dev", "/run", "/mnt"]
        .iter()
        .map(PathBuf::from)
        .collect()
}
