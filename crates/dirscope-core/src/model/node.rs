/// A single node in the arena-allocated size tree.
///
/// Nodes are stored in a flat `Vec<SizeNode>` for cache-friendly traversal.
/// Parent-child relationships use indices rather than pointers; child lists
/// are explicit `Vec<NodeIndex>` so the sorted-descending order the layout
/// engine depends on is a stored property, not a per-query sort.
use compact_str::CompactString;
use std::fs::Metadata;
use std::os::unix::fs::MetadataExt;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Lightweight index into the arena `Vec<SizeNode>`.
///
/// Uses `u32` to keep nodes small — supports up to ~4 billion nodes,
/// which is more than enough for any real filesystem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    /// Create a new `NodeIndex` from a `usize`, panicking if it exceeds
    /// `u32::MAX`. A hard assert: silent truncation would corrupt every
    /// link past the boundary, and the check is free next to the push it
    /// guards.
    #[inline]
    pub fn new(index: usize) -> Self {
        assert!(index <= u32::MAX as usize, "NodeIndex overflow");
        Self(index as u32)
    }

    /// Return the index as a `usize` for Vec indexing.
    #[inline]
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Stat details captured once per entry with a non-following lstat.
///
/// Immutable after the scan; formatting (ctime strings, rwx renderings,
/// user/group name resolution) is left to consumers.
#[derive(Debug, Clone, Copy)]
pub struct EntryMeta {
    /// Last-modified timestamp (mtime).
    pub modified: Option<SystemTime>,
    /// Last-accessed timestamp (atime).
    pub accessed: Option<SystemTime>,
    /// Inode-change timestamp (ctime).
    pub changed: Option<SystemTime>,
    /// Birth timestamp where the filesystem records one.
    pub created: Option<SystemTime>,
    /// Owning user id.
    pub uid: u32,
    /// Owning group id.
    pub gid: u32,
    /// Full `st_mode` bits (file type + permissions).
    pub mode: u32,
}

impl EntryMeta {
    /// Capture the tooltip-relevant fields from an lstat result.
    pub fn capture(meta: &Metadata) -> Self {
        Self {
            modified: meta.modified().ok(),
            accessed: meta.accessed().ok(),
            changed: epoch_time(meta.ctime(), meta.ctime_nsec()),
            created: meta.created().ok(),
            uid: meta.uid(),
            gid: meta.gid(),
            mode: meta.mode(),
        }
    }
}

/// Convert raw epoch seconds + nanos into a `SystemTime`.
///
/// Pre-epoch ctimes only appear on broken filesystems; treat them as absent.
fn epoch_time(secs: i64, nsec: i64) -> Option<SystemTime> {
    if secs < 0 || nsec < 0 {
        return None;
    }
    UNIX_EPOCH.checked_add(Duration::new(secs as u64, nsec as u32))
}

/// How a real filesystem entry fared during the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// Enumerated and stat'ed normally.
    Scanned,
    /// lstat or read_dir failed (permission denied, race-deleted, …).
    /// The entry stays in the tree with size 0 so totals are explainable.
    StatFailed,
    /// Matched the exclusion set; recorded with zero children, not omitted.
    Excluded,
}

/// What a node represents: a real filesystem entry, or the synthetic
/// bucket that absorbs the tail of an over-wide directory.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// A real file, directory, or symlink.
    Entry {
        meta: Option<EntryMeta>,
        status: EntryStatus,
    },
    /// Aggregated remainder of a directory with more than
    /// [`MAX_CHILDREN`](super::MAX_CHILDREN) children. No filesystem
    /// backing — only a summed size and the number of entries it hides.
    Others { hidden_count: u64 },
}

/// A single entry in the size tree.
#[derive(Debug, Clone)]
pub struct SizeNode {
    /// Final path component, kept separately for display and hue derivation.
    pub name: CompactString,

    /// Absolute path of the entry. Unique among siblings by final component.
    pub path: PathBuf,

    /// `true` for directories reached directly (never via a symlink).
    pub is_dir: bool,

    /// Bytes occupied by the entry itself: lstat size for regular files,
    /// 0 for directories, symlinks, and the others bucket.
    pub own_size: u64,

    /// Aggregate size: `own_size` plus all descendants, finalized
    /// post-order before the node is linked to its parent.
    pub size: u64,

    /// Stable hue in [0, 1), a pure function of `path`.
    pub hue: f32,

    /// Index of the parent node. `None` only for the scan root.
    pub parent: Option<NodeIndex>,

    /// Children sorted by `size` descending (ties by name ascending),
    /// with the others bucket — if any — pinned last.
    pub children: Vec<NodeIndex>,

    /// Real entry vs. synthetic bucket.
    pub kind: NodeKind,
}

impl SizeNode {
    /// Create a directory node. Size and children are finalized later,
    /// after the subtree below it has been walked.
    pub fn new_dir(
        name: CompactString,
        path: PathBuf,
        hue: f32,
        meta: Option<EntryMeta>,
        parent: Option<NodeIndex>,
    ) -> Self {
        Self {
            name,
            path,
            is_dir: true,
            own_size: 0,
            size: 0,
            hue,
            parent,
            children: Vec::new(),
            kind: NodeKind::Entry {
                meta,
                status: EntryStatus::Scanned,
            },
        }
    }

    /// Create a leaf node (regular file, special file, or symlink).
    pub fn new_leaf(
        name: CompactString,
        path: PathBuf,
        hue: f32,
        own_size: u64,
        meta: Option<EntryMeta>,
        parent: Option<NodeIndex>,
    ) -> Self {
        Self {
            name,
            path,
            is_dir: false,
            own_size,
            size: own_size,
            hue,
            parent,
            children: Vec::new(),
            kind: NodeKind::Entry {
                meta,
                status: EntryStatus::Scanned,
            },
        }
    }

    /// Create a zero-sized placeholder for an entry that could not be read.
    pub fn new_failed(
        name: CompactString,
        path: PathBuf,
        hue: f32,
        is_dir: bool,
        parent: Option<NodeIndex>,
    ) -> Self {
        Self {
            name,
            path,
            is_dir,
            own_size: 0,
            size: 0,
            hue,
            parent,
            children: Vec::new(),
            kind: NodeKind::Entry {
                meta: None,
                status: EntryStatus::StatFailed,
            },
        }
    }

    /// Create the record for a directory skipped by the exclusion set.
    pub fn new_excluded(
        name: CompactString,
        path: PathBuf,
        hue: f32,
        meta: Option<EntryMeta>,
        parent: Option<NodeIndex>,
    ) -> Self {
        Self {
            name,
            path,
            is_dir: true,
            own_size: 0,
            size: 0,
            hue,
            parent,
            children: Vec::new(),
            kind: NodeKind::Entry {
                meta,
                status: EntryStatus::Excluded,
            },
        }
    }

    /// Create the synthetic others bucket for a truncated child list.
    pub fn new_others(
        path: PathBuf,
        hue: f32,
        total_size: u64,
        hidden_count: u64,
        parent: NodeIndex,
    ) -> Self {
        Self {
            name: CompactString::new("(others)"),
            path,
            is_dir: false,
            own_size: total_size,
            size: total_size,
            hue,
            parent: Some(parent),
            children: Vec::new(),
            kind: NodeKind::Others { hidden_count },
        }
    }

    /// `true` if this is the synthetic others bucket.
    #[inline]
    pub fn is_others_bucket(&self) -> bool {
        matches!(self.kind, NodeKind::Others { .. })
    }

    /// Scan status for real entries; buckets report `Scanned`.
    #[inline]
    pub fn status(&self) -> EntryStatus {
        match self.kind {
            NodeKind::Entry { status, .. } => status,
            NodeKind::Others { .. } => EntryStatus::Scanned,
        }
    }

    /// Stat details, if the lstat succeeded. `None` for the others bucket.
    #[inline]
    pub fn meta(&self) -> Option<&EntryMeta> {
        match &self.kind {
            NodeKind::Entry { meta, .. } => meta.as_ref(),
            NodeKind::Others { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_index_round_trips() {
        assert_eq!(NodeIndex::new(0).idx(), 0);
        assert_eq!(NodeIndex::new(u32::MAX as usize).idx(), u32::MAX as usize);
    }

    #[test]
    #[should_panic(expected = "NodeIndex overflow")]
    fn node_index_overflow_panics_in_all_builds() {
        let _ = NodeIndex::new(u32::MAX as usize + 1);
    }
}
