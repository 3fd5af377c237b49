/// Data model for the dirscope size tree.
///
/// Re-exports the arena-allocated tree structure and supporting types.
pub mod node;
pub mod size;
pub mod tree;

pub use node::{EntryMeta, EntryStatus, NodeIndex, NodeKind, SizeNode};
pub use tree::{SizeTree, MAX_CHILDREN};
