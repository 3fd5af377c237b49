/// Zoom stack — which subtree the layout engine sees.
///
/// Pure navigation state over a completed [`SizeTree`]: a stack of node
/// indices from the scan root down to the current zoom target. Holds no
/// tree data itself; a new scan replaces the tree and the consumer builds
/// a fresh stack for it.
use crate::model::{NodeIndex, SizeTree};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ZoomError {
    /// The target is not a directory strictly below the current view.
    #[error("zoom target is not a directory below the current view")]
    InvalidZoomTarget,
}

/// Ancestor stack from the scan root to the current zoom target.
#[derive(Debug, Clone)]
pub struct ZoomStack {
    stack: Vec<NodeIndex>,
}

impl ZoomStack {
    /// Start at the scan root.
    pub fn new(root: NodeIndex) -> Self {
        Self { stack: vec![root] }
    }

    /// The node currently fed to the layout engine.
    #[inline]
    pub fn current(&self) -> NodeIndex {
        *self.stack.last().expect("zoom stack is never empty")
    }

    /// `true` when no zoom is active.
    #[inline]
    pub fn at_root(&self) -> bool {
        self.stack.len() == 1
    }

    /// Root-to-current chain, for breadcrumb displays.
    #[inline]
    pub fn chain(&self) -> &[NodeIndex] {
        &self.stack
    }

    /// Zoom into `target`. Pushes only if `target` is a directory and a
    /// strict descendant of the current view; otherwise fails and leaves
    /// the stack unchanged.
    pub fn zoom_into(&mut self, tree: &SizeTree, target: NodeIndex) -> Result<(), ZoomError> {
        let node = tree.node(target);
        if !node.is_dir || !tree.is_descendant(target, self.current()) {
            return Err(ZoomError::InvalidZoomTarget);
        }
        self.stack.push(target);
        Ok(())
    }

    /// Back out one level. No-op at the root (not an error).
    pub fn go_up(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    /// Reset to the scan root.
    pub fn go_top(&mut self) {
        self.stack.truncate(1);
    }
}
