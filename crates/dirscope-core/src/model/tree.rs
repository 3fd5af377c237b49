/// Arena-backed size tree with post-order aggregation.
///
/// All nodes live in a single `Vec<SizeNode>`. Relationships between nodes
/// use `NodeIndex` (a thin `u32` wrapper) rather than heap pointers, giving
/// cache-friendly traversal and a trivially movable value: the completed
/// tree crosses the scanner-thread boundary by move, never by lock.
use super::node::{NodeIndex, SizeNode};

/// Maximum number of children a directory keeps after sorting.
///
/// Directories wider than this keep the largest `MAX_CHILDREN - 1` entries
/// verbatim; the rest are merged into one synthetic others bucket, keeping
/// per-directory layout cost bounded regardless of fan-out.
pub const MAX_CHILDREN: usize = 2000;

/// The complete size tree produced by a scan.
///
/// Immutable once the scan returns it; layout and zoom are read-only.
#[derive(Debug, Clone)]
pub struct SizeTree {
    /// Arena: every node in a flat vector. Node 0 is the scan root.
    ///
    /// May contain entries no longer linked from the root: when a child
    /// list is truncated into an others bucket the tail subtrees stay in
    /// the arena (an arena never deletes). Reachability is defined by
    /// `children` links from `root()`.
    pub nodes: Vec<SizeNode>,

    /// Aggregate size of the root, cached for consumers.
    pub total_size: u64,

    /// Number of entries recorded with `StatFailed` during the scan.
    pub error_count: u64,
}

impl SizeTree {
    /// Create an empty tree with pre-allocated node capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            total_size: 0,
            error_count: 0,
        }
    }

    /// Append a node to the arena, returning its index.
    pub fn add_node(&mut self, node: SizeNode) -> NodeIndex {
        let idx = NodeIndex::new(self.nodes.len());
        self.nodes.push(node);
        idx
    }

    /// The scan root. Valid once the first node has been added.
    #[inline]
    pub fn root(&self) -> NodeIndex {
        NodeIndex(0)
    }

    /// Get the node at the given index.
    #[inline]
    pub fn node(&self, index: NodeIndex) -> &SizeNode {
        &self.nodes[index.idx()]
    }

    /// Mutable access, used only while the scan is still building the tree.
    #[inline]
    pub(crate) fn node_mut(&mut self, index: NodeIndex) -> &mut SizeNode {
        &mut self.nodes[index.idx()]
    }

    /// Direct children of a node, sorted by aggregate size descending
    /// with the others bucket (if any) last.
    #[inline]
    pub fn children(&self, parent: NodeIndex) -> &[NodeIndex] {
        &self.nodes[parent.idx()].children
    }

    /// Total number of arena slots (including truncated tail entries).
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the tree contains no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// `true` if `node` is a strict descendant of `ancestor`.
    pub fn is_descendant(&self, node: NodeIndex, ancestor: NodeIndex) -> bool {
        let mut current = self.nodes[node.idx()].parent;
        while let Some(idx) = current {
            if idx == ancestor {
                return true;
            }
            current = self.nodes[idx.idx()].parent;
        }
        false
    }

    /// Finalize a directory after its subtree has been walked: sort the
    /// children descending by size (ties by name, so identical trees scan
    /// to identical orders regardless of readdir order), truncate over-wide
    /// lists into an others bucket, and fix the parent's aggregate size.
    pub(crate) fn finalize_children(&mut self, parent: NodeIndex, mut children: Vec<NodeIndex>) {
        children.sort_by(|a, b| {
            let an = &self.nodes[a.idx()];
            let bn = &self.nodes[b.idx()];
            bn.size.cmp(&an.size).then_with(|| an.name.cmp(&bn.name))
        });

        if children.len() > MAX_CHILDREN {
            // Tail subtrees stay in the arena unlinked.
            let tail = children.split_off(MAX_CHILDREN - 1);
            let hidden_size: u64 = tail.iter().map(|c| self.nodes[c.idx()].size).sum();
            let hidden_count = tail.len() as u64;

            let parent_node = &self.nodes[parent.idx()];
            let bucket = SizeNode::new_others(
                parent_node.path.clone(),
                parent_node.hue,
                hidden_size,
                hidden_count,
                parent,
            );
            let bucket_idx = self.add_node(bucket);
            // Pinned last regardless of size rank, so the bucket stays
            // visually and semantically distinct from real entries.
            children.push(bucket_idx);
        }

        let total: u64 = children.iter().map(|c| self.nodes[c.idx()].size).sum();
        let parent_node = self.node_mut(parent);
        parent_node.size = parent_node.own_size + total;
        parent_node.children = children;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::node::{EntryStatus, NodeKind};
    use compact_str::CompactString;
    use std::path::PathBuf;

    fn leaf(tree: &mut SizeTree, parent: NodeIndex, name: &str, size: u64) -> NodeIndex {
        let path = tree.node(parent).path.join(name);
        tree.add_node(SizeNode::new_leaf(
            CompactString::new(name),
            path,
            0.5,
            size,
            None,
            Some(parent),
        ))
    }

    fn root(tree: &mut SizeTree) -> NodeIndex {
        tree.add_node(SizeNode::new_dir(
            CompactString::new("root"),
            PathBuf::from("/root"),
            0.5,
            None,
            None,
        ))
    }

    #[test]
    fn finalize_sorts_descending_with_name_tiebreak() {
        let mut tree = SizeTree::with_capacity(8);
        let r = root(&mut tree);
        let small = leaf(&mut tree, r, "small", 10);
        let big = leaf(&mut tree, r, "big", 1000);
        let tie_b = leaf(&mut tree, r, "b-tie", 10);
        let tie_a = leaf(&mut tree, r, "a-tie", 10);

        tree.finalize_children(r, vec![small, big, tie_b, tie_a]);

        let children = tree.children(r);
        assert_eq!(children[0], big);
        assert_eq!(children[1], tie_a);
        assert_eq!(children[2], tie_b);
        assert_eq!(children[3], small);
        assert_eq!(tree.node(r).size, 1030);
    }

    #[test]
    fn finalize_truncates_into_others_bucket() {
        let mut tree = SizeTree::with_capacity(MAX_CHILDREN + 200);
        let r = root(&mut tree);
        // 2100 children with sizes 1..=2100 — tail is the 101 smallest.
        let children: Vec<NodeIndex> = (1..=2100u64)
            .map(|i| leaf(&mut tree, r, &format!("f{i:04}"), i))
            .collect();

        tree.finalize_children(r, children);

        let kept = tree.children(r);
        assert_eq!(kept.len(), MAX_CHILDREN);

        let bucket = tree.node(*kept.last().unwrap());
        assert!(bucket.is_others_bucket());
        // Sizes 1..=101 were merged.
        assert_eq!(bucket.size, (1..=101u64).sum::<u64>());
        match bucket.kind {
            NodeKind::Others { hidden_count } => assert_eq!(hidden_count, 101),
            _ => unreachable!(),
        }

        // Aggregate still covers every original child.
        assert_eq!(tree.node(r).size, (1..=2100u64).sum::<u64>());
        // Kept real children are the 1999 largest, still sorted descending.
        assert_eq!(tree.node(kept[0]).size, 2100);
        assert_eq!(tree.node(kept[MAX_CHILDREN - 2]).size, 102);
    }

    #[test]
    fn bucket_not_created_at_exactly_max_children() {
        let mut tree = SizeTree::with_capacity(MAX_CHILDREN + 2);
        let r = root(&mut tree);
        let children: Vec<NodeIndex> = (0..MAX_CHILDREN as u64)
            .map(|i| leaf(&mut tree, r, &format!("f{i:04}"), i + 1))
            .collect();

        tree.finalize_children(r, children);

        let kept = tree.children(r);
        assert_eq!(kept.len(), MAX_CHILDREN);
        assert!(!tree.node(*kept.last().unwrap()).is_others_bucket());
    }

    #[test]
    fn is_descendant_follows_parent_chain() {
        let mut tree = SizeTree::with_capacity(4);
        let r = root(&mut tree);
        let dir = tree.add_node(SizeNode::new_dir(
            CompactString::new("sub"),
            PathBuf::from("/root/sub"),
            0.5,
            None,
            Some(r),
        ));
        let file = leaf(&mut tree, dir, "f", 1);
        tree.finalize_children(dir, vec![file]);
        tree.finalize_children(r, vec![dir]);

        assert!(tree.is_descendant(file, r));
        assert!(tree.is_descendant(file, dir));
        assert!(tree.is_descendant(dir, r));
        assert!(!tree.is_descendant(r, file));
        assert!(!tree.is_descendant(r, r));
    }

    #[test]
    fn excluded_status_round_trips() {
        let mut tree = SizeTree::with_capacity(2);
        let r = root(&mut tree);
        let ex = tree.add_node(SizeNode::new_excluded(
            CompactString::new("proc"),
            PathBuf::from("/root/proc"),
            0.1,
            None,
            Some(r),
        ));
        assert_eq!(tree.node(ex).status(), EntryStatus::Excluded);
        assert!(tree.node(ex).children.is_empty());
        assert_eq!(tree.node(ex).size, 0);
    }
}
