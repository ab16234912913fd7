use std::collections::VecDeque;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::search::BlockedSet;
use crate::domain::value::ValueBound;

/// Child slot of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Binary tree cell stored in the arena.
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Node value, within the tree's [`ValueBound`]
    pub value: u32,
    /// Index of the left child in the arena
    pub left: Option<Index>,
    /// Index of the right child in the arena
    pub right: Option<Index>,
}

impl TreeNode {
    fn new(value: u32) -> Self {
        Self {
            value,
            left: None,
            right: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    pub fn child(&self, side: Side) -> Option<Index> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    /// Present children, left before right.
    pub fn children(&self) -> impl Iterator<Item = Index> {
        self.left.into_iter().chain(self.right)
    }
}

/// Arena-based binary tree with bounded node values.
///
/// Owns every node reachable from `root`; there is no sharing between trees,
/// a copied subtree lives in its own arena. `size` is a cached node count and
/// `size == 0` exactly when `root` is `None`.
#[derive(Debug, Clone)]
pub struct BinaryTree {
    /// Arena storage for all tree nodes
    arena: Arena<TreeNode>,
    /// Index of the root node, None for empty trees
    root: Option<Index>,
    /// Cached number of nodes reachable from root
    size: usize,
    bound: ValueBound,
}

impl Default for BinaryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for BinaryTree {
    /// Structural equality: same shape and same values.
    fn eq(&self, other: &Self) -> bool {
        self.preorder_tokens() == other.preorder_tokens()
    }
}

impl Eq for BinaryTree {}

impl BinaryTree {
    pub fn new() -> Self {
        Self::with_bound(ValueBound::default())
    }

    pub fn with_bound(bound: ValueBound) -> Self {
        Self {
            arena: Arena::new(),
            root: None,
            size: 0,
            bound,
        }
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    pub fn root_value(&self) -> Option<u32> {
        self.root
            .and_then(|idx| self.get_node(idx))
            .map(|node| node.value)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn bound(&self) -> ValueBound {
        self.bound
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    /// True when `idx` refers to a node without children.
    pub fn is_leaf(&self, idx: Index) -> bool {
        self.get_node(idx).map(TreeNode::is_leaf).unwrap_or(false)
    }

    /// Insert the root node after validating its value.
    #[instrument(level = "trace", skip(self))]
    pub fn insert_root(&mut self, value: i64) -> DomainResult<Index> {
        let value = self.bound.check(value)?;
        if self.root.is_some() {
            return Err(DomainError::InvalidParameter(
                "tree already has a root".to_string(),
            ));
        }
        let idx = self.attach(None, value)?;
        self.size += 1;
        Ok(idx)
    }

    /// Insert a child into an empty slot of `parent` after validating its value.
    #[instrument(level = "trace", skip(self))]
    pub fn insert_child(&mut self, parent: Index, side: Side, value: i64) -> DomainResult<Index> {
        let value = self.bound.check(value)?;
        let parent_node = self.get_node(parent).ok_or(DomainError::DanglingIndex)?;
        if parent_node.child(side).is_some() {
            return Err(DomainError::InvalidParameter(format!(
                "{:?} child of {} already set",
                side, parent_node.value
            )));
        }
        let idx = self.attach(Some((parent, side)), value)?;
        self.size += 1;
        Ok(idx)
    }

    /// Store a node without validating its value or touching the size cache.
    pub(crate) fn attach(
        &mut self,
        parent: Option<(Index, Side)>,
        value: u32,
    ) -> DomainResult<Index> {
        if let Some((parent_idx, _)) = parent {
            if !self.arena.contains(parent_idx) {
                return Err(DomainError::DanglingIndex);
            }
        }
        let node_idx = self.arena.insert(TreeNode::new(value));
        match parent {
            Some((parent_idx, side)) => {
                let parent = self
                    .arena
                    .get_mut(parent_idx)
                    .ok_or(DomainError::DanglingIndex)?;
                match side {
                    Side::Left => parent.left = Some(node_idx),
                    Side::Right => parent.right = Some(node_idx),
                }
            }
            None => self.root = Some(node_idx),
        }
        Ok(node_idx)
    }

    /// Recompute the cached size from the nodes reachable from root.
    pub(crate) fn refresh_size(&mut self) {
        self.size = self.calculate_size(self.root);
        debug_assert_eq!(self.size, self.arena.len());
    }

    /// Pre-order iteration (node, left subtree, right subtree) over the whole tree.
    pub fn iter(&self) -> PreOrderIterator<'_> {
        PreOrderIterator::new(self, self.root)
    }

    /// Pre-order iteration over the subtree rooted at `start`.
    pub fn iter_from(&self, start: Index) -> PreOrderIterator<'_> {
        PreOrderIterator::new(self, Some(start))
    }

    /// Level-order iteration, left to right within a level.
    pub fn iter_level_order(&self) -> LevelOrderIterator<'_> {
        LevelOrderIterator::new(self, self.root)
    }

    pub fn iter_level_order_from(&self, start: Index) -> LevelOrderIterator<'_> {
        LevelOrderIterator::new(self, Some(start))
    }

    pub fn iter_postorder(&self) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self)
    }

    /// Number of levels; 0 for an empty tree.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut queue = VecDeque::new();
        if let Some(root) = self.root {
            queue.push_back((root, 1));
        }
        while let Some((idx, depth)) = queue.pop_front() {
            max_depth = max_depth.max(depth);
            if let Some(node) = self.get_node(idx) {
                for child in node.children() {
                    queue.push_back((child, depth + 1));
                }
            }
        }
        max_depth
    }

    /// Values of all leaves in pre-order.
    pub fn leaf_values(&self) -> Vec<u32> {
        self.iter()
            .filter(|(_, node)| node.is_leaf())
            .map(|(_, node)| node.value)
            .collect()
    }

    /// Pre-order walk including `None` for every absent child.
    ///
    /// A single `None` stands for the empty tree.
    pub fn preorder_tokens(&self) -> Vec<Option<u32>> {
        let mut tokens = Vec::with_capacity(2 * self.size + 1);
        let mut stack = vec![self.root];
        while let Some(slot) = stack.pop() {
            match slot.and_then(|idx| self.get_node(idx)) {
                Some(node) => {
                    tokens.push(Some(node.value));
                    stack.push(node.right);
                    stack.push(node.left);
                }
                None => tokens.push(None),
            }
        }
        tokens
    }

    /// First node in pre-order carrying `value`.
    ///
    /// When several nodes share the value, the pre-order-first one wins.
    #[instrument(level = "debug", skip(self))]
    pub fn find_node_by_value(&self, value: u32) -> Option<Index> {
        self.iter()
            .find(|(_, node)| node.value == value)
            .map(|(idx, _)| idx)
    }

    /// False if any node of the subtree (inclusive) is blocked.
    ///
    /// An absent subtree is vacuously valid.
    pub fn is_valid_subtree(&self, node: Option<Index>, blocked: &BlockedSet) -> bool {
        match node {
            Some(idx) => self.iter_from(idx).all(|(_, n)| !blocked.contains(n.value)),
            None => true,
        }
    }

    /// Count of nodes in the subtree rooted at `node`.
    pub fn calculate_size(&self, node: Option<Index>) -> usize {
        node.map(|idx| self.iter_from(idx).count()).unwrap_or(0)
    }

    /// Deep copy of the subtree rooted at `node` into a fresh, independent tree.
    ///
    /// Values are not re-validated. `None` yields an empty tree.
    #[instrument(level = "debug", skip(self))]
    pub fn copy_subtree(&self, node: Option<Index>) -> BinaryTree {
        let mut copy = BinaryTree::with_bound(self.bound);
        let mut stack: Vec<(Index, Option<(Index, Side)>)> =
            node.into_iter().map(|idx| (idx, None)).collect();

        while let Some((src_idx, dst_parent)) = stack.pop() {
            let Some(src) = self.get_node(src_idx) else {
                continue;
            };
            // parent indices come from `copy` itself, attach cannot miss
            let Ok(dst_idx) = copy.attach(dst_parent, src.value) else {
                continue;
            };
            if let Some(right) = src.right {
                stack.push((right, Some((dst_idx, Side::Right))));
            }
            if let Some(left) = src.left {
                stack.push((left, Some((dst_idx, Side::Left))));
            }
        }

        copy.refresh_size();
        copy
    }
}

pub struct PreOrderIterator<'a> {
    tree: &'a BinaryTree,
    stack: Vec<Index>,
}

impl<'a> PreOrderIterator<'a> {
    fn new(tree: &'a BinaryTree, start: Option<Index>) -> Self {
        Self {
            tree,
            stack: start.into_iter().collect(),
        }
    }
}

impl<'a> Iterator for PreOrderIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.tree.get_node(current_idx) {
                // Push right first so the left subtree is visited first
                self.stack.extend(node.right);
                self.stack.extend(node.left);
                return Some((current_idx, node));
            }
        }
        None
    }
}

pub struct LevelOrderIterator<'a> {
    tree: &'a BinaryTree,
    queue: VecDeque<Index>,
}

impl<'a> LevelOrderIterator<'a> {
    fn new(tree: &'a BinaryTree, start: Option<Index>) -> Self {
        Self {
            tree,
            queue: start.into_iter().collect(),
        }
    }
}

impl<'a> Iterator for LevelOrderIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.queue.pop_front() {
            if let Some(node) = self.tree.get_node(current_idx) {
                self.queue.extend(node.children());
                return Some((current_idx, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a> {
    tree: &'a BinaryTree,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(tree: &'a BinaryTree) -> Self {
        Self {
            tree,
            stack: tree.root().into_iter().map(|idx| (idx, false)).collect(),
        }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.tree.get_node(current_idx) {
                if visited {
                    return Some((current_idx, node));
                }
                self.stack.push((current_idx, true));
                if let Some(right) = node.right {
                    self.stack.push((right, false));
                }
                if let Some(left) = node.left {
                    self.stack.push((left, false));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    //     5
    //    / \
    //   3   8
    //  /     \
    // 3       9
    fn sample() -> BinaryTree {
        let mut tree = BinaryTree::new();
        let root = tree.insert_root(5).unwrap();
        let left = tree.insert_child(root, Side::Left, 3).unwrap();
        tree.insert_child(left, Side::Left, 3).unwrap();
        let right = tree.insert_child(root, Side::Right, 8).unwrap();
        tree.insert_child(right, Side::Right, 9).unwrap();
        tree
    }

    #[test]
    fn test_size_tracks_inserts() {
        let tree = sample();
        assert_eq!(tree.size(), 5);
        assert_eq!(tree.calculate_size(tree.root()), 5);
        assert_eq!(tree.depth(), 3);
    }

    #[test]
    fn test_empty_tree_invariants() {
        let tree = BinaryTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.size(), 0);
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.preorder_tokens(), vec![None]);
        assert_eq!(tree.iter().count(), 0);
    }

    #[test]
    fn test_insert_rejects_out_of_range_and_occupied_slots() {
        let mut tree = BinaryTree::new();
        assert_eq!(
            tree.insert_root(0),
            Err(DomainError::ValueOutOfRange { value: 0, max: 1000 })
        );
        let root = tree.insert_root(1).unwrap();
        assert!(tree.insert_root(2).is_err());
        tree.insert_child(root, Side::Left, 2).unwrap();
        assert!(tree.insert_child(root, Side::Left, 4).is_err());
        assert!(tree.insert_child(root, Side::Right, 1001).is_err());
        assert_eq!(tree.size(), 2);
    }

    #[test]
    fn test_traversal_orders() {
        let tree = sample();
        let pre: Vec<u32> = tree.iter().map(|(_, n)| n.value).collect();
        let level: Vec<u32> = tree.iter_level_order().map(|(_, n)| n.value).collect();
        let post: Vec<u32> = tree.iter_postorder().map(|(_, n)| n.value).collect();
        assert_eq!(pre, vec![5, 3, 3, 8, 9]);
        assert_eq!(level, vec![5, 3, 8, 3, 9]);
        assert_eq!(post, vec![3, 3, 9, 8, 5]);
        assert_eq!(tree.leaf_values(), vec![3, 9]);
    }

    #[test]
    fn test_find_prefers_preorder_first_duplicate() {
        let tree = sample();
        let found = tree.find_node_by_value(3).unwrap();
        let node = tree.get_node(found).unwrap();
        // the inner 3 has a child, the deeper one does not
        assert!(!node.is_leaf());
        assert!(tree.find_node_by_value(42).is_none());
    }

    #[test]
    fn test_preorder_tokens_include_sentinels() {
        let mut tree = BinaryTree::new();
        let root = tree.insert_root(5).unwrap();
        tree.insert_child(root, Side::Left, 3).unwrap();
        assert_eq!(tree.preorder_tokens(), vec![Some(5), Some(3), None, None, None]);
    }

    #[test]
    fn test_copy_subtree_is_independent() {
        let tree = sample();
        let right = tree.get_node(tree.root().unwrap()).unwrap().right;
        let copy = tree.copy_subtree(right);
        drop(tree);
        assert_eq!(copy.size(), 2);
        assert_eq!(copy.preorder_tokens(), vec![Some(8), None, Some(9), None, None]);
    }

    #[test]
    fn test_copy_of_none_is_empty() {
        let tree = sample();
        let copy = tree.copy_subtree(None);
        assert!(copy.is_empty());
        assert_eq!(copy.size(), 0);
    }
}
