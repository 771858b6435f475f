//! B+ Tree implementation for database indexing
//!
//! This module provides the in-memory node structure behind an index file:
//! - Duplicate keys, kept in insertion order
//! - Ordered scans via linked leaf nodes
//! - i32 keys with RecordId values
//!
//! Nodes live in an arena and are addressed by `NodeId`; the index layer maps
//! node `i` to page `i + 1` of its file. Deletion is lazy: entries are removed
//! from their leaf but nodes are never merged or freed.

mod error;
mod node;

pub use error::{BPlusTreeError, BPlusTreeResult};
pub use node::{BPlusNode, InternalNode, LeafNode, NodeId};

use std::collections::{BTreeSet, VecDeque};
use std::fmt::Write;

use crate::record::RecordId;

/// Key type for B+ tree (INT columns)
pub type BPlusKey = i32;

/// Smallest order that still allows a split
pub const MIN_ORDER: usize = 3;

/// B+ Tree data structure
///
/// Order `n` means:
/// - Internal nodes have at most `n` children
/// - Leaf nodes have at most `n-1` entries
///
/// Overflow splits the node and pushes the split upward, growing a new root
/// when the old root splits.
#[derive(Debug)]
pub struct BPlusTree {
    /// Root node ID (None until the first insert)
    root: Option<NodeId>,

    /// Tree order (max children per internal node)
    order: usize,

    /// Node storage
    nodes: Vec<BPlusNode>,

    /// First leaf node (for full scans)
    first_leaf: Option<NodeId>,

    /// Total number of entries in the tree
    entry_count: usize,

    /// Nodes modified since the last `take_dirty`
    dirty: BTreeSet<NodeId>,
}

impl BPlusTree {
    /// Create a new empty B+ tree with the given order
    ///
    /// # Arguments
    /// * `order` - The tree order (must be >= 3)
    pub fn new(order: usize) -> BPlusTreeResult<Self> {
        if order < MIN_ORDER {
            return Err(BPlusTreeError::InvalidOrder(order));
        }

        Ok(Self {
            root: None,
            order,
            nodes: Vec::new(),
            first_leaf: None,
            entry_count: 0,
            dirty: BTreeSet::new(),
        })
    }

    /// Rebuild a tree from nodes read back from storage.
    ///
    /// Every child and `next` link must point at an existing node.
    pub fn from_nodes(
        order: usize,
        nodes: Vec<BPlusNode>,
        root: Option<NodeId>,
        first_leaf: Option<NodeId>,
    ) -> BPlusTreeResult<Self> {
        let mut tree = Self::new(order)?;
        let count = nodes.len();
        let in_range = |id: NodeId| {
            if id < count {
                Ok(())
            } else {
                Err(BPlusTreeError::NodeNotFound(id))
            }
        };

        if root.is_some() != first_leaf.is_some() {
            return Err(BPlusTreeError::InvalidState(
                "root and first leaf must both be set or both be absent".to_string(),
            ));
        }
        root.map(in_range).transpose()?;
        first_leaf.map(in_range).transpose()?;

        let mut entry_count = 0;
        for node in &nodes {
            match node {
                BPlusNode::Internal(internal) => {
                    if internal.is_empty() || internal.len() > order {
                        return Err(BPlusTreeError::InvalidState(format!(
                            "internal node with {} children",
                            internal.len()
                        )));
                    }
                    for &child in &internal.children {
                        in_range(child)?;
                    }
                }
                BPlusNode::Leaf(leaf) => {
                    if leaf.len() >= order {
                        return Err(BPlusTreeError::InvalidState(format!(
                            "leaf with {} entries",
                            leaf.len()
                        )));
                    }
                    leaf.next.map(in_range).transpose()?;
                    entry_count += leaf.len();
                }
            }
        }

        tree.nodes = nodes;
        tree.root = root;
        tree.first_leaf = first_leaf;
        tree.entry_count = entry_count;
        Ok(tree)
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// True when no entries are stored (nodes may still exist)
    pub fn is_empty(&self) -> bool {
        self.entry_count == 0
    }

    /// Get number of entries in the tree
    pub fn len(&self) -> usize {
        self.entry_count
    }

    /// Get tree height (1 for single leaf, 2+ for internal nodes)
    pub fn height(&self) -> usize {
        let Some(mut current) = self.root else {
            return 0;
        };
        let mut height = 1;
        while let Some(BPlusNode::Internal(node)) = self.get_node(current) {
            match node.children.first() {
                Some(&child_id) => {
                    current = child_id;
                    height += 1;
                }
                None => break,
            }
        }
        height
    }

    /// Maximum entries in a leaf node
    fn max_leaf_entries(&self) -> usize {
        self.order - 1
    }

    /// Maximum children in an internal node
    fn max_internal_children(&self) -> usize {
        self.order
    }

    // ========== Node Management ==========

    fn allocate_node(&mut self, node: BPlusNode) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(node);
        self.dirty.insert(id);
        id
    }

    pub fn get_node(&self, id: NodeId) -> Option<&BPlusNode> {
        self.nodes.get(id)
    }

    /// Mutable access; the node is recorded as dirty
    fn get_node_mut(&mut self, id: NodeId) -> Option<&mut BPlusNode> {
        let node = self.nodes.get_mut(id)?;
        self.dirty.insert(id);
        Some(node)
    }

    fn leaf_mut(&mut self, id: NodeId) -> BPlusTreeResult<&mut LeafNode> {
        self.get_node_mut(id)
            .and_then(|n| n.as_leaf_mut())
            .ok_or(BPlusTreeError::NodeNotFound(id))
    }

    fn internal_mut(&mut self, id: NodeId) -> BPlusTreeResult<&mut InternalNode> {
        self.get_node_mut(id)
            .and_then(|n| n.as_internal_mut())
            .ok_or(BPlusTreeError::NodeNotFound(id))
    }

    /// All nodes, indexed by `NodeId`
    pub fn nodes(&self) -> &[BPlusNode] {
        &self.nodes
    }

    pub fn root_node_id(&self) -> Option<NodeId> {
        self.root
    }

    pub fn first_leaf_id(&self) -> Option<NodeId> {
        self.first_leaf
    }

    /// Number of allocated nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Drain the set of nodes modified since the last call, in id order
    pub fn take_dirty(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.dirty).into_iter().collect()
    }

    pub fn has_dirty_nodes(&self) -> bool {
        !self.dirty.is_empty()
    }

    // ========== Search Operations ==========

    /// Search for a key, returning the first matching RecordId
    pub fn search(&self, key: BPlusKey) -> Option<RecordId> {
        let (leaf_id, pos) = self.locate(key)?;
        let leaf = self.get_node(leaf_id)?.as_leaf()?;
        Some(leaf.values[pos])
    }

    /// Leaf and position of the first entry with `key`.
    ///
    /// Separators are upper bounds only, so the first match may sit in a later
    /// leaf than the one the descent lands on; walk the chain until a larger key shows up.
    fn locate(&self, key: BPlusKey) -> Option<(NodeId, usize)> {
        let mut current = Some(self.find_leaf(key, InternalNode::find_child_index)?.0);

        while let Some(id) = current {
            let leaf = self.get_node(id)?.as_leaf()?;
            if let Some(pos) = leaf.position(key) {
                return Some((id, pos));
            }
            if leaf.max_key().is_some_and(|max| max > key) {
                return None;
            }
            current = leaf.next;
        }

        None
    }

    /// Find the leaf for `key` and the path from root to it, choosing a child
    /// at each internal node with `route`
    fn find_leaf(
        &self,
        key: BPlusKey,
        route: fn(&InternalNode, BPlusKey) -> usize,
    ) -> Option<(NodeId, Vec<(NodeId, usize)>)> {
        let mut current = self.root?;
        let mut path = Vec::new();

        loop {
            match self.get_node(current)? {
                BPlusNode::Leaf(_) => return Some((current, path)),
                BPlusNode::Internal(node) => {
                    let child_idx = route(node, key);
                    path.push((current, child_idx));
                    current = node.children[child_idx];
                }
            }
        }
    }

    // ========== Insert Operations ==========

    /// Insert a key-value pair into the tree
    pub fn insert(&mut self, key: BPlusKey, rid: RecordId) -> BPlusTreeResult<()> {
        if self.root.is_none() {
            let mut leaf = LeafNode::new();
            leaf.insert(key, rid);
            let leaf_id = self.allocate_node(BPlusNode::Leaf(leaf));
            self.root = Some(leaf_id);
            self.first_leaf = Some(leaf_id);
            self.entry_count = 1;
            return Ok(());
        }

        let (leaf_id, path) = self
            .find_leaf(key, InternalNode::find_insert_index)
            .ok_or_else(|| BPlusTreeError::InvalidState("Could not find leaf".to_string()))?;

        let leaf_len = {
            let leaf = self.leaf_mut(leaf_id)?;
            leaf.insert(key, rid);
            leaf.len()
        };
        self.entry_count += 1;

        if leaf_len > self.max_leaf_entries() {
            self.split_leaf(leaf_id, path)
        } else {
            self.update_ancestor_keys(leaf_id, &path)
        }
    }

    /// Split an overflowing leaf node
    fn split_leaf(&mut self, leaf_id: NodeId, path: Vec<(NodeId, usize)>) -> BPlusTreeResult<()> {
        let right = self.leaf_mut(leaf_id)?.split();
        let right_max = right.max_key();
        let right_id = self.allocate_node(BPlusNode::Leaf(right));

        let leaf = self.leaf_mut(leaf_id)?;
        leaf.next = Some(right_id);
        let left_max = leaf.max_key();

        match (left_max, right_max) {
            (Some(left_key), Some(right_key)) => {
                self.insert_into_parent(path, leaf_id, left_key, right_id, right_key)
            }
            _ => Err(BPlusTreeError::InvalidState(format!(
                "split of leaf {} produced an empty half",
                leaf_id
            ))),
        }
    }

    /// Insert a new child into the parent after a split
    fn insert_into_parent(
        &mut self,
        mut path: Vec<(NodeId, usize)>,
        left_id: NodeId,
        left_key: BPlusKey,
        right_id: NodeId,
        right_key: BPlusKey,
    ) -> BPlusTreeResult<()> {
        let Some((parent_id, child_idx)) = path.pop() else {
            // Split the root - create new root
            let new_root = InternalNode::new(vec![left_key, right_key], vec![left_id, right_id]);
            let new_root_id = self.allocate_node(BPlusNode::Internal(new_root));
            self.root = Some(new_root_id);
            return Ok(());
        };

        let parent_len = {
            let parent = self.internal_mut(parent_id)?;
            parent.keys[child_idx] = left_key;
            parent.keys.insert(child_idx + 1, right_key);
            parent.children.insert(child_idx + 1, right_id);
            parent.len()
        };

        if parent_len > self.max_internal_children() {
            self.split_internal(parent_id, path)
        } else {
            self.update_ancestor_keys(parent_id, &path)
        }
    }

    /// Split an overflowing internal node
    fn split_internal(&mut self, node_id: NodeId, path: Vec<(NodeId, usize)>) -> BPlusTreeResult<()> {
        let (right_keys, right_children, left_max) = {
            let node = self.internal_mut(node_id)?;
            let mid = node.len() / 2;
            let right_keys = node.keys.split_off(mid);
            let right_children = node.children.split_off(mid);
            (right_keys, right_children, node.max_key())
        };

        let right_max = right_keys.last().copied();
        let right_id = self.allocate_node(BPlusNode::Internal(InternalNode::new(
            right_keys,
            right_children,
        )));

        match (left_max, right_max) {
            (Some(left_key), Some(right_key)) => {
                self.insert_into_parent(path, node_id, left_key, right_id, right_key)
            }
            _ => Err(BPlusTreeError::InvalidState(format!(
                "split of internal node {} produced an empty half",
                node_id
            ))),
        }
    }

    /// Raise ancestor separators that fell below the max key of their subtree
    fn update_ancestor_keys(
        &mut self,
        node_id: NodeId,
        path: &[(NodeId, usize)],
    ) -> BPlusTreeResult<()> {
        let mut current_node = node_id;

        for &(parent_id, child_idx) in path.iter().rev() {
            let Some(max_key) = self.get_node(current_node).and_then(|n| n.max_key()) else {
                break;
            };

            let separator = self
                .get_node(parent_id)
                .and_then(|n| n.as_internal())
                .map(|n| n.keys[child_idx])
                .ok_or(BPlusTreeError::NodeNotFound(parent_id))?;
            if separator >= max_key {
                break;
            }

            self.internal_mut(parent_id)?.keys[child_idx] = max_key;
            current_node = parent_id;
        }

        Ok(())
    }

    // ========== Delete Operations ==========

    /// Delete the first entry with the given key.
    /// Returns the removed RecordId, or `None` if the key is absent.
    pub fn delete(&mut self, key: BPlusKey) -> BPlusTreeResult<Option<RecordId>> {
        let Some((leaf_id, pos)) = self.locate(key) else {
            return Ok(None);
        };

        let leaf = self.leaf_mut(leaf_id)?;
        leaf.keys.remove(pos);
        let rid = leaf.values.remove(pos);
        self.entry_count -= 1;

        Ok(Some(rid))
    }

    // ========== Iterator ==========

    /// Iterate over all entries in key order
    pub fn iter(&self) -> BPlusTreeIter<'_> {
        BPlusTreeIter::new(self)
    }

    /// Render the tree breadth-first, one node per line.
    ///
    /// Internal nodes print as `(id)[child,key,child,key,...]`, leaves as
    /// `(id)[page.slot,key,...]` followed by `->next` when linked.
    pub fn print_tree(&self) -> String {
        let mut out = String::new();
        let mut queue: VecDeque<NodeId> = self.root.into_iter().collect();

        while let Some(id) = queue.pop_front() {
            let Some(node) = self.get_node(id) else {
                continue;
            };
            let parts: Vec<String> = match node {
                BPlusNode::Internal(internal) => {
                    queue.extend(internal.children.iter().copied());
                    internal
                        .children
                        .iter()
                        .zip(&internal.keys)
                        .map(|(child, key)| format!("{},{}", child, key))
                        .collect()
                }
                BPlusNode::Leaf(leaf) => leaf
                    .values
                    .iter()
                    .zip(&leaf.keys)
                    .map(|(rid, key)| format!("{}.{},{}", rid.page_id, rid.slot_id, key))
                    .collect(),
            };
            let _ = write!(out, "({})[{}]", id, parts.join(","));
            if let Some(next) = node.as_leaf().and_then(|leaf| leaf.next) {
                let _ = write!(out, "->{}", next);
            }
            out.push('\n');
        }

        out
    }
}

/// Iterator over B+ tree entries
pub struct BPlusTreeIter<'a> {
    tree: &'a BPlusTree,
    current_leaf: Option<NodeId>,
    current_idx: usize,
}

impl<'a> BPlusTreeIter<'a> {
    fn new(tree: &'a BPlusTree) -> Self {
        Self {
            tree,
            current_leaf: tree.first_leaf,
            current_idx: 0,
        }
    }
}

impl Iterator for BPlusTreeIter<'_> {
    type Item = (BPlusKey, RecordId);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let leaf_id = self.current_leaf?;
            let leaf = self.tree.get_node(leaf_id)?.as_leaf()?;

            if self.current_idx < leaf.len() {
                let key = leaf.keys[self.current_idx];
                let value = leaf.values[self.current_idx];
                self.current_idx += 1;
                return Some((key, value));
            }

            // Move to next leaf
            self.current_leaf = leaf.next;
            self.current_idx = 0;
        }
    }
}
