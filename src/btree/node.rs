use crate::record::RecordId;

use super::BPlusKey;

/// Node identifier (index into node storage)
pub type NodeId = usize;

/// Internal node: stores keys and child pointers
///
/// In this B+ tree variant:
/// - keys[i] is an upper bound of every key in the subtree at children[i]
/// - every key in children[i + 1] is >= keys[i]
/// - keys.len() == children.len()
#[derive(Debug, Clone, PartialEq)]
pub struct InternalNode {
    /// Maximum key of each child subtree
    pub keys: Vec<BPlusKey>,
    /// Child node IDs
    pub children: Vec<NodeId>,
}

impl InternalNode {
    /// Create a new internal node with given keys and children
    pub fn new(keys: Vec<BPlusKey>, children: Vec<NodeId>) -> Self {
        debug_assert_eq!(keys.len(), children.len());
        Self { keys, children }
    }

    /// Number of children
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Child where the first entry equal to `key` may live.
    /// Returns the index of the first key >= search key, or the last index if none found
    pub fn find_child_index(&self, key: BPlusKey) -> usize {
        self.keys
            .iter()
            .position(|&k| k >= key)
            .unwrap_or(self.keys.len().saturating_sub(1))
    }

    /// Child that receives a new entry for `key`.
    /// Equal keys go after the existing ones, so this is the first key > search key.
    pub fn find_insert_index(&self, key: BPlusKey) -> usize {
        self.keys
            .iter()
            .position(|&k| k > key)
            .unwrap_or(self.keys.len().saturating_sub(1))
    }

    pub fn max_key(&self) -> Option<BPlusKey> {
        self.keys.last().copied()
    }
}

/// Leaf node: stores key-value pairs, linked to next leaf
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeafNode {
    /// Keys (sorted)
    pub keys: Vec<BPlusKey>,
    /// Values (RecordIds) corresponding to keys
    pub values: Vec<RecordId>,
    /// Link to next leaf in key order
    pub next: Option<NodeId>,
}

impl LeafNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a leaf node with given entries
    pub fn with_entries(keys: Vec<BPlusKey>, values: Vec<RecordId>) -> Self {
        debug_assert_eq!(keys.len(), values.len());
        Self {
            keys,
            values,
            next: None,
        }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Insert a key-value pair in sorted order, after any entries with an equal key
    pub fn insert(&mut self, key: BPlusKey, value: RecordId) {
        let pos = self
            .keys
            .iter()
            .position(|&k| k > key)
            .unwrap_or(self.keys.len());
        self.keys.insert(pos, key);
        self.values.insert(pos, value);
    }

    /// Position of the first entry with the given key
    pub fn position(&self, key: BPlusKey) -> Option<usize> {
        for (i, &k) in self.keys.iter().enumerate() {
            if k == key {
                return Some(i);
            }
            if k > key {
                break;
            }
        }
        None
    }

    /// Search for a key, return the first matching RecordId
    pub fn search(&self, key: BPlusKey) -> Option<RecordId> {
        self.position(key).map(|i| self.values[i])
    }

    /// Delete the first entry with the given key, returning its value
    pub fn delete(&mut self, key: BPlusKey) -> Option<RecordId> {
        let i = self.position(key)?;
        self.keys.remove(i);
        Some(self.values.remove(i))
    }

    pub fn max_key(&self) -> Option<BPlusKey> {
        self.keys.last().copied()
    }

    pub fn min_key(&self) -> Option<BPlusKey> {
        self.keys.first().copied()
    }

    /// Split this leaf node, returning the new right sibling.
    /// This node keeps the first half and the right sibling takes over `next`.
    pub fn split(&mut self) -> LeafNode {
        let mid = self.keys.len() / 2;

        let right_keys = self.keys.split_off(mid);
        let right_values = self.values.split_off(mid);

        let mut right = LeafNode::with_entries(right_keys, right_values);
        right.next = self.next.take();

        right
    }
}

/// B+ tree node (either internal or leaf)
#[derive(Debug, Clone, PartialEq)]
pub enum BPlusNode {
    Internal(InternalNode),
    Leaf(LeafNode),
}

impl BPlusNode {
    pub fn is_leaf(&self) -> bool {
        matches!(self, BPlusNode::Leaf(_))
    }

    /// Largest key in this node; `None` for an empty leaf
    pub fn max_key(&self) -> Option<BPlusKey> {
        match self {
            BPlusNode::Internal(node) => node.max_key(),
            BPlusNode::Leaf(node) => node.max_key(),
        }
    }

    pub fn as_internal(&self) -> Option<&InternalNode> {
        match self {
            BPlusNode::Internal(node) => Some(node),
            BPlusNode::Leaf(_) => None,
        }
    }

    pub fn as_internal_mut(&mut self) -> Option<&mut InternalNode> {
        match self {
            BPlusNode::Internal(node) => Some(node),
            BPlusNode::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&LeafNode> {
        match self {
            BPlusNode::Internal(_) => None,
            BPlusNode::Leaf(node) => Some(node),
        }
    }

    pub fn as_leaf_mut(&mut self) -> Option<&mut LeafNode> {
        match self {
            BPlusNode::Internal(_) => None,
            BPlusNode::Leaf(node) => Some(node),
        }
    }
}
