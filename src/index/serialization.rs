//! Serialization and deserialization for B+ tree nodes
//!
//! Page 0 of an index file holds [`IndexMetadata`]; node `i` is stored in page
//! `i + 1`. All integers are little-endian.

use crate::btree::{BPlusKey, BPlusNode, InternalNode, LeafNode, NodeId};
use crate::file::PAGE_SIZE;
use crate::record::{DataType, RecordId};

use super::error::{IndexError, IndexResult};

/// Magic number for index files: "BTRE" in ASCII
pub const MAGIC_NUMBER: u32 = 0x42545245;

/// Current index file version
pub const VERSION: u32 = 1;

/// Bytes before the first entry of a node page
pub const NODE_HEADER_SIZE: usize = 16;

/// key (4) + page (4) + slot (4)
pub const LEAF_ENTRY_SIZE: usize = 12;

/// key (4) + child (4)
pub const INTERNAL_ENTRY_SIZE: usize = 8;

/// Largest order whose nodes still fit in one page
pub const MAX_ORDER: usize = (PAGE_SIZE - NODE_HEADER_SIZE) / LEAF_ENTRY_SIZE + 1;

const NODE_TYPE_INTERNAL: u8 = 0;
const NODE_TYPE_LEAF: u8 = 1;
const NONE_ID: u32 = u32::MAX;

/// Metadata stored in page 0
#[derive(Debug, Clone, PartialEq)]
pub struct IndexMetadata {
    pub order: usize,
    pub key_type: DataType,
    pub root_node_id: Option<NodeId>,
    pub first_leaf_id: Option<NodeId>,
    pub entry_count: usize,
    pub node_count: usize,
}

fn put_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn get_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}

fn get_i32(buf: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}

/// Narrow a stored count or id to the 32-bit on-page field
fn to_u32(value: usize, what: &str) -> IndexResult<u32> {
    u32::try_from(value).map_err(|_| {
        IndexError::Serialization(format!("{} {} does not fit in 32 bits", what, value))
    })
}

fn put_id(buf: &mut [u8], offset: usize, id: Option<NodeId>) -> IndexResult<()> {
    let raw = match id {
        Some(id) => match to_u32(id, "node id")? {
            NONE_ID => {
                return Err(IndexError::Serialization(format!(
                    "node id {} collides with the empty marker",
                    id
                )));
            }
            raw => raw,
        },
        None => NONE_ID,
    };
    put_u32(buf, offset, raw);
    Ok(())
}

fn get_id(buf: &[u8], offset: usize) -> Option<NodeId> {
    match get_u32(buf, offset) {
        NONE_ID => None,
        id => Some(id as NodeId),
    }
}

fn check_len(buf: &[u8], what: &str) -> IndexResult<()> {
    if buf.len() < PAGE_SIZE {
        return Err(IndexError::Deserialization(format!(
            "Buffer too small for {}",
            what
        )));
    }
    Ok(())
}

/// Serialize metadata into page 0
pub fn serialize_metadata(metadata: &IndexMetadata, buf: &mut [u8]) -> IndexResult<()> {
    buf.fill(0);
    put_u32(buf, 0, MAGIC_NUMBER);
    put_u32(buf, 4, VERSION);
    put_u32(buf, 8, to_u32(metadata.order, "order")?);
    put_u32(buf, 12, metadata.key_type.code() as u32);
    put_id(buf, 16, metadata.root_node_id)?;
    put_id(buf, 20, metadata.first_leaf_id)?;
    buf[24..32].copy_from_slice(&(metadata.entry_count as u64).to_le_bytes());
    put_u32(buf, 32, to_u32(metadata.node_count, "node count")?);
    Ok(())
}

/// Deserialize metadata from page 0
pub fn deserialize_metadata(buf: &[u8]) -> IndexResult<IndexMetadata> {
    check_len(buf, "metadata")?;

    if get_u32(buf, 0) != MAGIC_NUMBER {
        return Err(IndexError::InvalidMagic);
    }
    let version = get_u32(buf, 4);
    if version != VERSION {
        return Err(IndexError::UnsupportedVersion(version));
    }

    let code = get_u32(buf, 12);
    let key_type = u8::try_from(code)
        .ok()
        .and_then(|code| DataType::from_code(code, 0).ok())
        .ok_or_else(|| IndexError::Deserialization(format!("Unknown key type code {}", code)))?;

    let mut entry_count = [0u8; 8];
    entry_count.copy_from_slice(&buf[24..32]);

    Ok(IndexMetadata {
        order: get_u32(buf, 8) as usize,
        key_type,
        root_node_id: get_id(buf, 16),
        first_leaf_id: get_id(buf, 20),
        entry_count: u64::from_le_bytes(entry_count) as usize,
        node_count: get_u32(buf, 32) as usize,
    })
}

fn serialize_internal_node(node: &InternalNode, buf: &mut [u8]) -> IndexResult<()> {
    if NODE_HEADER_SIZE + node.len() * INTERNAL_ENTRY_SIZE > buf.len() {
        return Err(IndexError::Serialization(format!(
            "Internal node with {} children does not fit in a page",
            node.len()
        )));
    }

    buf.fill(0);
    buf[0] = NODE_TYPE_INTERNAL;
    buf[1..3].copy_from_slice(&(node.len() as u16).to_le_bytes());

    let mut offset = NODE_HEADER_SIZE;
    for (key, child) in node.keys.iter().zip(&node.children) {
        buf[offset..offset + 4].copy_from_slice(&key.to_le_bytes());
        put_u32(buf, offset + 4, to_u32(*child, "child id")?);
        offset += INTERNAL_ENTRY_SIZE;
    }
    Ok(())
}

fn serialize_leaf_node(node: &LeafNode, buf: &mut [u8]) -> IndexResult<()> {
    if NODE_HEADER_SIZE + node.len() * LEAF_ENTRY_SIZE > buf.len() {
        return Err(IndexError::Serialization(format!(
            "Leaf with {} entries does not fit in a page",
            node.len()
        )));
    }

    buf.fill(0);
    buf[0] = NODE_TYPE_LEAF;
    buf[1..3].copy_from_slice(&(node.len() as u16).to_le_bytes());
    put_id(buf, 3, node.next)?;

    let mut offset = NODE_HEADER_SIZE;
    for (key, rid) in node.keys.iter().zip(&node.values) {
        buf[offset..offset + 4].copy_from_slice(&key.to_le_bytes());
        put_u32(buf, offset + 4, to_u32(rid.page_id, "page id")?);
        put_u32(buf, offset + 8, to_u32(rid.slot_id, "slot id")?);
        offset += LEAF_ENTRY_SIZE;
    }
    Ok(())
}

/// Serialize a B+ tree node into a page buffer
pub fn serialize_node(node: &BPlusNode, buf: &mut [u8]) -> IndexResult<()> {
    match node {
        BPlusNode::Internal(internal) => serialize_internal_node(internal, buf),
        BPlusNode::Leaf(leaf) => serialize_leaf_node(leaf, buf),
    }
}

/// Deserialize a B+ tree node from a page buffer
pub fn deserialize_node(buf: &[u8]) -> IndexResult<BPlusNode> {
    check_len(buf, "node")?;

    let count = u16::from_le_bytes([buf[1], buf[2]]) as usize;
    match buf[0] {
        NODE_TYPE_INTERNAL => {
            if NODE_HEADER_SIZE + count * INTERNAL_ENTRY_SIZE > PAGE_SIZE {
                return Err(IndexError::Deserialization(format!(
                    "Internal node claims {} children",
                    count
                )));
            }
            let mut keys: Vec<BPlusKey> = Vec::with_capacity(count);
            let mut children = Vec::with_capacity(count);
            for i in 0..count {
                let offset = NODE_HEADER_SIZE + i * INTERNAL_ENTRY_SIZE;
                keys.push(get_i32(buf, offset));
                children.push(get_u32(buf, offset + 4) as NodeId);
            }
            Ok(BPlusNode::Internal(InternalNode::new(keys, children)))
        }
        NODE_TYPE_LEAF => {
            if NODE_HEADER_SIZE + count * LEAF_ENTRY_SIZE > PAGE_SIZE {
                return Err(IndexError::Deserialization(format!(
                    "Leaf claims {} entries",
                    count
                )));
            }
            let mut keys: Vec<BPlusKey> = Vec::with_capacity(count);
            let mut values = Vec::with_capacity(count);
            for i in 0..count {
                let offset = NODE_HEADER_SIZE + i * LEAF_ENTRY_SIZE;
                keys.push(get_i32(buf, offset));
                values.push(RecordId::new(
                    get_u32(buf, offset + 4) as usize,
                    get_u32(buf, offset + 8) as usize,
                ));
            }
            let mut leaf = LeafNode::with_entries(keys, values);
            leaf.next = get_id(buf, 3);
            Ok(BPlusNode::Leaf(leaf))
        }
        other => Err(IndexError::InvalidNodeType(other)),
    }
}
