//! Index file management

use std::path::{Path, PathBuf};

use crate::btree::{BPlusKey, BPlusTree, BPlusTreeError, MIN_ORDER};
use crate::file::{BufferPool, PAGE_SIZE, PageFile, PageId, PageStore};
use crate::record::{DataType, RecordId};

use super::IndexOptions;
use super::error::{IndexError, IndexResult};
use super::serialization::{
    IndexMetadata, MAX_ORDER, deserialize_metadata, deserialize_node, serialize_metadata,
    serialize_node,
};
use super::tree_scan::TreeScan;

const METADATA_PAGE: PageId = 0;

/// An open B+ tree index file.
///
/// Nodes are read through a [`BufferPool`] when the file is opened and kept in
/// memory; modified nodes are written back to their pages on [`flush`] and
/// [`close`].
///
/// [`flush`]: BTreeIndex::flush
/// [`close`]: BTreeIndex::close
pub struct BTreeIndex {
    tree: BPlusTree,
    key_type: DataType,
    pool: BufferPool,
    path: PathBuf,
    reserve_zero_keys: bool,
}

impl BTreeIndex {
    /// Create a new, empty index file
    pub fn create<P: AsRef<Path>>(path: P, key_type: DataType, order: usize) -> IndexResult<()> {
        let path = path.as_ref();
        check_key_type(key_type)?;
        check_order(order)?;

        PageFile::create(path)?;
        let mut file = PageFile::open(path)?;
        let metadata = IndexMetadata {
            order,
            key_type,
            root_node_id: None,
            first_leaf_id: None,
            entry_count: 0,
            node_count: 0,
        };
        let mut page = [0u8; PAGE_SIZE];
        serialize_metadata(&metadata, &mut page)?;
        file.write_block(METADATA_PAGE, &page)?;
        file.close()?;

        log::info!("created index {} (order {})", path.display(), order);
        Ok(())
    }

    /// Open an existing index file and load its nodes
    pub fn open<P: AsRef<Path>>(path: P, options: &IndexOptions) -> IndexResult<Self> {
        let path = path.as_ref();
        let mut pool = BufferPool::open(path, options.pool_capacity, options.replacement)?;

        pool.pin(METADATA_PAGE)?;
        let metadata = pool
            .page_data(METADATA_PAGE)
            .map_err(IndexError::from)
            .and_then(deserialize_metadata);
        pool.unpin(METADATA_PAGE)?;
        let metadata = metadata?;

        check_key_type(metadata.key_type)?;
        check_order(metadata.order)?;
        let page_count = pool.page_count()?;
        if page_count < metadata.node_count + 1 {
            return Err(IndexError::CorruptedNode(page_count));
        }

        let mut nodes = Vec::with_capacity(metadata.node_count);
        for page_id in 1..=metadata.node_count {
            pool.pin(page_id)?;
            let node = pool
                .page_data(page_id)
                .map_err(IndexError::from)
                .and_then(deserialize_node);
            pool.unpin(page_id)?;
            nodes.push(node.map_err(|_| IndexError::CorruptedNode(page_id))?);
        }

        let tree = BPlusTree::from_nodes(
            metadata.order,
            nodes,
            metadata.root_node_id,
            metadata.first_leaf_id,
        )?;
        if tree.len() != metadata.entry_count {
            return Err(IndexError::Deserialization(format!(
                "Header records {} entries, leaves hold {}",
                metadata.entry_count,
                tree.len()
            )));
        }

        log::info!(
            "opened index {} ({} entries in {} nodes)",
            path.display(),
            tree.len(),
            tree.node_count()
        );

        Ok(Self {
            tree,
            key_type: metadata.key_type,
            pool,
            path: path.to_path_buf(),
            reserve_zero_keys: options.reserve_zero_keys,
        })
    }

    /// Write all changes back and release the file
    pub fn close(mut self) -> IndexResult<()> {
        self.flush()?;
        self.pool.shutdown()?;
        log::info!("closed index {}", self.path.display());
        Ok(())
    }

    /// Remove an index file
    pub fn destroy<P: AsRef<Path>>(path: P) -> IndexResult<()> {
        PageFile::destroy(&path)?;
        log::info!("destroyed index {}", path.as_ref().display());
        Ok(())
    }

    /// Write modified nodes and the header page through the buffer pool
    pub fn flush(&mut self) -> IndexResult<()> {
        let dirty = self.tree.take_dirty();
        if dirty.is_empty() {
            return Ok(());
        }

        for &node_id in &dirty {
            let node = self
                .tree
                .get_node(node_id)
                .ok_or(IndexError::CorruptedNode(node_id + 1))?;
            write_page(&mut self.pool, node_id + 1, |buf| serialize_node(node, buf))?;
        }

        let metadata = IndexMetadata {
            order: self.tree.order(),
            key_type: self.key_type,
            root_node_id: self.tree.root_node_id(),
            first_leaf_id: self.tree.first_leaf_id(),
            entry_count: self.tree.len(),
            node_count: self.tree.node_count(),
        };
        write_page(&mut self.pool, METADATA_PAGE, |buf| {
            serialize_metadata(&metadata, buf)
        })?;

        self.pool.force_flush()?;
        log::debug!(
            "flushed {} nodes of index {}",
            dirty.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Locator of the first entry with `key`
    pub fn find_key(&self, key: BPlusKey) -> IndexResult<RecordId> {
        self.tree.search(key).ok_or(IndexError::KeyNotFound(key))
    }

    /// Add an entry. Duplicate keys are kept after the existing ones.
    ///
    /// With zero keys reserved, key 0 and locators on page 0 mark empty slots
    /// and are not stored.
    pub fn insert_key(&mut self, key: BPlusKey, rid: RecordId) -> IndexResult<()> {
        if self.reserve_zero_keys && (key == 0 || rid.page_id == 0) {
            log::warn!(
                "index {}: ignoring reserved entry key={} rid={}",
                self.path.display(),
                key,
                rid
            );
            return Ok(());
        }
        self.tree.insert(key, rid)?;
        Ok(())
    }

    /// Remove the first entry with `key`
    pub fn delete_key(&mut self, key: BPlusKey) -> IndexResult<()> {
        match self.tree.delete(key)? {
            Some(_) => Ok(()),
            None => Err(IndexError::KeyNotFound(key)),
        }
    }

    /// Snapshot every entry in ascending key order
    pub fn open_tree_scan(&self) -> TreeScan {
        TreeScan::new(self.tree.iter().collect(), self.reserve_zero_keys)
    }

    /// Number of allocated nodes
    pub fn num_nodes(&self) -> usize {
        self.tree.node_count()
    }

    /// Number of stored entries
    pub fn num_entries(&self) -> usize {
        self.tree.len()
    }

    pub fn key_type(&self) -> DataType {
        self.key_type
    }

    pub fn order(&self) -> usize {
        self.tree.order()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn buffer_pool(&self) -> &BufferPool {
        &self.pool
    }

    /// Debug rendering of the node structure
    pub fn print_tree(&self) -> String {
        self.tree.print_tree()
    }
}

impl Drop for BTreeIndex {
    fn drop(&mut self) {
        if self.pool.is_open() && self.tree.has_dirty_nodes() {
            log::warn!(
                "index {} dropped without close; flushing",
                self.path.display()
            );
            if let Err(e) = self.flush() {
                log::warn!("flush of index {} failed: {}", self.path.display(), e);
            }
        }
    }
}

fn check_key_type(key_type: DataType) -> IndexResult<()> {
    match key_type {
        DataType::Int => Ok(()),
        other => Err(IndexError::UnsupportedKeyType(other)),
    }
}

fn check_order(order: usize) -> IndexResult<()> {
    if order < MIN_ORDER {
        return Err(BPlusTreeError::InvalidOrder(order).into());
    }
    if order > MAX_ORDER {
        return Err(IndexError::OrderTooLarge {
            order,
            max: MAX_ORDER,
        });
    }
    Ok(())
}

/// Pin `page_id`, let `fill` write into it and unpin it again
fn write_page(
    pool: &mut BufferPool,
    page_id: PageId,
    fill: impl FnOnce(&mut [u8]) -> IndexResult<()>,
) -> IndexResult<()> {
    pool.pin(page_id)?;
    let result = match pool.page_data_mut(page_id) {
        Ok(data) => fill(data),
        Err(e) => Err(e.into()),
    };
    pool.unpin(page_id)?;
    result
}
