use std::path::Path;

use super::error::{RecordError, RecordResult};
use super::expr::Expr;
use super::page::SlotPage;
use super::record::{Record, RecordId};
use super::schema::Schema;
use crate::catalog::TableMetadata;
use crate::file::{BufferPool, PAGE_SIZE, PageFile, PageId, PageStore, ReplacementStrategy};

/// Page holding the table metadata
const METADATA_PAGE: PageId = 0;

/// An open table: fixed-length records laid out in slots of pages 1..,
/// with metadata in page 0, accessed through its own buffer pool
pub struct Table {
    metadata: TableMetadata,
    pool: BufferPool,
    record_size: usize,
    block_factor: usize,
    /// Page 0 no longer matches `metadata`
    metadata_dirty: bool,
}

impl Table {
    /// Create a new table file whose page 0 describes an empty table
    pub fn create<P: AsRef<Path>>(path: P, name: &str, schema: Schema) -> RecordResult<()> {
        let record_size = schema.record_size();
        if SlotPage::<&[u8]>::block_factor(record_size) == 0 {
            return Err(RecordError::RecordTooLarge(record_size));
        }

        let metadata = TableMetadata::new(name, schema);
        let mut page = vec![0u8; PAGE_SIZE];
        metadata.write_page(&mut page)?;

        PageFile::create(&path)?;
        let mut file = PageFile::open(&path)?;
        file.write_block(METADATA_PAGE, &page)?;
        file.close()?;

        log::info!("created table {} ({} bytes per record)", name, record_size);
        Ok(())
    }

    /// Open a table file, reading its metadata from page 0
    pub fn open<P: AsRef<Path>>(
        path: P,
        pool_capacity: usize,
        strategy: ReplacementStrategy,
    ) -> RecordResult<Self> {
        let mut pool = BufferPool::open(path, pool_capacity, strategy)?;

        pool.pin(METADATA_PAGE)?;
        let metadata = pool
            .page_data(METADATA_PAGE)
            .map_err(RecordError::from)
            .and_then(|page| Ok(TableMetadata::read_page(page)?));
        pool.unpin(METADATA_PAGE)?;
        let metadata = metadata?;

        let record_size = metadata.schema.record_size();
        let block_factor = SlotPage::<&[u8]>::block_factor(record_size);
        if block_factor == 0 {
            return Err(RecordError::RecordTooLarge(record_size));
        }

        log::info!(
            "opened table {} with {} records",
            metadata.name,
            metadata.total_records
        );
        Ok(Self {
            metadata,
            pool,
            record_size,
            block_factor,
            metadata_dirty: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn schema(&self) -> &Schema {
        &self.metadata.schema
    }

    pub fn metadata(&self) -> &TableMetadata {
        &self.metadata
    }

    pub fn record_size(&self) -> usize {
        self.record_size
    }

    pub fn block_factor(&self) -> usize {
        self.block_factor
    }

    /// Number of live records
    pub fn num_tuples(&self) -> usize {
        self.metadata.total_records
    }

    /// Location the next insert will use
    pub fn first_free(&self) -> RecordId {
        self.metadata.first_free
    }

    /// The table's buffer pool, for inspecting I/O statistics
    pub fn buffer_pool(&self) -> &BufferPool {
        &self.pool
    }

    /// Insert a record at the free location and advance it.
    /// The record's id is set to where it was stored.
    pub fn insert_record(&mut self, record: &mut Record) -> RecordResult<RecordId> {
        let rid = self.metadata.first_free;
        if rid.page_id < 1 {
            return Err(RecordError::InvalidPageNumber(rid.page_id));
        }
        if rid.slot_id >= self.block_factor {
            return Err(RecordError::InvalidSlotNumber(rid.slot_id));
        }

        let bytes = record.serialize(&self.metadata.schema)?;
        let record_size = self.record_size;
        self.with_page_mut(rid.page_id, |data| {
            SlotPage::from_buffer(data, record_size)?.write_record(rid.slot_id, &bytes)
        })?;

        record.id = Some(rid);
        self.metadata.total_records += 1;
        self.metadata_dirty = true;
        self.metadata.first_free = if rid.slot_id == self.block_factor - 1 {
            RecordId::new(rid.page_id + 1, 0)
        } else {
            RecordId::new(rid.page_id, rid.slot_id + 1)
        };
        Ok(rid)
    }

    /// Zero-fill a record's slot. The slot is not reused by later inserts.
    pub fn delete_record(&mut self, rid: RecordId) -> RecordResult<()> {
        self.check_locator(rid)?;
        let record_size = self.record_size;
        self.with_page_mut(rid.page_id, |data| {
            let mut page = SlotPage::from_buffer(data, record_size)?;
            if !page.is_occupied(rid.slot_id)? {
                return Err(RecordError::RecordNotFound(rid.page_id, rid.slot_id));
            }
            page.clear_slot(rid.slot_id)
        })?;

        self.metadata.total_records -= 1;
        self.metadata_dirty = true;
        Ok(())
    }

    /// Overwrite the record stored at `record.id`, keeping the slot sentinel
    pub fn update_record(&mut self, record: &Record) -> RecordResult<()> {
        let rid = record.id.ok_or(RecordError::MissingRecordId)?;
        self.check_locator(rid)?;

        let bytes = record.serialize(&self.metadata.schema)?;
        let record_size = self.record_size;
        self.with_page_mut(rid.page_id, |data| {
            let mut page = SlotPage::from_buffer(data, record_size)?;
            if !page.is_occupied(rid.slot_id)? {
                return Err(RecordError::RecordNotFound(rid.page_id, rid.slot_id));
            }
            page.overwrite_payload(rid.slot_id, &bytes)
        })
    }

    pub fn get_record(&mut self, rid: RecordId) -> RecordResult<Record> {
        self.check_locator(rid)?;
        self.read_slot(rid)?
            .ok_or(RecordError::RecordNotFound(rid.page_id, rid.slot_id))
    }

    /// Begin a scan returning records for which `condition` holds.
    /// `None` matches every record.
    pub fn start_scan(&mut self, condition: Option<Expr>) -> TableScan<'_> {
        TableScan {
            table: self,
            condition,
            cursor: RecordId::new(1, 0),
            examined: 0,
        }
    }

    /// Overwrite every record matching `condition` with the values of
    /// `replacement`. Returns how many records were rewritten.
    pub fn update_scan(
        &mut self,
        condition: Option<Expr>,
        replacement: &Record,
    ) -> RecordResult<usize> {
        let mut matched = Vec::new();
        for record in self.start_scan(condition) {
            if let Some(rid) = record?.id {
                matched.push(rid);
            }
        }

        for &rid in &matched {
            let mut updated = replacement.clone();
            updated.id = Some(rid);
            self.update_record(&updated)?;
        }
        Ok(matched.len())
    }

    /// Write the metadata back to page 0 and shut down the buffer pool
    pub fn close(mut self) -> RecordResult<()> {
        self.write_metadata()?;
        self.pool.shutdown()?;
        log::info!(
            "closed table {} with {} records",
            self.metadata.name,
            self.metadata.total_records
        );
        Ok(())
    }

    /// Serialize the metadata into page 0
    fn write_metadata(&mut self) -> RecordResult<()> {
        let metadata = &self.metadata;
        self.pool.pin(METADATA_PAGE)?;
        let written = self
            .pool
            .page_data_mut(METADATA_PAGE)
            .map_err(RecordError::from)
            .and_then(|page| Ok(metadata.write_page(page)?));
        self.pool.unpin(METADATA_PAGE)?;
        written?;
        self.metadata_dirty = false;
        Ok(())
    }

    /// Reject locators outside the written part of the table, before any
    /// page is pinned
    fn check_locator(&self, rid: RecordId) -> RecordResult<()> {
        let first_free = self.metadata.first_free;
        if rid.page_id < 1 || rid.page_id > first_free.page_id {
            return Err(RecordError::InvalidPageNumber(rid.page_id));
        }
        if rid.slot_id >= self.block_factor || rid >= first_free {
            return Err(RecordError::InvalidSlotNumber(rid.slot_id));
        }
        Ok(())
    }

    /// Record stored in a slot, or `None` if the slot is free
    fn read_slot(&mut self, rid: RecordId) -> RecordResult<Option<Record>> {
        let record_size = self.record_size;
        let schema = &self.metadata.schema;
        let pool = &mut self.pool;

        pool.pin(rid.page_id)?;
        let result = pool
            .page_data(rid.page_id)
            .map_err(RecordError::from)
            .and_then(|data| {
                let page = SlotPage::from_buffer(data, record_size)?;
                if !page.is_occupied(rid.slot_id)? {
                    return Ok(None);
                }
                Record::deserialize(page.record_bytes(rid.slot_id)?, schema, Some(rid)).map(Some)
            });
        pool.unpin(rid.page_id)?;
        result
    }

    /// Pin a page, run `f` over its (dirty-marked) bytes, and unpin it
    fn with_page_mut<R>(
        &mut self,
        page_id: PageId,
        f: impl FnOnce(&mut [u8]) -> RecordResult<R>,
    ) -> RecordResult<R> {
        self.pool.pin(page_id)?;
        let result = match self.pool.page_data_mut(page_id) {
            Ok(data) => f(data),
            Err(e) => Err(e.into()),
        };
        self.pool.unpin(page_id)?;
        result
    }
}

impl Drop for Table {
    fn drop(&mut self) {
        if self.pool.is_open() && self.metadata_dirty {
            log::warn!(
                "table {} dropped without close; writing metadata",
                self.metadata.name
            );
            let result = self
                .write_metadata()
                .and_then(|()| Ok(self.pool.force_flush()?));
            if let Err(e) = result {
                log::warn!("metadata write of table {} failed: {}", self.metadata.name, e);
            }
        }
    }
}

/// An in-progress scan over a table. Positions are visited in row-major
/// order from (1, 0) up to the table's free location.
pub struct TableScan<'a> {
    table: &'a mut Table,
    condition: Option<Expr>,
    cursor: RecordId,
    /// Live records seen so far
    examined: usize,
}

impl TableScan<'_> {
    /// Next matching record, or `NoMoreTuples` once the table is exhausted
    pub fn next_record(&mut self) -> RecordResult<Record> {
        let first_free = self.table.metadata.first_free;
        let block_factor = self.table.block_factor;

        while self.examined < self.table.metadata.total_records && self.cursor < first_free {
            let rid = self.cursor;
            self.cursor = if rid.slot_id + 1 == block_factor {
                RecordId::new(rid.page_id + 1, 0)
            } else {
                RecordId::new(rid.page_id, rid.slot_id + 1)
            };

            let Some(record) = self.table.read_slot(rid)? else {
                continue;
            };
            self.examined += 1;

            let matched = match &self.condition {
                Some(cond) => cond.matches(&record)?,
                None => true,
            };
            if matched {
                return Ok(record);
            }
        }

        Err(RecordError::NoMoreTuples)
    }

    /// End the scan
    pub fn close(self) {}
}

impl Iterator for TableScan<'_> {
    type Item = RecordResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_record() {
            Ok(record) => Some(Ok(record)),
            Err(RecordError::NoMoreTuples) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Attribute, DataType, Value};
    use tempfile::TempDir;

    fn test_schema() -> Schema {
        Schema::new(
            vec![
                Attribute::new("a", DataType::Int),
                Attribute::new("b", DataType::String(4)),
                Attribute::new("c", DataType::Int),
            ],
            vec![0],
        )
        .unwrap()
    }

    fn row(a: i32, b: &str, c: i32) -> Record {
        Record::new(vec![
            Value::Int(a),
            Value::String(b.to_string()),
            Value::Int(c),
        ])
    }

    fn setup_test_env() -> (TempDir, Table) {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("test_table");
        Table::create(&path, "test_table", test_schema()).unwrap();
        let table = Table::open(&path, 3, ReplacementStrategy::Fifo).unwrap();
        (temp_dir, table)
    }

    #[test]
    fn test_insert_and_get() {
        let (_temp_dir, mut table) = setup_test_env();
        assert_eq!(table.record_size(), 13);
        assert_eq!(table.block_factor(), PAGE_SIZE / 13);

        let mut record = row(1, "aaaa", 3);
        let rid = table.insert_record(&mut record).unwrap();
        assert_eq!(rid, RecordId::new(1, 0));
        assert_eq!(record.id, Some(rid));

        let fetched = table.get_record(rid).unwrap();
        assert_eq!(fetched.values(), record.values());
        assert_eq!(fetched.id, Some(rid));
        assert_eq!(table.num_tuples(), 1);
    }

    #[test]
    fn test_free_location_wraps_once_per_page() {
        let (_temp_dir, mut table) = setup_test_env();
        let bf = table.block_factor();

        let mut page_changes = 0;
        let mut last_page = table.first_free().page_id;
        for i in 0..(2 * bf + 5) {
            let rid = table.insert_record(&mut row(i as i32, "x", 0)).unwrap();
            assert_eq!(rid.slot_id, i % bf);
            if table.first_free().page_id != last_page {
                page_changes += 1;
                last_page = table.first_free().page_id;
                assert_eq!(rid.slot_id, bf - 1);
            }
        }
        assert_eq!(page_changes, 2);
        assert_eq!(table.first_free(), RecordId::new(3, 5));
    }

    #[test]
    fn test_delete_record() {
        let (_temp_dir, mut table) = setup_test_env();
        let rid = table.insert_record(&mut row(1, "a", 1)).unwrap();
        let keep = table.insert_record(&mut row(2, "b", 2)).unwrap();

        table.delete_record(rid).unwrap();
        assert_eq!(table.num_tuples(), 1);
        assert!(matches!(
            table.get_record(rid),
            Err(RecordError::RecordNotFound(1, 0))
        ));
        assert!(matches!(
            table.delete_record(rid),
            Err(RecordError::RecordNotFound(1, 0))
        ));
        assert_eq!(table.get_record(keep).unwrap().values()[0], Value::Int(2));

        // Deleted slots are not reused
        let next = table.insert_record(&mut row(3, "c", 3)).unwrap();
        assert_eq!(next, RecordId::new(1, 2));
    }

    #[test]
    fn test_update_record() {
        let (_temp_dir, mut table) = setup_test_env();
        let rid = table.insert_record(&mut row(1, "old", 1)).unwrap();

        let updated = Record::with_id(
            rid,
            vec![
                Value::Int(9),
                Value::String("new".to_string()),
                Value::Int(8),
            ],
        );
        table.update_record(&updated).unwrap();
        assert_eq!(table.get_record(rid).unwrap().values(), updated.values());

        assert!(matches!(
            table.update_record(&row(1, "x", 1)),
            Err(RecordError::MissingRecordId)
        ));
    }

    #[test]
    fn test_invalid_locators() {
        let (_temp_dir, mut table) = setup_test_env();
        table.insert_record(&mut row(1, "a", 1)).unwrap();

        assert!(matches!(
            table.get_record(RecordId::new(0, 0)),
            Err(RecordError::InvalidPageNumber(0))
        ));
        assert!(matches!(
            table.get_record(RecordId::new(7, 0)),
            Err(RecordError::InvalidPageNumber(7))
        ));
        let bf = table.block_factor();
        let err = table.get_record(RecordId::new(1, bf)).unwrap_err();
        assert!(matches!(err, RecordError::InvalidSlotNumber(_)));
        assert_eq!(err.code(), crate::error::codes::INVALID_SLOT_NUM);
    }

    #[test]
    fn test_locator_past_free_location_does_not_grow_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("bounded");
        Table::create(&path, "bounded", test_schema()).unwrap();
        let file_len = || std::fs::metadata(&path).unwrap().len();

        let mut table = Table::open(&path, 3, ReplacementStrategy::Fifo).unwrap();
        let before = file_len();
        let err = table.get_record(RecordId::new(1, 0)).unwrap_err();
        assert!(matches!(err, RecordError::InvalidSlotNumber(0)));
        assert!(matches!(
            table.delete_record(RecordId::new(1, 0)),
            Err(RecordError::InvalidSlotNumber(0))
        ));
        let mut ghost = row(9, "g", 9);
        ghost.id = Some(RecordId::new(1, 0));
        assert!(matches!(
            table.update_record(&ghost),
            Err(RecordError::InvalidSlotNumber(0))
        ));
        table.close().unwrap();
        assert_eq!(file_len(), before);

        let mut table = Table::open(&path, 3, ReplacementStrategy::Fifo).unwrap();
        table.insert_record(&mut row(1, "a", 1)).unwrap();
        table.close().unwrap();
        let before = file_len();

        let mut table = Table::open(&path, 3, ReplacementStrategy::Fifo).unwrap();
        assert!(matches!(
            table.get_record(RecordId::new(1, 1)),
            Err(RecordError::InvalidSlotNumber(1))
        ));
        assert!(matches!(
            table.get_record(RecordId::new(2, 0)),
            Err(RecordError::InvalidPageNumber(2))
        ));
        assert!(table.get_record(RecordId::new(1, 0)).is_ok());
        table.close().unwrap();
        assert_eq!(file_len(), before);
    }

    #[test]
    fn test_drop_without_close_keeps_metadata() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("dropped");
        Table::create(&path, "dropped", test_schema()).unwrap();
        {
            let mut table = Table::open(&path, 3, ReplacementStrategy::Fifo).unwrap();
            for i in 0..5 {
                table.insert_record(&mut row(i, "d", i)).unwrap();
            }
            table.delete_record(RecordId::new(1, 2)).unwrap();
        }

        let mut table = Table::open(&path, 3, ReplacementStrategy::Fifo).unwrap();
        assert_eq!(table.num_tuples(), 4);
        assert_eq!(table.first_free(), RecordId::new(1, 5));
        let rid = table.insert_record(&mut row(5, "e", 5)).unwrap();
        assert_eq!(rid, RecordId::new(1, 5));
        let survivor = table.get_record(RecordId::new(1, 4)).unwrap();
        assert_eq!(survivor.values()[0], Value::Int(4));
        assert!(matches!(
            table.get_record(RecordId::new(1, 2)),
            Err(RecordError::RecordNotFound(1, 2))
        ));
        table.close().unwrap();
    }

    #[test]
    fn test_type_checked_insert() {
        let (_temp_dir, mut table) = setup_test_env();
        let mut bad = Record::new(vec![Value::Bool(true), Value::Int(1), Value::Int(1)]);
        assert!(matches!(
            table.insert_record(&mut bad),
            Err(RecordError::TypeMismatch { .. })
        ));
        assert_eq!(table.num_tuples(), 0);
        assert_eq!(table.first_free(), RecordId::new(1, 0));
    }

    #[test]
    fn test_scan_with_condition() {
        let (_temp_dir, mut table) = setup_test_env();
        for i in 0..10 {
            table.insert_record(&mut row(i, "r", i % 3)).unwrap();
        }

        let cond = Expr::equal(Expr::attr(2), Expr::constant(Value::Int(0)));
        let mut scan = table.start_scan(Some(cond));
        let mut seen = Vec::new();
        loop {
            match scan.next_record() {
                Ok(record) => seen.push(record.values()[0].clone()),
                Err(RecordError::NoMoreTuples) => break,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
        scan.close();
        assert_eq!(
            seen,
            vec![Value::Int(0), Value::Int(3), Value::Int(6), Value::Int(9)]
        );
    }

    #[test]
    fn test_scan_skips_deleted_and_spans_pages() {
        let (_temp_dir, mut table) = setup_test_env();
        let bf = table.block_factor();
        let total = bf + 3;
        let mut rids = Vec::new();
        for i in 0..total {
            rids.push(table.insert_record(&mut row(i as i32, "", 0)).unwrap());
        }
        table.delete_record(rids[1]).unwrap();
        table.delete_record(rids[bf + 1]).unwrap();

        let ids: Vec<i32> = table
            .start_scan(None)
            .map(|r| match r.unwrap().values()[0] {
                Value::Int(v) => v,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(ids.len(), total - 2);
        assert!(!ids.contains(&1));
        assert!(!ids.contains(&(bf as i32 + 1)));
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_empty_scan() {
        let (_temp_dir, mut table) = setup_test_env();
        let mut scan = table.start_scan(None);
        assert!(matches!(scan.next_record(), Err(RecordError::NoMoreTuples)));
        assert!(matches!(scan.next_record(), Err(RecordError::NoMoreTuples)));
    }

    #[test]
    fn test_scan_condition_type_error() {
        let (_temp_dir, mut table) = setup_test_env();
        table.insert_record(&mut row(1, "a", 1)).unwrap();
        let cond = Expr::equal(Expr::attr(0), Expr::attr(1));
        let mut scan = table.start_scan(Some(cond));
        assert!(matches!(
            scan.next_record(),
            Err(RecordError::CompareDifferentTypes(..))
        ));
    }

    #[test]
    fn test_update_scan() {
        let (_temp_dir, mut table) = setup_test_env();
        for i in 0..6 {
            table.insert_record(&mut row(i, "v", i % 2)).unwrap();
        }

        let cond = Expr::equal(Expr::attr(2), Expr::constant(Value::Int(1)));
        let changed = table.update_scan(Some(cond), &row(100, "odd", 1)).unwrap();
        assert_eq!(changed, 3);

        let odd = Expr::equal(Expr::attr(0), Expr::constant(Value::Int(100)));
        assert_eq!(table.start_scan(Some(odd)).count(), 3);
        assert_eq!(table.num_tuples(), 6);
    }

    #[test]
    fn test_close_and_reopen() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("persist");
        Table::create(&path, "persist", test_schema()).unwrap();

        let mut table = Table::open(&path, 3, ReplacementStrategy::Fifo).unwrap();
        let bf = table.block_factor();
        for i in 0..(bf + 2) {
            table.insert_record(&mut row(i as i32, "p", 7)).unwrap();
        }
        table.delete_record(RecordId::new(1, 4)).unwrap();
        let metadata = table.metadata().clone();
        table.close().unwrap();

        let mut table = Table::open(&path, 3, ReplacementStrategy::Lru).unwrap();
        assert_eq!(table.metadata(), &metadata);
        assert_eq!(table.num_tuples(), bf + 1);
        assert_eq!(table.first_free(), RecordId::new(2, 2));
        let last = table.get_record(RecordId::new(2, 1)).unwrap();
        assert_eq!(last.values()[0], Value::Int(bf as i32 + 1));
        table.close().unwrap();
    }

    #[test]
    fn test_create_existing_table() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("dup");
        Table::create(&path, "dup", test_schema()).unwrap();
        assert!(matches!(
            Table::create(&path, "dup", test_schema()),
            Err(RecordError::File(crate::file::FileError::FileAlreadyExists(_)))
        ));
    }

    #[test]
    fn test_record_too_large() {
        let temp_dir = tempfile::tempdir().unwrap();
        let schema = Schema::new(
            vec![Attribute::new("blob", DataType::String(PAGE_SIZE))],
            vec![],
        )
        .unwrap();
        let result = Table::create(temp_dir.path().join("big"), "big", schema);
        assert!(matches!(result, Err(RecordError::RecordTooLarge(_))));
    }
}
