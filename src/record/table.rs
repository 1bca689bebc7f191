use std::path::Path;

use super::error::{RecordError, RecordResult};
use super::page::PageLayout;
use super::record::{Record, RecordId};
use super::schema::Schema;
use crate::config::EngineConfig;
use crate::file::{BufferManager, FileHandle, PageId, PagedFileManager};

/// Page 0 of every table file holds the metadata and schema
pub const HEADER_PAGE: PageId = 0;
/// Records live on pages 1..num_pages
pub const DATA_START_PAGE: PageId = 1;

/// Persistent table statistics, stored at offset 0 of the header page.
///
/// `first_free_page` is a hint: a page at or after which a free slot is
/// likely. It can lag behind the true earliest free page after deletions;
/// the allocator's linear scan from the hint is always correct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableMetadata {
    pub num_tuples: u32,
    pub first_free_page: PageId,
    pub num_pages: u32,
    pub record_size: u32,
    pub slots_per_page: u32,
}

impl TableMetadata {
    pub const LEN: usize = 20;

    fn encode_into(&self, out: &mut [u8]) {
        out[0..4].copy_from_slice(&self.num_tuples.to_le_bytes());
        out[4..8].copy_from_slice(&self.first_free_page.to_le_bytes());
        out[8..12].copy_from_slice(&self.num_pages.to_le_bytes());
        out[12..16].copy_from_slice(&self.record_size.to_le_bytes());
        out[16..20].copy_from_slice(&self.slots_per_page.to_le_bytes());
    }

    fn decode(bytes: &[u8]) -> Self {
        let field = |i: usize| {
            let mut buf = [0u8; 4];
            buf.copy_from_slice(&bytes[i * 4..i * 4 + 4]);
            u32::from_le_bytes(buf)
        };
        Self {
            num_tuples: field(0),
            first_free_page: field(1),
            num_pages: field(2),
            record_size: field(3),
            slots_per_page: field(4),
        }
    }
}

/// An open table: a buffer pool bound to one page file, plus the schema
/// and page layout reconstructed from the header.
pub struct Table {
    name: String,
    pub(crate) file: FileHandle,
    pub(crate) pool: BufferManager,
    pub(crate) schema: Schema,
    pub(crate) layout: PageLayout,
    num_tuples: u32,
}

impl Table {
    /// Create a table file: header page with metadata and schema, followed
    /// by one empty data page. The table is not left open; call [`Table::open`].
    pub fn create<P: AsRef<Path>>(
        path: P,
        schema: &Schema,
        config: &EngineConfig,
    ) -> RecordResult<()> {
        if schema.num_attrs() == 0 {
            return Err(RecordError::EmptySchema);
        }
        let layout = PageLayout::for_record_size(schema.record_size())?;

        let mut file_manager = PagedFileManager::new();
        file_manager.create_file(&path)?;
        let file = file_manager.open_file(&path)?;
        // Header and first data page must physically exist before any pin
        file_manager.ensure_capacity(file, DATA_START_PAGE + 1)?;

        let mut pool = config.build_pool(file_manager);

        let meta = TableMetadata {
            num_tuples: 0,
            first_free_page: DATA_START_PAGE,
            num_pages: DATA_START_PAGE + 1,
            record_size: schema.record_size() as u32,
            slots_per_page: layout.slots_per_page(),
        };

        {
            let mut guard = pool.pin(file, HEADER_PAGE)?;
            let data = guard.data_mut();
            data.fill(0);
            meta.encode_into(&mut data[..TableMetadata::LEN]);
            schema.serialize_into(&mut data[TableMetadata::LEN..])?;
        }
        {
            let mut guard = pool.pin(file, DATA_START_PAGE)?;
            guard.data_mut().fill(0);
        }

        pool.shutdown()?;
        Ok(())
    }

    /// Open an existing table, rebuilding the schema from its header page
    pub fn open<P: AsRef<Path>>(path: P, config: &EngineConfig) -> RecordResult<Self> {
        let name = path.as_ref().display().to_string();

        let mut file_manager = PagedFileManager::new();
        let file = file_manager.open_file(&path)?;
        let mut pool = config.build_pool(file_manager);

        let (meta, schema) = {
            let guard = pool.pin(file, HEADER_PAGE)?;
            let data = guard.data();
            let meta = TableMetadata::decode(&data[..TableMetadata::LEN]);
            let schema = Schema::deserialize(&data[TableMetadata::LEN..])?;
            (meta, schema)
        };

        if meta.slots_per_page == 0
            || meta.num_pages < DATA_START_PAGE + 1
            || meta.record_size as usize != schema.record_size()
        {
            return Err(RecordError::Corrupt(
                "header metadata does not match schema".into(),
            ));
        }

        let layout = PageLayout::new(meta.slots_per_page, meta.record_size as usize);

        Ok(Self {
            name,
            file,
            pool,
            schema,
            layout,
            num_tuples: meta.num_tuples,
        })
    }

    /// Flush everything and release the buffer pool. The file persists.
    pub fn close(self) -> RecordResult<()> {
        let Table { pool, .. } = self;
        pool.shutdown()?;
        Ok(())
    }

    /// Delete a table's file. The table must not be open.
    pub fn destroy<P: AsRef<Path>>(path: P) -> RecordResult<()> {
        let mut file_manager = PagedFileManager::new();
        file_manager.remove_file(path)?;
        Ok(())
    }

    /// The table's name (its file path)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The table's schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Current number of live records
    pub fn num_tuples(&self) -> u32 {
        self.num_tuples
    }

    /// The table's buffer pool (for introspection)
    pub fn pool(&self) -> &BufferManager {
        &self.pool
    }

    /// Insert a record, assigning it the id of a free slot.
    ///
    /// Extends the file by one page when every data page is full.
    pub fn insert_record(&mut self, record: &mut Record) -> RecordResult<RecordId> {
        let expected = self.layout.record_size();
        if record.data().len() != expected {
            return Err(RecordError::InvalidRecordSize {
                expected,
                actual: record.data().len(),
            });
        }

        let mut meta = self.read_meta()?;
        let rid = self.find_free_slot(&mut meta)?;

        {
            let mut guard = self.pool.pin(self.file, rid.page)?;
            let data = guard.data_mut();
            self.layout.mark_occupied(data, rid.slot);
            self.layout
                .record_slice_mut(data, rid.slot)
                .copy_from_slice(record.data());
        }

        record.id = Some(rid);
        meta.num_tuples += 1;
        self.num_tuples = meta.num_tuples;
        self.write_meta(&meta)?;

        Ok(rid)
    }

    /// Delete the record at `rid`. The slot bytes are left as a tombstone;
    /// only the occupancy bit is cleared.
    pub fn delete_record(&mut self, rid: RecordId) -> RecordResult<()> {
        let mut meta = self.read_meta()?;
        self.check_rid(rid, &meta)?;

        {
            let mut guard = self.pool.pin(self.file, rid.page)?;
            if !self.layout.is_occupied(guard.data(), rid.slot) {
                return Err(RecordError::RecordNotFound(rid));
            }
            self.layout.mark_free(guard.data_mut(), rid.slot);
        }

        meta.num_tuples = meta.num_tuples.saturating_sub(1);
        self.num_tuples = meta.num_tuples;
        self.write_meta(&meta)
    }

    /// Overwrite the record at `record.id` in place
    pub fn update_record(&mut self, record: &Record) -> RecordResult<()> {
        let rid = record.id.ok_or(RecordError::RecordNotInserted)?;

        let expected = self.layout.record_size();
        if record.data().len() != expected {
            return Err(RecordError::InvalidRecordSize {
                expected,
                actual: record.data().len(),
            });
        }

        let meta = self.read_meta()?;
        self.check_rid(rid, &meta)?;

        let mut guard = self.pool.pin(self.file, rid.page)?;
        if !self.layout.is_occupied(guard.data(), rid.slot) {
            return Err(RecordError::RecordNotFound(rid));
        }
        self.layout
            .record_slice_mut(guard.data_mut(), rid.slot)
            .copy_from_slice(record.data());

        Ok(())
    }

    /// Fetch the record at `rid`
    pub fn get_record(&mut self, rid: RecordId) -> RecordResult<Record> {
        let meta = self.read_meta()?;
        self.check_rid(rid, &meta)?;

        let guard = self.pool.pin(self.file, rid.page)?;
        if !self.layout.is_occupied(guard.data(), rid.slot) {
            return Err(RecordError::RecordNotFound(rid));
        }

        let bytes = self.layout.record_slice(guard.data(), rid.slot).to_vec();
        Ok(Record::from_bytes(rid, bytes))
    }

    /// Find a free slot, growing the file by one page if every data page
    /// is full. The scan starts at the `first_free_page` hint.
    fn find_free_slot(&mut self, meta: &mut TableMetadata) -> RecordResult<RecordId> {
        let mut page_id = meta.first_free_page;
        while page_id < meta.num_pages {
            let guard = self.pool.pin(self.file, page_id)?;
            if let Some(slot) = self.layout.find_free_slot(guard.data()) {
                return Ok(RecordId::new(page_id, slot));
            }
            drop(guard);
            page_id += 1;
        }

        // Grow the file before pinning the new page: pinning beyond EOF
        // is undefined
        let new_page = self.pool.file_manager_mut().append_empty_page(self.file)?;
        meta.num_pages = new_page + 1;

        {
            let mut guard = self.pool.pin(self.file, new_page)?;
            guard.data_mut().fill(0);
        }

        meta.first_free_page = new_page;
        self.write_meta(meta)?;

        Ok(RecordId::new(new_page, 0))
    }

    pub(crate) fn read_meta(&mut self) -> RecordResult<TableMetadata> {
        let guard = self.pool.pin(self.file, HEADER_PAGE)?;
        Ok(TableMetadata::decode(&guard.data()[..TableMetadata::LEN]))
    }

    /// Overwrite the metadata prefix of the header page. The schema region
    /// behind it is never touched after create.
    fn write_meta(&mut self, meta: &TableMetadata) -> RecordResult<()> {
        let mut guard = self.pool.pin(self.file, HEADER_PAGE)?;
        meta.encode_into(&mut guard.data_mut()[..TableMetadata::LEN]);
        Ok(())
    }

    fn check_rid(&self, rid: RecordId, meta: &TableMetadata) -> RecordResult<()> {
        if rid.page < DATA_START_PAGE
            || rid.page >= meta.num_pages
            || rid.slot >= meta.slots_per_page
        {
            return Err(RecordError::InvalidSlot { rid });
        }
        Ok(())
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
                Attribute::new("id", DataType::Int),
                Attribute::new("name", DataType::String(20)),
                Attribute::new("score", DataType::Float),
            ],
            vec![0],
        )
        .unwrap()
    }

    fn test_record(schema: &Schema, id: i32, name: &str, score: f32) -> Record {
        Record::from_values(
            schema,
            &[
                Value::Int(id),
                Value::String(name.to_string()),
                Value::Float(score),
            ],
        )
        .unwrap()
    }

    fn open_fresh_table(dir: &TempDir, name: &str, schema: &Schema) -> Table {
        let path = dir.path().join(name);
        let config = EngineConfig::default();
        Table::create(&path, schema, &config).unwrap();
        Table::open(&path, &config).unwrap()
    }

    #[test]
    fn test_create_and_open() {
        let dir = tempfile::tempdir().unwrap();
        let schema = test_schema();
        let table = open_fresh_table(&dir, "t.tbl", &schema);

        assert_eq!(table.schema(), &schema);
        assert_eq!(table.num_tuples(), 0);
    }

    #[test]
    fn test_create_rejects_oversized_record() {
        let dir = tempfile::tempdir().unwrap();
        let schema = Schema::new(
            vec![Attribute::new("blob", DataType::String(5000))],
            vec![],
        )
        .unwrap();

        let result = Table::create(
            dir.path().join("big.tbl"),
            &schema,
            &EngineConfig::default(),
        );
        assert!(matches!(result, Err(RecordError::RecordTooLarge { .. })));
    }

    #[test]
    fn test_insert_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let schema = test_schema();
        let mut table = open_fresh_table(&dir, "t.tbl", &schema);

        let mut record = test_record(&schema, 1, "Alice", 95.5);
        let rid = table.insert_record(&mut record).unwrap();

        assert_eq!(record.id, Some(rid));
        assert_eq!(rid, RecordId::new(DATA_START_PAGE, 0));
        assert_eq!(table.num_tuples(), 1);

        let fetched = table.get_record(rid).unwrap();
        assert_eq!(fetched.data(), record.data());
        assert_eq!(fetched.id, Some(rid));
        assert_eq!(table.pool().pinned_page_count(), 0);
    }

    #[test]
    fn test_sequential_rids() {
        let dir = tempfile::tempdir().unwrap();
        let schema = test_schema();
        let mut table = open_fresh_table(&dir, "t.tbl", &schema);

        for slot in 0..5 {
            let mut record = test_record(&schema, slot as i32, "x", 0.0);
            let rid = table.insert_record(&mut record).unwrap();
            assert_eq!(rid, RecordId::new(DATA_START_PAGE, slot));
        }
    }

    #[test]
    fn test_delete_is_observable() {
        let dir = tempfile::tempdir().unwrap();
        let schema = test_schema();
        let mut table = open_fresh_table(&dir, "t.tbl", &schema);

        let mut record = test_record(&schema, 1, "Alice", 95.5);
        let rid = table.insert_record(&mut record).unwrap();
        assert_eq!(table.num_tuples(), 1);

        table.delete_record(rid).unwrap();
        assert_eq!(table.num_tuples(), 0);

        assert!(matches!(
            table.get_record(rid),
            Err(RecordError::RecordNotFound(_))
        ));
        assert!(matches!(
            table.delete_record(rid),
            Err(RecordError::RecordNotFound(_))
        ));
        assert_eq!(table.pool().pinned_page_count(), 0);
    }

    #[test]
    fn test_update_preserves_id() {
        let dir = tempfile::tempdir().unwrap();
        let schema = test_schema();
        let mut table = open_fresh_table(&dir, "t.tbl", &schema);

        let mut record = test_record(&schema, 1, "Alice", 95.5);
        let rid = table.insert_record(&mut record).unwrap();

        let mut updated = test_record(&schema, 1, "Bob", 85.0);
        updated.id = Some(rid);
        table.update_record(&updated).unwrap();

        assert_eq!(table.num_tuples(), 1);
        let fetched = table.get_record(rid).unwrap();
        assert_eq!(fetched.data(), updated.data());
    }

    #[test]
    fn test_update_unoccupied_slot() {
        let dir = tempfile::tempdir().unwrap();
        let schema = test_schema();
        let mut table = open_fresh_table(&dir, "t.tbl", &schema);

        let mut record = test_record(&schema, 1, "Alice", 95.5);
        record.id = Some(RecordId::new(DATA_START_PAGE, 0));
        assert!(matches!(
            table.update_record(&record),
            Err(RecordError::RecordNotFound(_))
        ));

        record.id = None;
        assert!(matches!(
            table.update_record(&record),
            Err(RecordError::RecordNotInserted)
        ));
    }

    #[test]
    fn test_rid_bounds_checked() {
        let dir = tempfile::tempdir().unwrap();
        let schema = test_schema();
        let mut table = open_fresh_table(&dir, "t.tbl", &schema);

        // Header page is not a data page
        assert!(matches!(
            table.get_record(RecordId::new(0, 0)),
            Err(RecordError::InvalidSlot { .. })
        ));
        // Past the last page
        assert!(matches!(
            table.get_record(RecordId::new(99, 0)),
            Err(RecordError::InvalidSlot { .. })
        ));
        // Slot beyond the page's slot count
        assert!(matches!(
            table.get_record(RecordId::new(1, 1_000_000)),
            Err(RecordError::InvalidSlot { .. })
        ));
    }

    #[test]
    fn test_slot_reuse_after_delete() {
        let dir = tempfile::tempdir().unwrap();
        let schema = test_schema();
        let mut table = open_fresh_table(&dir, "t.tbl", &schema);

        let mut rids = Vec::new();
        for i in 0..10 {
            let mut record = test_record(&schema, i, "x", 0.0);
            rids.push(table.insert_record(&mut record).unwrap());
        }
        for rid in &rids {
            table.delete_record(*rid).unwrap();
        }
        assert_eq!(table.num_tuples(), 0);

        // The allocator finds the earliest free slot again
        let mut record = test_record(&schema, 99, "y", 1.0);
        let rid = table.insert_record(&mut record).unwrap();
        assert_eq!(rid, RecordId::new(DATA_START_PAGE, 0));
    }

    #[test]
    fn test_file_growth_when_full() {
        let dir = tempfile::tempdir().unwrap();
        // One slot per page: a ~2KB record
        let schema = Schema::new(
            vec![
                Attribute::new("k", DataType::Int),
                Attribute::new("pad", DataType::String(2044)),
            ],
            vec![0],
        )
        .unwrap();
        let mut table = open_fresh_table(&dir, "wide.tbl", &schema);
        assert_eq!(table.layout.slots_per_page(), 1);

        let mut rids = Vec::new();
        for i in 0..4 {
            let mut record = Record::from_values(
                &schema,
                &[Value::Int(i), Value::String("p".to_string())],
            )
            .unwrap();
            rids.push(table.insert_record(&mut record).unwrap());
        }

        // First insert fills page 1; each later insert grows the file
        assert_eq!(rids[0], RecordId::new(1, 0));
        assert_eq!(rids[1], RecordId::new(2, 0));
        assert_eq!(rids[2], RecordId::new(3, 0));
        assert_eq!(rids[3], RecordId::new(4, 0));

        let meta = table.read_meta().unwrap();
        assert_eq!(meta.num_pages, 5);
        assert_eq!(meta.num_tuples, 4);

        for (i, rid) in rids.iter().enumerate() {
            let record = table.get_record(*rid).unwrap();
            assert_eq!(
                record.get_attr(&schema, 0).unwrap(),
                Value::Int(i as i32)
            );
        }
    }

    #[test]
    fn test_many_records_span_pages() {
        let dir = tempfile::tempdir().unwrap();
        let schema = Schema::new(vec![Attribute::new("id", DataType::Int)], vec![0]).unwrap();
        let mut table = open_fresh_table(&dir, "small.tbl", &schema);

        let per_page = table.layout.slots_per_page();
        let count = per_page + 10;

        let mut rids = Vec::new();
        for i in 0..count {
            let mut record =
                Record::from_values(&schema, &[Value::Int(i as i32)]).unwrap();
            rids.push(table.insert_record(&mut record).unwrap());
        }

        let meta = table.read_meta().unwrap();
        assert!(meta.num_pages > 2);

        for (i, rid) in rids.iter().enumerate() {
            let record = table.get_record(*rid).unwrap();
            assert_eq!(
                record.get_attr(&schema, 0).unwrap(),
                Value::Int(i as i32)
            );
        }
        assert_eq!(table.pool().pinned_page_count(), 0);
    }

    #[test]
    fn test_close_and_reopen_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.tbl");
        let schema = test_schema();
        let config = EngineConfig::default();

        Table::create(&path, &schema, &config).unwrap();
        let mut table = Table::open(&path, &config).unwrap();

        let mut rids = Vec::new();
        for i in 0..4 {
            let mut record = test_record(&schema, i, &format!("user{}", i), i as f32);
            rids.push(table.insert_record(&mut record).unwrap());
        }
        table.delete_record(rids[1]).unwrap();
        table.close().unwrap();

        let mut reopened = Table::open(&path, &config).unwrap();
        assert_eq!(reopened.schema(), &schema);
        assert_eq!(reopened.num_tuples(), 3);

        let record = reopened.get_record(rids[2]).unwrap();
        assert_eq!(record.get_attr(&schema, 0).unwrap(), Value::Int(2));
        assert!(matches!(
            reopened.get_record(rids[1]),
            Err(RecordError::RecordNotFound(_))
        ));
    }

    #[test]
    fn test_metadata_matches_bitmap_population() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.tbl");
        let schema = test_schema();
        let config = EngineConfig::default();

        Table::create(&path, &schema, &config).unwrap();
        let mut table = Table::open(&path, &config).unwrap();

        let mut rids = Vec::new();
        for i in 0..7 {
            let mut record = test_record(&schema, i, "x", 0.0);
            rids.push(table.insert_record(&mut record).unwrap());
        }
        table.delete_record(rids[0]).unwrap();
        table.delete_record(rids[4]).unwrap();
        table.close().unwrap();

        // Count set bits across data pages straight off the disk
        let mut reopened = Table::open(&path, &config).unwrap();
        let meta = reopened.read_meta().unwrap();
        let layout = PageLayout::new(meta.slots_per_page, meta.record_size as usize);

        let mut live = 0;
        for page_id in DATA_START_PAGE..meta.num_pages {
            let guard = reopened.pool.pin(reopened.file, page_id).unwrap();
            for slot in 0..layout.slots_per_page() {
                if layout.is_occupied(guard.data(), slot) {
                    live += 1;
                }
            }
        }

        assert_eq!(live, meta.num_tuples);
        assert_eq!(live, 5);
    }

    #[test]
    fn test_insert_wrong_size_record() {
        let dir = tempfile::tempdir().unwrap();
        let schema = test_schema();
        let mut table = open_fresh_table(&dir, "t.tbl", &schema);

        let other_schema =
            Schema::new(vec![Attribute::new("id", DataType::Int)], vec![]).unwrap();
        let mut record = Record::new(&other_schema);
        assert!(matches!(
            table.insert_record(&mut record),
            Err(RecordError::InvalidRecordSize { .. })
        ));
    }

    #[test]
    fn test_destroy_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.tbl");
        let schema = test_schema();
        let config = EngineConfig::default();

        Table::create(&path, &schema, &config).unwrap();
        assert!(path.exists());

        Table::destroy(&path).unwrap();
        assert!(!path.exists());
        assert!(Table::open(&path, &config).is_err());
    }
}
