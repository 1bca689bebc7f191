mod error;
mod page;
mod record;
mod scan;
mod schema;
mod table;
mod value;

pub use error::{RecordError, RecordResult};
pub use page::PageLayout;
pub use record::{Record, RecordId, SlotId};
pub use scan::TableScan;
pub use schema::{Attribute, Schema};
pub use table::{DATA_START_PAGE, HEADER_PAGE, Table, TableMetadata};
pub use value::{DataType, Value};

use crate::config::EngineConfig;
use crate::expr::Expr;
use ahash::AHashMap;

/// High-level record manager: a registry of open tables keyed by name.
///
/// A table's name is its file path. Every open table carries its own
/// buffer pool, sized by the shared [`EngineConfig`].
pub struct RecordManager {
    config: EngineConfig,
    open_tables: AHashMap<String, Table>,
}

impl RecordManager {
    /// Create a record manager with the given configuration
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            open_tables: AHashMap::new(),
        }
    }

    /// Create a record manager with default configuration
    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Create a new table file; the table is not opened
    pub fn create_table(&mut self, name: &str, schema: &Schema) -> RecordResult<()> {
        Table::create(name, schema, &self.config)
    }

    /// Open an existing table
    pub fn open_table(&mut self, name: &str) -> RecordResult<()> {
        let table = Table::open(name, &self.config)?;
        self.open_tables.insert(name.to_string(), table);
        Ok(())
    }

    /// Flush and close an open table; the file persists
    pub fn close_table(&mut self, name: &str) -> RecordResult<()> {
        let table = self
            .open_tables
            .remove(name)
            .ok_or_else(|| RecordError::TableNotOpen(name.to_string()))?;
        table.close()
    }

    /// Delete a table's file, closing it first if open
    pub fn delete_table(&mut self, name: &str) -> RecordResult<()> {
        if let Some(table) = self.open_tables.remove(name) {
            table.close()?;
        }
        Table::destroy(name)
    }

    /// Access an open table
    pub fn table(&mut self, name: &str) -> RecordResult<&mut Table> {
        self.open_tables
            .get_mut(name)
            .ok_or_else(|| RecordError::TableNotOpen(name.to_string()))
    }

    /// Insert a record into a table
    pub fn insert(&mut self, name: &str, record: &mut Record) -> RecordResult<RecordId> {
        self.table(name)?.insert_record(record)
    }

    /// Delete a record from a table
    pub fn delete(&mut self, name: &str, rid: RecordId) -> RecordResult<()> {
        self.table(name)?.delete_record(rid)
    }

    /// Update a record in a table
    pub fn update(&mut self, name: &str, record: &Record) -> RecordResult<()> {
        self.table(name)?.update_record(record)
    }

    /// Get a record from a table
    pub fn get(&mut self, name: &str, rid: RecordId) -> RecordResult<Record> {
        self.table(name)?.get_record(rid)
    }

    /// Live record count of an open table
    pub fn num_tuples(&self, name: &str) -> RecordResult<u32> {
        self.open_tables
            .get(name)
            .map(Table::num_tuples)
            .ok_or_else(|| RecordError::TableNotOpen(name.to_string()))
    }

    /// Start a scan over a table, optionally filtered
    pub fn scan(&mut self, name: &str, condition: Option<Expr>) -> RecordResult<TableScan<'_>> {
        self.table(name)?.scan(condition)
    }

    /// Flush and close every open table
    pub fn shutdown(mut self) -> RecordResult<()> {
        for (_, table) in self.open_tables.drain() {
            table.close()?;
        }
        Ok(())
    }
}
