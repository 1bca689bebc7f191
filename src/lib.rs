pub mod config;
pub mod expr;
pub mod file;
pub mod record;
pub mod ser;

pub use config::{ConfigError, EngineConfig, EvictionPolicy};
pub use expr::{Expr, ExprError, Operator, eval, parse_predicate};
pub use file::{
    BufferManager, DEFAULT_POOL_CAPACITY, FileError, FileHandle, PAGE_SIZE, PageGuard, PageId,
    PagedFileManager,
};
pub use record::{
    Attribute, DATA_START_PAGE, DataType, HEADER_PAGE, PageLayout, Record, RecordError, RecordId,
    RecordManager, RecordResult, Schema, SlotId, Table, TableMetadata, TableScan, Value,
};
