use super::error::{RecordError, RecordResult};
use super::schema::Schema;
use super::value::Value;
use crate::file::PageId;
use std::fmt;

/// Slot index within a data page
pub type SlotId = u32;

/// Physical identifier for a record (page + slot)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId {
    pub page: PageId,
    pub slot: SlotId,
}

impl RecordId {
    pub fn new(page: PageId, slot: SlotId) -> Self {
        Self { page, slot }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.page, self.slot)
    }
}

/// A single record: the raw fixed-width byte image of one row.
///
/// `id` is `None` until the record is inserted into a table. Attribute
/// access is schema-directed; the buffer always has exactly
/// `schema.record_size()` bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: Option<RecordId>,
    data: Vec<u8>,
}

impl Record {
    /// Create a fresh zeroed record for a schema
    pub fn new(schema: &Schema) -> Self {
        Self {
            id: None,
            data: vec![0u8; schema.record_size()],
        }
    }

    /// Build a record from one value per attribute
    pub fn from_values(schema: &Schema, values: &[Value]) -> RecordResult<Self> {
        if values.len() != schema.num_attrs() {
            return Err(RecordError::WrongValueCount {
                expected: schema.num_attrs(),
                actual: values.len(),
            });
        }

        let mut record = Record::new(schema);
        for (idx, value) in values.iter().enumerate() {
            record.set_attr(schema, idx, value)?;
        }
        Ok(record)
    }

    pub(crate) fn from_bytes(id: RecordId, data: Vec<u8>) -> Self {
        Self { id: Some(id), data }
    }

    /// The raw record bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Decode one attribute into a freshly allocated value
    pub fn get_attr(&self, schema: &Schema, idx: usize) -> RecordResult<Value> {
        let attr = schema
            .attr(idx)
            .ok_or(RecordError::InvalidAttribute(idx))?;

        let offset = schema.attr_offset(idx);
        let field = &self.data[offset..offset + attr.data_type.width()];
        Value::deserialize(field, &attr.data_type)
    }

    /// Encode one attribute into the record buffer.
    ///
    /// Fails on a type mismatch; strings longer than the declared width are
    /// silently truncated.
    pub fn set_attr(&mut self, schema: &Schema, idx: usize, value: &Value) -> RecordResult<()> {
        let attr = schema
            .attr(idx)
            .ok_or(RecordError::InvalidAttribute(idx))?;

        let offset = schema.attr_offset(idx);
        let field = &mut self.data[offset..offset + attr.data_type.width()];
        value.serialize_into(&attr.data_type, field)
    }

    /// Decode every attribute, in schema order
    pub fn values(&self, schema: &Schema) -> RecordResult<Vec<Value>> {
        (0..schema.num_attrs())
            .map(|idx| self.get_attr(schema, idx))
            .collect()
    }
}
