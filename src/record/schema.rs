use super::error::{RecordError, RecordResult};
use super::value::DataType;

/// One attribute of a table schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub data_type: DataType,
}

impl Attribute {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Table schema: ordered attributes plus the key attribute indices.
///
/// Immutable after creation. The key is descriptive only; the engine does
/// not enforce uniqueness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    attrs: Vec<Attribute>,
    key_attrs: Vec<usize>,
    record_size: usize,
}

/// On-disk type tags, written as little-endian u32
const TAG_INT: u32 = 0;
const TAG_FLOAT: u32 = 1;
const TAG_BOOL: u32 = 2;
const TAG_STRING: u32 = 3;

impl Schema {
    /// Create a schema; every key index must refer to an attribute
    pub fn new(attrs: Vec<Attribute>, key_attrs: Vec<usize>) -> RecordResult<Self> {
        for &idx in &key_attrs {
            if idx >= attrs.len() {
                return Err(RecordError::InvalidKeyAttribute(idx));
            }
        }

        let record_size = attrs.iter().map(|a| a.data_type.width()).sum();

        Ok(Self {
            attrs,
            key_attrs,
            record_size,
        })
    }

    /// Get attribute count
    pub fn num_attrs(&self) -> usize {
        self.attrs.len()
    }

    /// Get all attributes
    pub fn attrs(&self) -> &[Attribute] {
        &self.attrs
    }

    /// Get a specific attribute
    pub fn attr(&self, idx: usize) -> Option<&Attribute> {
        self.attrs.get(idx)
    }

    /// Get the key attribute indices
    pub fn key_attrs(&self) -> &[usize] {
        &self.key_attrs
    }

    /// Find attribute index by name
    pub fn attr_index(&self, name: &str) -> Option<usize> {
        self.attrs.iter().position(|a| a.name == name)
    }

    /// Total record size in bytes (sum of attribute widths)
    pub fn record_size(&self) -> usize {
        self.record_size
    }

    /// Byte offset of an attribute within a record
    pub fn attr_offset(&self, idx: usize) -> usize {
        self.attrs[..idx]
            .iter()
            .map(|a| a.data_type.width())
            .sum()
    }

    /// Size of the serialized schema in the header page
    pub fn serialized_len(&self) -> usize {
        let attr_bytes: usize = self.attrs.iter().map(|a| 12 + a.name.len()).sum();
        4 + attr_bytes + 4 + 4 * self.key_attrs.len()
    }

    /// Serialize into the header page region following the table metadata.
    ///
    /// Layout: num_attr, then per attribute {name_len, name bytes, type tag,
    /// type length}, then key count and key indices; all integers
    /// little-endian u32.
    pub fn serialize_into(&self, out: &mut [u8]) -> RecordResult<usize> {
        let needed = self.serialized_len();
        if out.len() < needed {
            return Err(RecordError::SchemaTooLarge {
                needed,
                available: out.len(),
            });
        }

        let mut pos = 0;
        write_u32(out, &mut pos, self.attrs.len() as u32);

        for attr in &self.attrs {
            write_u32(out, &mut pos, attr.name.len() as u32);
            out[pos..pos + attr.name.len()].copy_from_slice(attr.name.as_bytes());
            pos += attr.name.len();

            let (tag, type_len) = match attr.data_type {
                DataType::Int => (TAG_INT, 0),
                DataType::Float => (TAG_FLOAT, 0),
                DataType::Bool => (TAG_BOOL, 0),
                DataType::String(n) => (TAG_STRING, n as u32),
            };
            write_u32(out, &mut pos, tag);
            write_u32(out, &mut pos, type_len);
        }

        write_u32(out, &mut pos, self.key_attrs.len() as u32);
        for &key in &self.key_attrs {
            write_u32(out, &mut pos, key as u32);
        }

        Ok(pos)
    }

    /// Rebuild a schema from the header page region
    pub fn deserialize(bytes: &[u8]) -> RecordResult<Self> {
        let mut pos = 0;
        let num_attrs = read_u32(bytes, &mut pos)? as usize;

        let mut attrs = Vec::with_capacity(num_attrs);
        for _ in 0..num_attrs {
            let name_len = read_u32(bytes, &mut pos)? as usize;
            let name_end = pos
                .checked_add(name_len)
                .filter(|&end| end <= bytes.len())
                .ok_or_else(|| RecordError::Corrupt("attribute name out of range".into()))?;
            let name = String::from_utf8(bytes[pos..name_end].to_vec())
                .map_err(|e| RecordError::Corrupt(format!("attribute name: {}", e)))?;
            pos = name_end;

            let tag = read_u32(bytes, &mut pos)?;
            let type_len = read_u32(bytes, &mut pos)? as usize;
            let data_type = match tag {
                TAG_INT => DataType::Int,
                TAG_FLOAT => DataType::Float,
                TAG_BOOL => DataType::Bool,
                TAG_STRING => DataType::String(type_len),
                other => {
                    return Err(RecordError::Corrupt(format!("unknown type tag {}", other)));
                }
            };

            attrs.push(Attribute { name, data_type });
        }

        let key_size = read_u32(bytes, &mut pos)? as usize;
        let mut key_attrs = Vec::with_capacity(key_size);
        for _ in 0..key_size {
            key_attrs.push(read_u32(bytes, &mut pos)? as usize);
        }

        Schema::new(attrs, key_attrs)
    }
}

fn write_u32(out: &mut [u8], pos: &mut usize, value: u32) {
    out[*pos..*pos + 4].copy_from_slice(&value.to_le_bytes());
    *pos += 4;
}

fn read_u32(bytes: &[u8], pos: &mut usize) -> RecordResult<u32> {
    let end = pos
        .checked_add(4)
        .filter(|&end| end <= bytes.len())
        .ok_or_else(|| RecordError::Corrupt("schema region truncated".into()))?;
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[*pos..end]);
    *pos = end;
    Ok(u32::from_le_bytes(buf))
}
