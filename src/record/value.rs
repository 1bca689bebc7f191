use super::error::{RecordError, RecordResult};

/// Data type of a single attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// 4 bytes, signed
    Int,
    /// 4 bytes, IEEE 754 single precision
    Float,
    /// 1 byte, 0 or 1
    Bool,
    /// Fixed n bytes, NUL-padded on disk
    String(usize),
}

impl DataType {
    /// Width in bytes inside a record
    pub fn width(&self) -> usize {
        match self {
            DataType::Int => 4,
            DataType::Float => 4,
            DataType::Bool => 1,
            DataType::String(n) => *n,
        }
    }

    /// Name used in schema rendering and parse errors
    pub fn name(&self) -> String {
        match self {
            DataType::Int => "INT".to_string(),
            DataType::Float => "FLOAT".to_string(),
            DataType::Bool => "BOOL".to_string(),
            DataType::String(n) => format!("STRING({})", n),
        }
    }
}

/// A single attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f32),
    Bool(bool),
    String(String),
}

impl Value {
    /// Check whether this value can be stored in a column of `data_type`.
    /// Strings match any declared width; over-long ones are truncated on write.
    pub fn matches(&self, data_type: &DataType) -> bool {
        matches!(
            (self, data_type),
            (Value::Int(_), DataType::Int)
                | (Value::Float(_), DataType::Float)
                | (Value::Bool(_), DataType::Bool)
                | (Value::String(_), DataType::String(_))
        )
    }

    /// Name of this value's type, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "INT",
            Value::Float(_) => "FLOAT",
            Value::Bool(_) => "BOOL",
            Value::String(_) => "STRING",
        }
    }

    /// Serialize into a fixed-width little-endian field of exactly
    /// `data_type.width()` bytes. Over-long strings are silently truncated
    /// to the declared width; shorter ones are zero-padded.
    pub fn serialize_into(&self, data_type: &DataType, out: &mut [u8]) -> RecordResult<()> {
        if !self.matches(data_type) {
            return Err(RecordError::TypeMismatch {
                expected: data_type.name(),
                actual: self.type_name().to_string(),
            });
        }

        match (self, data_type) {
            (Value::Int(i), DataType::Int) => out.copy_from_slice(&i.to_le_bytes()),
            (Value::Float(f), DataType::Float) => out.copy_from_slice(&f.to_le_bytes()),
            (Value::Bool(b), DataType::Bool) => out[0] = *b as u8,
            (Value::String(s), DataType::String(max_len)) => {
                let bytes = s.as_bytes();
                let len = bytes.len().min(*max_len);
                out[..len].copy_from_slice(&bytes[..len]);
                out[len..].fill(0);
            }
            _ => unreachable!(),
        }

        Ok(())
    }

    /// Deserialize from a fixed-width field. String fields end at the first
    /// NUL byte (or the declared width, whichever comes first).
    pub fn deserialize(bytes: &[u8], data_type: &DataType) -> RecordResult<Self> {
        if bytes.len() != data_type.width() {
            return Err(RecordError::Corrupt(format!(
                "expected {} bytes for {}, got {}",
                data_type.width(),
                data_type.name(),
                bytes.len()
            )));
        }

        match data_type {
            DataType::Int => {
                let mut buf = [0u8; 4];
                buf.copy_from_slice(bytes);
                Ok(Value::Int(i32::from_le_bytes(buf)))
            }
            DataType::Float => {
                let mut buf = [0u8; 4];
                buf.copy_from_slice(bytes);
                Ok(Value::Float(f32::from_le_bytes(buf)))
            }
            DataType::Bool => Ok(Value::Bool(bytes[0] != 0)),
            DataType::String(_) => {
                let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
                let s = String::from_utf8(bytes[..end].to_vec())
                    .map_err(|e| RecordError::Corrupt(format!("invalid UTF-8: {}", e)))?;
                Ok(Value::String(s))
            }
        }
    }
}
