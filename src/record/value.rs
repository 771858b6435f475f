use std::cmp::Ordering;
use std::fmt;

use super::error::{RecordError, RecordResult};

/// Represents an attribute data type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Int,            // 4 bytes
    String(usize),  // n bytes (fixed length)
    Float,          // 4 bytes
    Bool,           // 1 byte
}

impl DataType {
    /// Get the size in bytes for this data type
    pub fn size(&self) -> usize {
        match self {
            DataType::Int => 4,
            DataType::String(n) => *n,
            DataType::Float => 4,
            DataType::Bool => 1,
        }
    }

    /// Numeric code used in the persisted table metadata
    pub fn code(&self) -> u8 {
        match self {
            DataType::Int => 0,
            DataType::String(_) => 1,
            DataType::Float => 2,
            DataType::Bool => 3,
        }
    }

    /// Length field written next to the code; zero for fixed-size types
    pub fn type_length(&self) -> usize {
        match self {
            DataType::String(n) => *n,
            _ => 0,
        }
    }

    pub fn from_code(code: u8, type_length: usize) -> RecordResult<Self> {
        match code {
            0 => Ok(DataType::Int),
            1 => Ok(DataType::String(type_length)),
            2 => Ok(DataType::Float),
            3 => Ok(DataType::Bool),
            other => Err(RecordError::UnknownDataType(other)),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int => write!(f, "INT"),
            DataType::String(n) => write!(f, "STRING({})", n),
            DataType::Float => write!(f, "FLOAT"),
            DataType::Bool => write!(f, "BOOL"),
        }
    }
}

/// Represents a single attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    String(String),
    Float(f32),
    Bool(bool),
}

impl Value {
    /// Check whether this value can be stored in an attribute of type `data_type`
    pub fn fits(&self, data_type: &DataType) -> bool {
        match (self, data_type) {
            (Value::Int(_), DataType::Int)
            | (Value::Float(_), DataType::Float)
            | (Value::Bool(_), DataType::Bool) => true,
            (Value::String(s), DataType::String(n)) => s.len() <= *n,
            _ => false,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "INT",
            Value::String(_) => "STRING",
            Value::Float(_) => "FLOAT",
            Value::Bool(_) => "BOOL",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Compare two values of the same type. `None` when the types differ.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Serialize value into exactly `data_type.size()` bytes.
    /// Strings are zero-padded to the attribute length.
    pub fn serialize(&self, data_type: &DataType) -> RecordResult<Vec<u8>> {
        match (self, data_type) {
            (Value::Int(i), DataType::Int) => Ok(i.to_le_bytes().to_vec()),
            (Value::Float(f), DataType::Float) => Ok(f.to_le_bytes().to_vec()),
            (Value::Bool(b), DataType::Bool) => Ok(vec![*b as u8]),
            (Value::String(s), DataType::String(max_len)) => {
                let bytes = s.as_bytes();
                if bytes.len() > *max_len {
                    return Err(RecordError::Serialization(format!(
                        "String length {} exceeds max length {}",
                        bytes.len(),
                        max_len
                    )));
                }
                let mut result = vec![0u8; *max_len];
                result[..bytes.len()].copy_from_slice(bytes);
                Ok(result)
            }
            _ => Err(RecordError::TypeMismatch {
                expected: data_type.to_string(),
                actual: self.type_name().to_string(),
            }),
        }
    }

    /// Deserialize value from bytes
    pub fn deserialize(bytes: &[u8], data_type: &DataType) -> RecordResult<Self> {
        if bytes.len() != data_type.size() {
            return Err(RecordError::Deserialization(format!(
                "Expected {} bytes for {}, got {}",
                data_type.size(),
                data_type,
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
                // Find the first null byte (string terminator)
                let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
                let s = String::from_utf8(bytes[..end].to_vec())
                    .map_err(|e| RecordError::Deserialization(format!("Invalid UTF-8: {}", e)))?;
                Ok(Value::String(s))
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::String(s) => write!(f, "{}", s),
            Value::Float(x) => write!(f, "{:.6}", x),
            Value::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
        }
    }
}
