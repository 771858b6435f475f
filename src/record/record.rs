use std::fmt;

use super::error::{RecordError, RecordResult};
use super::schema::Schema;
use super::value::Value;
use crate::file::PageId;

/// Slot identifier within a page
pub type SlotId = usize;

/// Byte stored at the end of every occupied record slot
pub const RECORD_SENTINEL: u8 = b'$';

/// Physical identifier for a record (page + slot)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot_id: SlotId,
}

impl RecordId {
    pub fn new(page_id: PageId, slot_id: SlotId) -> Self {
        Self { page_id, slot_id }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.page_id, self.slot_id)
    }
}

/// A single record (row) with typed values
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Location in the table, once inserted or fetched
    pub id: Option<RecordId>,
    values: Vec<Value>,
}

impl Record {
    /// Create a new record that has not been stored yet
    pub fn new(values: Vec<Value>) -> Self {
        Self { id: None, values }
    }

    pub fn with_id(id: RecordId, values: Vec<Value>) -> Self {
        Self {
            id: Some(id),
            values,
        }
    }

    /// Get the number of values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get_attr(&self, idx: usize) -> RecordResult<&Value> {
        self.values.get(idx).ok_or(RecordError::InvalidAttribute(idx))
    }

    /// Replace one attribute value, checking it against the schema
    pub fn set_attr(&mut self, schema: &Schema, idx: usize, value: Value) -> RecordResult<()> {
        let attr = schema
            .attribute(idx)
            .ok_or(RecordError::InvalidAttribute(idx))?;
        if idx >= self.values.len() {
            return Err(RecordError::InvalidAttribute(idx));
        }
        if !value.fits(&attr.data_type) {
            return Err(RecordError::TypeMismatch {
                expected: attr.data_type.to_string(),
                actual: value.type_name().to_string(),
            });
        }
        self.values[idx] = value;
        Ok(())
    }

    /// Serialize record to bytes according to schema
    /// Format: [attr0 data] [attr1 data] ... ['$']
    pub fn serialize(&self, schema: &Schema) -> RecordResult<Vec<u8>> {
        schema.validate_values(&self.values)?;

        let mut result = Vec::with_capacity(schema.record_size());
        for (value, attr) in self.values.iter().zip(schema.attributes()) {
            result.extend_from_slice(&value.serialize(&attr.data_type)?);
        }
        result.push(RECORD_SENTINEL);

        Ok(result)
    }

    /// Deserialize record from bytes according to schema
    pub fn deserialize(data: &[u8], schema: &Schema, id: Option<RecordId>) -> RecordResult<Self> {
        if data.len() != schema.record_size() {
            return Err(RecordError::Deserialization(format!(
                "Expected {} bytes, got {}",
                schema.record_size(),
                data.len()
            )));
        }

        let mut offset = 0;
        let mut values = Vec::with_capacity(schema.num_attrs());
        for attr in schema.attributes() {
            let size = attr.size();
            values.push(Value::deserialize(&data[offset..offset + size], &attr.data_type)?);
            offset += size;
        }

        Ok(Record { id, values })
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(id) = self.id {
            write!(f, "{}", id)?;
        }
        write!(f, "(")?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", value)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Attribute, DataType};

    fn create_test_schema() -> Schema {
        Schema::new(
            vec![
                Attribute::new("id", DataType::Int),
                Attribute::new("name", DataType::String(10)),
                Attribute::new("score", DataType::Float),
            ],
            vec![0],
        )
        .unwrap()
    }

    #[test]
    fn test_record_serialization() {
        let schema = create_test_schema();
        let record = Record::new(vec![
            Value::Int(42),
            Value::String("test".to_string()),
            Value::Float(3.25),
        ]);

        let bytes = record.serialize(&schema).unwrap();
        assert_eq!(bytes.len(), schema.record_size());
        assert_eq!(bytes[bytes.len() - 1], RECORD_SENTINEL);
        assert_eq!(&bytes[..4], &42i32.to_le_bytes());

        let rid = RecordId::new(1, 3);
        let restored = Record::deserialize(&bytes, &schema, Some(rid)).unwrap();
        assert_eq!(restored.id, Some(rid));
        assert_eq!(restored.values(), record.values());
    }

    #[test]
    fn test_set_attr() {
        let schema = create_test_schema();
        let mut record = Record::new(vec![
            Value::Int(1),
            Value::String("a".to_string()),
            Value::Float(0.0),
        ]);

        record.set_attr(&schema, 1, Value::String("bob".to_string())).unwrap();
        assert_eq!(record.get_attr(1).unwrap(), &Value::String("bob".to_string()));

        let result = record.set_attr(&schema, 0, Value::Bool(true));
        assert!(matches!(result, Err(RecordError::TypeMismatch { .. })));
        assert!(matches!(
            record.set_attr(&schema, 7, Value::Int(1)),
            Err(RecordError::InvalidAttribute(7))
        ));
        assert!(record.get_attr(3).is_err());
    }

    #[test]
    fn test_wrong_length() {
        let schema = create_test_schema();
        let result = Record::deserialize(&[0u8; 5], &schema, None);
        assert!(matches!(result, Err(RecordError::Deserialization(_))));
    }

    #[test]
    fn test_display() {
        let record = Record::with_id(
            RecordId::new(2, 0),
            vec![Value::Int(7), Value::String("x".to_string())],
        );
        assert_eq!(record.to_string(), "(2, 0)(7,x)");
    }
}
