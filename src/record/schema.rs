use super::error::{RecordError, RecordResult};
use super::value::{DataType, Value};

/// Named attribute of a table
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

    /// Get the size of this attribute in bytes
    pub fn size(&self) -> usize {
        self.data_type.size()
    }
}

/// Fixed-length record layout: attributes in order plus the key attribute set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    attributes: Vec<Attribute>,
    key_attrs: Vec<usize>,
    /// Attribute bytes plus the trailing sentinel byte
    record_size: usize,
}

impl Schema {
    /// Create a schema, rejecting empty, duplicate or out-of-range definitions
    pub fn new(attributes: Vec<Attribute>, key_attrs: Vec<usize>) -> RecordResult<Self> {
        if attributes.is_empty() {
            return Err(RecordError::InvalidSchema(
                "schema needs at least one attribute".to_string(),
            ));
        }

        for (i, attr) in attributes.iter().enumerate() {
            if attr.name.is_empty() {
                return Err(RecordError::InvalidSchema(format!(
                    "attribute {} has an empty name",
                    i
                )));
            }
            if attributes[..i].iter().any(|a| a.name == attr.name) {
                return Err(RecordError::InvalidSchema(format!(
                    "duplicate attribute name '{}'",
                    attr.name
                )));
            }
            if attr.data_type == DataType::String(0) {
                return Err(RecordError::InvalidSchema(format!(
                    "string attribute '{}' has zero length",
                    attr.name
                )));
            }
        }

        if let Some(&bad) = key_attrs.iter().find(|&&k| k >= attributes.len()) {
            return Err(RecordError::InvalidSchema(format!(
                "key attribute {} out of range",
                bad
            )));
        }

        let record_size = attributes.iter().map(|a| a.size()).sum::<usize>() + 1;

        Ok(Self {
            attributes,
            key_attrs,
            record_size,
        })
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn num_attrs(&self) -> usize {
        self.attributes.len()
    }

    pub fn attribute(&self, idx: usize) -> Option<&Attribute> {
        self.attributes.get(idx)
    }

    pub fn key_attrs(&self) -> &[usize] {
        &self.key_attrs
    }

    /// Find attribute index by name
    pub fn find_attribute(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name == name)
    }

    /// Get total record size in bytes (including the sentinel)
    pub fn record_size(&self) -> usize {
        self.record_size
    }

    /// Get the byte offset of an attribute within a record
    pub fn attr_offset(&self, idx: usize) -> usize {
        self.attributes[..idx].iter().map(|a| a.size()).sum()
    }

    /// Validate a value list against this schema
    pub fn validate_values(&self, values: &[Value]) -> RecordResult<()> {
        if values.len() != self.attributes.len() {
            return Err(RecordError::SchemaMismatch(format!(
                "Expected {} attributes, got {}",
                self.attributes.len(),
                values.len()
            )));
        }

        for (value, attr) in values.iter().zip(&self.attributes) {
            if !value.fits(&attr.data_type) {
                return Err(RecordError::TypeMismatch {
                    expected: attr.data_type.to_string(),
                    actual: value.type_name().to_string(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_schema() -> Schema {
        Schema::new(
            vec![
                Attribute::new("a", DataType::Int),
                Attribute::new("b", DataType::String(4)),
                Attribute::new("c", DataType::Float),
                Attribute::new("d", DataType::Bool),
            ],
            vec![0],
        )
        .unwrap()
    }

    #[test]
    fn test_schema_creation() {
        let schema = create_test_schema();
        assert_eq!(schema.num_attrs(), 4);
        assert_eq!(schema.key_attrs(), &[0]);
        assert_eq!(schema.record_size(), 4 + 4 + 4 + 1 + 1);
    }

    #[test]
    fn test_attr_offset() {
        let schema = create_test_schema();
        assert_eq!(schema.attr_offset(0), 0);
        assert_eq!(schema.attr_offset(1), 4);
        assert_eq!(schema.attr_offset(2), 8);
        assert_eq!(schema.attr_offset(3), 12);
    }

    #[test]
    fn test_find_attribute() {
        let schema = create_test_schema();
        assert_eq!(schema.find_attribute("c"), Some(2));
        assert_eq!(schema.find_attribute("nonexistent"), None);
    }

    #[test]
    fn test_invalid_schemas() {
        assert!(Schema::new(vec![], vec![]).is_err());
        assert!(
            Schema::new(
                vec![
                    Attribute::new("a", DataType::Int),
                    Attribute::new("a", DataType::Int)
                ],
                vec![]
            )
            .is_err()
        );
        assert!(Schema::new(vec![Attribute::new("a", DataType::Int)], vec![1]).is_err());
        assert!(Schema::new(vec![Attribute::new("s", DataType::String(0))], vec![]).is_err());
        assert!(Schema::new(vec![Attribute::new("", DataType::Int)], vec![]).is_err());
    }

    #[test]
    fn test_validate_values() {
        let schema = create_test_schema();
        let ok = vec![
            Value::Int(1),
            Value::String("abcd".to_string()),
            Value::Float(2.5),
            Value::Bool(true),
        ];
        assert!(schema.validate_values(&ok).is_ok());

        let too_long = vec![
            Value::Int(1),
            Value::String("abcde".to_string()),
            Value::Float(2.5),
            Value::Bool(true),
        ];
        assert!(matches!(
            schema.validate_values(&too_long),
            Err(RecordError::TypeMismatch { .. })
        ));

        assert!(matches!(
            schema.validate_values(&ok[..2]),
            Err(RecordError::SchemaMismatch(_))
        ));
    }
}
