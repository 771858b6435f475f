mod error;
mod expr;
mod page;
mod record;
mod schema;
mod table_file;
mod value;

pub use error::{RecordError, RecordResult};
pub use expr::{Expr, Operator};
pub use page::SlotPage;
pub use record::{RECORD_SENTINEL, Record, RecordId, SlotId};
pub use schema::{Attribute, Schema};
pub use table_file::{Table, TableScan};
pub use value::{DataType, Value};

use crate::catalog;
use crate::config::EngineConfig;
use crate::file::PageFile;

/// Creates, opens and deletes tables under the configured data directory
pub struct RecordManager {
    config: EngineConfig,
}

impl RecordManager {
    /// Create a new record manager
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Create a new table file
    pub fn create_table(&self, name: &str, schema: Schema) -> RecordResult<()> {
        Self::check_name(name)?;
        Table::create(self.config.file_path(name), name, schema)
    }

    /// Open an existing table with a buffer pool sized by the configuration
    pub fn open_table(&self, name: &str) -> RecordResult<Table> {
        Self::check_name(name)?;
        Table::open(
            self.config.file_path(name),
            self.config.table_pool_capacity,
            self.config.table_replacement,
        )
    }

    /// Remove a table file
    pub fn delete_table(&self, name: &str) -> RecordResult<()> {
        Self::check_name(name)?;
        PageFile::destroy(self.config.file_path(name))?;
        log::info!("deleted table {}", name);
        Ok(())
    }

    fn check_name(name: &str) -> RecordResult<()> {
        if name.contains(['/', '\\']) || catalog::validate_name(name).is_err() {
            return Err(RecordError::InvalidTableName(name.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::file::FileError;
    use tempfile::TempDir;

    fn setup_test_env() -> (TempDir, RecordManager) {
        let temp_dir = tempfile::tempdir().unwrap();
        let manager = RecordManager::new(EngineConfig::with_data_dir(temp_dir.path()));
        (temp_dir, manager)
    }

    fn schema() -> Schema {
        Schema::new(
            vec![
                Attribute::new("id", DataType::Int),
                Attribute::new("name", DataType::String(8)),
            ],
            vec![0],
        )
        .unwrap()
    }

    #[test]
    fn test_create_open_delete() {
        let (temp_dir, manager) = setup_test_env();
        manager.create_table("people", schema()).unwrap();
        assert!(temp_dir.path().join("people").exists());

        let mut table = manager.open_table("people").unwrap();
        assert_eq!(table.name(), "people");
        assert_eq!(table.schema(), &schema());
        assert_eq!(table.buffer_pool().capacity(), 3);

        let mut r = Record::new(vec![Value::Int(1), Value::String("ann".into())]);
        table.insert_record(&mut r).unwrap();
        table.close().unwrap();

        manager.delete_table("people").unwrap();
        assert!(!temp_dir.path().join("people").exists());
    }

    #[test]
    fn test_invalid_names() {
        let (_temp_dir, manager) = setup_test_env();
        for name in ["", "a|b", "../escape", "x$y"] {
            let err = manager.create_table(name, schema()).unwrap_err();
            assert!(matches!(err, RecordError::InvalidTableName(_)));
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
    }

    #[test]
    fn test_missing_table() {
        let (_temp_dir, manager) = setup_test_env();
        let err = manager.open_table("ghost").err().unwrap();
        assert!(matches!(err, RecordError::File(FileError::FileNotFound(_))));
        assert_eq!(err.kind(), ErrorKind::NotFound);

        assert!(manager.delete_table("ghost").is_err());
    }
}
