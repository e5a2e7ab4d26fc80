use super::coerce::CoercionRegistry;
use super::column::Column;
use super::record::Record;
use super::table::RecordTable;
use crate::errors::Error;
use std::sync::Arc;
use tracing::debug;

/// Creates records and tables that share one converter registry.
#[derive(Debug, Clone)]
pub struct TableFactory {
    registry: Arc<CoercionRegistry>,
}

impl Default for TableFactory {
    fn default() -> Self {
        Self::new(CoercionRegistry::with_builtins())
    }
}

impl TableFactory {
    pub fn new(registry: CoercionRegistry) -> Self {
        TableFactory {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &Arc<CoercionRegistry> {
        &self.registry
    }

    pub fn new_record(&self) -> Record {
        Record::new()
    }

    pub fn copy_record(&self, record: &Record) -> Record {
        record.copy()
    }

    /// A schema-less table; columns are added later.
    pub fn new_table(&self) -> RecordTable {
        RecordTable::with_registry(self.registry.clone())
    }

    pub fn new_table_with(&self, columns: Vec<Column>) -> Result<RecordTable, Error> {
        let mut table = self.new_table();
        for column in columns {
            table.add_column(column)?;
        }
        debug!(columns = table.column_count(), "Created table");
        Ok(table)
    }
}
