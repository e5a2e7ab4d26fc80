use super::column::Column;
use super::record::Record;
use super::table::{ColumnHandle, RecordTable, RowView};
use super::value::Value;
use crate::errors;

/// Walks the rows of a table and may remove the current one.
///
/// ```
/// use rectable::storage::{Column, DataType, Record, RecordTable, Value};
/// let mut table = RecordTable::with_columns(vec![Column::new("n", DataType::INT)]).unwrap();
/// for n in 0..4 {
///     table.add_row(&Record::with_fields([("n", Value::from(n))]).unwrap()).unwrap();
/// }
/// let mut cursor = table.row_cursor();
/// while !cursor.end_of_table {
///     if cursor.row().unwrap().get("n").unwrap() == &Value::Int(1) {
///         cursor.remove_current().unwrap();
///     } else {
///         cursor.advance();
///     }
/// }
/// assert_eq!(table.row_count(), 3);
/// ```
pub struct RowCursor<'a> {
    table: &'a mut RecordTable,
    pub row_num: usize,
    // Indicates a position one past the last element
    pub end_of_table: bool,
}

impl<'a> RowCursor<'a> {
    pub fn start(table: &'a mut RecordTable) -> Self {
        let end_of_table = table.row_count() == 0;
        RowCursor {
            table,
            row_num: 0,
            end_of_table,
        }
    }

    pub fn row(&self) -> Result<RowView<'_>, errors::Error> {
        self.table.get_row(self.row_num)
    }

    pub fn set_value(
        &mut self,
        column: &str,
        value: impl Into<Value>,
    ) -> Result<Value, errors::Error> {
        self.table.set_value(self.row_num, column, value)
    }

    pub fn advance(&mut self) {
        self.row_num += 1;
        if self.row_num >= self.table.row_count() {
            self.end_of_table = true;
        }
    }

    /// Removes the current row. The cursor then points at the row that followed it.
    pub fn remove_current(&mut self) -> Result<Record, errors::Error> {
        let record = self.table.remove_row(self.row_num)?;
        if self.row_num >= self.table.row_count() {
            self.end_of_table = true;
        }
        Ok(record)
    }
}

/// Walks the schema of a table and may remove the current column.
pub struct ColumnCursor<'a> {
    table: &'a mut RecordTable,
    pub column_num: usize,
    // Indicates a position one past the last element
    pub end_of_table: bool,
}

impl<'a> ColumnCursor<'a> {
    pub fn start(table: &'a mut RecordTable) -> Self {
        let end_of_table = table.column_count() == 0;
        ColumnCursor {
            table,
            column_num: 0,
            end_of_table,
        }
    }

    pub fn column(&self) -> Result<&Column, errors::Error> {
        self.table.get_column(self.column_num)
    }

    pub fn column_mut(&mut self) -> Result<ColumnHandle<'_>, errors::Error> {
        self.table.column_mut(self.column_num)
    }

    pub fn advance(&mut self) {
        self.column_num += 1;
        if self.column_num >= self.table.column_count() {
            self.end_of_table = true;
        }
    }

    /// Removes the current column from the schema after dropping its field from
    /// every row. The cursor then points at the column that followed it.
    pub fn remove_current(&mut self) -> Result<Column, errors::Error> {
        let column = self.table.remove_column(self.column_num)?;
        if self.column_num >= self.table.column_count() {
            self.end_of_table = true;
        }
        Ok(column)
    }
}
