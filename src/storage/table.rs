use super::coerce::{CoercionRegistry, NullPolicy};
use super::column::Column;
use super::cursor::{ColumnCursor, RowCursor};
use super::record::Record;
use super::sortable::{self, Sortable};
use super::value::Value;
use crate::errors::Error;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};
use uuid::Uuid;

/// Identity of a row inside a table. Stable across reordering and cell updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowId(Uuid);

impl RowId {
    fn new() -> Self {
        RowId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A record bound to the table schema: one value per column, in column order.
#[derive(Debug, Clone)]
struct Row {
    id: RowId,
    values: Vec<Value>,
}

/// Schema-enforcing, in-memory table of rows.
///
/// Invariants kept by every operation:
/// - each row holds exactly `column_count()` values, in column order;
/// - `unique_index[i]` is `Some` iff column `i` is unique, and holds every non-null
///   value of that column;
/// - a failed operation leaves rows, columns and indexes untouched.
///
/// Not safe for concurrent mutation; callers serialize access externally.
#[derive(Debug)]
pub struct RecordTable {
    columns: Vec<Column>,
    order: Vec<RowId>,
    rows: HashMap<RowId, Row>,
    unique_index: Vec<Option<HashSet<Value>>>,
    mutable: bool,
    registry: Arc<CoercionRegistry>,
}

impl Default for RecordTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordTable {
    /// An empty, schema-less table using the built-in converters.
    pub fn new() -> Self {
        Self::with_registry(Arc::new(CoercionRegistry::with_builtins()))
    }

    pub fn with_registry(registry: Arc<CoercionRegistry>) -> Self {
        RecordTable {
            columns: Vec::new(),
            order: Vec::new(),
            rows: HashMap::new(),
            unique_index: Vec::new(),
            mutable: true,
            registry,
        }
    }

    /// An empty table with the given schema.
    pub fn with_columns(columns: Vec<Column>) -> Result<Self, Error> {
        let mut table = Self::new();
        for column in columns {
            table.add_column(column)?;
        }
        Ok(table)
    }

    pub fn registry(&self) -> &Arc<CoercionRegistry> {
        &self.registry
    }

    pub fn is_mutable(&self) -> bool {
        self.mutable
    }

    /// Freezes or unfreezes the schema, the rows and every cell.
    pub fn set_mutable(&mut self, mutable: bool) {
        self.mutable = mutable;
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    pub fn get_column(&self, index: usize) -> Result<&Column, Error> {
        self.columns.get(index).ok_or_else(|| {
            err!(
                Bounds,
                "Column index {} out of range 0..{}",
                index,
                self.columns.len()
            )
        })
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    pub fn contains_column(&self, name: &str) -> bool {
        self.get_column_index(name).is_some()
    }

    /// Mutable access to the constraint attributes of an attached column.
    pub fn column_mut(&mut self, index: usize) -> Result<ColumnHandle<'_>, Error> {
        self.get_column(index)?;
        Ok(ColumnHandle { table: self, index })
    }

    pub fn column_cursor(&mut self) -> ColumnCursor<'_> {
        ColumnCursor::start(self)
    }

    pub fn row_cursor(&mut self) -> RowCursor<'_> {
        RowCursor::start(self)
    }

    /// Inserts a column at `index`, filling every existing row with its default.
    ///
    /// # Errors
    /// - `Bounds` if `index > column_count()`.
    /// - `IllegalArgument` for a blank name, `Schema` for a duplicate one.
    /// - `IllegalState` if existing rows cannot be filled without breaking the
    ///   column's nullability or uniqueness.
    pub fn insert_column(&mut self, column: Column, index: usize) -> Result<(), Error> {
        self.ensure_mutable()?;
        if index > self.columns.len() {
            return Err(err!(
                Bounds,
                "Column index {} out of range 0..={}",
                index,
                self.columns.len()
            ));
        }
        column.validate_name()?;
        if self.contains_column(column.name()) {
            return Err(err!(Schema, "Duplicate column name '{}'", column.name()));
        }

        let mut column = column;
        if let Some(default) = column.default.take() {
            let default = self.registry.coerce(column.data_type(), default)?;
            column.check_size(&default)?;
            column.default = if default.is_null() { None } else { Some(default) };
        }

        let fill = self.resolve_default(&column)?;
        if !self.rows.is_empty() {
            if fill.is_null() && !column.is_nullable() {
                return Err(err!(
                    IllegalState,
                    "Column '{}' is not nullable and has no default for {} existing rows",
                    column.name(),
                    self.rows.len()
                ));
            }
            if column.is_unique() && !fill.is_null() && self.rows.len() > 1 {
                return Err(err!(
                    IllegalState,
                    "Column '{}' is unique but its default {} would repeat across {} rows",
                    column.name(),
                    fill,
                    self.rows.len()
                ));
            }
        }

        let index_set = if column.is_unique() {
            let mut set = HashSet::new();
            if !fill.is_null() && !self.rows.is_empty() {
                set.insert(fill.clone());
            }
            Some(set)
        } else {
            None
        };

        for row in self.rows.values_mut() {
            row.values.insert(index, fill.clone());
        }
        debug!(
            column = column.name(),
            index = index,
            rows = self.rows.len(),
            "Inserted column"
        );
        self.columns.insert(index, column);
        self.unique_index.insert(index, index_set);
        Ok(())
    }

    pub fn add_column(&mut self, column: Column) -> Result<(), Error> {
        self.insert_column(column, self.columns.len())
    }

    /// Removes a column, dropping its field from every row first.
    pub fn remove_column(&mut self, index: usize) -> Result<Column, Error> {
        self.ensure_mutable()?;
        self.get_column(index)?;
        for row in self.rows.values_mut() {
            row.values.remove(index);
        }
        let column = self.columns.remove(index);
        self.unique_index.remove(index);
        debug!(column = column.name(), index = index, "Removed column");
        Ok(column)
    }

    pub fn get_row(&self, index: usize) -> Result<RowView<'_>, Error> {
        self.check_row_index(index)?;
        self.row(self.order[index])
            .ok_or_else(|| err!(IllegalState, "Row at index {} is missing", index))
    }

    pub fn row(&self, id: RowId) -> Option<RowView<'_>> {
        self.rows.get(&id).map(|row| RowView { table: self, row })
    }

    pub fn get_row_index(&self, id: RowId) -> Option<usize> {
        self.order.iter().position(|r| *r == id)
    }

    pub fn contains_row(&self, id: RowId) -> bool {
        self.rows.contains_key(&id)
    }

    /// Rows in table order.
    pub fn rows(&self) -> impl Iterator<Item = RowView<'_>> + '_ {
        self.order
            .iter()
            .filter_map(move |id| self.rows.get(id).map(|row| RowView { table: self, row }))
    }

    /// Validates `record` against the schema and inserts it at `index`.
    ///
    /// The record must have exactly one field per column. Every value goes through
    /// the column's coercion, nullability, size and uniqueness checks before
    /// anything is committed.
    pub fn insert_row(&mut self, record: &Record, index: usize) -> Result<RowId, Error> {
        self.ensure_mutable()?;
        if index > self.order.len() {
            return Err(err!(
                Bounds,
                "Row index {} out of range 0..={}",
                index,
                self.order.len()
            ));
        }
        if record.size() != self.columns.len() {
            return Err(err!(
                Schema,
                "Incompatible record: {} fields for {} columns",
                record.size(),
                self.columns.len()
            ));
        }

        let mut values = Vec::with_capacity(self.columns.len());
        for (i, column) in self.columns.iter().enumerate() {
            let value = record.get_value(column.name()).map_err(|_| {
                err!(
                    Schema,
                    "Incompatible record: missing field '{}'",
                    column.name()
                )
            })?;
            let value = self.coerce_cell(column, value.clone())?;
            if self.is_taken(i, &value) {
                return Err(err!(
                    NonUniqueValue,
                    "Column '{}' already holds {}",
                    column.name(),
                    value
                ));
            }
            values.push(value);
        }

        for (i, value) in values.iter().enumerate() {
            if let (Some(set), false) = (self.unique_index[i].as_mut(), value.is_null()) {
                set.insert(value.clone());
            }
        }
        let id = RowId::new();
        self.rows.insert(id, Row { id, values });
        self.order.insert(index, id);
        debug!(row_id = %id, index = index, "Inserted row");
        Ok(id)
    }

    pub fn add_row(&mut self, record: &Record) -> Result<RowId, Error> {
        self.insert_row(record, self.order.len())
    }

    /// Removes the row at `index` and its contributions to the uniqueness indexes.
    pub fn remove_row(&mut self, index: usize) -> Result<Record, Error> {
        self.ensure_mutable()?;
        self.check_row_index(index)?;
        let id = self.order.remove(index);

        // Mid-sort the same row may sit in two slots; keep it stored until the last one goes.
        let row = if self.order.contains(&id) {
            self.rows.get(&id).cloned()
        } else {
            let row = self.rows.remove(&id);
            if let Some(row) = &row {
                for (i, value) in row.values.iter().enumerate() {
                    if let Some(Some(set)) = self.unique_index.get_mut(i) {
                        set.remove(value);
                    }
                }
            }
            row
        };
        let row = row.ok_or_else(|| err!(IllegalState, "Row {} is missing", id))?;
        debug!(row_id = %id, index = index, "Removed row");
        Ok(self.snapshot(&row))
    }

    pub fn get_value(&self, row_index: usize, column: &str) -> Result<&Value, Error> {
        self.get_row(row_index)?.get(column)
    }

    /// Writes a cell, re-running the column checks. Returns the previous value.
    pub fn set_value(
        &mut self,
        row_index: usize,
        column: &str,
        value: impl Into<Value>,
    ) -> Result<Value, Error> {
        self.ensure_mutable()?;
        self.check_row_index(row_index)?;
        let col = self
            .get_column_index(column)
            .ok_or_else(|| err!(NoSuchField, "{}", column))?;
        let value = self.coerce_cell(&self.columns[col], value.into())?;

        let id = self.order[row_index];
        let current = self
            .rows
            .get(&id)
            .map(|row| &row.values[col])
            .ok_or_else(|| err!(IllegalState, "Row {} is missing", id))?;
        if *current == value {
            return Ok(value);
        }
        if self.is_taken(col, &value) {
            return Err(err!(
                NonUniqueValue,
                "Column '{}' already holds {}",
                column,
                value
            ));
        }

        let row = self
            .rows
            .get_mut(&id)
            .ok_or_else(|| err!(IllegalState, "Row {} is missing", id))?;
        let previous = std::mem::replace(&mut row.values[col], value.clone());
        if let Some(set) = self.unique_index[col].as_mut() {
            set.remove(&previous);
            if !value.is_null() {
                set.insert(value);
            }
        }
        trace!(row_id = %id, column = column, "Updated cell");
        Ok(previous)
    }

    /// A structurally independent copy: same schema and cell values, every row
    /// under a new id. Cells are copied as stored, so NULLs stay NULL even where the
    /// column has since gained a default. Shares the converter registry.
    pub fn copy(&self) -> Result<RecordTable, Error> {
        let mut order = Vec::with_capacity(self.order.len());
        let mut rows = HashMap::with_capacity(self.order.len());
        let mut unique_index: Vec<Option<HashSet<Value>>> = self
            .columns
            .iter()
            .map(|c| if c.is_unique() { Some(HashSet::new()) } else { None })
            .collect();

        for old in &self.order {
            let row = self
                .rows
                .get(old)
                .ok_or_else(|| err!(IllegalState, "Row {} is missing", old))?;
            let id = RowId::new();
            for (set, value) in unique_index.iter_mut().zip(&row.values) {
                if let (Some(set), false) = (set.as_mut(), value.is_null()) {
                    set.insert(value.clone());
                }
            }
            rows.insert(
                id,
                Row {
                    id,
                    values: row.values.clone(),
                },
            );
            order.push(id);
        }

        debug!(rows = order.len(), columns = self.columns.len(), "Copied table");
        Ok(RecordTable {
            columns: self.columns.clone(),
            order,
            rows,
            unique_index,
            mutable: self.mutable,
            registry: self.registry.clone(),
        })
    }

    /// Stable in-place sort of the rows by one column. NULLs sort first.
    pub fn sort_by_column(&mut self, column: &str, ascending: bool) -> Result<(), Error> {
        let col = self
            .get_column_index(column)
            .ok_or_else(|| err!(NoSuchField, "{}", column))?;
        sortable::insertion_sort(self, |table: &RecordTable, a: &RowId, b: &RowId| {
            let left = table.rows.get(a).map(|r| &r.values[col]);
            let right = table.rows.get(b).map(|r| &r.values[col]);
            let ordering = left
                .unwrap_or(&Value::Null)
                .sort_cmp(right.unwrap_or(&Value::Null));
            if ascending {
                ordering
            } else {
                ordering.reverse()
            }
        })
    }

    fn ensure_mutable(&self) -> Result<(), Error> {
        if !self.mutable {
            return Err(err!(IllegalState, "Table is not mutable."));
        }
        Ok(())
    }

    fn check_row_index(&self, index: usize) -> Result<(), Error> {
        if index >= self.order.len() {
            return Err(err!(
                Bounds,
                "Row index {} out of range 0..{}",
                index,
                self.order.len()
            ));
        }
        Ok(())
    }

    /// Whether a non-null `value` is already present in unique column `col`.
    fn is_taken(&self, col: usize, value: &Value) -> bool {
        !value.is_null()
            && self.unique_index[col]
                .as_ref()
                .map_or(false, |set| set.contains(value))
    }

    /// Value used in place of NULL for `column`.
    fn resolve_default(&self, column: &Column) -> Result<Value, Error> {
        if let Some(default) = column.default_value() {
            return self.registry.coerce(column.data_type(), default.clone());
        }
        if !column.is_nullable() && self.registry.null_policy() == NullPolicy::TypeDefault {
            return Ok(column.data_type().zero_value());
        }
        Ok(Value::Null)
    }

    /// Normalizes a value for storage in `column`.
    fn coerce_cell(&self, column: &Column, value: Value) -> Result<Value, Error> {
        let value = if value.is_null() {
            self.resolve_default(column)?
        } else {
            self.registry.coerce(column.data_type(), value)?
        };
        if value.is_null() && !column.is_nullable() {
            return Err(err!(NotNull, "Column '{}' cannot be NULL", column.name()));
        }
        column.check_size(&value)?;
        Ok(value)
    }

    fn snapshot(&self, row: &Row) -> Record {
        Record::from_cells(
            self.columns
                .iter()
                .map(|c| c.name())
                .zip(row.values.iter().cloned()),
        )
    }
}

/// Lets generic in-place sorts reorder rows by identity. Only rows already in the
/// table can be written back.
///
/// `set` overwrites a slot of the row order and nothing else. While a row id sits
/// in no slot, the row is still stored and indexed (`contains_row` is true, its
/// unique values stay taken) but `get_row_index` returns `None` and `rows()` skips
/// it. Callers are expected to end with a permutation of the original order, as
/// `insertion_sort` does.
impl Sortable for RecordTable {
    type Item = RowId;

    fn len(&self) -> usize {
        self.order.len()
    }

    fn get(&self, index: usize) -> Result<RowId, Error> {
        self.check_row_index(index)?;
        Ok(self.order[index])
    }

    fn set(&mut self, item: RowId, index: usize) -> Result<(), Error> {
        self.ensure_mutable()?;
        self.check_row_index(index)?;
        if !self.rows.contains_key(&item) {
            return Err(err!(IllegalArgument, "Row {} does not belong to this table", item));
        }
        self.order[index] = item;
        Ok(())
    }
}

/// Read-only view of a row.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    table: &'a RecordTable,
    row: &'a Row,
}

impl<'a> RowView<'a> {
    pub fn id(&self) -> RowId {
        self.row.id
    }

    pub fn get(&self, column: &str) -> Result<&'a Value, Error> {
        self.table
            .get_column_index(column)
            .and_then(|i| self.row.values.get(i))
            .ok_or_else(|| err!(NoSuchField, "{}", column))
    }

    pub fn get_at(&self, index: usize) -> Result<&'a Value, Error> {
        self.row.values.get(index).ok_or_else(|| {
            err!(
                Bounds,
                "Column index {} out of range 0..{}",
                index,
                self.row.values.len()
            )
        })
    }

    pub fn values(&self) -> &'a [Value] {
        &self.row.values
    }

    pub fn size(&self) -> usize {
        self.row.values.len()
    }

    /// A table-independent copy of the row.
    pub fn to_record(&self) -> Record {
        self.table.snapshot(self.row)
    }
}

/// Table-mediated access to an attached column's mutable attributes.
///
/// Every setter fails with `IllegalState` while the table is not mutable, and the
/// flag changes are checked against the current rows before they commit.
pub struct ColumnHandle<'a> {
    table: &'a mut RecordTable,
    index: usize,
}

impl<'a> ColumnHandle<'a> {
    pub fn column(&self) -> &Column {
        &self.table.columns[self.index]
    }

    /// Making a column non-nullable fills existing NULLs with the resolved
    /// default. Fails without changes if some NULL cannot be filled.
    pub fn set_nullable(&mut self, nullable: bool) -> Result<(), Error> {
        self.table.ensure_mutable()?;
        let i = self.index;
        if nullable || !self.table.columns[i].nullable {
            self.table.columns[i].nullable = nullable;
            return Ok(());
        }

        let mut probe = self.table.columns[i].clone();
        probe.nullable = false;
        let nulls: Vec<RowId> = self
            .table
            .rows
            .values()
            .filter(|row| row.values[i].is_null())
            .map(|row| row.id)
            .collect();

        let fill = self.table.resolve_default(&probe)?;
        if !nulls.is_empty() {
            if fill.is_null() {
                return Err(err!(
                    IllegalState,
                    "Column '{}' has {} NULL values and no default",
                    probe.name(),
                    nulls.len()
                ));
            }
            probe.check_size(&fill)?;
            if probe.unique && (nulls.len() > 1 || self.table.is_taken(i, &fill)) {
                return Err(err!(
                    IllegalState,
                    "Filling NULLs of unique column '{}' with {} would create duplicates",
                    probe.name(),
                    fill
                ));
            }
        }

        for id in &nulls {
            if let Some(row) = self.table.rows.get_mut(id) {
                row.values[i] = fill.clone();
            }
        }
        if let (Some(set), false) = (self.table.unique_index[i].as_mut(), nulls.is_empty()) {
            set.insert(fill);
        }
        self.table.columns[i].nullable = false;
        debug!(column = probe.name(), filled = nulls.len(), "Column made not nullable");
        Ok(())
    }

    /// Making a column unique builds its index. Fails without changes if two rows
    /// already share a non-null value.
    pub fn set_unique(&mut self, unique: bool) -> Result<(), Error> {
        self.table.ensure_mutable()?;
        let i = self.index;
        if !unique {
            self.table.columns[i].unique = false;
            self.table.unique_index[i] = None;
            return Ok(());
        }
        if self.table.columns[i].unique {
            return Ok(());
        }

        let mut seen = HashSet::new();
        for row in self.table.rows.values() {
            let value = &row.values[i];
            if !value.is_null() && !seen.insert(value.clone()) {
                return Err(err!(
                    IllegalState,
                    "Column '{}' contains duplicate value {}",
                    self.table.columns[i].name(),
                    value
                ));
            }
        }
        self.table.unique_index[i] = Some(seen);
        self.table.columns[i].unique = true;
        debug!(column = self.table.columns[i].name(), "Column made unique");
        Ok(())
    }

    /// Sets or clears (`Value::Null`) the default, coerced to the column type.
    pub fn set_default_value(&mut self, default: impl Into<Value>) -> Result<(), Error> {
        self.table.ensure_mutable()?;
        let column = &self.table.columns[self.index];
        let default = self.table.registry.coerce(column.data_type(), default.into())?;
        column.check_size(&default)?;
        self.table.columns[self.index].default = if default.is_null() { None } else { Some(default) };
        Ok(())
    }

    pub fn set_display_name(&mut self, display_name: impl Into<String>) -> Result<(), Error> {
        self.table.ensure_mutable()?;
        self.table.columns[self.index].display_name = Some(display_name.into());
        Ok(())
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> Result<(), Error> {
        self.table.ensure_mutable()?;
        self.table.columns[self.index].description = Some(description.into());
        Ok(())
    }

    /// Changes the length bound. Fails if an existing value would no longer fit.
    pub fn set_size(&mut self, size: Option<usize>) -> Result<(), Error> {
        self.table.ensure_mutable()?;
        let i = self.index;
        let mut probe = self.table.columns[i].clone();
        probe.size = size;
        for row in self.table.rows.values() {
            probe
                .check_size(&row.values[i])
                .map_err(|e| err!(IllegalState, "Cannot change size: {}", e))?;
        }
        self.table.columns[i].size = size;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::value::DataType;

    fn people() -> RecordTable {
        RecordTable::with_columns(vec![
            Column::new("name", DataType::TEXT).unique().not_null(),
            Column::new("age", DataType::INT),
        ])
        .unwrap()
    }

    fn person(name: &str, age: impl Into<Value>) -> Record {
        Record::with_fields([("name", Value::from(name)), ("age", age.into())]).unwrap()
    }

    fn assert_arity(table: &RecordTable) {
        for row in table.rows() {
            assert_eq!(row.size(), table.column_count());
        }
    }

    #[test]
    fn test_insert_duplicate_unique_value() {
        let mut table = people();
        table.add_row(&person("Alice", 30)).unwrap();
        assert_eq!(table.row_count(), 1);

        let result = table.add_row(&person("Alice", 40));
        assert!(matches!(result, Err(Error::NonUniqueValue(_))));
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn test_insert_null_into_non_nullable() {
        let mut table = RecordTable::with_columns(vec![
            Column::new("name", DataType::TEXT).unique().not_null(),
            Column::new("age", DataType::INT).not_null(),
        ])
        .unwrap();
        let result = table.add_row(&person("Bob", Value::Null));
        assert!(matches!(result, Err(Error::NotNull(_))));
        assert!(table.is_empty());

        table
            .column_mut(1)
            .unwrap()
            .set_default_value(18)
            .unwrap();
        table.add_row(&person("Bob", Value::Null)).unwrap();
        assert_eq!(table.get_value(0, "age").unwrap(), &Value::Int(18));
    }

    #[test]
    fn test_insert_null_into_nullable() {
        let mut table = people();
        table.add_row(&person("Bob", Value::Null)).unwrap();
        assert_eq!(table.get_value(0, "age").unwrap(), &Value::Null);
    }

    #[test]
    fn test_type_default_null_policy() {
        let mut registry = CoercionRegistry::with_builtins();
        registry.set_null_policy(NullPolicy::TypeDefault);
        let mut table = RecordTable::with_registry(Arc::new(registry));
        table
            .add_column(Column::new("age", DataType::SMALLINT).not_null())
            .unwrap();
        let record = Record::with_fields([("age", Value::Null)]).unwrap();
        table.add_row(&record).unwrap();
        assert_eq!(table.get_value(0, "age").unwrap(), &Value::SmallInt(0));
    }

    #[test]
    fn test_insert_coerces_values() {
        let mut table = people();
        table.add_row(&person("Carol", "41")).unwrap();
        assert_eq!(table.get_value(0, "age").unwrap(), &Value::Int(41));

        let result = table.add_row(&person("Dave", "forty"));
        assert!(matches!(result, Err(Error::Coercion(_))));
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn test_incompatible_record() {
        let mut table = people();
        let short = Record::with_fields([("name", Value::from("Eve"))]).unwrap();
        assert!(matches!(table.add_row(&short), Err(Error::Schema(_))));

        let wrong =
            Record::with_fields([("name", Value::from("Eve")), ("email", Value::Null)]).unwrap();
        assert!(matches!(table.add_row(&wrong), Err(Error::Schema(_))));
        assert!(table.is_empty());
    }

    #[test]
    fn test_insert_row_bounds() {
        let mut table = people();
        assert!(matches!(
            table.insert_row(&person("Alice", 1), 1),
            Err(Error::Bounds(_))
        ));
        table.insert_row(&person("Bob", 2), 0).unwrap();
        table.insert_row(&person("Alice", 1), 0).unwrap();
        assert_eq!(table.get_value(0, "name").unwrap(), &Value::from("Alice"));
        assert_eq!(table.get_value(1, "name").unwrap(), &Value::from("Bob"));
    }

    #[test]
    fn test_failed_insert_leaves_no_index_entries() {
        let mut table = RecordTable::with_columns(vec![
            Column::new("name", DataType::TEXT).unique(),
            Column::new("code", DataType::TEXT).unique(),
        ])
        .unwrap();
        table
            .add_row(&Record::with_fields([("name", Value::from("a")), ("code", Value::from("x"))]).unwrap())
            .unwrap();

        // "b" is new but "x" collides, so "b" must not be indexed.
        let clash =
            Record::with_fields([("name", Value::from("b")), ("code", Value::from("x"))]).unwrap();
        assert!(table.add_row(&clash).is_err());

        let ok = Record::with_fields([("name", Value::from("b")), ("code", Value::from("y"))]).unwrap();
        table.add_row(&ok).unwrap();
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_insert_column_fills_rows() {
        let mut table = people();
        table.add_row(&person("Alice", 30)).unwrap();
        table.add_row(&person("Bob", 25)).unwrap();

        table
            .insert_column(Column::new("active", DataType::BOOLEAN).with_default(true), 1)
            .unwrap();
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.get_column(1).unwrap().name(), "active");
        for row in table.rows() {
            assert_eq!(row.get("active").unwrap(), &Value::Boolean(true));
            assert_eq!(row.get_at(1).unwrap(), &Value::Boolean(true));
        }
        assert_arity(&table);
    }

    #[test]
    fn test_insert_column_rejections() {
        let mut table = people();
        table.add_row(&person("Alice", 30)).unwrap();
        table.add_row(&person("Bob", 25)).unwrap();

        assert!(matches!(
            table.add_column(Column::new("name", DataType::TEXT)),
            Err(Error::Schema(_))
        ));
        assert!(matches!(
            table.add_column(Column::new("", DataType::TEXT)),
            Err(Error::IllegalArgument(_))
        ));
        assert!(matches!(
            table.insert_column(Column::new("x", DataType::TEXT), 5),
            Err(Error::Bounds(_))
        ));
        assert!(matches!(
            table.add_column(Column::new("email", DataType::TEXT).not_null()),
            Err(Error::IllegalState(_))
        ));
        assert!(matches!(
            table.add_column(Column::new("email", DataType::TEXT).unique().with_default("n/a")),
            Err(Error::IllegalState(_))
        ));
        assert_eq!(table.column_count(), 2);
        assert_arity(&table);

        // A unique nullable column without default is fine.
        table
            .add_column(Column::new("email", DataType::TEXT).unique())
            .unwrap();
        assert_arity(&table);
    }

    #[test]
    fn test_set_value() {
        let mut table = people();
        table.add_row(&person("Alice", 30)).unwrap();
        table.add_row(&person("Bob", 25)).unwrap();

        let previous = table.set_value(1, "age", "26").unwrap();
        assert_eq!(previous, Value::Int(25));
        assert_eq!(table.get_value(1, "age").unwrap(), &Value::Int(26));

        assert!(matches!(
            table.set_value(1, "name", "Alice"),
            Err(Error::NonUniqueValue(_))
        ));
        assert!(matches!(
            table.set_value(1, "name", Value::Null),
            Err(Error::NotNull(_))
        ));
        assert!(matches!(
            table.set_value(1, "email", "x"),
            Err(Error::NoSuchField(_))
        ));
        assert!(matches!(table.set_value(2, "age", 1), Err(Error::Bounds(_))));

        // Renaming frees the old value in the index.
        table.set_value(0, "name", "Alicia").unwrap();
        table.set_value(1, "name", "Alice").unwrap();
        table.set_value(0, "name", "Alicia").unwrap();
    }

    #[test]
    fn test_set_unique_with_duplicates() {
        let mut table = people();
        table.add_row(&person("Alice", 30)).unwrap();
        table.add_row(&person("Bob", 30)).unwrap();

        let result = table.column_mut(1).unwrap().set_unique(true);
        assert!(matches!(result, Err(Error::IllegalState(_))));
        assert!(!table.get_column(1).unwrap().is_unique());

        table.set_value(1, "age", 31).unwrap();
        table.column_mut(1).unwrap().set_unique(true).unwrap();
        assert!(table.get_column(1).unwrap().is_unique());
        assert!(matches!(
            table.set_value(1, "age", 30),
            Err(Error::NonUniqueValue(_))
        ));

        table.column_mut(1).unwrap().set_unique(false).unwrap();
        table.set_value(1, "age", 30).unwrap();
    }

    #[test]
    fn test_set_nullable_fills_or_fails() {
        let mut table = people();
        table.add_row(&person("Alice", Value::Null)).unwrap();
        table.add_row(&person("Bob", 25)).unwrap();

        let result = table.column_mut(1).unwrap().set_nullable(false);
        assert!(matches!(result, Err(Error::IllegalState(_))));
        assert!(table.get_column(1).unwrap().is_nullable());
        assert_eq!(table.get_value(0, "age").unwrap(), &Value::Null);

        let mut handle = table.column_mut(1).unwrap();
        handle.set_default_value(0).unwrap();
        handle.set_nullable(false).unwrap();
        assert!(!table.get_column(1).unwrap().is_nullable());
        assert_eq!(table.get_value(0, "age").unwrap(), &Value::Int(0));
    }

    #[test]
    fn test_set_nullable_fills_type_zero_under_type_default_policy() {
        let mut registry = CoercionRegistry::with_builtins();
        registry.set_null_policy(NullPolicy::TypeDefault);
        let mut table = RecordTable::with_registry(Arc::new(registry));
        table.add_column(Column::new("name", DataType::TEXT)).unwrap();
        table.add_column(Column::new("age", DataType::INT)).unwrap();
        table.add_row(&person("Alice", Value::Null)).unwrap();
        table.add_row(&person("Bob", 25)).unwrap();
        assert_eq!(table.get_value(0, "age").unwrap(), &Value::Null);

        table.column_mut(1).unwrap().set_nullable(false).unwrap();
        assert_eq!(table.get_value(0, "age").unwrap(), &Value::Int(0));
        assert_eq!(table.get_value(1, "age").unwrap(), &Value::Int(25));

        table.set_value(1, "age", Value::Null).unwrap();
        assert_eq!(table.get_value(1, "age").unwrap(), &Value::Int(0));
    }

    #[test]
    fn test_set_nullable_on_unique_column() {
        let mut table = RecordTable::with_columns(vec![
            Column::new("name", DataType::TEXT),
            Column::new("tag", DataType::TEXT).unique().with_default("t"),
        ])
        .unwrap();
        let row = |n: &str| {
            Record::with_fields([("name", Value::from(n)), ("tag", Value::Null)]).unwrap()
        };
        table.add_row(&row("a")).unwrap();
        // NULL input resolves to the default "t", the next one would clash.
        assert!(matches!(table.add_row(&row("b")), Err(Error::NonUniqueValue(_))));

        table.column_mut(1).unwrap().set_default_value(Value::Null).unwrap();
        table.add_row(&row("b")).unwrap();
        table.add_row(&row("c")).unwrap();
        table.column_mut(1).unwrap().set_default_value("u").unwrap();
        assert!(matches!(
            table.column_mut(1).unwrap().set_nullable(false),
            Err(Error::IllegalState(_))
        ));
        assert!(table.get_column(1).unwrap().is_nullable());
    }

    #[test]
    fn test_column_handle_attributes() {
        let mut table = people();
        table.add_row(&person("Alexander", 30)).unwrap();
        {
            let mut handle = table.column_mut(0).unwrap();
            handle.set_display_name("Full name").unwrap();
            handle.set_description("Person name").unwrap();
            assert!(matches!(handle.set_size(Some(4)), Err(Error::IllegalState(_))));
            handle.set_size(Some(16)).unwrap();
            assert_eq!(handle.column().display_name(), "Full name");
        }
        assert_eq!(table.get_column(0).unwrap().size(), Some(16));
        assert!(matches!(
            table.set_value(0, "name", "A name that is too long"),
            Err(Error::Constraint(_))
        ));
        assert!(matches!(table.column_mut(2), Err(Error::Bounds(_))));
    }

    #[test]
    fn test_immutable_table() {
        let mut table = people();
        table.add_row(&person("Alice", 30)).unwrap();
        table.set_mutable(false);

        assert!(matches!(
            table.add_row(&person("Bob", 1)),
            Err(Error::IllegalState(_))
        ));
        assert!(matches!(
            table.set_value(0, "age", 31),
            Err(Error::IllegalState(_))
        ));
        assert!(matches!(
            table.add_column(Column::new("x", DataType::INT)),
            Err(Error::IllegalState(_))
        ));
        assert!(matches!(table.remove_row(0), Err(Error::IllegalState(_))));
        assert!(matches!(
            table.column_mut(0).unwrap().set_description("d"),
            Err(Error::IllegalState(_))
        ));
        assert!(matches!(
            table.column_mut(1).unwrap().set_unique(true),
            Err(Error::IllegalState(_))
        ));
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn test_remove_row_releases_unique_values() {
        let mut table = people();
        table.add_row(&person("Alice", 30)).unwrap();
        table.add_row(&person("Bob", 25)).unwrap();

        let removed = table.remove_row(0).unwrap();
        assert_eq!(removed.get_value("name").unwrap(), &Value::from("Alice"));
        assert_eq!(table.row_count(), 1);
        table.add_row(&person("Alice", 31)).unwrap();
        assert!(matches!(table.remove_row(5), Err(Error::Bounds(_))));
    }

    #[test]
    fn test_remove_column() {
        let mut table = people();
        table.add_row(&person("Alice", 30)).unwrap();
        let removed = table.remove_column(0).unwrap();
        assert_eq!(removed.name(), "name");
        assert_eq!(table.column_count(), 1);
        assert_arity(&table);
        assert!(matches!(table.remove_column(1), Err(Error::Bounds(_))));
    }

    #[test]
    fn test_lookups() {
        let mut table = people();
        let id = table.add_row(&person("Alice", 30)).unwrap();
        assert!(table.contains_row(id));
        assert_eq!(table.get_row_index(id), Some(0));
        assert_eq!(table.get_row(0).unwrap().id(), id);
        assert!(matches!(table.get_row(1), Err(Error::Bounds(_))));
        assert!(table.contains_column("age"));
        assert_eq!(table.get_column_index("age"), Some(1));
        assert_eq!(table.get_column_index("email"), None);
        assert!(matches!(table.get_column(2), Err(Error::Bounds(_))));

        table.remove_row(0).unwrap();
        assert!(!table.contains_row(id));
        assert_eq!(table.get_row_index(id), None);
    }

    #[test]
    fn test_copy_is_independent_snapshot() {
        let mut table = people();
        table.add_row(&person("Alice", 30)).unwrap();
        table.add_row(&person("Bob", 25)).unwrap();

        let copy = table.copy().unwrap();
        assert_eq!(copy.column_count(), table.column_count());
        assert_eq!(copy.row_count(), 2);
        for (a, b) in copy.columns().zip(table.columns()) {
            assert_eq!(a.name(), b.name());
            assert_eq!(a.data_type(), b.data_type());
        }
        for (a, b) in copy.rows().zip(table.rows()) {
            assert_eq!(a.values(), b.values());
        }

        table.set_value(0, "age", 99).unwrap();
        table.remove_row(1).unwrap();
        table.remove_column(0).unwrap();
        assert_eq!(copy.row_count(), 2);
        assert_eq!(copy.column_count(), 2);
        assert_eq!(copy.get_value(0, "age").unwrap(), &Value::Int(30));
    }

    #[test]
    fn test_copy_keeps_null_cells_after_default_is_set() {
        let mut table = people();
        table.add_column(Column::new("tag", DataType::TEXT).unique()).unwrap();
        for (name, age) in [("Alice", Value::Null), ("Bob", Value::from(25))] {
            let mut record = person(name, age);
            record.add_field("tag", Value::Null).unwrap();
            table.add_row(&record).unwrap();
        }
        table.column_mut(2).unwrap().set_default_value("u").unwrap();

        let mut copy = table.copy().unwrap();
        assert_eq!(copy.get_value(0, "tag").unwrap(), &Value::Null);
        assert_eq!(copy.get_value(1, "tag").unwrap(), &Value::Null);
        assert_eq!(copy.get_value(0, "age").unwrap(), &Value::Null);
        for (a, b) in copy.rows().zip(table.rows()) {
            assert_eq!(a.values(), b.values());
            assert_ne!(a.id(), b.id());
        }

        // the copy's index is live: a new NULL takes the default, a repeat fails
        let mut carol = person("Carol", 1);
        carol.add_field("tag", Value::Null).unwrap();
        copy.add_row(&carol).unwrap();
        assert_eq!(copy.get_value(2, "tag").unwrap(), &Value::from("u"));
        let mut dave = person("Dave", 2);
        dave.add_field("tag", Value::from("u")).unwrap();
        assert!(matches!(copy.add_row(&dave), Err(Error::NonUniqueValue(_))));
        let mut alice = person("Alice", 3);
        alice.add_field("tag", Value::from("v")).unwrap();
        assert!(matches!(copy.add_row(&alice), Err(Error::NonUniqueValue(_))));
    }

    #[test]
    fn test_sortable_set_overwrites_slot_only() {
        let mut table = people();
        let alice = table.add_row(&person("Alice", 30)).unwrap();
        let bob = table.add_row(&person("Bob", 25)).unwrap();

        Sortable::set(&mut table, alice, 1).unwrap();
        assert!(table.contains_row(bob));
        assert_eq!(table.get_row_index(bob), None);
        assert_eq!(table.get_row_index(alice), Some(0));
        assert!(matches!(
            table.add_row(&person("Bob", 1)),
            Err(Error::NonUniqueValue(_))
        ));

        Sortable::set(&mut table, bob, 1).unwrap();
        assert_eq!(table.get_row_index(bob), Some(1));
        assert_eq!(table.get_value(1, "name").unwrap(), &Value::from("Bob"));
    }

    #[test]
    fn test_sortable_set_rejects_foreign_row() {
        let mut table = people();
        let alice = table.add_row(&person("Alice", 30)).unwrap();
        let mut other = people();
        let foreign = other.add_row(&person("Zed", 1)).unwrap();

        let result = Sortable::set(&mut table, foreign, 0);
        assert!(matches!(result, Err(Error::IllegalArgument(_))));
        assert_eq!(Sortable::get(&table, 0).unwrap(), alice);
        assert!(matches!(
            Sortable::set(&mut table, alice, 1),
            Err(Error::Bounds(_))
        ));
    }

    #[test]
    fn test_sort_by_column() {
        let mut table = people();
        table.add_row(&person("Carol", 41)).unwrap();
        table.add_row(&person("Alice", Value::Null)).unwrap();
        table.add_row(&person("Bob", 25)).unwrap();

        table.sort_by_column("age", true).unwrap();
        let names: Vec<String> = table
            .rows()
            .map(|r| r.get("name").unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["Alice", "Bob", "Carol"]);

        table.sort_by_column("name", false).unwrap();
        assert_eq!(table.get_value(0, "name").unwrap(), &Value::from("Carol"));
        assert_eq!(table.row_count(), 3);
        assert!(matches!(
            table.sort_by_column("email", true),
            Err(Error::NoSuchField(_))
        ));

        // Unique index survives the reorder.
        assert!(matches!(
            table.add_row(&person("Bob", 1)),
            Err(Error::NonUniqueValue(_))
        ));
    }
}
