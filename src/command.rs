mod parser;
mod tokenizer;
mod validator;

use crate::errors;
use crate::storage::{Column, Record, RecordTable, Value};
use std::fs;
use std::path::Path;
use tracing::{debug, info, trace};

pub use parser::parse;

/// A parsed table command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddColumn { column: Column, at: Option<usize> },
    DropColumn(String),
    AlterColumn { name: String, change: ColumnChange },
    Insert { at: Option<usize>, fields: Vec<(String, Value)> },
    Update { row: usize, column: String, value: Value },
    Delete(usize),
    Sort { column: String, ascending: bool },
    Select,
    Describe,
}

/// A change to one column's constraints.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnChange {
    Nullable(bool),
    Unique(bool),
    Default(Value),
}

#[derive(Debug, PartialEq)]
pub enum CommandResult {
    /// OK response from schema and row changes
    Ok { affected_rows: u64 },
    /// Result set from SELECT and DESCRIBE
    ResultSet {
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    },
}

/// Execute a command against a table.
pub fn execute(table: &mut RecordTable, c: Command) -> Result<CommandResult, errors::Error> {
    trace!(command = ?c, "Executing command");
    match c {
        Command::AddColumn { column, at } => {
            let affected_rows = table.row_count() as u64;
            match at {
                Some(index) => table.insert_column(column, index)?,
                None => table.add_column(column)?,
            }
            Ok(CommandResult::Ok { affected_rows })
        }
        Command::DropColumn(name) => {
            let affected_rows = table.row_count() as u64;
            execute_drop_column(table, &name)?;
            Ok(CommandResult::Ok { affected_rows })
        }
        Command::AlterColumn { name, change } => {
            let index = column_index(table, &name)?;
            let mut handle = table.column_mut(index)?;
            match change {
                ColumnChange::Nullable(nullable) => handle.set_nullable(nullable)?,
                ColumnChange::Unique(unique) => handle.set_unique(unique)?,
                ColumnChange::Default(value) => handle.set_default_value(value)?,
            }
            Ok(CommandResult::Ok { affected_rows: 0 })
        }
        Command::Insert { at, fields } => {
            let record = build_record(table, fields)?;
            let id = match at {
                Some(index) => table.insert_row(&record, index)?,
                None => table.add_row(&record)?,
            };
            debug!(row = %id, "Row inserted");
            Ok(CommandResult::Ok { affected_rows: 1 })
        }
        Command::Update { row, column, value } => {
            table.set_value(row, &column, value)?;
            Ok(CommandResult::Ok { affected_rows: 1 })
        }
        Command::Delete(row) => {
            table.remove_row(row)?;
            Ok(CommandResult::Ok { affected_rows: 1 })
        }
        Command::Sort { column, ascending } => {
            table.sort_by_column(&column, ascending)?;
            Ok(CommandResult::Ok {
                affected_rows: table.row_count() as u64,
            })
        }
        Command::Select => Ok(execute_select(table)),
        Command::Describe => Ok(execute_describe(table)),
    }
}

/// Parses and executes each line of a script file. Blank lines and lines
/// starting with `--` are skipped. Stops at the first failing command.
pub fn run_script(
    table: &mut RecordTable,
    path: &Path,
) -> Result<Vec<CommandResult>, errors::Error> {
    let script = fs::read_to_string(path)?;
    info!(path = %path.display(), "Running script");

    let mut results = Vec::new();
    for (line_num, line) in script.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("--") {
            continue;
        }
        let result = parse(line)
            .and_then(|c| execute(table, c))
            .map_err(|e| err!(Other, "Line {}: {}", line_num + 1, e))?;
        results.push(result);
    }
    Ok(results)
}

fn column_index(table: &RecordTable, name: &str) -> Result<usize, errors::Error> {
    table
        .get_column_index(name)
        .ok_or_else(|| err!(NoSuchField, "{}", name))
}

/// Drops a column through the column cursor so that every row loses the field
/// before the schema does.
fn execute_drop_column(table: &mut RecordTable, name: &str) -> Result<(), errors::Error> {
    let mut cursor = table.column_cursor();
    while !cursor.end_of_table {
        if cursor.column()?.name() == name {
            cursor.remove_current()?;
            return Ok(());
        }
        cursor.advance();
    }
    Err(err!(NoSuchField, "{}", name))
}

/// Builds a full-width record for the table. Columns left out are NULL, so the
/// column default applies.
fn build_record(
    table: &RecordTable,
    fields: Vec<(String, Value)>,
) -> Result<Record, errors::Error> {
    if let Some((name, _)) = fields.iter().find(|(name, _)| !table.contains_column(name)) {
        return Err(err!(NoSuchField, "{}", name));
    }

    let mut record = Record::new();
    for column in table.columns() {
        let value = fields
            .iter()
            .rev()
            .find(|(name, _)| name == column.name())
            .map(|(_, value)| value.clone())
            .unwrap_or(Value::Null);
        record.add_field(column.name(), value)?;
    }
    Ok(record)
}

fn execute_select(table: &RecordTable) -> CommandResult {
    let columns = table
        .columns()
        .map(|c| c.display_name().to_string())
        .collect();
    let rows = table
        .rows()
        .map(|r| r.values().iter().map(|v| v.to_string()).collect())
        .collect();
    CommandResult::ResultSet { columns, rows }
}

fn execute_describe(table: &RecordTable) -> CommandResult {
    let columns = ["Column", "Type", "Nullable", "Unique", "Default"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    let yes_no = |b: bool| (if b { "YES" } else { "NO" }).to_string();
    let rows = table
        .columns()
        .map(|c| {
            vec![
                c.name().to_string(),
                c.data_type().to_string(),
                yes_no(c.is_nullable()),
                yes_no(c.is_unique()),
                c.default_value().map(|v| v.to_string()).unwrap_or_default(),
            ]
        })
        .collect();
    CommandResult::ResultSet { columns, rows }
}
