use super::tokenizer;
use super::validator;
use super::{ColumnChange, Command};
use crate::errors;
use crate::storage::{Column, DataType, Value};
use std::collections::VecDeque;

/// Parses one command line.
///
/// # Arguments
/// * `command` - The raw command, with or without a trailing `;`.
///
/// # Returns
/// A `Result` containing the parsed `Command` or an `errors::Error`.
pub fn parse(command: &str) -> Result<Command, errors::Error> {
    let without_suffix = command.trim().strip_suffix(';').unwrap_or(command.trim());
    let mut tokens = tokenizer::tokenize(without_suffix)?;
    let first = pop_token(&mut tokens, "Expected at least one element.")?.to_uppercase();

    let parsed = match first.as_str() {
        "ADD" => parse_add_column(&mut tokens)?,
        "DROP" => {
            expect_token(&mut tokens, "COLUMN", "'DROP' must be followed by 'COLUMN'.")?;
            let name = pop_token(&mut tokens, "'DROP COLUMN' must be followed by a name.")?;
            Command::DropColumn(validator::validate_column_name(&name)?)
        }
        "ALTER" => parse_alter_column(&mut tokens)?,
        "INSERT" => parse_insert(&mut tokens)?,
        "UPDATE" => parse_update(&mut tokens)?,
        "DELETE" => {
            let row = pop_token(&mut tokens, "'DELETE' must be followed by a row index.")?;
            Command::Delete(validator::validate_index(&row)?)
        }
        "SORT" => parse_sort(&mut tokens)?,
        "SELECT" => Command::Select,
        "DESCRIBE" => Command::Describe,
        _ => {
            return Err(errors::Error::Syntax(format!(
                "Unrecognized command: {}.",
                first
            )));
        }
    };

    if let Some(extra) = tokens.front() {
        return Err(errors::Error::Syntax(format!(
            "Unexpected token: {}.",
            extra
        )));
    }
    Ok(parsed)
}

/// Parses `ADD COLUMN <name> <TYPE> [NOT NULL] [UNIQUE] [DEFAULT <v>] [AT <i>]`.
fn parse_add_column(tokens: &mut VecDeque<String>) -> Result<Command, errors::Error> {
    expect_token(tokens, "COLUMN", "'ADD' must be followed by 'COLUMN'.")?;
    let name = pop_token(tokens, "'ADD COLUMN' must be followed by a name.")?;
    let name = validator::validate_column_name(&name)?;
    let type_str = pop_token(tokens, "Column name must be followed by a type.")?;
    validator::validate_column_type(&type_str)?;
    let data_type: DataType = type_str.parse()?;

    let mut column = Column::new(name, data_type);
    let mut at = None;
    while let Some(token) = tokens.pop_front() {
        match token.to_uppercase().as_str() {
            "NOT" => {
                expect_token(tokens, "NULL", "'NOT' must be followed by 'NULL'.")?;
                column = column.not_null();
            }
            "UNIQUE" => column = column.unique(),
            "DEFAULT" => {
                let value = pop_token(tokens, "'DEFAULT' must be followed by a value.")?;
                column = column.with_default(validator::validate_value(&value)?);
            }
            "AT" => {
                let index = pop_token(tokens, "'AT' must be followed by a column index.")?;
                at = Some(validator::validate_index(&index)?);
            }
            _ => {
                return Err(errors::Error::Syntax(format!(
                    "Unknown column option: {}.",
                    token
                )));
            }
        }
    }
    Ok(Command::AddColumn { column, at })
}

/// Parses `ALTER COLUMN <name> SET|DROP NOT NULL|UNIQUE` and `ALTER COLUMN <name> DEFAULT <v>`.
fn parse_alter_column(tokens: &mut VecDeque<String>) -> Result<Command, errors::Error> {
    expect_token(tokens, "COLUMN", "'ALTER' must be followed by 'COLUMN'.")?;
    let name = pop_token(tokens, "'ALTER COLUMN' must be followed by a name.")?;
    let name = validator::validate_column_name(&name)?;
    let action = pop_token(tokens, "Expected 'SET', 'DROP' or 'DEFAULT'.")?.to_uppercase();

    let change = match action.as_str() {
        "DEFAULT" => {
            let value = pop_token(tokens, "'DEFAULT' must be followed by a value.")?;
            ColumnChange::Default(validator::validate_value(&value)?)
        }
        "SET" | "DROP" => {
            let set = action == "SET";
            let constraint = pop_token(tokens, "Expected 'NOT NULL' or 'UNIQUE'.")?.to_uppercase();
            match constraint.as_str() {
                "NOT" => {
                    expect_token(tokens, "NULL", "'NOT' must be followed by 'NULL'.")?;
                    ColumnChange::Nullable(!set)
                }
                "UNIQUE" => ColumnChange::Unique(set),
                _ => {
                    return Err(errors::Error::Syntax(format!(
                        "Unknown constraint: {}.",
                        constraint
                    )));
                }
            }
        }
        _ => {
            return Err(errors::Error::Syntax(format!(
                "Unknown column change: {}.",
                action
            )));
        }
    };
    Ok(Command::AlterColumn { name, change })
}

/// Parses `INSERT [AT <i>] <name>=<v>[, <name>=<v>]*`.
fn parse_insert(tokens: &mut VecDeque<String>) -> Result<Command, errors::Error> {
    let mut at = None;
    if tokens
        .front()
        .map_or(false, |t| t.eq_ignore_ascii_case("AT"))
    {
        tokens.pop_front();
        let index = pop_token(tokens, "'AT' must be followed by a row index.")?;
        at = Some(validator::validate_index(&index)?);
    }

    let mut fields = Vec::new();
    loop {
        fields.push(parse_assignment(tokens)?);
        match tokens.front() {
            Some(t) if t == "," => {
                tokens.pop_front();
            }
            _ => break,
        }
    }
    Ok(Command::Insert { at, fields })
}

/// Parses `UPDATE <row> SET <name>=<v>`.
fn parse_update(tokens: &mut VecDeque<String>) -> Result<Command, errors::Error> {
    let row = pop_token(tokens, "'UPDATE' must be followed by a row index.")?;
    let row = validator::validate_index(&row)?;
    expect_token(tokens, "SET", "'UPDATE row' must be followed by 'SET'.")?;
    let (column, value) = parse_assignment(tokens)?;
    Ok(Command::Update { row, column, value })
}

/// Parses `SORT BY <name> [ASC|DESC]`.
fn parse_sort(tokens: &mut VecDeque<String>) -> Result<Command, errors::Error> {
    expect_token(tokens, "BY", "'SORT' must be followed by 'BY'.")?;
    let column = pop_token(tokens, "'SORT BY' must be followed by a column name.")?;
    let column = validator::validate_column_name(&column)?;
    let ascending = match tokens.front().map(|t| t.to_uppercase()) {
        Some(t) if t == "ASC" => {
            tokens.pop_front();
            true
        }
        Some(t) if t == "DESC" => {
            tokens.pop_front();
            false
        }
        _ => true,
    };
    Ok(Command::Sort { column, ascending })
}

fn parse_assignment(tokens: &mut VecDeque<String>) -> Result<(String, Value), errors::Error> {
    let column = pop_token(tokens, "Missing column in assignment.")?;
    let column = validator::validate_column_name(&column)?;
    expect_token(tokens, "=", "Expected '=' after column in assignment.")?;
    let value = pop_token(tokens, "Missing value after '=' in assignment.")?;
    Ok((column, validator::validate_value(&value)?))
}

/// Helper function to expect and consume a specific token.
///
/// # Arguments
/// * `tokens` - The token queue.
/// * `expected` - The token to expect (case-insensitive).
/// * `error_msg` - The error message if the token is not found.
fn expect_token(
    tokens: &mut VecDeque<String>,
    expected: &str,
    error_msg: &str,
) -> Result<(), errors::Error> {
    match tokens.pop_front() {
        Some(token) if token.to_uppercase() == expected.to_uppercase() => Ok(()),
        _ => Err(errors::Error::Syntax(error_msg.to_owned())),
    }
}

/// Helper function to pop a token or return an error.
fn pop_token(tokens: &mut VecDeque<String>, error_msg: &str) -> Result<String, errors::Error> {
    tokens
        .pop_front()
        .ok_or_else(|| errors::Error::Syntax(error_msg.to_owned()))
}
