use crate::errors;
use crate::storage::Value;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref COLUMN_REGEX: Regex = Regex::new(r#"^[A-Za-z_][A-Za-z0-9_]*$"#).unwrap();
    static ref TYPE_REGEX: Regex = Regex::new(r#"(?i)^(TINYINT|SMALLINT|INT|INTEGER|BIGINT|FLOAT|DOUBLE|VARCHAR\(\s*\d+\s*\)|TEXT|STRING|BOOLEAN|BOOL|ANY)$"#).unwrap();
    static ref INDEX_REGEX: Regex = Regex::new(r#"^\d+$"#).unwrap();
}

/// Validates a column name against the regex.
///
/// # Arguments
/// * `name` - The column name to validate.
///
/// # Returns
/// A `Result` containing the validated name or an `errors::Error`.
pub fn validate_column_name(name: &str) -> Result<String, errors::Error> {
    if name.is_empty() {
        return Err(errors::Error::Syntax(
            "Column name cannot be empty.".to_owned(),
        ));
    }
    if COLUMN_REGEX.is_match(name) {
        Ok(name.to_string())
    } else {
        Err(errors::Error::Syntax(format!(
            "Column name ({}) must match regex {}.",
            name,
            COLUMN_REGEX.as_str()
        )))
    }
}

/// Validates a column type against the regex.
///
/// # Arguments
/// * `type_str` - The column type to validate.
///
/// # Returns
/// An`errors::Error` if type is invalid.
pub fn validate_column_type(type_str: &str) -> Result<(), errors::Error> {
    if !TYPE_REGEX.is_match(type_str) {
        return Err(errors::Error::Syntax(format!(
            "Invalid column type: {}.",
            type_str
        )));
    }
    Ok(())
}

/// Parses a non-negative row or column position.
pub fn validate_index(token: &str) -> Result<usize, errors::Error> {
    if !INDEX_REGEX.is_match(token) {
        return Err(errors::Error::Syntax(format!(
            "Expected a non-negative index, got '{}'.",
            token
        )));
    }
    Ok(token.parse()?)
}

/// Turns a value token into a `Value`. `NULL` is the null value, quoted text is
/// unquoted, anything else is kept as text for the column converter to parse.
///
/// # Arguments
/// * `value` - The value token.
///
/// # Returns
/// A `Result` containing the value or an `errors::Error`.
pub fn validate_value(value: &str) -> Result<Value, errors::Error> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(errors::Error::Syntax("Value cannot be empty.".to_owned()));
    }
    if trimmed.eq_ignore_ascii_case("NULL") {
        return Ok(Value::Null);
    }
    if trimmed.len() >= 2 && trimmed.starts_with('\'') && trimmed.ends_with('\'') {
        return Ok(Value::Text(trimmed[1..trimmed.len() - 1].to_string()));
    }
    if trimmed.contains('\'') {
        return Err(errors::Error::Syntax(format!(
            "Malformed text literal: {}.",
            trimmed
        )));
    }
    Ok(Value::Text(trimmed.to_string()))
}
