use super::value::{DataType, Value};
use crate::errors::Error;
use std::fmt;

/// Describes one field across all rows of a table.
///
/// `name` and `data_type` are fixed at construction. The constraint attributes are
/// set freely on a detached column; once the column belongs to a table they can only
/// be changed through [`super::table::ColumnHandle`], which consults the table.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data_type: DataType,
    pub(crate) nullable: bool,
    pub(crate) unique: bool,
    pub(crate) default: Option<Value>,
    pub(crate) display_name: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) size: Option<usize>,
}

impl Column {
    /// A nullable, non-unique column without a default.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Column {
            name: name.into(),
            data_type,
            nullable: true,
            unique: false,
            default: None,
            display_name: None,
            description: None,
            size: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        let default = default.into();
        self.default = if default.is_null() { None } else { Some(default) };
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Falls back to the column name.
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn size(&self) -> Option<usize> {
        self.size
    }

    /// Longest text this column accepts, combining `size` and a `VARCHAR` bound.
    pub fn max_length(&self) -> Option<usize> {
        match (self.size, self.data_type.max_length()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Rejects text values longer than [`Column::max_length`].
    pub fn check_size(&self, value: &Value) -> Result<(), Error> {
        if let (Value::Text(s), Some(max)) = (value, self.max_length()) {
            let len = s.chars().count();
            if len > max {
                return Err(err!(
                    Constraint,
                    "Value for column '{}' exceeds max length: {} > {}",
                    self.name,
                    len,
                    max
                ));
            }
        }
        Ok(())
    }

    pub(crate) fn validate_name(&self) -> Result<(), Error> {
        if self.name.trim().is_empty() {
            return Err(err!(IllegalArgument, "Column name cannot be empty."));
        }
        Ok(())
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.data_type)?;
        if !self.nullable {
            write!(f, " NOT NULL")?;
        }
        if self.unique {
            write!(f, " UNIQUE")?;
        }
        if let Some(default) = &self.default {
            write!(f, " DEFAULT {}", default)?;
        }
        Ok(())
    }
}
