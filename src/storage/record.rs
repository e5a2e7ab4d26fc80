use super::value::Value;
use crate::errors::Error;
use std::collections::HashMap;

/// An ordered mapping from field name to value, independent of any table.
///
/// The field order and the value map always hold the same set of names.
#[derive(Debug, Clone)]
pub struct Record {
    fields: Vec<String>,
    values: HashMap<String, Value>,
    mutable: bool,
    modifications: u64,
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields && self.values == other.values
    }
}

impl Record {
    pub fn new() -> Self {
        Record {
            fields: Vec::new(),
            values: HashMap::new(),
            mutable: true,
            modifications: 0,
        }
    }

    /// Builds a record from `(name, value)` pairs, in order.
    ///
    /// # Examples
    /// ```
    /// use rectable::storage::{Record, Value};
    /// let record = Record::with_fields([("name", Value::from("Alice")), ("age", Value::from(30))]).unwrap();
    /// assert_eq!(record.size(), 2);
    /// assert_eq!(record.get_field(1).unwrap(), "age");
    /// ```
    pub fn with_fields<I, S>(fields: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        let mut record = Record::new();
        for (name, value) in fields {
            record.add_field(name, value)?;
        }
        Ok(record)
    }

    /// Snapshot of table cells. Column names are already validated and distinct.
    pub(crate) fn from_cells<'a>(cells: impl IntoIterator<Item = (&'a str, Value)>) -> Self {
        let mut record = Record::new();
        for (name, value) in cells {
            record.fields.push(name.to_string());
            record.values.insert(name.to_string(), value);
        }
        record
    }

    /// Appends a field. Re-adding an existing field is a no-op that still succeeds.
    ///
    /// # Errors
    /// `IllegalArgument` for a blank name, `IllegalState` if the record is frozen.
    pub fn add_field(&mut self, name: impl Into<String>, default: Value) -> Result<(), Error> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(err!(IllegalArgument, "Field name cannot be empty."));
        }
        self.ensure_mutable()?;
        if self.values.contains_key(&name) {
            return Ok(());
        }
        self.fields.push(name.clone());
        self.values.insert(name, default);
        self.modifications += 1;
        Ok(())
    }

    pub fn get_field(&self, index: usize) -> Result<&str, Error> {
        self.fields
            .get(index)
            .map(|f| f.as_str())
            .ok_or_else(|| err!(Bounds, "Field index {} out of range 0..{}", index, self.size()))
    }

    pub fn get_field_index(&self, name: &str) -> Result<usize, Error> {
        self.fields
            .iter()
            .position(|f| f == name)
            .ok_or_else(|| err!(NoSuchField, "{}", name))
    }

    pub fn contains_field(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn get_value(&self, name: &str) -> Result<&Value, Error> {
        self.values
            .get(name)
            .ok_or_else(|| err!(NoSuchField, "{}", name))
    }

    /// Replaces the value of an existing field and returns the previous one.
    pub fn set_value(&mut self, name: &str, value: impl Into<Value>) -> Result<Value, Error> {
        let slot = self
            .values
            .get_mut(name)
            .ok_or_else(|| err!(NoSuchField, "{}", name))?;
        if !self.mutable {
            return Err(err!(IllegalState, "Record is not mutable."));
        }
        let previous = std::mem::replace(slot, value.into());
        self.modifications += 1;
        Ok(previous)
    }

    /// Removes a field from both the order and the value map, returning its value.
    pub fn remove_field(&mut self, name: &str) -> Result<Value, Error> {
        let index = self.get_field_index(name)?;
        self.ensure_mutable()?;
        self.fields.remove(index);
        let value = self.values.remove(name).unwrap_or(Value::Null);
        self.modifications += 1;
        Ok(value)
    }

    /// Field names in order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.as_str())
    }

    /// `(name, value)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields
            .iter()
            .filter_map(move |f| self.values.get(f).map(|v| (f.as_str(), v)))
    }

    pub fn size(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// An independent copy; the copy starts mutable with a fresh modification count.
    pub fn copy(&self) -> Record {
        Record {
            fields: self.fields.clone(),
            values: self.values.clone(),
            mutable: true,
            modifications: 0,
        }
    }

    pub fn is_mutable(&self) -> bool {
        self.mutable
    }

    pub fn set_mutable(&mut self, mutable: bool) {
        self.mutable = mutable;
    }

    /// Number of structural or value changes since creation.
    pub fn modification_count(&self) -> u64 {
        self.modifications
    }

    fn ensure_mutable(&self) -> Result<(), Error> {
        if !self.mutable {
            return Err(err!(IllegalState, "Record is not mutable."));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> Record {
        Record::with_fields([("name", Value::from("Alice")), ("age", Value::from(30))]).unwrap()
    }

    #[test]
    fn test_add_field_is_idempotent() {
        let mut record = person();
        let before = record.modification_count();
        record.add_field("name", Value::from("Bob")).unwrap();
        assert_eq!(record.size(), 2);
        assert_eq!(record.fields().filter(|f| *f == "name").count(), 1);
        assert_eq!(record.get_value("name").unwrap(), &Value::from("Alice"));
        assert_eq!(record.modification_count(), before);
    }

    #[test]
    fn test_add_blank_field() {
        let mut record = Record::new();
        assert!(matches!(
            record.add_field("  ", Value::Null),
            Err(Error::IllegalArgument(_))
        ));
        assert!(record.is_empty());
    }

    #[test]
    fn test_lookups() {
        let record = person();
        assert_eq!(record.get_field(0).unwrap(), "name");
        assert_eq!(record.get_field_index("age").unwrap(), 1);
        assert!(matches!(record.get_field(2), Err(Error::Bounds(_))));
        assert!(matches!(
            record.get_field_index("email"),
            Err(Error::NoSuchField(_))
        ));
        assert!(matches!(record.get_value("email"), Err(Error::NoSuchField(_))));
    }

    #[test]
    fn test_set_value_returns_previous() {
        let mut record = person();
        let previous = record.set_value("age", 31).unwrap();
        assert_eq!(previous, Value::Int(30));
        assert_eq!(record.get_value("age").unwrap(), &Value::Int(31));
        assert!(matches!(
            record.set_value("email", "a@b.c"),
            Err(Error::NoSuchField(_))
        ));
    }

    #[test]
    fn test_remove_field() {
        let mut record = person();
        assert_eq!(record.remove_field("name").unwrap(), Value::from("Alice"));
        assert_eq!(record.size(), 1);
        assert!(!record.contains_field("name"));
        assert_eq!(record.get_field(0).unwrap(), "age");
        assert!(matches!(
            record.remove_field("name"),
            Err(Error::NoSuchField(_))
        ));
    }

    #[test]
    fn test_frozen_record_rejects_mutation() {
        let mut record = person();
        record.set_mutable(false);
        assert!(matches!(
            record.set_value("age", 1),
            Err(Error::IllegalState(_))
        ));
        assert!(matches!(
            record.add_field("email", Value::Null),
            Err(Error::IllegalState(_))
        ));
        assert!(matches!(
            record.remove_field("age"),
            Err(Error::IllegalState(_))
        ));
        assert_eq!(record.size(), 2);
    }

    #[test]
    fn test_copy_is_independent() {
        let original = person();
        let mut copy = original.copy();
        copy.set_value("name", "Bob").unwrap();
        copy.add_field("email", Value::Null).unwrap();
        assert_eq!(original.size(), 2);
        assert_eq!(original.get_value("name").unwrap(), &Value::from("Alice"));
        assert_eq!(copy.size(), 3);
    }

    #[test]
    fn test_iter_in_field_order() {
        let record = person();
        let pairs: Vec<(&str, &Value)> = record.iter().collect();
        assert_eq!(pairs[0].0, "name");
        assert_eq!(pairs[1], ("age", &Value::Int(30)));
    }
}
