use crate::errors::Error;
use lazy_static::lazy_static;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

lazy_static! {
    static ref VARCHAR_REGEX: Regex = Regex::new(r"(?i)^VARCHAR\(\s*(\d+)\s*\)$").unwrap();
}

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    TINYINT,      // i8
    SMALLINT,     // i16
    INT,          // i64, equivalent to SQL's BIGINT
    BIGINT,       // i128
    FLOAT,        // 32-bit floating point
    DOUBLE,       // 64-bit floating point
    VARCHAR(u16), // Variable-length string with max length
    TEXT,         // Unbounded string
    BOOLEAN,      // True/False value
    ANY,          // Untyped, values stored as given
}

impl DataType {
    /// Value stored for a non-nullable column when nothing better is known.
    pub fn zero_value(&self) -> Value {
        match self {
            DataType::TINYINT => Value::TinyInt(0),
            DataType::SMALLINT => Value::SmallInt(0),
            DataType::INT => Value::Int(0),
            DataType::BIGINT => Value::BigInt(0),
            DataType::FLOAT => Value::Float(0.0),
            DataType::DOUBLE => Value::Double(0.0),
            DataType::VARCHAR(_) | DataType::TEXT => Value::Text(String::new()),
            DataType::BOOLEAN => Value::Boolean(false),
            DataType::ANY => Value::Null,
        }
    }

    /// Maximum number of characters a text value of this type may hold.
    pub fn max_length(&self) -> Option<usize> {
        match self {
            DataType::VARCHAR(len) => Some(*len as usize),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::TINYINT => write!(f, "TINYINT"),
            DataType::SMALLINT => write!(f, "SMALLINT"),
            DataType::INT => write!(f, "INT"),
            DataType::BIGINT => write!(f, "BIGINT"),
            DataType::FLOAT => write!(f, "FLOAT"),
            DataType::DOUBLE => write!(f, "DOUBLE"),
            DataType::VARCHAR(max_length) => write!(f, "VARCHAR({})", max_length),
            DataType::TEXT => write!(f, "TEXT"),
            DataType::BOOLEAN => write!(f, "BOOLEAN"),
            DataType::ANY => write!(f, "ANY"),
        }
    }
}

impl FromStr for DataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(caps) = VARCHAR_REGEX.captures(s.trim()) {
            let len: u16 = caps[1]
                .parse()
                .map_err(|_| err!(Syntax, "Invalid VARCHAR length: {}", &caps[1]))?;
            return Ok(DataType::VARCHAR(len));
        }
        match s.trim().to_uppercase().as_str() {
            "TINYINT" => Ok(DataType::TINYINT),
            "SMALLINT" => Ok(DataType::SMALLINT),
            "INT" | "INTEGER" => Ok(DataType::INT),
            "BIGINT" => Ok(DataType::BIGINT),
            "FLOAT" => Ok(DataType::FLOAT),
            "DOUBLE" => Ok(DataType::DOUBLE),
            "TEXT" | "STRING" => Ok(DataType::TEXT),
            "BOOLEAN" | "BOOL" => Ok(DataType::BOOLEAN),
            "ANY" => Ok(DataType::ANY),
            other => Err(err!(Syntax, "Invalid column type: {}.", other)),
        }
    }
}

/// A single cell value.
///
/// Equality and hashing are total: floats compare by bit pattern, so a value can
/// key the uniqueness index of a column.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    TinyInt(i8),
    SmallInt(i16),
    Int(i64),
    BigInt(i128),
    Float(f32),
    Double(f64),
    Text(String),
    Boolean(bool),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Integral payload widened to `i128`.
    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Value::TinyInt(v) => Some(*v as i128),
            Value::SmallInt(v) => Some(*v as i128),
            Value::Int(v) => Some(*v as i128),
            Value::BigInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric payload widened to `f64`.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v as f64),
            Value::Double(v) => Some(*v),
            other => other.as_integer().map(|i| i as f64),
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::TinyInt(_)
            | Value::SmallInt(_)
            | Value::Int(_)
            | Value::BigInt(_)
            | Value::Float(_)
            | Value::Double(_) => 2,
            Value::Text(_) => 3,
        }
    }

    /// Total ordering used when sorting rows: NULL first, then booleans, numbers
    /// and text. Numbers of different widths compare by magnitude.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        let rank = self.type_rank().cmp(&other.type_rank());
        if rank != Ordering::Equal {
            return rank;
        }
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (a, b) => match (a.as_integer(), b.as_integer()) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => {
                    let x = a.as_double().unwrap_or(f64::NAN);
                    let y = b.as_double().unwrap_or(f64::NAN);
                    x.total_cmp(&y)
                }
            },
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::TinyInt(a), Value::TinyInt(b)) => a == b,
            (Value::SmallInt(a), Value::SmallInt(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::TinyInt(v) => v.hash(state),
            Value::SmallInt(v) => v.hash(state),
            Value::Int(v) => v.hash(state),
            Value::BigInt(v) => v.hash(state),
            Value::Float(v) => v.to_bits().hash(state),
            Value::Double(v) => v.to_bits().hash(state),
            Value::Text(v) => v.hash(state),
            Value::Boolean(v) => v.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::TinyInt(v) => write!(f, "{}", v),
            Value::SmallInt(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::BigInt(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "{}", v),
            Value::Boolean(v) => write!(f, "{}", v),
        }
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Value::TinyInt(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::SmallInt(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i128> for Value {
    fn from(v: i128) -> Self {
        Value::BigInt(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}
