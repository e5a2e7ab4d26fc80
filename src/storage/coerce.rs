//! Converter registry used to normalize every value written into a cell.
//!
//! Converters are registered per [`TypeKind`]. Lookup tries the exact kind first
//! and then walks up the kind hierarchy, so a single `Integral` converter serves
//! every integer width unless a narrower one is registered.
use super::value::{DataType, Value};
use crate::errors::Error;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// A conversion function. Receives the concrete target type and a non-null value.
pub type Converter = Arc<dyn Fn(&DataType, &Value) -> Result<Value, Error> + Send + Sync>;

/// Converter resolution keys, arranged in a single-inheritance hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Float,
    Double,
    Text,
    Boolean,
    Integral,
    Floating,
    Number,
    Any,
}

impl TypeKind {
    /// The nearest kind a converter may be inherited from.
    pub fn supertype(&self) -> Option<TypeKind> {
        match self {
            TypeKind::TinyInt | TypeKind::SmallInt | TypeKind::Int | TypeKind::BigInt => {
                Some(TypeKind::Integral)
            }
            TypeKind::Float | TypeKind::Double => Some(TypeKind::Floating),
            TypeKind::Integral | TypeKind::Floating => Some(TypeKind::Number),
            TypeKind::Number | TypeKind::Text | TypeKind::Boolean => Some(TypeKind::Any),
            TypeKind::Any => None,
        }
    }
}

impl From<&DataType> for TypeKind {
    fn from(data_type: &DataType) -> Self {
        match data_type {
            DataType::TINYINT => TypeKind::TinyInt,
            DataType::SMALLINT => TypeKind::SmallInt,
            DataType::INT => TypeKind::Int,
            DataType::BIGINT => TypeKind::BigInt,
            DataType::FLOAT => TypeKind::Float,
            DataType::DOUBLE => TypeKind::Double,
            DataType::VARCHAR(_) | DataType::TEXT => TypeKind::Text,
            DataType::BOOLEAN => TypeKind::Boolean,
            DataType::ANY => TypeKind::Any,
        }
    }
}

/// What to store when NULL reaches a non-nullable column that has no default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullPolicy {
    /// Leave the NULL in place; the write is then rejected.
    #[default]
    Keep,
    /// Substitute the zero value of the column type.
    TypeDefault,
}

impl std::str::FromStr for NullPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "keep" => Ok(NullPolicy::Keep),
            "type-default" | "type_default" => Ok(NullPolicy::TypeDefault),
            other => Err(err!(IllegalArgument, "Unknown null policy: {}", other)),
        }
    }
}

static BUILTINS: Lazy<Vec<(TypeKind, Converter)>> = Lazy::new(|| {
    vec![
        (TypeKind::Integral, Arc::new(to_integral) as Converter),
        (TypeKind::Floating, Arc::new(to_floating) as Converter),
        (TypeKind::Text, Arc::new(to_text) as Converter),
        (TypeKind::Boolean, Arc::new(to_boolean) as Converter),
        (TypeKind::Any, Arc::new(identity) as Converter),
    ]
});

#[derive(Clone, Default)]
pub struct CoercionRegistry {
    converters: HashMap<TypeKind, Converter>,
    null_policy: NullPolicy,
}

impl CoercionRegistry {
    /// An empty registry. Every non-null write fails until converters are registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with the built-in converters.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (kind, converter) in BUILTINS.iter() {
            registry.converters.insert(*kind, converter.clone());
        }
        registry
    }

    pub fn null_policy(&self) -> NullPolicy {
        self.null_policy
    }

    pub fn set_null_policy(&mut self, policy: NullPolicy) {
        self.null_policy = policy;
    }

    /// Registers a converter for `kind`, returning the one it replaced.
    pub fn register<F>(&mut self, kind: TypeKind, converter: F) -> Option<Converter>
    where
        F: Fn(&DataType, &Value) -> Result<Value, Error> + Send + Sync + 'static,
    {
        self.converters.insert(kind, Arc::new(converter))
    }

    /// Removes the converter registered exactly for `kind`.
    /// Returns `false` if there was none.
    pub fn unregister(&mut self, kind: TypeKind) -> bool {
        self.converters.remove(&kind).is_some()
    }

    /// Resolves a converter: exact kind first, then the nearest supertype.
    pub fn lookup(&self, kind: TypeKind) -> Option<&Converter> {
        let mut current = Some(kind);
        while let Some(k) = current {
            if let Some(converter) = self.converters.get(&k) {
                return Some(converter);
            }
            current = k.supertype();
        }
        None
    }

    /// Converts `value` to `target`. NULL passes through untouched.
    pub fn coerce(&self, target: &DataType, value: Value) -> Result<Value, Error> {
        if value.is_null() {
            return Ok(value);
        }
        let kind = TypeKind::from(target);
        let converter = self
            .lookup(kind)
            .ok_or_else(|| err!(Coercion, "No converter registered for type {}", target))?;
        trace!(target = %target, value = %value, "Coercing value");
        converter(target, &value)
    }
}

impl fmt::Debug for CoercionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<String> = self.converters.keys().map(|k| format!("{:?}", k)).collect();
        kinds.sort();
        f.debug_struct("CoercionRegistry")
            .field("converters", &kinds)
            .field("null_policy", &self.null_policy)
            .finish()
    }
}

fn identity(_target: &DataType, value: &Value) -> Result<Value, Error> {
    Ok(value.clone())
}

fn to_integral(target: &DataType, value: &Value) -> Result<Value, Error> {
    let wide: i128 = match value {
        Value::Float(_) | Value::Double(_) => {
            let v = value.as_double().unwrap_or(f64::NAN);
            if v.fract() != 0.0 || !v.is_finite() {
                return Err(err!(Coercion, "Cannot convert {} to {} exactly", v, target));
            }
            // i128 spans [-2^127, 2^127); `as` would saturate outside it
            let bound = 2f64.powi(127);
            if v < -bound || v >= bound {
                return Err(err!(Coercion, "Value {} out of range for {}", v, target));
            }
            v as i128
        }
        Value::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| err!(Coercion, "Invalid {}: {}", target, s))?,
        Value::Boolean(b) => *b as i128,
        other => other
            .as_integer()
            .ok_or_else(|| err!(Coercion, "Cannot convert {} to {}", other, target))?,
    };

    let overflow = || err!(Coercion, "Value {} out of range for {}", wide, target);
    match target {
        DataType::TINYINT => Ok(Value::TinyInt(i8::try_from(wide).map_err(|_| overflow())?)),
        DataType::SMALLINT => Ok(Value::SmallInt(
            i16::try_from(wide).map_err(|_| overflow())?,
        )),
        DataType::INT => Ok(Value::Int(i64::try_from(wide).map_err(|_| overflow())?)),
        DataType::BIGINT => Ok(Value::BigInt(wide)),
        other => Err(err!(Coercion, "{} is not an integral type", other)),
    }
}

fn to_floating(target: &DataType, value: &Value) -> Result<Value, Error> {
    let v: f64 = match value {
        Value::Text(s) => s.trim().parse()?,
        Value::Boolean(_) => {
            return Err(err!(Coercion, "Cannot convert BOOLEAN to {}", target));
        }
        other => other
            .as_double()
            .ok_or_else(|| err!(Coercion, "Cannot convert {} to {}", other, target))?,
    };
    match target {
        DataType::FLOAT => {
            if v.is_finite() && v.abs() > f32::MAX as f64 {
                return Err(err!(Coercion, "Value {} out of range for {}", v, target));
            }
            Ok(Value::Float(v as f32))
        }
        DataType::DOUBLE => Ok(Value::Double(v)),
        other => Err(err!(Coercion, "{} is not a floating point type", other)),
    }
}

fn to_text(_target: &DataType, value: &Value) -> Result<Value, Error> {
    match value {
        Value::Text(_) => Ok(value.clone()),
        other => Ok(Value::Text(other.to_string())),
    }
}

fn to_boolean(target: &DataType, value: &Value) -> Result<Value, Error> {
    match value {
        Value::Boolean(_) => Ok(value.clone()),
        Value::Text(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(Value::Boolean(true)),
            "false" | "no" | "off" | "0" => Ok(Value::Boolean(false)),
            _ => Err(err!(Coercion, "Invalid {}: {}", target, s)),
        },
        other => match other.as_integer() {
            Some(0) => Ok(Value::Boolean(false)),
            Some(1) => Ok(Value::Boolean(true)),
            _ => Err(err!(Coercion, "Cannot convert {} to {}", other, target)),
        },
    }
}
