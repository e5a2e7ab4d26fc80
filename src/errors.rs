use std::fmt;

/// Custom error type for record and table operations, including specific error codes.
///
/// Each variant represents a distinct error condition with a unique error code for easier debugging
/// and error handling in applications.
#[derive(Debug)]
pub enum Error {
    /// I/O-related error (e.g., reading a script file).
    /// Error code: 1000
    Io(std::io::Error),
    /// Command syntax error.
    /// Error code: 3000
    Syntax(String),
    /// Row or column index outside the valid range.
    /// Error code: 4000
    Bounds(String),
    /// Schema-related error (e.g., incompatible record, duplicate column name).
    /// Error code: 5000
    Schema(String),
    /// Duplicate value written to a unique column.
    /// Error code: 6000
    NonUniqueValue(String),
    /// NULL written to a non-nullable column with no usable default.
    /// Error code: 6100
    NotNull(String),
    /// Other value constraint violation (e.g., text longer than the column size).
    /// Error code: 6200
    Constraint(String),
    /// Operation not allowed in the current state (e.g., table is not mutable).
    /// Error code: 7000
    IllegalState(String),
    /// Invalid argument (e.g., blank field name, foreign row).
    /// Error code: 7100
    IllegalArgument(String),
    /// Lookup of a field the record does not have.
    /// Error code: 8000
    NoSuchField(String),
    /// Value could not be converted to the declared column type.
    /// Error code: 8100
    Coercion(String),
    /// Miscellaneous uncategorized error.
    /// Error code: 9000
    Other(String),
}

impl Error {
    /// Returns the error code associated with this error variant.
    ///
    /// # Examples
    /// ```
    /// use rectable::errors::Error;
    /// let err = Error::Syntax("Missing column name".to_string());
    /// assert_eq!(err.code(), 3000);
    /// ```
    pub fn code(&self) -> u32 {
        match self {
            Error::Io(_) => 1000,
            Error::Syntax(_) => 3000,
            Error::Bounds(_) => 4000,
            Error::Schema(_) => 5000,
            Error::NonUniqueValue(_) => 6000,
            Error::NotNull(_) => 6100,
            Error::Constraint(_) => 6200,
            Error::IllegalState(_) => 7000,
            Error::IllegalArgument(_) => 7100,
            Error::NoSuchField(_) => 8000,
            Error::Coercion(_) => 8100,
            Error::Other(_) => 9000,
        }
    }

    /// Returns a human-readable error category for this error variant.
    ///
    /// # Examples
    /// ```
    /// use rectable::errors::Error;
    /// let err = Error::NonUniqueValue("name = 'Alice'".to_string());
    /// assert_eq!(err.category(), "Non-Unique Value");
    /// ```
    pub fn category(&self) -> &'static str {
        match self {
            Error::Io(_) => "I/O",
            Error::Syntax(_) => "Syntax",
            Error::Bounds(_) => "Index Out Of Bounds",
            Error::Schema(_) => "Schema",
            Error::NonUniqueValue(_) => "Non-Unique Value",
            Error::NotNull(_) => "Not Null",
            Error::Constraint(_) => "Constraint",
            Error::IllegalState(_) => "Illegal State",
            Error::IllegalArgument(_) => "Illegal Argument",
            Error::NoSuchField(_) => "No Such Field",
            Error::Coercion(_) => "Coercion",
            Error::Other(_) => "Other",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "[{}] I/O Error: {}", self.code(), e),
            Error::Syntax(msg) => write!(f, "[{}] Syntax Error: {}", self.code(), msg),
            Error::Bounds(msg) => write!(f, "[{}] Index Out Of Bounds: {}", self.code(), msg),
            Error::Schema(msg) => write!(f, "[{}] Schema Error: {}", self.code(), msg),
            Error::NonUniqueValue(msg) => {
                write!(f, "[{}] Non-Unique Column Value: {}", self.code(), msg)
            }
            Error::NotNull(msg) => write!(f, "[{}] Not Null Violation: {}", self.code(), msg),
            Error::Constraint(msg) => write!(f, "[{}] Constraint Error: {}", self.code(), msg),
            Error::IllegalState(msg) => write!(f, "[{}] Illegal State: {}", self.code(), msg),
            Error::IllegalArgument(msg) => {
                write!(f, "[{}] Illegal Argument: {}", self.code(), msg)
            }
            Error::NoSuchField(msg) => write!(f, "[{}] No Such Field: {}", self.code(), msg),
            Error::Coercion(msg) => write!(f, "[{}] Coercion Error: {}", self.code(), msg),
            Error::Other(msg) => write!(f, "[{}] Unknown Error: {}", self.code(), msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<std::num::ParseIntError> for Error {
    fn from(err: std::num::ParseIntError) -> Self {
        Error::Coercion(format!("Integer parsing error: {}", err))
    }
}

impl From<std::num::ParseFloatError> for Error {
    fn from(err: std::num::ParseFloatError) -> Self {
        Error::Coercion(format!("Float parsing error: {}", err))
    }
}

/// Convenience macro to create an `Error` with a formatted message.
///
/// # Examples
/// ```
/// use rectable::err;
/// let err = err!(Syntax, "Missing column name");
/// assert_eq!(err.code(), 3000);
/// assert_eq!(err.to_string(), "[3000] Syntax Error: Missing column name");
///
/// let err = err!(Bounds, "Row index {} out of range", 7);
/// assert_eq!(err.code(), 4000);
/// assert_eq!(err.to_string(), "[4000] Index Out Of Bounds: Row index 7 out of range");
/// ```
#[macro_export]
macro_rules! err {
    ($variant:ident, $msg:expr) => {
        $crate::errors::Error::$variant($msg.to_string())
    };
    ($variant:ident, $fmt:expr, $($arg:tt)*) => {
        $crate::errors::Error::$variant(format!($fmt, $($arg)*))
    };
}
