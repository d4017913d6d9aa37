use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value as JsonValue;
use url::Url;

/// Values that can be bound as statement parameters or read back from a row.
///
/// Every supported Rust type converts into one of these with `From`:
/// ```rust
/// use sql_mapper::prelude::*;
///
/// let params: Vec<SqlValue> = vec![
///     42i32.into(),
///     "alice".into(),
///     true.into(),
///     None::<String>.into(),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value
    Null,
    /// Text/string value
    Text(String),
    /// Boolean value, stored as 0 or 1
    Bool(bool),
    /// 32-bit or machine-sized integer, bound as a native integer
    Integer(i64),
    /// 64-bit integer, bound as a floating point value
    BigInt(i64),
    /// Floating point value
    Real(f64),
    /// Absolute time, stored as seconds since the Unix epoch
    Timestamp(DateTime<Utc>),
    /// Resource locator, stored as its string form
    Url(Url),
    /// Binary data
    Blob(Vec<u8>),
    /// Dynamic JSON value; only scalars can be bound
    Json(JsonValue),
}

impl SqlValue {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            SqlValue::Integer(i) | SqlValue::BigInt(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_real(&self) -> Option<f64> {
        if let SqlValue::Real(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let SqlValue::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SqlValue::Bool(b) => Some(*b),
            SqlValue::Integer(1) => Some(true),
            SqlValue::Integer(0) => Some(false),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let SqlValue::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    /// Short description of the value's kind, used in error messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Text(_) => "text",
            SqlValue::Bool(_) => "bool",
            SqlValue::Integer(_) => "integer",
            SqlValue::BigInt(_) => "64-bit integer",
            SqlValue::Real(_) => "real",
            SqlValue::Timestamp(_) => "timestamp",
            SqlValue::Url(_) => "url",
            SqlValue::Blob(_) => "blob",
            SqlValue::Json(_) => "json",
        }
    }
}

/// Declared value kind of a model field.
///
/// This is the type tag the binder and decoder dispatch on; it is finer than
/// [`DataType`] so that, for example, an INTEGER column can be read back as a
/// boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Integer,
    BigInt,
    Real,
    Text,
    Timestamp,
    Url,
    Blob,
    Json,
}

impl ValueKind {
    /// Native column type for this kind, `None` when the kind has no mapping.
    #[must_use]
    pub fn data_type(self) -> Option<DataType> {
        match self {
            ValueKind::Bool | ValueKind::Integer | ValueKind::BigInt => Some(DataType::Integer),
            ValueKind::Real | ValueKind::Timestamp => Some(DataType::Real),
            ValueKind::Text | ValueKind::Url => Some(DataType::Text),
            ValueKind::Blob => Some(DataType::Blob),
            ValueKind::Json => None,
        }
    }
}

/// Native SQL column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Integer,
    Real,
    Text,
    Blob,
}

impl DataType {
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            DataType::Integer => "INTEGER",
            DataType::Real => "REAL",
            DataType::Text => "TEXT",
            DataType::Blob => "BLOB",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for SqlValue {
                fn from(value: $ty) -> Self {
                    SqlValue::Integer(i64::from(value))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, u8, u16, u32);

impl From<isize> for SqlValue {
    fn from(value: isize) -> Self {
        // isize is at most 64 bits on every supported target
        SqlValue::Integer(value as i64)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::BigInt(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<f32> for SqlValue {
    fn from(value: f32) -> Self {
        SqlValue::Real(f64::from(value))
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Real(value)
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(value: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(value)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(value: NaiveDateTime) -> Self {
        SqlValue::Timestamp(value.and_utc())
    }
}

impl From<Url> for SqlValue {
    fn from(value: Url) -> Self {
        SqlValue::Url(value)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        SqlValue::Blob(value)
    }
}

impl From<&[u8]> for SqlValue {
    fn from(value: &[u8]) -> Self {
        SqlValue::Blob(value.to_vec())
    }
}

impl From<JsonValue> for SqlValue {
    fn from(value: JsonValue) -> Self {
        SqlValue::Json(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}
