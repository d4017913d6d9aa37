use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value as JsonValue;
use url::Url;

use crate::error::SqlMapperError;
use crate::types::{SqlValue, ValueKind};

/// A Rust type that can be stored in a model field.
///
/// `KIND` is the type tag used for native type classification and for
/// disambiguating decoded values; `NULLABLE` is true only for `Option<T>`.
pub trait ColumnValue: Sized {
    const KIND: ValueKind;
    const NULLABLE: bool = false;

    fn to_sql_value(&self) -> SqlValue;

    /// Convert a decoded value into this type.
    ///
    /// # Errors
    /// Returns `SqlMapperError::DecodeError` if the value cannot represent `Self`.
    fn from_sql_value(value: SqlValue) -> Result<Self, SqlMapperError>;
}

fn mismatch<T>(expected: &str, value: &SqlValue) -> Result<T, SqlMapperError> {
    if value.is_null() {
        Err(SqlMapperError::decode(format!(
            "unexpected NULL for non-nullable {expected}"
        )))
    } else {
        Err(SqlMapperError::decode(format!(
            "cannot read {} as {expected}",
            value.kind_name()
        )))
    }
}

/// Lower bound of the `i64` range as a real, -2^63. The upper bound is its negation.
const I64_MIN_AS_REAL: f64 = -9_223_372_036_854_775_808.0;

/// Integral value of a decoded number. Reals are accepted when they carry no
/// fractional part and lie in `[-2^63, 2^63)`, which is how 64-bit integers
/// come back after being bound as REAL into a non-INTEGER column.
#[allow(clippy::cast_possible_truncation)]
fn integral(value: &SqlValue) -> Option<i64> {
    match value {
        SqlValue::Integer(i) | SqlValue::BigInt(i) => Some(*i),
        SqlValue::Bool(b) => Some(i64::from(*b)),
        SqlValue::Real(f)
            if f.fract() == 0.0 && *f >= I64_MIN_AS_REAL && *f < -I64_MIN_AS_REAL =>
        {
            Some(*f as i64)
        }
        _ => None,
    }
}

impl ColumnValue for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Bool(*self)
    }

    fn from_sql_value(value: SqlValue) -> Result<Self, SqlMapperError> {
        match value {
            SqlValue::Bool(b) => Ok(b),
            SqlValue::Integer(i) | SqlValue::BigInt(i) => Ok(i == 1),
            other => mismatch("bool", &other),
        }
    }
}

macro_rules! impl_column_value_integer {
    ($($ty:ty),*) => {
        $(
            impl ColumnValue for $ty {
                const KIND: ValueKind = ValueKind::Integer;

                fn to_sql_value(&self) -> SqlValue {
                    SqlValue::from(*self)
                }

                fn from_sql_value(value: SqlValue) -> Result<Self, SqlMapperError> {
                    let Some(i) = integral(&value) else {
                        return mismatch(stringify!($ty), &value);
                    };
                    <$ty>::try_from(i).map_err(|_| {
                        SqlMapperError::decode(format!(
                            "{i} is out of range for {}",
                            stringify!($ty)
                        ))
                    })
                }
            }
        )*
    };
}

impl_column_value_integer!(i8, i16, i32, u8, u16, u32, isize);

impl ColumnValue for i64 {
    const KIND: ValueKind = ValueKind::BigInt;

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::BigInt(*self)
    }

    fn from_sql_value(value: SqlValue) -> Result<Self, SqlMapperError> {
        integral(&value).map_or_else(|| mismatch("i64", &value), Ok)
    }
}

impl ColumnValue for f64 {
    const KIND: ValueKind = ValueKind::Real;

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Real(*self)
    }

    #[allow(clippy::cast_precision_loss)]
    fn from_sql_value(value: SqlValue) -> Result<Self, SqlMapperError> {
        match value {
            SqlValue::Real(f) => Ok(f),
            SqlValue::Integer(i) | SqlValue::BigInt(i) => Ok(i as f64),
            other => mismatch("f64", &other),
        }
    }
}

impl ColumnValue for f32 {
    const KIND: ValueKind = ValueKind::Real;

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Real(f64::from(*self))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_sql_value(value: SqlValue) -> Result<Self, SqlMapperError> {
        f64::from_sql_value(value).map(|f| f as f32)
    }
}

impl ColumnValue for String {
    const KIND: ValueKind = ValueKind::Text;

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Text(self.clone())
    }

    fn from_sql_value(value: SqlValue) -> Result<Self, SqlMapperError> {
        match value {
            SqlValue::Text(s) => Ok(s),
            other => mismatch("String", &other),
        }
    }
}

/// Convert epoch seconds back into a UTC time, rounded to the microsecond.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn timestamp_from_epoch_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    DateTime::from_timestamp_micros((seconds * 1_000_000.0).round() as i64)
}

/// Epoch seconds (microsecond resolution) for a UTC time.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn epoch_seconds(value: &DateTime<Utc>) -> f64 {
    value.timestamp_micros() as f64 / 1_000_000.0
}

impl ColumnValue for DateTime<Utc> {
    const KIND: ValueKind = ValueKind::Timestamp;

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Timestamp(*self)
    }

    #[allow(clippy::cast_precision_loss)]
    fn from_sql_value(value: SqlValue) -> Result<Self, SqlMapperError> {
        let seconds = match value {
            SqlValue::Timestamp(dt) => return Ok(dt),
            SqlValue::Real(f) => f,
            SqlValue::Integer(i) | SqlValue::BigInt(i) => i as f64,
            other => return mismatch("DateTime<Utc>", &other),
        };
        timestamp_from_epoch_seconds(seconds).ok_or_else(|| {
            SqlMapperError::decode(format!("{seconds} is not a valid epoch timestamp"))
        })
    }
}

impl ColumnValue for NaiveDateTime {
    const KIND: ValueKind = ValueKind::Timestamp;

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Timestamp(self.and_utc())
    }

    fn from_sql_value(value: SqlValue) -> Result<Self, SqlMapperError> {
        DateTime::<Utc>::from_sql_value(value).map(|dt| dt.naive_utc())
    }
}

impl ColumnValue for Url {
    const KIND: ValueKind = ValueKind::Url;

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Url(self.clone())
    }

    fn from_sql_value(value: SqlValue) -> Result<Self, SqlMapperError> {
        match value {
            SqlValue::Url(u) => Ok(u),
            SqlValue::Text(s) => Url::parse(&s)
                .map_err(|e| SqlMapperError::decode(format!("invalid url {s:?}: {e}"))),
            other => mismatch("Url", &other),
        }
    }
}

impl ColumnValue for Vec<u8> {
    const KIND: ValueKind = ValueKind::Blob;

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Blob(self.clone())
    }

    // The engine reports an empty blob as NULL, so NULL reads back as empty.
    fn from_sql_value(value: SqlValue) -> Result<Self, SqlMapperError> {
        match value {
            SqlValue::Blob(b) => Ok(b),
            SqlValue::Null => Ok(Vec::new()),
            other => mismatch("Vec<u8>", &other),
        }
    }
}

impl ColumnValue for JsonValue {
    const KIND: ValueKind = ValueKind::Json;
    const NULLABLE: bool = true;

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Json(self.clone())
    }

    fn from_sql_value(value: SqlValue) -> Result<Self, SqlMapperError> {
        Ok(match value {
            SqlValue::Null => JsonValue::Null,
            SqlValue::Json(v) => v,
            SqlValue::Bool(b) => JsonValue::Bool(b),
            SqlValue::Integer(i) | SqlValue::BigInt(i) => JsonValue::from(i),
            SqlValue::Real(f) => JsonValue::from(f),
            SqlValue::Text(s) => JsonValue::String(s),
            other => return mismatch("serde_json::Value", &other),
        })
    }
}

impl<T: ColumnValue> ColumnValue for Option<T> {
    const KIND: ValueKind = T::KIND;
    const NULLABLE: bool = true;

    fn to_sql_value(&self) -> SqlValue {
        self.as_ref().map_or(SqlValue::Null, ColumnValue::to_sql_value)
    }

    fn from_sql_value(value: SqlValue) -> Result<Self, SqlMapperError> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_sql_value(value).map(Some)
        }
    }
}
