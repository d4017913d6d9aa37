use rusqlite::Statement;
use rusqlite::types::Null;
use serde_json::Value as JsonValue;
use tracing::trace;

use crate::conversion::epoch_seconds;
use crate::error::SqlMapperError;
use crate::types::SqlValue;

/// Bind one value to the 1-based parameter `index` of `stmt`.
///
/// Dispatch follows the value's kind:
/// - 32-bit and machine integers bind as native integers, booleans as 0/1.
/// - 64-bit integers bind as REAL. This loses precision beyond 2^53.
/// - Timestamps bind as REAL seconds since the Unix epoch, URLs as their string form.
/// - JSON scalars bind as the matching primitive; JSON arrays and objects are rejected.
///
/// # Errors
/// Returns `SqlMapperError::UnsupportedParameterType` for composite JSON values, and
/// `SqlMapperError::ParameterError` if the engine rejects the bind (e.g. index out of range).
#[allow(clippy::cast_precision_loss)]
pub fn bind_parameter(
    stmt: &mut Statement<'_>,
    index: usize,
    value: &SqlValue,
) -> Result<(), SqlMapperError> {
    trace!(index, kind = value.kind_name(), "bind parameter");
    let res = match value {
        SqlValue::Null => stmt.raw_bind_parameter(index, Null),
        SqlValue::Text(s) => stmt.raw_bind_parameter(index, s.as_str()),
        SqlValue::Bool(b) => stmt.raw_bind_parameter(index, i64::from(*b)),
        SqlValue::Integer(i) => stmt.raw_bind_parameter(index, *i),
        SqlValue::BigInt(i) => stmt.raw_bind_parameter(index, *i as f64),
        SqlValue::Real(f) => stmt.raw_bind_parameter(index, *f),
        SqlValue::Timestamp(dt) => stmt.raw_bind_parameter(index, epoch_seconds(dt)),
        SqlValue::Url(u) => stmt.raw_bind_parameter(index, u.as_str()),
        SqlValue::Blob(bytes) => stmt.raw_bind_parameter(index, bytes.as_slice()),
        SqlValue::Json(json) => return bind_json(stmt, index, json),
    };
    res.map_err(|e| SqlMapperError::ParameterError(format!("cannot bind parameter {index}: {e}")))
}

fn bind_json(
    stmt: &mut Statement<'_>,
    index: usize,
    json: &JsonValue,
) -> Result<(), SqlMapperError> {
    let scalar = match json {
        JsonValue::Null => SqlValue::Null,
        JsonValue::Bool(b) => SqlValue::Bool(*b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or(f64::NAN)),
        },
        JsonValue::String(s) => SqlValue::Text(s.clone()),
        JsonValue::Array(_) | JsonValue::Object(_) => {
            return Err(SqlMapperError::UnsupportedParameterType(format!(
                "composite JSON value {json}"
            )));
        }
    };
    bind_parameter(stmt, index, &scalar)
}
