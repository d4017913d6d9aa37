use rusqlite::Rows;
use rusqlite::types::ValueRef;

use crate::error::{SqlMapperError, execute_error};
use crate::mapping::TableMapping;
use crate::model::Model;
use crate::types::{SqlValue, ValueKind};

/// Decode one engine column into a [`SqlValue`].
///
/// The engine's storage class picks the variant; `destination` only matters
/// for INTEGER values read into a boolean field (`1` is true, anything else
/// false). NULL stays NULL whatever the destination, and an empty blob is
/// reported as NULL.
///
/// # Errors
/// Returns `SqlMapperError::DecodeError` for text that is not valid UTF-8.
pub fn read_column(value: ValueRef<'_>, destination: ValueKind) -> Result<SqlValue, SqlMapperError> {
    match value {
        ValueRef::Null => Ok(SqlValue::Null),
        ValueRef::Integer(i) if destination == ValueKind::Bool => Ok(SqlValue::Bool(i == 1)),
        ValueRef::Integer(i) => Ok(SqlValue::Integer(i)),
        ValueRef::Real(f) => Ok(SqlValue::Real(f)),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .map(|s| SqlValue::Text(s.to_string()))
            .map_err(|e| SqlMapperError::decode(format!("invalid UTF-8 in text column: {e}"))),
        ValueRef::Blob(bytes) if bytes.is_empty() => Ok(SqlValue::Null),
        ValueRef::Blob(bytes) => Ok(SqlValue::Blob(bytes.to_vec())),
    }
}

/// For each result column, the position of the mapping column with the same
/// name. Unknown result columns map to `None` and are skipped.
pub(crate) fn match_columns<M>(names: &[&str], mapping: &TableMapping<M>) -> Vec<Option<usize>> {
    names
        .iter()
        .map(|name| mapping.find_column(name).map(|(idx, _)| idx))
        .collect()
}

/// Step `rows` to completion, building one `M` per row.
///
/// Each row starts as `M::default()`; matched columns overwrite their fields.
/// The first failing row aborts the whole result.
///
/// # Errors
/// Returns `SqlMapperError::ExecuteError` if stepping fails and
/// `SqlMapperError::DecodeError` if any value does not fit its field.
pub(crate) fn materialize_rows<M: Model>(
    mut rows: Rows<'_>,
    columns: &[Option<usize>],
    mapping: &TableMapping<M>,
) -> Result<Vec<M>, SqlMapperError> {
    let mut result = Vec::new();
    while let Some(row) = rows.next().map_err(execute_error)? {
        let mut obj = M::default();
        for (i, target) in columns.iter().enumerate() {
            let Some(idx) = *target else { continue };
            let raw = row
                .get_ref(i)
                .map_err(|e| SqlMapperError::decode(e.to_string()))?;
            let value = read_column(raw, mapping.columns()[idx].kind)?;
            mapping.assign(idx, &mut obj, value)?;
        }
        result.push(obj);
    }
    Ok(result)
}
