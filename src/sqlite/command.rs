use tracing::debug;

use crate::conversion::ColumnValue;
use crate::error::{SqlMapperError, execute_error, non_query_error};
use crate::mapping::TableMapping;
use crate::model::Model;
use crate::types::SqlValue;

use super::connection::Connection;
use super::params::bind_parameter;
use super::prepared::PreparedStatement;
use super::query::{match_columns, materialize_rows, read_column};

/// A parameter queued on a [`Command`].
///
/// Unnamed bindings are positional; named bindings (`:name`, `@name`, `$name`)
/// are resolved against the compiled statement when it is prepared. `index` is
/// the statement position the binding was last applied to.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: Option<String>,
    pub value: SqlValue,
    pub index: usize,
}

/// One SQL statement plus its parameters.
///
/// Nothing touches the engine until an `execute_*` method runs; each of them
/// prepares, binds, steps and finalizes in a single call.
pub struct Command<'conn> {
    conn: &'conn Connection,
    command_text: String,
    bindings: Vec<Binding>,
}

impl<'conn> Command<'conn> {
    #[must_use]
    pub fn new(conn: &'conn Connection, command_text: impl Into<String>) -> Self {
        Self {
            conn,
            command_text: command_text.into(),
            bindings: Vec::new(),
        }
    }

    #[must_use]
    pub fn command_text(&self) -> &str {
        &self.command_text
    }

    #[must_use]
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Queue a positional parameter.
    pub fn bind(&mut self, value: impl Into<SqlValue>) -> &mut Self {
        self.bindings.push(Binding {
            name: None,
            value: value.into(),
            index: 0,
        });
        self
    }

    /// Queue a parameter resolved by name at prepare time.
    pub fn bind_named(&mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> &mut Self {
        self.bindings.push(Binding {
            name: Some(name.into()),
            value: value.into(),
            index: 0,
        });
        self
    }

    /// Apply every binding in append order.
    ///
    /// Unnamed bindings take 1, 2, 3, ... in the order they were added,
    /// independent of any named bindings between them.
    fn bind_all(&mut self, stmt: &mut PreparedStatement<'_>) -> Result<(), SqlMapperError> {
        let mut position = 0;
        for binding in &mut self.bindings {
            binding.index = match binding.name {
                Some(ref name) => stmt
                    .parameter_index(name)
                    .map_err(|e| SqlMapperError::ParameterError(e.to_string()))?
                    .ok_or_else(|| {
                        SqlMapperError::ParameterError(format!("unknown parameter name {name}"))
                    })?,
                None => {
                    position += 1;
                    position
                }
            };
            bind_parameter(stmt, binding.index, &binding.value)?;
        }
        Ok(())
    }

    /// Compile the statement and apply all bindings.
    ///
    /// # Errors
    /// Returns `SqlMapperError::PrepareError` if the text does not compile, or a
    /// binding error (`UnsupportedParameterType`, `ParameterError`).
    pub fn prepare(&mut self) -> Result<PreparedStatement<'conn>, SqlMapperError> {
        let mut stmt = PreparedStatement::new(self.conn, &self.command_text)?;
        self.bind_all(&mut stmt)?;
        Ok(stmt)
    }

    /// Step once and decode column 0 of the first row, `None` when there is
    /// no row or the value is NULL.
    ///
    /// # Errors
    /// Returns `SqlMapperError::ExecuteError` on a failed step and
    /// `SqlMapperError::DecodeError` if the value does not fit `T`.
    pub fn execute_scalar<T: ColumnValue>(&mut self) -> Result<Option<T>, SqlMapperError> {
        let mut stmt = self.prepare()?;
        let mut rows = stmt.raw_query();
        let Some(row) = rows.next().map_err(execute_error)? else {
            return Ok(None);
        };
        let raw = row
            .get_ref(0)
            .map_err(|e| SqlMapperError::decode(e.to_string()))?;
        let value = read_column(raw, T::KIND)?;
        if value.is_null() {
            return Ok(None);
        }
        T::from_sql_value(value).map(Some)
    }

    /// Step once and return the number of rows changed.
    ///
    /// # Errors
    /// Returns `SqlMapperError::NotNullConstraintViolation` for constraint
    /// failures and `SqlMapperError::ExecuteError` for any other failed step,
    /// including a statement that produces rows.
    pub fn execute_non_query(&mut self) -> Result<usize, SqlMapperError> {
        let mut stmt = self.prepare()?;
        let affected = stmt.raw_execute().map_err(non_query_error)?;
        debug!(affected, "statement executed");
        Ok(affected)
    }

    /// Step through every row, decoding each into an `M` via `mapping`.
    ///
    /// Result columns are matched to mapping columns by name; unknown columns
    /// are skipped. A row that fails to decode fails the whole query.
    ///
    /// # Errors
    /// Returns `SqlMapperError::ExecuteError` on a failed step and
    /// `SqlMapperError::DecodeError` if any row cannot be built.
    pub fn execute_query<M: Model>(
        &mut self,
        mapping: &TableMapping<M>,
    ) -> Result<Vec<M>, SqlMapperError> {
        let mut stmt = self.prepare()?;
        let columns = match_columns(&stmt.column_names(), mapping);
        let rows = stmt.raw_query();
        let result = materialize_rows(rows, &columns, mapping)?;
        debug!(rows = result.len(), table = mapping.table_name(), "query materialized");
        Ok(result)
    }
}
