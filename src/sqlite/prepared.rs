use std::ops::{Deref, DerefMut};

use rusqlite::Statement;
use tracing::debug;

use crate::counter::SharedCounter;
use crate::error::{SqlMapperError, non_query_error};
use crate::types::SqlValue;

use super::connection::Connection;
use super::params::bind_parameter;

/// A compiled statement registered with its connection's outstanding-statement
/// counter. Dropping it finalizes the statement and releases the count, on
/// success and error paths alike.
pub struct PreparedStatement<'conn> {
    stmt: Statement<'conn>,
    counter: &'conn SharedCounter,
}

impl<'conn> PreparedStatement<'conn> {
    /// Compile `sql` on `conn`.
    ///
    /// # Errors
    /// Returns `SqlMapperError::PrepareError` if the engine cannot compile the text.
    pub fn new(conn: &'conn Connection, sql: &str) -> Result<Self, SqlMapperError> {
        debug!(sql, "prepare statement");
        let stmt = conn
            .raw()
            .prepare(sql)
            .map_err(|e| SqlMapperError::PrepareError(e.to_string()))?;
        let counter = conn.statement_counter();
        counter.increment_and_get();
        Ok(Self { stmt, counter })
    }
}

impl<'conn> Deref for PreparedStatement<'conn> {
    type Target = Statement<'conn>;

    fn deref(&self) -> &Self::Target {
        &self.stmt
    }
}

impl DerefMut for PreparedStatement<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.stmt
    }
}

impl Drop for PreparedStatement<'_> {
    fn drop(&mut self) {
        self.counter.decrement_and_get();
    }
}

/// An INSERT compiled once and re-executed for every parameter set.
///
/// The statement is compiled on the first call and kept until the holder is
/// dropped, so batch inserts do not re-parse SQL per row.
pub struct PreparedInsertCommand<'conn> {
    conn: &'conn Connection,
    command_text: String,
    statement: Option<PreparedStatement<'conn>>,
}

impl<'conn> PreparedInsertCommand<'conn> {
    #[must_use]
    pub fn new(conn: &'conn Connection, command_text: impl Into<String>) -> Self {
        Self {
            conn,
            command_text: command_text.into(),
            statement: None,
        }
    }

    #[must_use]
    pub fn command_text(&self) -> &str {
        &self.command_text
    }

    /// Whether the statement has been compiled yet.
    #[must_use]
    pub fn is_prepared(&self) -> bool {
        self.statement.is_some()
    }

    /// Bind `args` positionally (starting at 1) and execute, returning rows affected.
    ///
    /// # Errors
    /// Returns `SqlMapperError::PrepareError` if compiling fails,
    /// `SqlMapperError::ParameterError` if `args` does not supply exactly one
    /// value per parameter, a bind error for
    /// an unsupported value, `SqlMapperError::NotNullConstraintViolation` for a
    /// constraint failure and `SqlMapperError::ExecuteError` otherwise.
    pub fn execute_non_query(&mut self, args: &[SqlValue]) -> Result<usize, SqlMapperError> {
        let stmt = match self.statement {
            Some(ref mut stmt) => stmt,
            None => self
                .statement
                .insert(PreparedStatement::new(self.conn, &self.command_text)?),
        };
        // every call rebinds every parameter, so no value carries over between rows
        let expected = stmt.parameter_count();
        if args.len() != expected {
            return Err(SqlMapperError::ParameterError(format!(
                "expected {expected} arguments, got {}",
                args.len()
            )));
        }
        for (i, arg) in args.iter().enumerate() {
            bind_parameter(stmt, i + 1, arg)?;
        }
        // raw_execute resets the statement after stepping, keeping it reusable
        stmt.raw_execute().map_err(non_query_error)
    }
}
