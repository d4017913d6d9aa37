use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::conversion::ColumnValue;
use crate::counter::SharedCounter;
use crate::error::SqlMapperError;
use crate::mapping::TableMapping;
use crate::model::Model;
use crate::sqlite::command::Command;
use crate::sqlite::config::ConnectionOptions;
use crate::types::SqlValue;

type MappingCache = RefCell<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>;

/// An open `SQLite` database plus the table mappings derived on it.
///
/// Mappings are derived lazily, once per model type, and shared read-only
/// after that. The connection is `Send` but not `Sync`; use
/// [`AsyncConnection`](crate::sqlite::AsyncConnection) to share one across tasks.
pub struct Connection {
    conn: rusqlite::Connection,
    options: ConnectionOptions,
    mappings: MappingCache,
    open_statements: SharedCounter,
}

impl Connection {
    /// Open a database with `options`.
    ///
    /// # Errors
    /// Returns `SqlMapperError::ConfigError` for invalid options,
    /// `SqlMapperError::OpenDatabaseError` if the file cannot be opened, and
    /// `SqlMapperError::SqliteError` if the busy timeout or journal mode cannot be set.
    pub fn open(options: ConnectionOptions) -> Result<Self, SqlMapperError> {
        options.validate()?;
        let conn = rusqlite::Connection::open_with_flags(&options.db_path, options.open_flags())
            .map_err(|e| SqlMapperError::OpenDatabaseError {
                path: options.db_path.clone(),
                message: e.to_string(),
            })?;
        conn.busy_timeout(options.busy_timeout)?;
        if options.wal {
            let mode: String = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                row.get(0)
            })?;
            debug!(mode = %mode, "journal mode set");
        }
        info!(path = %options.db_path, read_only = options.read_only, "opened sqlite database");
        Ok(Self {
            conn,
            options,
            mappings: RefCell::new(HashMap::new()),
            open_statements: SharedCounter::default(),
        })
    }

    /// # Errors
    /// See [`Connection::open`].
    pub fn open_path(db_path: impl Into<String>) -> Result<Self, SqlMapperError> {
        Self::open(ConnectionOptions::new(db_path))
    }

    /// # Errors
    /// See [`Connection::open`].
    pub fn open_in_memory() -> Result<Self, SqlMapperError> {
        Self::open(ConnectionOptions::in_memory())
    }

    #[must_use]
    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }

    pub(crate) fn raw(&self) -> &rusqlite::Connection {
        &self.conn
    }

    pub(crate) fn statement_counter(&self) -> &SharedCounter {
        &self.open_statements
    }

    /// Number of compiled statements not yet finalized.
    #[must_use]
    pub fn outstanding_statements(&self) -> i64 {
        self.open_statements.get()
    }

    /// Mapping of `M`, derived on first use and cached for this connection.
    pub fn mapping<M: Model>(&self) -> Arc<TableMapping<M>> {
        let key = TypeId::of::<M>();
        let cached = self.mappings.borrow().get(&key).cloned();
        if let Some(mapping) = cached.and_then(|c| c.downcast::<TableMapping<M>>().ok()) {
            return mapping;
        }
        let mapping = Arc::new(TableMapping::<M>::derive());
        debug!(table = mapping.table_name(), "derived table mapping");
        let shared: Arc<dyn Any + Send + Sync> = Arc::clone(&mapping) as _;
        self.mappings.borrow_mut().insert(key, shared);
        mapping
    }

    /// A [`Command`] for `sql` with `params` bound positionally.
    #[must_use]
    pub fn create_command(&self, sql: &str, params: &[SqlValue]) -> Command<'_> {
        let mut cmd = Command::new(self, sql);
        for param in params {
            cmd.bind(param.clone());
        }
        cmd
    }

    /// Execute a statement and return the number of rows changed.
    ///
    /// # Errors
    /// See [`Command::execute_non_query`].
    pub fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<usize, SqlMapperError> {
        self.create_command(sql, params).execute_non_query()
    }

    /// Execute a query and decode column 0 of its first row.
    ///
    /// # Errors
    /// See [`Command::execute_scalar`].
    pub fn execute_scalar<T: ColumnValue>(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<Option<T>, SqlMapperError> {
        self.create_command(sql, params).execute_scalar()
    }

    /// Run several `;`-separated statements without parameters.
    ///
    /// # Errors
    /// Returns `SqlMapperError::SqliteError` if any statement fails.
    pub fn execute_batch(&self, sql: &str) -> Result<(), SqlMapperError> {
        debug!(sql, "execute batch");
        self.conn
            .execute_batch(sql)
            .map_err(SqlMapperError::SqliteError)
    }

    #[must_use]
    pub fn last_insert_rowid(&self) -> i64 {
        self.conn.last_insert_rowid()
    }

    /// Rows changed by the most recent INSERT, UPDATE or DELETE.
    #[must_use]
    pub fn changes(&self) -> u64 {
        self.conn.changes()
    }

    #[must_use]
    pub fn lib_version() -> &'static str {
        rusqlite::version()
    }

    #[must_use]
    pub fn lib_version_number() -> i32 {
        rusqlite::version_number()
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("options", &self.options)
            .field("mappings", &self.mappings.borrow().len())
            .field("open_statements", &self.open_statements.get())
            .finish_non_exhaustive()
    }
}
