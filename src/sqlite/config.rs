use std::time::Duration;

use rusqlite::OpenFlags;
use serde::{Deserialize, Serialize};

use crate::error::SqlMapperError;

use super::connection::Connection;

/// Default busy timeout applied to every connection.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Options for opening a `SQLite` [`Connection`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionOptions {
    /// Database file path, or `:memory:`
    pub db_path: String,
    pub read_only: bool,
    /// Create the file if it does not exist (ignored when read-only)
    pub create: bool,
    pub busy_timeout: Duration,
    /// Switch the database to WAL journaling after opening
    pub wal: bool,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            db_path: ":memory:".to_string(),
            read_only: false,
            create: true,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            wal: false,
        }
    }
}

impl ConnectionOptions {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_wal(mut self, wal: bool) -> Self {
        self.wal = wal;
        self
    }

    #[must_use]
    pub fn open_flags(&self) -> OpenFlags {
        let base = OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        if self.read_only {
            base | OpenFlags::SQLITE_OPEN_READ_ONLY
        } else if self.create {
            base | OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
        } else {
            base | OpenFlags::SQLITE_OPEN_READ_WRITE
        }
    }

    /// # Errors
    /// Returns `SqlMapperError::ConfigError` for an empty path or a WAL request
    /// on a read-only connection.
    pub fn validate(&self) -> Result<(), SqlMapperError> {
        if self.db_path.trim().is_empty() {
            return Err(SqlMapperError::ConfigError("db_path must not be empty".into()));
        }
        if self.wal && self.read_only {
            return Err(SqlMapperError::ConfigError(
                "WAL journaling cannot be enabled on a read-only connection".into(),
            ));
        }
        Ok(())
    }
}

/// Fluent builder for [`ConnectionOptions`].
#[derive(Debug, Clone)]
pub struct ConnectionOptionsBuilder {
    opts: ConnectionOptions,
}

impl ConnectionOptionsBuilder {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            opts: ConnectionOptions::new(db_path),
        }
    }

    #[must_use]
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.opts.read_only = read_only;
        self
    }

    #[must_use]
    pub fn create(mut self, create: bool) -> Self {
        self.opts.create = create;
        self
    }

    #[must_use]
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.opts.busy_timeout = timeout;
        self
    }

    #[must_use]
    pub fn wal(mut self, wal: bool) -> Self {
        self.opts.wal = wal;
        self
    }

    #[must_use]
    pub fn finish(self) -> ConnectionOptions {
        self.opts
    }

    /// Open a [`Connection`] with the built options.
    ///
    /// # Errors
    /// Returns `SqlMapperError` if the options are invalid or the database cannot be opened.
    pub fn open(self) -> Result<Connection, SqlMapperError> {
        Connection::open(self.finish())
    }
}
