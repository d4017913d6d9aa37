use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlMapperError {
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error("Could not open database {path}: {message}")]
    OpenDatabaseError { path: String, message: String },

    #[error("Prepare error: {0}")]
    PrepareError(String),

    #[error("SQL execution error ({code}): {message}")]
    ExecuteError { code: i32, message: String },

    #[error("Constraint violation ({code}): {message}")]
    NotNullConstraintViolation { code: i32, message: String },

    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("Unsupported parameter type: {0}")]
    UnsupportedParameterType(String),

    #[error("Parameter error: {0}")]
    ParameterError(String),

    #[error("Schema error: {0}")]
    SchemaError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),
}

impl SqlMapperError {
    /// Engine result code carried by execution failures.
    #[must_use]
    pub fn code(&self) -> Option<i32> {
        match self {
            SqlMapperError::ExecuteError { code, .. }
            | SqlMapperError::NotNullConstraintViolation { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub(crate) fn decode(message: impl Into<String>) -> Self {
        SqlMapperError::DecodeError(message.into())
    }
}

/// Map a failure raised while stepping a statement.
pub(crate) fn execute_error(err: rusqlite::Error) -> SqlMapperError {
    match err {
        rusqlite::Error::SqliteFailure(e, msg) => SqlMapperError::ExecuteError {
            code: e.extended_code,
            message: msg.unwrap_or_else(|| e.to_string()),
        },
        rusqlite::Error::ExecuteReturnedResults => SqlMapperError::ExecuteError {
            code: rusqlite::ffi::SQLITE_ROW,
            message: "statement returned rows".to_string(),
        },
        other => SqlMapperError::ExecuteError {
            code: rusqlite::ffi::SQLITE_ERROR,
            message: other.to_string(),
        },
    }
}

/// Like [`execute_error`], but constraint failures surface as
/// [`SqlMapperError::NotNullConstraintViolation`].
pub(crate) fn non_query_error(err: rusqlite::Error) -> SqlMapperError {
    match err {
        rusqlite::Error::SqliteFailure(e, msg)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            SqlMapperError::NotNullConstraintViolation {
                code: e.extended_code,
                message: msg.unwrap_or_else(|| e.to_string()),
            }
        }
        other => execute_error(other),
    }
}
