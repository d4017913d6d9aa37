//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types
//! to make it easier to get started with the library.

pub use crate::attribute::{Attribute, AttributeInfo};
pub use crate::conversion::ColumnValue;
pub use crate::error::SqlMapperError;
pub use crate::mapping::{Column, TableMapping};
pub use crate::model::{Field, Model};
pub use crate::model_fields;
pub use crate::query_builder::{Direction, Ordering, TableQuery};
pub use crate::sqlite::{
    AsyncConnection, Command, Connection, ConnectionOptions, ConnectionOptionsBuilder,
    PreparedInsertCommand,
};
pub use crate::types::{SqlValue, ValueKind};
