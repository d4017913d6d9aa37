//! A small object mapper over embedded `SQLite`.
//!
//! Models describe their stored fields through [`Model`]; the
//! [`sqlite::Connection`] derives a [`TableMapping`] per model type, binds
//! values through [`SqlValue`], and decodes rows back into models.
//! [`TableQuery`] composes read queries without mutating its receiver.

pub mod attribute;
pub mod conversion;
pub mod counter;
pub mod error;
pub mod mapping;
pub mod model;
pub mod prelude;
pub mod query_builder;
pub mod sqlite;
pub mod types;

pub use attribute::{Attribute, AttributeInfo};
pub use conversion::ColumnValue;
pub use counter::SharedCounter;
pub use error::SqlMapperError;
pub use mapping::{Column, TableMapping};
pub use model::{Field, Model};
pub use query_builder::{Direction, Ordering, TableQuery};
pub use types::{DataType, SqlValue, ValueKind};
