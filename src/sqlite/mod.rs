// SQLite module - maps models onto an embedded SQLite database
//
// This module is split into several sub-modules:
// - config: Connection options and builder
// - connection: The connection, its mapping cache, DDL and CRUD helpers
// - command: One statement plus its bindings, executed on demand
// - params: Binding mapper values onto statement parameters
// - prepared: Counted statement handles and the reusable insert command
// - query: Reading columns and materializing rows into models
// - worker: Async handle backed by a dedicated connection thread

pub mod command;
pub mod config;
pub mod connection;
pub mod params;
pub mod prepared;
pub mod query;
pub mod worker;

// Re-export the public API
pub use command::{Binding, Command};
pub use config::{ConnectionOptions, ConnectionOptionsBuilder, DEFAULT_BUSY_TIMEOUT};
pub use connection::Connection;
pub use params::bind_parameter;
pub use prepared::{PreparedInsertCommand, PreparedStatement};
pub use query::read_column;
pub use worker::AsyncConnection;
