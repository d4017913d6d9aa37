mod core;
mod dml;
mod select;

pub use core::Connection;
