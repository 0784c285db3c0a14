//! Core types for pgmock.
//!
//! This crate provides the data types shared between the mock engine and
//! the test code consuming it:
//!
//! - `Value` for dynamically-typed query parameters and column values
//! - `Row` for canned result rows with shared column metadata
//! - `Error` for the simulated database error taxonomy

pub mod error;
pub mod row;
pub mod value;

pub use error::{
    ConnectionError, ConnectionErrorKind, Error, QueryError, Result, TypeError,
};
pub use row::{ColumnInfo, FromValue, Row};
pub use value::Value;
