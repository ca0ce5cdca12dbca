//! activerow: a tiny active-record style ORM over embedded SQLite.
//!
//! Typed records and fluent queries are rendered into parameterized SQL
//! and executed through a single shared connection; result rows map back
//! into records. Identifiers are trusted input; only values are bound.

// Core infrastructure modules
pub mod core;

// Feature-specific modules
pub mod db;
pub mod kv;
pub mod query;
pub mod record;
pub mod statement;
pub mod value;

// Re-export the types most call sites need
pub use crate::core::{OrmError, Result};
pub use crate::db::{global, Canceller, Database, ResultSet, Row};
pub use crate::kv::KvTable;
pub use crate::query::Query;
pub use crate::record::{Record, COLUMN_ID, UNSAVED_ID};
pub use crate::statement::BatchStyle;
pub use crate::value::{Value, ValueMap};
