//! Core Module
//!
//! Infrastructure shared by every layer of the crate: the error taxonomy
//! and its crate-wide `Result` alias.

pub mod error;

// Re-export commonly used types for convenience
pub use error::{OrmError, Result};
