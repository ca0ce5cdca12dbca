//! Scalar Value Module
//!
//! A closed sum type over every scalar kind the ORM can bind to a SQL
//! placeholder or read back out of a result row. Binding dispatches on the
//! variant exhaustively, so a value that cannot be bound is unrepresentable.
//!
//! `Null` carries engine NULLs out of result rows (and the null results of
//! aggregates over empty sets); the builder API never produces it for
//! clause arguments.

use std::collections::BTreeMap;

use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::ToSql;

use crate::core::{OrmError, Result};

/// Column-name-to-value mapping used for INSERT and UPDATE.
///
/// A `BTreeMap` so iteration order is the sorted column order; rendering,
/// binding and the batch-insert template all rely on that determinism.
pub type ValueMap = BTreeMap<String, Value>;

/// A scalar that can be stored in a row or bound to a placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 32-bit integer
    Int(i32),
    /// 64-bit integer
    Long(i64),
    /// Text value
    Text(String),
    /// Boolean, stored as integer 1/0
    Bool(bool),
    /// Single-precision real, widened to 64-bit at the engine boundary
    Float(f32),
    /// Double-precision real
    Double(f64),
    /// SQL NULL
    Null,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Integer access, widening `Int` to 64 bits.
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(i64::from(*i)),
            Value::Long(i) => Some(*i),
            _ => None,
        }
    }

    /// 32-bit integer access; `Long` values outside `i32` range are refused.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Long(i) => i32::try_from(*i).ok(),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean access. SQLite stores booleans as integers, so 0/1 integers
    /// coerce.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(0) | Value::Long(0) => Some(false),
            Value::Int(1) | Value::Long(1) => Some(true),
            _ => None,
        }
    }

    /// Double access, accepting any numeric variant.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(f) => Some(*f),
            Value::Float(f) => Some(f64::from(*f)),
            Value::Int(i) => Some(f64::from(*i)),
            Value::Long(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Double(f) => Some(*f as f32),
            _ => None,
        }
    }

    /// Reads an engine value back into the scalar set.
    ///
    /// SQLite's storage classes map onto `Long`/`Double`/`Text`/`Null`;
    /// narrower variants only appear on values the caller constructed.
    /// BLOB columns are outside the scalar set and fail with a mapping
    /// error.
    pub(crate) fn from_sql_ref(value: ValueRef<'_>) -> Result<Value> {
        match value {
            ValueRef::Null => Ok(Value::Null),
            ValueRef::Integer(i) => Ok(Value::Long(i)),
            ValueRef::Real(f) => Ok(Value::Double(f)),
            ValueRef::Text(t) => Ok(Value::Text(String::from_utf8_lossy(t).into_owned())),
            ValueRef::Blob(_) => Err(OrmError::Mapping(
                "BLOB columns are not part of the scalar value set".to_string(),
            )),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Int(i) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(i64::from(*i))),
            Value::Long(i) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*i)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Bool(b) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(i64::from(*b))),
            Value::Float(f) => ToSqlOutput::Owned(rusqlite::types::Value::Real(f64::from(*f))),
            Value::Double(f) => ToSqlOutput::Owned(rusqlite::types::Value::Real(*f)),
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
        })
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}
