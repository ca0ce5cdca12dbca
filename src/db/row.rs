//! Result Row Module
//!
//! Materialized query results. Rows share one column-name vector with the
//! result set they came from; values are already converted into the scalar
//! set. Iteration is forward-only.

use std::sync::Arc;

use crate::core::{OrmError, Result};
use crate::value::Value;

/// A single row from a query result.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Arc<Vec<String>>,
    values: Vec<Value>,
}

impl Row {
    pub(crate) fn new(columns: Arc<Vec<String>>, values: Vec<Value>) -> Self {
        Row { columns, values }
    }

    /// The column names of this row's result set.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Raw value access by column name. Use this for nullable columns;
    /// the typed getters below refuse NULL.
    pub fn get(&self, column: &str) -> Result<&Value> {
        let idx = self
            .columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| OrmError::Mapping(format!("no such column in result: {column}")))?;
        Ok(&self.values[idx])
    }

    /// Raw value access by position.
    pub fn get_by_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn get_long(&self, column: &str) -> Result<i64> {
        self.get(column)?
            .as_long()
            .ok_or_else(|| OrmError::Mapping(format!("column '{column}' is not an integer")))
    }

    pub fn get_int(&self, column: &str) -> Result<i32> {
        self.get(column)?
            .as_int()
            .ok_or_else(|| OrmError::Mapping(format!("column '{column}' is not a 32-bit integer")))
    }

    pub fn get_text(&self, column: &str) -> Result<String> {
        self.get(column)?
            .as_text()
            .map(str::to_string)
            .ok_or_else(|| OrmError::Mapping(format!("column '{column}' is not text")))
    }

    pub fn get_bool(&self, column: &str) -> Result<bool> {
        self.get(column)?
            .as_bool()
            .ok_or_else(|| OrmError::Mapping(format!("column '{column}' is not a boolean")))
    }

    pub fn get_double(&self, column: &str) -> Result<f64> {
        self.get(column)?
            .as_double()
            .ok_or_else(|| OrmError::Mapping(format!("column '{column}' is not numeric")))
    }

    pub fn get_float(&self, column: &str) -> Result<f32> {
        Ok(self.get_double(column)? as f32)
    }
}

/// The materialized result of a query.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    columns: Arc<Vec<String>>,
    rows: Vec<Row>,
}

impl ResultSet {
    pub(crate) fn new(columns: Vec<String>) -> Self {
        ResultSet {
            columns: Arc::new(columns),
            rows: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, values: Vec<Value>) {
        self.rows.push(Row::new(Arc::clone(&self.columns), values));
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    /// Consumes the set, yielding the first row if any.
    pub fn into_first(mut self) -> Option<Row> {
        if self.rows.is_empty() {
            None
        } else {
            Some(self.rows.swap_remove(0))
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }
}

impl IntoIterator for ResultSet {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
