//! Query Builder Module
//!
//! A chainable accumulator of clause fragments, optionally bound to a
//! gateway and a target table. Chain operations return the builder;
//! terminal operations render the statement, execute it through the
//! gateway, and map rows into records where a record type is given.
//!
//! Calling `where_` a second time conjoins the new condition with the
//! existing one as `(old) AND (new)`; argument order follows call order,
//! matching the positional placeholders.

use crate::core::{OrmError, Result};
use crate::db::{global, Database, ResultSet, Row};
use crate::record::{Record, COLUMN_ID};
use crate::value::{Value, ValueMap};

/// Accumulates SELECT/WHERE/GROUP BY/ORDER BY/LIMIT fragments and the
/// values bound to the WHERE placeholders.
#[derive(Clone)]
pub struct Query<'db> {
    db: Option<&'db Database>,
    table: Option<String>,
    select: Option<String>,
    where_clause: Option<String>,
    where_args: Vec<Value>,
    group_by: Option<String>,
    order_by: Option<String>,
    limit: Option<u32>,
}

impl Query<'static> {
    /// An unbound query; terminals resolve the process-wide default
    /// gateway.
    pub fn new() -> Query<'static> {
        Query {
            db: None,
            table: None,
            select: None,
            where_clause: None,
            where_args: Vec::new(),
            group_by: None,
            order_by: None,
            limit: None,
        }
    }
}

impl Default for Query<'static> {
    fn default() -> Self {
        Query::new()
    }
}

impl<'db> Query<'db> {
    /// A query bound to an explicit gateway.
    pub fn on(database: &'db Database) -> Query<'db> {
        Query::new().db(database)
    }

    /// Binds the gateway to execute against.
    pub fn db<'b>(self, database: &'b Database) -> Query<'b> {
        Query {
            db: Some(database),
            table: self.table,
            select: self.select,
            where_clause: self.where_clause,
            where_args: self.where_args,
            group_by: self.group_by,
            order_by: self.order_by,
            limit: self.limit,
        }
    }

    /// Sets the target table.
    pub fn from(mut self, table: &str) -> Self {
        self.table = Some(table.to_string());
        self
    }

    /// Sets the target table from a record type.
    pub fn of<T: Record>(self) -> Self {
        self.from(T::table_name())
    }

    /// Sets the SELECT list (defaults to `*`).
    pub fn select(mut self, select: &str) -> Self {
        self.select = Some(select.to_string());
        self
    }

    /// Adds a WHERE condition. A second call conjoins with the existing
    /// condition and appends its args after the existing ones.
    pub fn where_(mut self, clause: &str, args: &[Value]) -> Self {
        match self.where_clause.take() {
            Some(existing) => {
                self.where_clause = Some(format!("({existing}) AND ({clause})"));
            }
            None => {
                self.where_clause = Some(clause.to_string());
            }
        }
        self.where_args.extend_from_slice(args);
        self
    }

    /// WHERE on the identity column.
    pub fn where_id(self, id: i64) -> Self {
        self.where_(&format!("{COLUMN_ID} = ?"), &[Value::Long(id)])
    }

    pub fn group_by(mut self, group_by: &str) -> Self {
        self.group_by = Some(group_by.to_string());
        self
    }

    pub fn order_by(mut self, order_by: &str) -> Self {
        self.order_by = Some(order_by.to_string());
        self
    }

    /// Caps the number of rows returned. Unset means no limit.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    fn with_db<R>(&self, f: impl FnOnce(&Database) -> Result<R>) -> Result<R> {
        match self.db {
            Some(db) => f(db),
            None => global::with(f),
        }
    }

    fn target(&self) -> Result<&str> {
        self.table.as_deref().ok_or_else(|| {
            OrmError::UnboundQuery("no table bound; call from() or of()".to_string())
        })
    }

    fn run(&self, table: &str, select: Option<&str>, limit: Option<u32>) -> Result<ResultSet> {
        self.with_db(|db| {
            db.query(
                table,
                select.or(self.select.as_deref()),
                self.where_clause.as_deref(),
                &self.where_args,
                self.group_by.as_deref(),
                self.order_by.as_deref(),
                limit.or(self.limit),
            )
        })
    }

    /// Executes the query and returns the raw result set.
    pub fn rows(&self) -> Result<ResultSet> {
        self.run(self.target()?, None, None)
    }

    /// Executes with the limit forced to 1, returning the first row.
    pub fn first_row(&self) -> Result<Option<Row>> {
        Ok(self.run(self.target()?, None, Some(1))?.into_first())
    }

    /// Executes and maps every row into a record. An empty result is an
    /// empty vector, never an error.
    pub fn all<T: Record>(&self) -> Result<Vec<T>> {
        let table = match self.table.as_deref() {
            Some(table) => table,
            None => T::table_name(),
        };
        let result = self.run(table, None, None)?;
        result.iter().map(T::from_row).collect()
    }

    /// Maps the first row, if any, into a record.
    pub fn first<T: Record>(&self) -> Result<Option<T>> {
        let table = match self.table.as_deref() {
            Some(table) => table,
            None => T::table_name(),
        };
        match self.run(table, None, Some(1))?.into_first() {
            Some(row) => Ok(Some(T::from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Shorthand for `where_id(id).first()`.
    pub fn find<T: Record>(&self, id: i64) -> Result<Option<T>> {
        self.clone().where_id(id).first()
    }

    /// Row count of the query, 0 on an empty table.
    pub fn count(&self) -> Result<i64> {
        self.count_column("*")
    }

    pub fn count_column(&self, column: &str) -> Result<i64> {
        self.scalar(&format!("count({column})"))?
            .as_long()
            .ok_or_else(|| OrmError::Mapping("count() did not return an integer".to_string()))
    }

    /// `sum(column)` over the query; `Null` on an empty set.
    pub fn sum(&self, column: &str) -> Result<Value> {
        self.scalar(&format!("sum({column})"))
    }

    /// `min(column)` over the query; `Null` on an empty set.
    pub fn min(&self, column: &str) -> Result<Value> {
        self.scalar(&format!("min({column})"))
    }

    /// `max(column)` over the query; `Null` on an empty set.
    pub fn max(&self, column: &str) -> Result<Value> {
        self.scalar(&format!("max({column})"))
    }

    /// Rewrites the SELECT list to `expr`, executes, and returns row 1
    /// column 1.
    pub fn scalar(&self, expr: &str) -> Result<Value> {
        let result = self.run(self.target()?, Some(expr), Some(1))?;
        Ok(result
            .into_first()
            .and_then(|row| row.get_by_index(0).cloned())
            .unwrap_or(Value::Null))
    }

    /// Inserts `values` into the target table, returning the generated
    /// identity.
    pub fn insert(&self, values: &ValueMap) -> Result<i64> {
        let table = self.target()?;
        self.with_db(|db| db.insert(table, values))
    }

    /// Updates rows matched by the accumulated WHERE. The identity column
    /// is stripped from `values`. Returns rows affected.
    pub fn update(&self, values: &ValueMap) -> Result<usize> {
        let table = self.target()?;
        let mut values = values.clone();
        values.remove(COLUMN_ID);
        self.with_db(|db| {
            db.update(
                table,
                &values,
                self.where_clause.as_deref(),
                &self.where_args,
            )
        })
    }

    /// Updates the single row with the given identity.
    pub fn update_id(&self, id: i64, values: &ValueMap) -> Result<usize> {
        let table = self.target()?;
        let mut values = values.clone();
        values.remove(COLUMN_ID);
        self.with_db(|db| {
            db.update(
                table,
                &values,
                Some(&format!("{COLUMN_ID} = ?")),
                &[Value::Long(id)],
            )
        })
    }

    /// Deletes rows matched by the accumulated WHERE. Returns rows
    /// affected.
    pub fn drop_rows(&self) -> Result<usize> {
        let table = self.target()?;
        self.with_db(|db| db.delete(table, self.where_clause.as_deref(), &self.where_args))
    }

    /// Deletes the single row with the given identity.
    pub fn drop_id(&self, id: i64) -> Result<usize> {
        let table = self.target()?;
        self.with_db(|db| {
            db.delete(
                table,
                Some(&format!("{COLUMN_ID} = ?")),
                &[Value::Long(id)],
            )
        })
    }

    /// Raw passthrough: runs already-composed SQL with positional args.
    pub fn sql(&self, sql: &str, args: &[Value]) -> Result<ResultSet> {
        self.with_db(|db| db.raw_query(sql, args))
    }
}
