//! Database Gateway Module
//!
//! Owns the single shared connection and exposes the blocking query /
//! update / insert / delete / raw-SQL primitives everything else is built
//! on. Statements are rendered by the statement module and bound here;
//! every call blocks until the engine returns.
//!
//! ## Cancellation
//!
//! The connection runs at most one statement at a time. An in-flight flag
//! is set around statement execution; `cancel` interrupts the engine if
//! the flag is up. `canceller` hands out a `Send` token for cross-thread
//! interruption so concurrent callers never race on gateway state. An
//! interrupted call fails with `OrmError::Cancelled`.

pub mod global;
pub mod row;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rusqlite::{Connection, InterruptHandle, Statement};
use tracing::{debug, error};

use crate::core::{OrmError, Result};
use crate::record::{Record, COLUMN_ID};
use crate::statement::{self, BatchStyle};
use crate::value::{Value, ValueMap};

pub use row::{ResultSet, Row};

/// Pragmas applied to every new connection.
const CONNECT_PRAGMAS: &str = "
    PRAGMA foreign_keys = ON;
    PRAGMA journal_mode = WAL;
";

/// Gateway to one SQLite database.
///
/// Exclusively owns the live connection. Access is single-threaded; to
/// share across threads, install it as the process-wide default (see
/// [`global`]) and let the mutex serialize callers.
pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
    busy: Arc<AtomicBool>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").field("path", &self.path).finish()
    }
}

/// A `Send` token that can interrupt the connection's in-flight statement
/// from another thread.
pub struct Canceller {
    handle: InterruptHandle,
    busy: Arc<AtomicBool>,
}

impl Canceller {
    /// Interrupts the running statement, if any. Returns whether one was
    /// in flight.
    pub fn cancel(&self) -> bool {
        if self.busy.load(Ordering::SeqCst) {
            self.handle.interrupt();
            true
        } else {
            false
        }
    }
}

/// Clears the in-flight flag when statement execution ends, on every path.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Binds each value at one-based positions `start, start+1, ..`,
/// dispatching on the scalar variant. The position advances once per
/// value.
fn bind_values<'a>(
    stmt: &mut Statement<'_>,
    values: impl IntoIterator<Item = &'a Value>,
    start: usize,
) -> Result<usize> {
    let mut pos = start;
    for value in values {
        stmt.raw_bind_parameter(pos, value)
            .map_err(OrmError::from_engine)?;
        pos += 1;
    }
    Ok(pos)
}

impl Database {
    /// Opens (creating if needed) a database file and applies the connect
    /// pragmas.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).map_err(OrmError::from_engine)?;
        conn.execute_batch(CONNECT_PRAGMAS)
            .map_err(OrmError::from_engine)?;
        debug!(path = %path.as_ref().display(), "opened database");
        Ok(Database {
            conn,
            path: Some(path.as_ref().to_path_buf()),
            busy: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Opens a fresh in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(OrmError::from_engine)?;
        conn.execute_batch(CONNECT_PRAGMAS)
            .map_err(OrmError::from_engine)?;
        Ok(Database {
            conn,
            path: None,
            busy: Arc::new(AtomicBool::new(false)),
        })
    }

    /// The file backing this database, `None` for in-memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Installs this database as the process-wide default, returning the
    /// previous one if any.
    pub fn globalize(self) -> Option<Database> {
        global::install(self)
    }

    /// Runs a SELECT assembled from clause fragments.
    ///
    /// Absent clauses contribute nothing to the SQL; `where_args` fill the
    /// WHERE placeholders in order, starting at position 1.
    pub fn query(
        &self,
        table: &str,
        select: Option<&str>,
        where_clause: Option<&str>,
        where_args: &[Value],
        group_by: Option<&str>,
        order_by: Option<&str>,
        limit: Option<u32>,
    ) -> Result<ResultSet> {
        let sql = statement::select(table, select, where_clause, group_by, order_by, limit);
        self.raw_query(&sql, where_args)
    }

    /// Runs an UPDATE. SET values bind first (positions 1..=N in column
    /// order), where-args after. Returns rows affected.
    pub fn update(
        &self,
        table: &str,
        values: &ValueMap,
        where_clause: Option<&str>,
        where_args: &[Value],
    ) -> Result<usize> {
        let columns: Vec<&str> = values.keys().map(String::as_str).collect();
        let sql = statement::update(table, &columns, where_clause);
        debug!(sql = %sql, "update");
        let mut stmt = self.prepare(&sql)?;
        let next = bind_values(&mut stmt, values.values(), 1)?;
        bind_values(&mut stmt, where_args, next)?;
        self.execute_raw(&mut stmt)
    }

    /// Inserts one row. The identity column is stripped from `values`
    /// because the engine assigns it. Returns the generated identity.
    pub fn insert(&self, table: &str, values: &ValueMap) -> Result<i64> {
        let columns: Vec<&str> = values
            .keys()
            .map(String::as_str)
            .filter(|c| *c != COLUMN_ID)
            .collect();
        let sql = statement::insert(table, &columns);
        debug!(sql = %sql, "insert");
        let mut stmt = self.prepare(&sql)?;
        bind_values(
            &mut stmt,
            values
                .iter()
                .filter(|(k, _)| k.as_str() != COLUMN_ID)
                .map(|(_, v)| v),
            1,
        )?;
        self.execute_raw(&mut stmt)?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Inserts up to `limit` records in one multi-row statement, every
    /// value parameterized.
    pub fn batch_insert<T: Record>(&self, items: &[T], limit: usize) -> Result<()> {
        self.batch_insert_with(items, limit, BatchStyle::Parameterized)
    }

    /// Fast path: non-text values are inlined as SQL literals (booleans
    /// as `1`/`0`), only text values are bound. Use only when the
    /// non-text columns never carry untrusted input.
    pub fn batch_insert_inlined<T: Record>(&self, items: &[T], limit: usize) -> Result<()> {
        self.batch_insert_with(items, limit, BatchStyle::InlineLiterals)
    }

    fn batch_insert_with<T: Record>(
        &self,
        items: &[T],
        limit: usize,
        style: BatchStyle,
    ) -> Result<()> {
        if limit == 0 {
            return Ok(());
        }
        let count = limit.min(items.len());
        if count == 0 {
            return Ok(());
        }

        // Template: the first record's sorted non-identity column set.
        let mut template = ValueMap::new();
        items[0].write_values(&mut template);
        template.remove(COLUMN_ID);
        let columns: Vec<&str> = template.keys().map(String::as_str).collect();

        let mut rows = Vec::with_capacity(count);
        for (i, item) in items[..count].iter().enumerate() {
            let values = item.fast_values();
            if values.len() != columns.len() {
                return Err(OrmError::ShapeMismatch(format!(
                    "record {} emits {} values but the template has {} columns",
                    i,
                    values.len(),
                    columns.len()
                )));
            }
            rows.push(values);
        }

        let (sql, params) = statement::batch_insert(T::table_name(), &columns, &rows, style);
        debug!(sql = %sql, rows = count, "batch insert");
        let mut stmt = self.prepare(&sql)?;
        bind_values(&mut stmt, &params, 1)?;
        self.execute_raw(&mut stmt)?;
        Ok(())
    }

    /// Runs a DELETE. Returns rows affected.
    pub fn delete(
        &self,
        table: &str,
        where_clause: Option<&str>,
        where_args: &[Value],
    ) -> Result<usize> {
        let sql = statement::delete(table, where_clause);
        debug!(sql = %sql, "delete");
        let mut stmt = self.prepare(&sql)?;
        bind_values(&mut stmt, where_args, 1)?;
        self.execute_raw(&mut stmt)
    }

    /// Escape hatch: runs already-composed SQL with positional args and
    /// returns the materialized result.
    pub fn raw_query(&self, sql: &str, args: &[Value]) -> Result<ResultSet> {
        debug!(sql = %sql, "query");
        let mut stmt = self.prepare(sql)?;
        bind_values(&mut stmt, args, 1)?;

        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let column_count = columns.len();
        let mut result = ResultSet::new(columns);

        self.busy.store(true, Ordering::SeqCst);
        let _guard = BusyGuard(&self.busy);
        let mut rows = stmt.raw_query();
        loop {
            match rows.next() {
                Ok(Some(row)) => {
                    let mut values = Vec::with_capacity(column_count);
                    for i in 0..column_count {
                        let value = row.get_ref(i).map_err(OrmError::from_engine)?;
                        values.push(Value::from_sql_ref(value)?);
                    }
                    result.push(values);
                }
                Ok(None) => break,
                Err(e) => {
                    error!(sql = %sql, error = %e, "query failed");
                    return Err(OrmError::from_engine(e));
                }
            }
        }
        debug!(rows = result.len(), "query finished");
        Ok(result)
    }

    /// Runs SQL that returns no result. Accepts multiple `;`-separated
    /// statements.
    pub fn run(&self, sql: &str) -> Result<()> {
        debug!(sql = %sql, "run");
        self.busy.store(true, Ordering::SeqCst);
        let _guard = BusyGuard(&self.busy);
        self.conn.execute_batch(sql).map_err(|e| {
            error!(sql = %sql, error = %e, "run failed");
            OrmError::from_engine(e)
        })
    }

    /// Suspends autocommit (opens an explicit transaction). Speeds up
    /// bulk imports; must be paired with [`commit`](Self::commit).
    pub fn suspend_autocommit(&self) -> Result<()> {
        self.conn.execute_batch("BEGIN").map_err(OrmError::from_engine)
    }

    /// Commits outstanding changes and restores autocommit.
    pub fn commit(&self) -> Result<()> {
        self.conn.execute_batch("COMMIT").map_err(OrmError::from_engine)
    }

    /// Interrupts the currently executing statement, if any. Returns
    /// whether one was in flight.
    pub fn cancel(&self) -> bool {
        if self.busy.load(Ordering::SeqCst) {
            self.conn.get_interrupt_handle().interrupt();
            true
        } else {
            false
        }
    }

    /// A `Send` cancellation token for this connection, usable from other
    /// threads while this one is blocked in a call.
    pub fn canceller(&self) -> Canceller {
        Canceller {
            handle: self.conn.get_interrupt_handle(),
            busy: Arc::clone(&self.busy),
        }
    }

    /// Closes the database.
    pub fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, e)| OrmError::Database(e))
    }

    fn prepare(&self, sql: &str) -> Result<Statement<'_>> {
        self.conn
            .prepare(sql)
            .map_err(|e| OrmError::Query(format!("failed to prepare statement: {e}")))
    }

    fn execute_raw(&self, stmt: &mut Statement<'_>) -> Result<usize> {
        self.busy.store(true, Ordering::SeqCst);
        let _guard = BusyGuard(&self.busy);
        stmt.raw_execute().map_err(|e| {
            error!(error = %e, "statement failed");
            OrmError::from_engine(e)
        })
    }
}
