//! Statement Renderer Module
//!
//! Pure functions that turn clause fragments into parameterized SQL text.
//! No connection access happens here; rendering the same inputs twice
//! yields identical text and identical parameter order.
//!
//! Table and column names are trusted inputs and are never quoted or
//! escaped; only values travel through placeholders.

use crate::value::Value;

/// How a multi-row INSERT renders its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStyle {
    /// Every value becomes a placeholder. The default.
    Parameterized,
    /// Fast path: booleans render as `1`/`0`, numerics and NULL as
    /// literals, and only text values become placeholders.
    InlineLiterals,
}

/// Renders a SELECT statement from optional clause fragments.
///
/// Fragment order is SELECT, FROM, WHERE, GROUP BY, ORDER BY, LIMIT. An
/// absent clause contributes nothing; `select` defaults to `*`. The limit
/// is always a literal integer, never a placeholder.
pub fn select(
    table: &str,
    select: Option<&str>,
    where_clause: Option<&str>,
    group_by: Option<&str>,
    order_by: Option<&str>,
    limit: Option<u32>,
) -> String {
    let mut sql = format!("SELECT {} FROM {}", select.unwrap_or("*"), table);
    if let Some(w) = where_clause {
        sql.push_str(" WHERE ");
        sql.push_str(w);
    }
    if let Some(g) = group_by {
        sql.push_str(" GROUP BY ");
        sql.push_str(g);
    }
    if let Some(o) = order_by {
        sql.push_str(" ORDER BY ");
        sql.push_str(o);
    }
    if let Some(n) = limit {
        sql.push_str(" LIMIT ");
        sql.push_str(&n.to_string());
    }
    sql
}

/// Renders `UPDATE <table> SET c=?, ... [WHERE ...]` in the supplied
/// column order.
pub fn update(table: &str, columns: &[&str], where_clause: Option<&str>) -> String {
    let assignments: Vec<String> = columns.iter().map(|c| format!("{c}=?")).collect();
    let mut sql = format!("UPDATE {} SET {}", table, assignments.join(", "));
    if let Some(w) = where_clause {
        sql.push_str(" WHERE ");
        sql.push_str(w);
    }
    sql
}

/// Renders `INSERT INTO <table> (cols) VALUES (?, ...)`, one placeholder
/// per column. Callers strip the identity column before rendering.
pub fn insert(table: &str, columns: &[&str]) -> String {
    let placeholders = vec!["?"; columns.len()];
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(", "),
        placeholders.join(", ")
    )
}

/// Renders `DELETE FROM <table> [WHERE ...]`.
pub fn delete(table: &str, where_clause: Option<&str>) -> String {
    let mut sql = format!("DELETE FROM {table}");
    if let Some(w) = where_clause {
        sql.push_str(" WHERE ");
        sql.push_str(w);
    }
    sql
}

/// Renders one multi-row INSERT covering every value group in `rows`.
///
/// Returns the SQL text plus the values to bind, in order of appearance.
/// With `BatchStyle::Parameterized` that is every value in row-major
/// order; with `BatchStyle::InlineLiterals` non-text values are written
/// into the statement text and only text values are returned for binding.
pub fn batch_insert(
    table: &str,
    columns: &[&str],
    rows: &[Vec<Value>],
    style: BatchStyle,
) -> (String, Vec<Value>) {
    let mut sql = format!("INSERT INTO {} ({}) VALUES ", table, columns.join(", "));
    let mut params = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        sql.push('(');
        for (j, value) in row.iter().enumerate() {
            if j > 0 {
                sql.push(',');
            }
            match (style, value) {
                (BatchStyle::InlineLiterals, Value::Bool(b)) => {
                    sql.push_str(if *b { "1" } else { "0" });
                }
                (BatchStyle::InlineLiterals, Value::Int(v)) => sql.push_str(&v.to_string()),
                (BatchStyle::InlineLiterals, Value::Long(v)) => sql.push_str(&v.to_string()),
                (BatchStyle::InlineLiterals, Value::Float(v)) => sql.push_str(&v.to_string()),
                (BatchStyle::InlineLiterals, Value::Double(v)) => sql.push_str(&v.to_string()),
                (BatchStyle::InlineLiterals, Value::Null) => sql.push_str("NULL"),
                (BatchStyle::InlineLiterals, Value::Text(_)) | (BatchStyle::Parameterized, _) => {
                    sql.push('?');
                    params.push(value.clone());
                }
            }
        }
        if i < rows.len() - 1 {
            sql.push_str("), ");
        } else {
            sql.push(')');
        }
    }
    (sql, params)
}
