//! Active Record Module
//!
//! The mapped-entity abstraction. A record is either transient (identity
//! is the unsaved sentinel) or persisted (identity assigned by the
//! engine); `save` decides INSERT vs UPDATE from that state alone.
//!
//! There is no reflection: each mapped type supplies an explicit
//! descriptor — its table name, identity accessors, and how its
//! non-identity columns move between the struct and a row or value map.

use crate::core::Result;
use crate::db::{global, Database, Row};
use crate::query::Query;
use crate::value::{Value, ValueMap};

/// Name of the identity column on every mapped table.
pub const COLUMN_ID: &str = "id";

/// Identity sentinel for records that have never been persisted.
pub const UNSAVED_ID: i64 = -1;

/// A type mapped onto one database table, one instance per row.
///
/// Implementors provide the schema descriptor (the six required items);
/// the lifecycle methods are derived from it. `Default` must produce a
/// transient record, i.e. one whose identity is [`UNSAVED_ID`].
pub trait Record: Default {
    /// Table this type maps to. By convention the lower-cased type name.
    fn table_name() -> &'static str;

    /// Current identity, [`UNSAVED_ID`] when transient.
    fn id(&self) -> i64;

    fn set_id(&mut self, id: i64);

    /// Populates the non-identity fields from a result row.
    fn read_row(&mut self, row: &Row) -> Result<()>;

    /// Writes the non-identity columns into `values`.
    fn write_values(&self, values: &mut ValueMap);

    /// The non-identity column values in alphabetical column order, for
    /// batch insertion. Must agree with [`write_values`](Self::write_values)
    /// on arity and order.
    fn fast_values(&self) -> Vec<Value>;

    /// Whether this record has been persisted.
    fn is_saved(&self) -> bool {
        self.id() > UNSAVED_ID
    }

    /// Whether two records refer to the same row, by identity. Two
    /// transient records never do.
    fn same_row(&self, other: &Self) -> bool {
        self.is_saved() && self.id() == other.id()
    }

    /// Identity plus all mapped columns, as stored on save.
    fn values(&self) -> ValueMap {
        let mut map = ValueMap::new();
        map.insert(COLUMN_ID.to_string(), Value::Long(self.id()));
        self.write_values(&mut map);
        map
    }

    /// Builds an instance from a result row. The identity column is read
    /// first, then the descriptor fills in the rest.
    fn from_row(row: &Row) -> Result<Self>
    where
        Self: Sized,
    {
        let mut record = Self::default();
        record.set_id(row.get_long(COLUMN_ID)?);
        record.read_row(row)?;
        Ok(record)
    }

    /// Saves the record: INSERT when transient (capturing the generated
    /// identity), UPDATE keyed by identity when persisted.
    fn save(&mut self, db: &Database) -> Result<()> {
        if self.is_saved() {
            Query::on(db)
                .from(Self::table_name())
                .update_id(self.id(), &self.values())?;
        } else {
            let id = Query::on(db)
                .from(Self::table_name())
                .insert(&self.values())?;
            self.set_id(id);
        }
        Ok(())
    }

    /// [`save`](Self::save) against the process-wide default gateway.
    fn save_global(&mut self) -> Result<()> {
        global::with(|db| self.save(db))
    }

    /// Deletes the record's row and resets the identity to the transient
    /// sentinel, so a subsequent save inserts a fresh row. Returns the
    /// number of rows removed (0 for a transient record).
    fn drop_row(&mut self, db: &Database) -> Result<usize> {
        if !self.is_saved() {
            return Ok(0);
        }
        let dropped = Query::on(db)
            .from(Self::table_name())
            .drop_id(self.id())?;
        self.set_id(UNSAVED_ID);
        Ok(dropped)
    }

    /// [`drop_row`](Self::drop_row) against the process-wide default
    /// gateway.
    fn drop_global(&mut self) -> Result<usize> {
        global::with(|db| self.drop_row(db))
    }
}
