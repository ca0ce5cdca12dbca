//! Key-Value Table Mirror Module
//!
//! Mirrors an in-memory string map onto a two-column table. Each entry
//! tracks how it diverged from the stored state, so `save` emits only the
//! minimal set of INSERT/UPDATE/DELETE statements.
//!
//! `remove` is a toggle: removing an entry marks it for deletion while
//! remembering its previous state, and removing it again restores that
//! state. Callers rely on this to undo a pending removal before save.

use std::collections::HashMap;

use crate::core::Result;
use crate::db::Database;
use crate::query::Query;
use crate::value::{Value, ValueMap};

/// How an entry diverges from the stored table state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Matches the table; save emits nothing.
    Loaded,
    /// Not yet in the table; save emits INSERT.
    New,
    /// In the table with a different value; save emits UPDATE.
    Edited,
    /// Marked for deletion; save emits DELETE. Remembers the state to
    /// restore if the removal is toggled back off.
    Removed(PriorMode),
}

/// The states an entry can be in before it is marked removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PriorMode {
    Loaded,
    New,
    Edited,
}

impl Mode {
    /// The remove toggle: into `Removed` remembering the current state,
    /// or back out of it.
    fn toggle_removed(self) -> Mode {
        match self {
            Mode::Loaded => Mode::Removed(PriorMode::Loaded),
            Mode::New => Mode::Removed(PriorMode::New),
            Mode::Edited => Mode::Removed(PriorMode::Edited),
            Mode::Removed(PriorMode::Loaded) => Mode::Loaded,
            Mode::Removed(PriorMode::New) => Mode::New,
            Mode::Removed(PriorMode::Edited) => Mode::Edited,
        }
    }

    fn is_removed(self) -> bool {
        matches!(self, Mode::Removed(_))
    }
}

#[derive(Debug, Clone)]
struct StoredValue {
    value: String,
    mode: Mode,
}

/// A string-to-string map persisted as rows of a two-column table.
#[derive(Debug, Clone)]
pub struct KvTable {
    table: String,
    entries: HashMap<String, StoredValue>,
    saved: bool,
}

impl KvTable {
    /// An empty mirror over the given table.
    pub fn new(table: &str) -> Self {
        KvTable {
            table: table.to_string(),
            entries: HashMap::new(),
            saved: false,
        }
    }

    /// The table this mirror persists to.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Stores a value in the map. Not written to the table until
    /// [`save`](Self::save). A key already present (in any state) becomes
    /// Edited; an absent key becomes New.
    pub fn put(&mut self, key: &str, value: &str) {
        let mode = if self.entries.contains_key(key) {
            Mode::Edited
        } else {
            Mode::New
        };
        self.entries.insert(
            key.to_string(),
            StoredValue {
                value: value.to_string(),
                mode,
            },
        );
        self.saved = false;
    }

    /// Marks the entry for deletion at the next save; a second call
    /// restores it. Returns whether the key was present at all.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.mode = entry.mode.toggle_removed();
                self.saved = false;
                true
            }
            None => false,
        }
    }

    /// The value for `key`, unless absent or pending removal.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .filter(|entry| !entry.mode.is_removed())
            .map(|entry| entry.value.as_str())
    }

    /// Whether `key` holds a value that is not pending removal.
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Whether every change has been written to the table.
    pub fn is_saved(&self) -> bool {
        self.saved
    }

    /// Replaces the in-memory map with the table's current contents,
    /// everything Loaded.
    pub fn load(&mut self, db: &Database) -> Result<()> {
        let rows = Query::on(db).from(&self.table).rows()?;
        self.entries.clear();
        for row in &rows {
            self.entries.insert(
                row.get_text("key")?,
                StoredValue {
                    value: row.get_text("value")?,
                    mode: Mode::Loaded,
                },
            );
        }
        self.saved = true;
        Ok(())
    }

    /// Writes every pending change to the table: INSERT for New, UPDATE
    /// for Edited, DELETE for Removed, nothing for Loaded. Afterwards the
    /// mirror is fully saved: removed entries are gone and the rest are
    /// Loaded.
    pub fn save(&mut self, db: &Database) -> Result<()> {
        for (key, entry) in &self.entries {
            match entry.mode {
                Mode::Loaded => {}
                Mode::New => {
                    let mut values = ValueMap::new();
                    values.insert("key".to_string(), Value::from(key.as_str()));
                    values.insert("value".to_string(), Value::from(entry.value.as_str()));
                    Query::on(db).from(&self.table).insert(&values)?;
                }
                Mode::Edited => {
                    let mut values = ValueMap::new();
                    values.insert("value".to_string(), Value::from(entry.value.as_str()));
                    Query::on(db)
                        .from(&self.table)
                        .where_("key=?", &[Value::from(key.as_str())])
                        .update(&values)?;
                }
                Mode::Removed(_) => {
                    Query::on(db)
                        .from(&self.table)
                        .where_("key=?", &[Value::from(key.as_str())])
                        .drop_rows()?;
                }
            }
        }
        self.entries.retain(|_, entry| !entry.mode.is_removed());
        for entry in self.entries.values_mut() {
            entry.mode = Mode::Loaded;
        }
        self.saved = true;
        Ok(())
    }

    /// Creates the backing table, dropping any previous one.
    pub fn create_table(&self, db: &Database) -> Result<()> {
        db.run(&format!(
            "DROP TABLE IF EXISTS {table}; CREATE TABLE {table} (key varchar(50), value text);",
            table = self.table
        ))
    }
}
