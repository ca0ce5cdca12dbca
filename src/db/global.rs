//! Process-wide Default Gateway
//!
//! An opt-in fallback for call sites that do not pass a gateway
//! explicitly. Nothing in the crate consults it when an explicit
//! reference is bound; installing one is always a visible act.
//!
//! The mutex serializes cross-thread users; single-threaded programs pay
//! one uncontended lock per fallback resolution.

use std::sync::Mutex;

use once_cell::sync::OnceCell;

use crate::core::{OrmError, Result};
use crate::db::Database;

static GLOBAL: OnceCell<Mutex<Option<Database>>> = OnceCell::new();

fn cell() -> &'static Mutex<Option<Database>> {
    GLOBAL.get_or_init(|| Mutex::new(None))
}

/// Installs `db` as the process-wide default, returning the previous one.
pub fn install(db: Database) -> Option<Database> {
    match cell().lock() {
        Ok(mut guard) => guard.replace(db),
        Err(poisoned) => poisoned.into_inner().replace(db),
    }
}

/// Removes and returns the installed default, if any.
pub fn take() -> Option<Database> {
    match cell().lock() {
        Ok(mut guard) => guard.take(),
        Err(poisoned) => poisoned.into_inner().take(),
    }
}

/// Whether a default gateway is currently installed.
pub fn is_installed() -> bool {
    match cell().lock() {
        Ok(guard) => guard.is_some(),
        Err(poisoned) => poisoned.into_inner().is_some(),
    }
}

/// Resolves the default gateway and runs `f` against it under the lock.
///
/// Fails with `NoDatabase` when nothing is installed.
pub fn with<R>(f: impl FnOnce(&Database) -> Result<R>) -> Result<R> {
    let guard = match cell().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    match guard.as_ref() {
        Some(db) => f(db),
        None => Err(OrmError::NoDatabase(
            "no global database installed".to_string(),
        )),
    }
}
