//! SQLite bootstrap for the durable widget state.
//!
//! # Responsibility
//! - Open file or in-memory connections with required pragmas.
//! - Apply schema migrations before any state is read or written.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - A database written by a newer binary is refused, never downgraded.
//! - A failed migration rolls back and reports its version.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failures while opening or migrating the state database.
#[derive(Debug)]
pub enum DbError {
    /// Connection or statement failure outside migrations.
    Sqlite(rusqlite::Error),
    /// Migration `version` failed; the database keeps its previous version.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
    /// The file was written by a binary with a newer schema.
    SchemaTooNew { found: u32, supported: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "state database error: {err}"),
            Self::Migration { version, source } => {
                write!(f, "state database migration {version} failed: {source}")
            }
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "state database schema {found} is newer than this build supports ({supported})"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::Migration { source: err, .. } => Some(err),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
