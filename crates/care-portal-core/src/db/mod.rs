//! Database layer for the care portal.

mod schema;
mod store;
mod patients;
mod doctors;
mod health;

pub use schema::*;
pub use store::*;
#[allow(unused_imports)]
pub use patients::*;
#[allow(unused_imports)]
pub use doctors::*;
#[allow(unused_imports)]
pub use health::*;

use rusqlite::{ffi, Connection};
use std::path::Path;
use thiserror::Error;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// A UNIQUE or PRIMARY KEY constraint rejected an insert.
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Invalid timestamp {0:?}: expected RFC 3339")]
    InvalidTimestamp(String),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl DbError {
    /// Map an insert failure, keeping uniqueness conflicts distinguishable.
    pub(crate) fn from_insert(e: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(err, msg) = &e {
            if matches!(
                err.extended_code,
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            ) {
                return DbError::UniqueViolation(msg.clone().unwrap_or_else(|| err.to_string()));
            }
        }
        DbError::Sqlite(e)
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::UniqueViolation(_))
    }
}

impl<T> From<std::sync::PoisonError<T>> for DbError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        DbError::LockPoisoned(e.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn test_open_file_twice() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portal.db");

        Database::open(&path).unwrap();
        // Schema is idempotent, reopening must not fail
        assert!(Database::open(&path).is_ok());
    }

    #[test]
    fn test_schema_initialized() {
        let db = Database::open_in_memory().unwrap();

        // Check that tables exist
        let tables: Vec<String> = db
            .conn()
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(tables.contains(&"users".to_string()));
        assert!(tables.contains(&"doctor".to_string()));
        assert!(tables.contains(&"doctor_patient_assignment".to_string()));
        assert!(tables.contains(&"vitals_monitoring".to_string()));
        assert!(tables.contains(&"breath_analysis".to_string()));
        assert!(tables.contains(&"patient_predictions_cache".to_string()));
    }

    #[test]
    fn test_unique_violation_is_distinguished() {
        let db = Database::open_in_memory().unwrap();
        db.conn()
            .execute(
                "INSERT INTO doctor (doctor_id, first_name, last_name) VALUES (1, 'A', 'B')",
                [],
            )
            .unwrap();

        let err = db
            .conn()
            .execute(
                "INSERT INTO doctor (doctor_id, first_name, last_name) VALUES (1, 'C', 'D')",
                [],
            )
            .map_err(DbError::from_insert)
            .unwrap_err();
        assert!(err.is_unique_violation());

        // NOT NULL failures are not uniqueness conflicts
        let err = db
            .conn()
            .execute("INSERT INTO doctor (doctor_id, last_name) VALUES (2, 'D')", [])
            .map_err(DbError::from_insert)
            .unwrap_err();
        assert!(!err.is_unique_violation());
    }
}
