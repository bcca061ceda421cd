//! SQLite-backed store for personal records, employee records and their ledgers.
//!
//! One `HrDb` wraps one connection. Uniqueness invariants (person identity
//! numbers, national ID per company, one open placement per employee, one open
//! blacklist per national ID) are enforced by the schema; the lifecycle services
//! check them up front to produce field-targeted errors.

use std::path::Path;

use rusqlite::Connection;

pub mod audits;
pub mod employees;
pub mod org;
pub mod people;
pub mod placements;
pub mod statuses;
pub mod types;

pub use types::*;

pub struct HrDb {
    conn: Connection,
}

impl HrDb {
    /// Borrow the underlying connection for ad-hoc queries.
    pub fn conn_ref(&self) -> &Connection {
        &self.conn
    }

    /// Execute a closure within a SQLite transaction.
    /// Commits on Ok, rolls back on Err.
    pub fn with_transaction<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<DbError>,
    {
        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(DbError::from)?;
        match f(self) {
            Ok(val) => {
                if let Err(e) = self.conn.execute_batch("COMMIT") {
                    let _ = self.conn.execute_batch("ROLLBACK");
                    return Err(DbError::from(e).into());
                }
                Ok(val)
            }
            Err(e) => {
                let _ = self.conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }

    /// Open (or create) the database at `path` and apply the schema.
    pub fn open_at(path: &Path) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(DbError::CreateDir)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        crate::migrations::run_migrations(&conn).map_err(DbError::Migration)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        Ok(Self { conn })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_db;

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let db = test_db();
        let result: Result<(), DbError> = db.with_transaction(|tx| {
            tx.conn_ref()
                .execute("INSERT INTO companies (id, name) VALUES (900, 'Temp')", [])?;
            Err(DbError::Migration("forced".into()))
        });
        assert!(result.is_err());

        let count: i64 = db
            .conn_ref()
            .query_row("SELECT COUNT(*) FROM companies WHERE id = 900", [], |row| row.get(0))
            .expect("count");
        assert_eq!(count, 0);
    }

    #[test]
    fn test_transaction_commits_on_ok() {
        let db = test_db();
        db.with_transaction(|tx| -> Result<(), DbError> {
            tx.conn_ref()
                .execute("INSERT INTO companies (id, name) VALUES (901, 'Kept')", [])?;
            Ok(())
        })
        .expect("commit");

        let name: String = db
            .conn_ref()
            .query_row("SELECT name FROM companies WHERE id = 901", [], |row| row.get(0))
            .expect("row");
        assert_eq!(name, "Kept");
    }

    #[test]
    fn test_reopen_keeps_schema() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("hr.db");
        HrDb::open_at(&path).expect("first open");
        let db = HrDb::open_at(&path).expect("second open");
        let version: i64 = db
            .conn_ref()
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
            .expect("version");
        assert_eq!(version, 1);
    }
}
