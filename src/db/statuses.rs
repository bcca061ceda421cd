use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::*;
use crate::types::StatusKind;

const STATUS_COLUMNS: &str = "id, employee_id, person_id, national_id, kind, reason, category,
    start_date, end_date, document_path, created_by, created_at";

impl HrDb {
    // =========================================================================
    // Employee status entries
    // =========================================================================

    fn map_status_row(row: &Row<'_>) -> rusqlite::Result<DbStatusEntry> {
        Ok(DbStatusEntry {
            id: row.get(0)?,
            employee_id: row.get(1)?,
            person_id: row.get(2)?,
            national_id: row.get(3)?,
            kind: row.get(4)?,
            reason: row.get(5)?,
            category: row.get(6)?,
            start_date: row.get(7)?,
            end_date: row.get(8)?,
            document_path: row.get(9)?,
            created_by: row.get(10)?,
            created_at: row.get(11)?,
        })
    }

    /// True iff an unterminated blacklist entry exists for exactly this
    /// national ID string.
    pub fn is_blacklisted(&self, national_id: &str) -> Result<bool, DbError> {
        Ok(self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM employee_statuses
                WHERE national_id = ?1 AND kind = 'blacklist' AND end_date IS NULL
             )",
            params![national_id],
            |row| row.get(0),
        )?)
    }

    /// Start date of the most recent inactive entry for a national ID.
    pub fn latest_inactive_date(&self, national_id: &str) -> Result<Option<NaiveDate>, DbError> {
        Ok(self.conn.query_row(
            "SELECT MAX(start_date) FROM employee_statuses
             WHERE national_id = ?1 AND kind = 'inactive'",
            params![national_id],
            |row| row.get(0),
        )?)
    }

    /// Whether the national ID has ever been marked inactive.
    pub fn has_inactive_history(&self, national_id: &str) -> Result<bool, DbError> {
        Ok(self.latest_inactive_date(national_id)?.is_some())
    }

    pub fn record_status(
        &self,
        entry: &NewStatus<'_>,
        now: DateTime<Utc>,
    ) -> Result<DbStatusEntry, DbError> {
        self.conn.execute(
            "INSERT INTO employee_statuses (
                employee_id, person_id, national_id, kind, reason, category, start_date,
                end_date, document_path, created_by, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL, ?8, ?9, ?10)",
            params![
                entry.employee_id,
                entry.person_id,
                entry.national_id,
                entry.kind,
                entry.reason,
                entry.category,
                entry.start_date,
                entry.document_path,
                entry.actor,
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        let sql = format!("SELECT {STATUS_COLUMNS} FROM employee_statuses WHERE id = ?1");
        Ok(self.conn.query_row(&sql, params![id], Self::map_status_row)?)
    }

    /// The unterminated blacklist entry for a national ID, if any.
    pub fn open_blacklist(&self, national_id: &str) -> Result<Option<DbStatusEntry>, DbError> {
        let sql = format!(
            "SELECT {STATUS_COLUMNS} FROM employee_statuses
             WHERE national_id = ?1 AND kind = 'blacklist' AND end_date IS NULL"
        );
        Ok(self
            .conn
            .query_row(&sql, params![national_id], Self::map_status_row)
            .optional()?)
    }

    /// Set the end date of one status entry.
    pub fn end_status(
        &self,
        status_id: i64,
        end_date: NaiveDate,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<(), DbError> {
        self.conn.execute(
            "UPDATE employee_statuses SET end_date = ?1, updated_by = ?2, updated_at = ?3
             WHERE id = ?4 AND end_date IS NULL",
            params![end_date, actor, now, status_id],
        )?;
        Ok(())
    }

    /// Open entries of `kind` attached to one employee.
    pub fn open_statuses_for_employee(
        &self,
        employee_id: i64,
        kind: StatusKind,
    ) -> Result<Vec<DbStatusEntry>, DbError> {
        let sql = format!(
            "SELECT {STATUS_COLUMNS} FROM employee_statuses
             WHERE employee_id = ?1 AND kind = ?2 AND end_date IS NULL ORDER BY id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![employee_id, kind], Self::map_status_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn list_statuses(&self, employee_id: i64) -> Result<Vec<DbStatusEntry>, DbError> {
        let sql = format!(
            "SELECT {STATUS_COLUMNS} FROM employee_statuses
             WHERE employee_id = ?1 ORDER BY start_date, id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![employee_id], Self::map_status_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_employee, seed_org, test_db, ts, COMPANY_A};

    fn status<'a>(emp: &'a DbEmployee, kind: StatusKind, start: NaiveDate) -> NewStatus<'a> {
        NewStatus {
            employee_id: emp.id,
            person_id: emp.person_id,
            national_id: &emp.national_id,
            kind,
            reason: "test",
            category: None,
            start_date: start,
            document_path: None,
            actor: "hr",
        }
    }

    #[test]
    fn test_blacklist_lifecycle() {
        let db = test_db();
        seed_org(&db);
        let emp = seed_employee(&db, "1234567890123456", COMPANY_A);
        let day = NaiveDate::from_ymd_opt(2025, 3, 1).expect("date");

        assert!(!db.is_blacklisted(&emp.national_id).expect("query"));
        let entry = db
            .record_status(&status(&emp, StatusKind::Blacklist, day), ts(2025, 3, 1))
            .expect("record");
        assert!(db.is_blacklisted(&emp.national_id).expect("query"));
        assert!(!db.is_blacklisted("1234567890123457").expect("query"));

        db.end_status(entry.id, day, "owner", ts(2025, 3, 2)).expect("end");
        assert!(!db.is_blacklisted(&emp.national_id).expect("query"));
        assert!(db.open_blacklist(&emp.national_id).expect("query").is_none());
    }

    #[test]
    fn test_latest_inactive_date_picks_newest() {
        let db = test_db();
        seed_org(&db);
        let emp = seed_employee(&db, "1234567890123456", COMPANY_A);
        let older = NaiveDate::from_ymd_opt(2024, 1, 1).expect("date");
        let newer = NaiveDate::from_ymd_opt(2025, 1, 1).expect("date");

        assert_eq!(db.latest_inactive_date(&emp.national_id).expect("query"), None);
        db.record_status(&status(&emp, StatusKind::Inactive, newer), ts(2025, 1, 1))
            .expect("newer");
        db.record_status(&status(&emp, StatusKind::Inactive, older), ts(2025, 1, 2))
            .expect("older");
        db.record_status(&status(&emp, StatusKind::Infraction, ts(2025, 2, 1).date_naive()), ts(2025, 2, 1))
            .expect("infraction");

        assert_eq!(db.latest_inactive_date(&emp.national_id).expect("query"), Some(newer));
        assert_eq!(
            db.open_statuses_for_employee(emp.id, StatusKind::Inactive)
                .expect("open")
                .len(),
            2
        );
    }
}
