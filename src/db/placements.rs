use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::*;

const PLACEMENT_COLUMNS: &str = "id, employee_id, person_id, national_id, from_company_id,
    to_company_id, department_id, section_id, position_id, role_label, start_date, end_date,
    status, source, created_by, created_at";

impl HrDb {
    // =========================================================================
    // Placement history ledger
    // =========================================================================

    fn map_placement_row(row: &Row<'_>) -> rusqlite::Result<DbPlacement> {
        Ok(DbPlacement {
            id: row.get(0)?,
            employee_id: row.get(1)?,
            person_id: row.get(2)?,
            national_id: row.get(3)?,
            from_company_id: row.get(4)?,
            to_company_id: row.get(5)?,
            department_id: row.get(6)?,
            section_id: row.get(7)?,
            position_id: row.get(8)?,
            role_label: row.get(9)?,
            start_date: row.get(10)?,
            end_date: row.get(11)?,
            status: row.get(12)?,
            source: row.get(13)?,
            created_by: row.get(14)?,
            created_at: row.get(15)?,
        })
    }

    /// Append a placement and close the employee's previously open entry.
    ///
    /// The previous entry only ever receives an end date (the new start date);
    /// no other column of an existing row is touched. A new entry never starts
    /// before the open one, so a future-dated hire cannot end before it starts.
    pub fn append_transition(
        &self,
        entry: &NewPlacement<'_>,
        now: DateTime<Utc>,
    ) -> Result<DbPlacement, DbError> {
        let open_start: Option<NaiveDate> = self.conn.query_row(
            "SELECT MAX(start_date) FROM placement_history
             WHERE employee_id = ?1 AND end_date IS NULL",
            params![entry.employee_id],
            |row| row.get(0),
        )?;
        let start_date = open_start.map_or(entry.start_date, |open| open.max(entry.start_date));

        self.conn.execute(
            "UPDATE placement_history SET end_date = ?1
             WHERE employee_id = ?2 AND end_date IS NULL",
            params![start_date, entry.employee_id],
        )?;
        self.conn.execute(
            "INSERT INTO placement_history (
                employee_id, person_id, national_id, from_company_id, to_company_id,
                department_id, section_id, position_id, role_label, start_date, end_date,
                status, source, created_by, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, NULL, ?11, ?12, ?13, ?14)",
            params![
                entry.employee_id,
                entry.person_id,
                entry.national_id,
                entry.from_company_id,
                entry.placement.company_id,
                entry.placement.department_id,
                entry.placement.section_id,
                entry.placement.position_id,
                entry.role_label,
                start_date,
                entry.status,
                entry.source,
                entry.actor,
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        let sql = format!("SELECT {PLACEMENT_COLUMNS} FROM placement_history WHERE id = ?1");
        Ok(self.conn.query_row(&sql, params![id], Self::map_placement_row)?)
    }

    /// Full ledger for one employee, in append order.
    pub fn list_placements(&self, employee_id: i64) -> Result<Vec<DbPlacement>, DbError> {
        let sql = format!(
            "SELECT {PLACEMENT_COLUMNS} FROM placement_history
             WHERE employee_id = ?1 ORDER BY id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![employee_id], Self::map_placement_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// The single open entry (end date NULL) for an employee.
    pub fn current_placement(&self, employee_id: i64) -> Result<Option<DbPlacement>, DbError> {
        let sql = format!(
            "SELECT {PLACEMENT_COLUMNS} FROM placement_history
             WHERE employee_id = ?1 AND end_date IS NULL"
        );
        Ok(self
            .conn
            .query_row(&sql, params![employee_id], Self::map_placement_row)
            .optional()?)
    }
}
