use chrono::{DateTime, Utc};
use rusqlite::params;

use super::*;
use crate::audit::FieldChange;
use crate::types::AuditSource;

/// Identity of the employee a batch of field changes belongs to.
#[derive(Debug, Clone, Copy)]
pub struct AuditSubject<'a> {
    pub employee_id: i64,
    pub person_id: i64,
    pub national_id: &'a str,
}

impl HrDb {
    // =========================================================================
    // Field audit trail
    // =========================================================================

    /// Append one row per change. Callers pass only real changes (see
    /// `audit::diff_fields`).
    pub fn insert_field_audits(
        &self,
        subject: AuditSubject<'_>,
        changes: &[FieldChange],
        source: AuditSource,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<usize, DbError> {
        let mut stmt = self.conn.prepare(
            "INSERT INTO field_audits (
                employee_id, person_id, national_id, field, old_value, new_value,
                changed_by, changed_at, source
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;
        for change in changes {
            stmt.execute(params![
                subject.employee_id,
                subject.person_id,
                subject.national_id,
                change.field,
                change.old_value,
                change.new_value,
                actor,
                now,
                source,
            ])?;
        }
        Ok(changes.len())
    }

    pub fn list_field_audits(&self, employee_id: i64) -> Result<Vec<DbFieldAudit>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, employee_id, person_id, national_id, field, old_value, new_value,
                    changed_by, changed_at, source
             FROM field_audits WHERE employee_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![employee_id], |row| {
            Ok(DbFieldAudit {
                id: row.get(0)?,
                employee_id: row.get(1)?,
                person_id: row.get(2)?,
                national_id: row.get(3)?,
                field: row.get(4)?,
                old_value: row.get(5)?,
                new_value: row.get(6)?,
                changed_by: row.get(7)?,
                changed_at: row.get(8)?,
                source: row.get(9)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
