use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::*;
use crate::scope::ScopeFilter;

const EMPLOYEE_COLUMNS: &str = "id, person_id, national_id, registration_number, employee_code,
    hire_date, active_date, office_email, photo_path, company_id, department_id, section_id,
    position_id, classification, grade, roster, work_location, is_active, version,
    created_by, created_at, updated_by, updated_at";

/// List filter for employee queries; the scope filter is applied separately.
#[derive(Debug, Clone, Default)]
pub struct EmployeeQuery {
    /// Case-insensitive match against name, national ID or employee code.
    pub search: Option<String>,
    pub include_inactive: bool,
    pub limit: Option<u32>,
}

impl HrDb {
    // =========================================================================
    // Employee records
    // =========================================================================

    pub(crate) fn map_employee_row(row: &Row<'_>) -> rusqlite::Result<DbEmployee> {
        Ok(DbEmployee {
            id: row.get(0)?,
            person_id: row.get(1)?,
            national_id: row.get(2)?,
            registration_number: row.get(3)?,
            employee_code: row.get(4)?,
            hire_date: row.get(5)?,
            active_date: row.get(6)?,
            office_email: row.get(7)?,
            photo_path: row.get(8)?,
            company_id: row.get(9)?,
            department_id: row.get(10)?,
            section_id: row.get(11)?,
            position_id: row.get(12)?,
            classification: row.get(13)?,
            grade: row.get(14)?,
            roster: row.get(15)?,
            work_location: row.get(16)?,
            is_active: row.get::<_, i32>(17)? != 0,
            version: row.get(18)?,
            created_by: row.get(19)?,
            created_at: row.get(20)?,
            updated_by: row.get(21)?,
            updated_at: row.get(22)?,
        })
    }

    pub fn get_employee(&self, id: i64) -> Result<Option<DbEmployee>, DbError> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?1");
        Ok(self
            .conn
            .query_row(&sql, params![id], Self::map_employee_row)
            .optional()?)
    }

    /// The employee holding `national_id` in `company_id`, if any.
    pub fn find_employee_in_company(
        &self,
        national_id: &str,
        company_id: i64,
    ) -> Result<Option<DbEmployee>, DbError> {
        let sql = format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE national_id = ?1 AND company_id = ?2"
        );
        Ok(self
            .conn
            .query_row(&sql, params![national_id, company_id], Self::map_employee_row)
            .optional()?)
    }

    /// All employments of a national ID, newest first.
    pub fn find_employees_by_national_id(
        &self,
        national_id: &str,
    ) -> Result<Vec<DbEmployee>, DbError> {
        let sql = format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE national_id = ?1
             ORDER BY COALESCE(updated_at, created_at) DESC, id DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![national_id], Self::map_employee_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Most recent employment of `national_id` in any company other than
    /// `company_id`.
    pub fn latest_employee_elsewhere(
        &self,
        national_id: &str,
        company_id: i64,
    ) -> Result<Option<DbEmployee>, DbError> {
        let sql = format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees
             WHERE national_id = ?1 AND company_id <> ?2
             ORDER BY COALESCE(updated_at, created_at) DESC, id DESC
             LIMIT 1"
        );
        Ok(self
            .conn
            .query_row(&sql, params![national_id, company_id], Self::map_employee_row)
            .optional()?)
    }

    pub fn find_employee_by_code(&self, code: &str) -> Result<Option<DbEmployee>, DbError> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE employee_code = ?1");
        Ok(self
            .conn
            .query_row(&sql, params![code], Self::map_employee_row)
            .optional()?)
    }

    pub fn employee_code_exists(&self, code: &str) -> Result<bool, DbError> {
        Ok(self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM employees WHERE employee_code = ?1)",
            params![code],
            |row| row.get(0),
        )?)
    }

    pub fn insert_employee(
        &self,
        person_id: i64,
        employee_code: &str,
        data: &EmployeeData,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<DbEmployee, DbError> {
        self.conn.execute(
            "INSERT INTO employees (
                person_id, national_id, registration_number, employee_code, hire_date,
                active_date, office_email, photo_path, company_id, department_id, section_id,
                position_id, classification, grade, roster, work_location, is_active,
                version, created_by, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                       ?16, ?17, 1, ?18, ?19)",
            params![
                person_id,
                data.national_id,
                data.registration_number,
                employee_code,
                data.hire_date,
                data.active_date,
                data.office_email,
                data.photo_path,
                data.placement.company_id,
                data.placement.department_id,
                data.placement.section_id,
                data.placement.position_id,
                data.classification,
                data.grade,
                data.roster,
                data.work_location,
                data.is_active as i32,
                actor,
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_employee(id)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Overwrite an employee's mutable fields when the stored version still
    /// equals `expected_version`; bumps the version.
    pub fn update_employee(
        &self,
        id: i64,
        data: &EmployeeData,
        expected_version: i64,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<DbEmployee, DbError> {
        let changed = self.conn.execute(
            "UPDATE employees SET
                national_id = ?1, registration_number = ?2, hire_date = ?3, active_date = ?4,
                office_email = ?5, photo_path = ?6, company_id = ?7, department_id = ?8,
                section_id = ?9, position_id = ?10, classification = ?11, grade = ?12,
                roster = ?13, work_location = ?14, is_active = ?15,
                version = version + 1, updated_by = ?16, updated_at = ?17
             WHERE id = ?18 AND version = ?19",
            params![
                data.national_id,
                data.registration_number,
                data.hire_date,
                data.active_date,
                data.office_email,
                data.photo_path,
                data.placement.company_id,
                data.placement.department_id,
                data.placement.section_id,
                data.placement.position_id,
                data.classification,
                data.grade,
                data.roster,
                data.work_location,
                data.is_active as i32,
                actor,
                now,
                id,
                expected_version,
            ],
        )?;
        if changed == 0 {
            return Err(DbError::StaleVersion {
                table: "employees",
                id,
                expected: expected_version,
            });
        }
        self.get_employee(id)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Flip the active flag; bumps the version.
    pub fn set_employee_active(
        &self,
        id: i64,
        is_active: bool,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<(), DbError> {
        self.conn.execute(
            "UPDATE employees SET is_active = ?1, version = version + 1,
                updated_by = ?2, updated_at = ?3
             WHERE id = ?4",
            params![is_active as i32, actor, now, id],
        )?;
        Ok(())
    }

    /// Employees visible through `filter`, ordered by person name.
    pub fn list_employees(
        &self,
        filter: &ScopeFilter,
        query: &EmployeeQuery,
    ) -> Result<Vec<DbEmployee>, DbError> {
        let (scope_column, scope_value) = match *filter {
            ScopeFilter::Unrestricted => (None, None),
            ScopeFilter::Company(id) => (Some("e.company_id"), Some(id)),
            ScopeFilter::Department(id) => (Some("e.department_id"), Some(id)),
            ScopeFilter::Section(id) => (Some("e.section_id"), Some(id)),
            ScopeFilter::Position(id) => (Some("e.position_id"), Some(id)),
        };
        let scope_clause = match scope_column {
            Some(column) => format!("{column} = ?1"),
            None => "?1 IS NULL".to_string(),
        };
        let columns = EMPLOYEE_COLUMNS
            .split(',')
            .map(|c| format!("e.{}", c.trim()))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {columns} FROM employees e
             JOIN people p ON p.id = e.person_id
             WHERE {scope_clause}
               AND (?2 = 1 OR e.is_active = 1)
               AND (?3 IS NULL
                    OR LOWER(p.name) LIKE '%' || LOWER(?3) || '%'
                    OR e.national_id LIKE '%' || ?3 || '%'
                    OR e.employee_code LIKE '%' || UPPER(?3) || '%')
             ORDER BY p.name, e.id
             LIMIT ?4"
        );
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let limit = query.limit.map(i64::from).unwrap_or(-1);

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![scope_value, query.include_inactive as i32, search, limit],
            Self::map_employee_row,
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // =========================================================================
    // Vaccinations
    // =========================================================================

    pub fn insert_vaccination(
        &self,
        employee_id: i64,
        dose: i64,
        vaccine: &str,
        vaccinated_on: Option<chrono::NaiveDate>,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<i64, DbError> {
        self.conn.execute(
            "INSERT INTO employee_vaccinations
                (employee_id, dose, vaccine, vaccinated_on, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![employee_id, dose, vaccine, vaccinated_on, actor, now],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn list_vaccinations(&self, employee_id: i64) -> Result<Vec<DbVaccination>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, employee_id, dose, vaccine, vaccinated_on, created_at
             FROM employee_vaccinations WHERE employee_id = ?1 ORDER BY dose, id",
        )?;
        let rows = stmt.query_map(params![employee_id], |row| {
            Ok(DbVaccination {
                id: row.get(0)?,
                employee_id: row.get(1)?,
                dose: row.get(2)?,
                vaccine: row.get(3)?,
                vaccinated_on: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
