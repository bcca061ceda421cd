//! Organization lookups: companies, departments, sections, positions, roles.

use rusqlite::{params, OptionalExtension};

use super::*;
use crate::types::Placement;

impl HrDb {
    // =========================================================================
    // Organization
    // =========================================================================

    pub fn insert_company(&self, name: &str, parent_id: Option<i64>) -> Result<i64, DbError> {
        self.conn.execute(
            "INSERT INTO companies (name, parent_id) VALUES (?1, ?2)",
            params![name, parent_id],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn insert_department(&self, company_id: i64, name: &str) -> Result<i64, DbError> {
        self.conn.execute(
            "INSERT INTO departments (company_id, name) VALUES (?1, ?2)",
            params![company_id, name],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn insert_section(&self, department_id: i64, name: &str) -> Result<i64, DbError> {
        self.conn.execute(
            "INSERT INTO sections (department_id, name) VALUES (?1, ?2)",
            params![department_id, name],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn insert_position(
        &self,
        company_id: i64,
        section_id: Option<i64>,
        name: &str,
    ) -> Result<i64, DbError> {
        self.conn.execute(
            "INSERT INTO positions (company_id, section_id, name) VALUES (?1, ?2, ?3)",
            params![company_id, section_id, name],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn insert_role(&self, name: &str, level: i64) -> Result<i64, DbError> {
        self.conn.execute(
            "INSERT INTO roles (name, level) VALUES (?1, ?2)",
            params![name, level],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_role(&self, id: i64) -> Result<Option<DbRole>, DbError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, level FROM roles WHERE id = ?1",
                params![id],
                |row| {
                    Ok(DbRole {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        level: row.get(2)?,
                    })
                },
            )
            .optional()?)
    }

    pub fn company_name(&self, id: i64) -> Result<Option<String>, DbError> {
        Ok(self
            .conn
            .query_row("SELECT name FROM companies WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()?)
    }

    // -------------------------------------------------------------------------
    // Exact, case-sensitive name lookups within a parent scope
    // -------------------------------------------------------------------------

    pub fn find_company_by_name(&self, name: &str) -> Result<Option<i64>, DbError> {
        self.first_id("SELECT id FROM companies WHERE name = ?1 ORDER BY id LIMIT 1", params![name])
    }

    pub fn find_department_by_name(
        &self,
        company_id: i64,
        name: &str,
    ) -> Result<Option<i64>, DbError> {
        self.first_id(
            "SELECT id FROM departments WHERE company_id = ?1 AND name = ?2 ORDER BY id LIMIT 1",
            params![company_id, name],
        )
    }

    pub fn find_section_by_name(
        &self,
        department_id: i64,
        name: &str,
    ) -> Result<Option<i64>, DbError> {
        self.first_id(
            "SELECT id FROM sections WHERE department_id = ?1 AND name = ?2 ORDER BY id LIMIT 1",
            params![department_id, name],
        )
    }

    /// Position by name inside a section when one is given, otherwise anywhere
    /// in the company.
    pub fn find_position_by_name(
        &self,
        company_id: i64,
        section_id: Option<i64>,
        name: &str,
    ) -> Result<Option<i64>, DbError> {
        self.first_id(
            "SELECT id FROM positions
             WHERE company_id = ?1 AND (?2 IS NULL OR section_id = ?2) AND name = ?3
             ORDER BY id LIMIT 1",
            params![company_id, section_id, name],
        )
    }

    fn first_id(&self, sql: &str, args: impl rusqlite::Params) -> Result<Option<i64>, DbError> {
        Ok(self.conn.query_row(sql, args, |row| row.get(0)).optional()?)
    }

    /// Describe the first inconsistency in a placement (unknown company, or a
    /// department/section/position that belongs elsewhere). `None` when valid.
    pub fn placement_problem(
        &self,
        placement: &Placement,
    ) -> Result<Option<(&'static str, String)>, DbError> {
        if self.company_name(placement.company_id)?.is_none() {
            return Ok(Some(("company_id", format!("Unknown company {}", placement.company_id))));
        }
        if let Some(department_id) = placement.department_id {
            let owner = self.first_id(
                "SELECT company_id FROM departments WHERE id = ?1",
                params![department_id],
            )?;
            if owner != Some(placement.company_id) {
                return Ok(Some((
                    "department_id",
                    format!("Department {} is not part of company {}", department_id, placement.company_id),
                )));
            }
        }
        if let Some(section_id) = placement.section_id {
            let owner = self.first_id(
                "SELECT department_id FROM sections WHERE id = ?1",
                params![section_id],
            )?;
            if owner.is_none() || owner != placement.department_id {
                return Ok(Some((
                    "section_id",
                    format!("Section {} is not part of the selected department", section_id),
                )));
            }
        }
        if let Some(position_id) = placement.position_id {
            let owner = self.first_id(
                "SELECT company_id FROM positions WHERE id = ?1",
                params![position_id],
            )?;
            if owner != Some(placement.company_id) {
                return Ok(Some((
                    "position_id",
                    format!("Position {} is not part of company {}", position_id, placement.company_id),
                )));
            }
        }
        Ok(None)
    }
}
