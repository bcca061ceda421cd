//! Shared type definitions for the database layer.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Citizenship, Placement, PlacementSource, PlacementStatus, StatusKind};

/// Errors specific to database operations.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to create database directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Schema migration failed: {0}")]
    Migration(String),

    /// Optimistic concurrency check failed: the row changed since it was read.
    #[error("{table} {id} was modified by someone else (expected version {expected})")]
    StaleVersion {
        table: &'static str,
        id: i64,
        expected: i64,
    },
}

impl DbError {
    /// True when the underlying failure is a UNIQUE constraint violation.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            DbError::Sqlite(rusqlite::Error::SqliteFailure(err, _)) => {
                err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
            }
            _ => false,
        }
    }
}

/// A row from the `people` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbPerson {
    pub id: i64,
    pub national_id: Option<String>,
    pub family_card_number: Option<String>,
    pub name: String,
    pub alias: Option<String>,
    pub gender: Option<String>,
    pub birth_place: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub marital_status: Option<String>,
    pub citizenship: Citizenship,
    pub personal_email: Option<String>,
    pub phone: Option<String>,
    pub phone_alt: Option<String>,
    pub tax_number: Option<String>,
    pub insurance_number: Option<String>,
    pub province: Option<String>,
    pub regency: Option<String>,
    pub district: Option<String>,
    pub village: Option<String>,
    pub postal_code: Option<String>,
    pub version: i64,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_by: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Person-level fields written by `upsert_person`. Text is expected to be
/// normalized already (trimmed, empty → `None`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonData {
    pub national_id: Option<String>,
    pub family_card_number: Option<String>,
    pub name: String,
    pub alias: Option<String>,
    pub gender: Option<String>,
    pub birth_place: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub marital_status: Option<String>,
    pub citizenship: Citizenship,
    pub personal_email: Option<String>,
    pub phone: Option<String>,
    pub phone_alt: Option<String>,
    pub tax_number: Option<String>,
    pub insurance_number: Option<String>,
    pub province: Option<String>,
    pub regency: Option<String>,
    pub district: Option<String>,
    pub village: Option<String>,
    pub postal_code: Option<String>,
}

/// A row from the `employees` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbEmployee {
    pub id: i64,
    pub person_id: i64,
    pub national_id: String,
    pub registration_number: Option<String>,
    pub employee_code: String,
    pub hire_date: Option<NaiveDate>,
    pub active_date: Option<NaiveDate>,
    pub office_email: Option<String>,
    pub photo_path: Option<String>,
    pub company_id: i64,
    pub department_id: Option<i64>,
    pub section_id: Option<i64>,
    pub position_id: Option<i64>,
    pub classification: Option<String>,
    pub grade: Option<String>,
    pub roster: Option<String>,
    pub work_location: Option<String>,
    pub is_active: bool,
    pub version: i64,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_by: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl DbEmployee {
    pub fn placement(&self) -> Placement {
        Placement {
            company_id: self.company_id,
            department_id: self.department_id,
            section_id: self.section_id,
            position_id: self.position_id,
        }
    }
}

/// Employee-level fields written on insert/update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeData {
    pub national_id: String,
    pub registration_number: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub active_date: Option<NaiveDate>,
    pub office_email: Option<String>,
    pub photo_path: Option<String>,
    pub placement: Placement,
    pub classification: Option<String>,
    pub grade: Option<String>,
    pub roster: Option<String>,
    pub work_location: Option<String>,
    pub is_active: bool,
}

impl From<&DbPerson> for PersonData {
    fn from(p: &DbPerson) -> Self {
        Self {
            national_id: p.national_id.clone(),
            family_card_number: p.family_card_number.clone(),
            name: p.name.clone(),
            alias: p.alias.clone(),
            gender: p.gender.clone(),
            birth_place: p.birth_place.clone(),
            birth_date: p.birth_date,
            marital_status: p.marital_status.clone(),
            citizenship: p.citizenship,
            personal_email: p.personal_email.clone(),
            phone: p.phone.clone(),
            phone_alt: p.phone_alt.clone(),
            tax_number: p.tax_number.clone(),
            insurance_number: p.insurance_number.clone(),
            province: p.province.clone(),
            regency: p.regency.clone(),
            district: p.district.clone(),
            village: p.village.clone(),
            postal_code: p.postal_code.clone(),
        }
    }
}

impl From<&DbEmployee> for EmployeeData {
    fn from(e: &DbEmployee) -> Self {
        Self {
            national_id: e.national_id.clone(),
            registration_number: e.registration_number.clone(),
            hire_date: e.hire_date,
            active_date: e.active_date,
            office_email: e.office_email.clone(),
            photo_path: e.photo_path.clone(),
            placement: e.placement(),
            classification: e.classification.clone(),
            grade: e.grade.clone(),
            roster: e.roster.clone(),
            work_location: e.work_location.clone(),
            is_active: e.is_active,
        }
    }
}

/// A row from `placement_history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbPlacement {
    pub id: i64,
    pub employee_id: i64,
    pub person_id: i64,
    pub national_id: String,
    pub from_company_id: Option<i64>,
    pub to_company_id: i64,
    pub department_id: Option<i64>,
    pub section_id: Option<i64>,
    pub position_id: Option<i64>,
    pub role_label: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: PlacementStatus,
    pub source: PlacementSource,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Arguments of a ledger append.
#[derive(Debug, Clone)]
pub struct NewPlacement<'a> {
    pub employee_id: i64,
    pub person_id: i64,
    pub national_id: &'a str,
    pub from_company_id: Option<i64>,
    pub placement: Placement,
    pub role_label: Option<&'a str>,
    pub start_date: NaiveDate,
    pub status: PlacementStatus,
    pub source: PlacementSource,
    pub actor: &'a str,
}

/// A row from `employee_statuses`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbStatusEntry {
    pub id: i64,
    pub employee_id: i64,
    pub person_id: i64,
    pub national_id: String,
    pub kind: StatusKind,
    pub reason: String,
    pub category: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub document_path: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Arguments of a status append.
#[derive(Debug, Clone)]
pub struct NewStatus<'a> {
    pub employee_id: i64,
    pub person_id: i64,
    pub national_id: &'a str,
    pub kind: StatusKind,
    pub reason: &'a str,
    pub category: Option<&'a str>,
    pub start_date: NaiveDate,
    pub document_path: Option<&'a str>,
    pub actor: &'a str,
}

/// A row from `field_audits`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbFieldAudit {
    pub id: i64,
    pub employee_id: i64,
    pub person_id: i64,
    pub national_id: String,
    pub field: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub changed_by: Option<String>,
    pub changed_at: DateTime<Utc>,
    pub source: String,
}

/// A row from `employee_vaccinations`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbVaccination {
    pub id: i64,
    pub employee_id: i64,
    pub dose: i64,
    pub vaccine: String,
    pub vaccinated_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// A row from `roles`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbRole {
    pub id: i64,
    pub name: String,
    pub level: i64,
}
