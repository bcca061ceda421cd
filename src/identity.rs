//! Identity-number format rules and cross-person conflict detection.

use std::sync::LazyLock;

use regex::Regex;
use rusqlite::params;
use serde::Serialize;

use crate::db::{DbError, HrDb};
use crate::error::LifecycleError;
use crate::types::Citizenship;

static CITIZEN_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{16}$").expect("valid regex"));
static FOREIGN_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]+$").expect("valid regex"));

/// Strip all whitespace and upper-case. Applied before every comparison and
/// write so blacklist and conflict lookups see one canonical string.
pub fn normalize_identity_number(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Citizens need exactly 16 digits; foreigners any non-empty alphanumeric run.
pub fn validate_national_id(value: &str, citizenship: Citizenship) -> Result<(), LifecycleError> {
    match citizenship {
        Citizenship::Citizen if !CITIZEN_ID.is_match(value) => Err(LifecycleError::validation(
            "national_id",
            format!("National ID must be exactly 16 digits (got {} characters)", value.len()),
        )),
        Citizenship::Foreign if !FOREIGN_ID.is_match(value) => Err(LifecycleError::validation(
            "national_id",
            "Foreign national ID must be letters and digits only",
        )),
        _ => Ok(()),
    }
}

/// Family-card numbers follow the citizen national-ID shape.
pub fn validate_family_card(value: &str) -> Result<(), LifecycleError> {
    if CITIZEN_ID.is_match(value) {
        Ok(())
    } else {
        Err(LifecycleError::validation(
            "family_card_number",
            "Family card number must be exactly 16 digits",
        ))
    }
}

/// An identity number already bound to someone else's employment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityConflict {
    pub person_id: i64,
    pub employee_national_id: String,
    pub company_name: String,
    /// Which submitted number matched.
    pub matched_on: &'static str,
}

/// Find employments whose person carries the given national ID or family-card
/// number but which are not the record being saved.
///
/// Each number is checked on its own. Rows of `exclude_person_id` and rows whose
/// employee national ID equals `national_id` are not conflicts.
pub fn find_conflicts(
    db: &HrDb,
    national_id: Option<&str>,
    family_card_number: Option<&str>,
    exclude_person_id: Option<i64>,
) -> Result<Vec<IdentityConflict>, DbError> {
    let mut conflicts = Vec::new();
    let checks = [
        ("national_id", national_id),
        ("family_card_number", family_card_number),
    ];
    for (column, value) in checks {
        let Some(value) = value.filter(|v| !v.is_empty()) else {
            continue;
        };
        let sql = format!(
            "SELECT p.id, e.national_id, c.name
             FROM people p
             JOIN employees e ON e.person_id = p.id
             JOIN companies c ON c.id = e.company_id
             WHERE p.{column} = ?1
               AND (?2 IS NULL OR p.id <> ?2)
               AND (?3 IS NULL OR e.national_id <> ?3)
             ORDER BY p.id, e.id"
        );
        let mut stmt = db.conn_ref().prepare(&sql)?;
        let rows = stmt.query_map(params![value, exclude_person_id, national_id], |row| {
            Ok(IdentityConflict {
                person_id: row.get(0)?,
                employee_national_id: row.get(1)?,
                company_name: row.get(2)?,
                matched_on: column,
            })
        })?;
        for row in rows {
            let conflict = row?;
            if !conflicts.contains(&conflict) {
                conflicts.push(conflict);
            }
        }
    }
    Ok(conflicts)
}

/// Fail with a field-targeted conflict when `find_conflicts` reports anything.
pub fn ensure_no_conflicts(
    db: &HrDb,
    national_id: Option<&str>,
    family_card_number: Option<&str>,
    exclude_person_id: Option<i64>,
) -> Result<(), LifecycleError> {
    let conflicts = find_conflicts(db, national_id, family_card_number, exclude_person_id)?;
    match conflicts.first() {
        None => Ok(()),
        Some(first) => Err(LifecycleError::conflict(
            first.matched_on,
            format!(
                "Identity number already belongs to employee {} at {}",
                first.employee_national_id, first.company_name
            ),
        )),
    }
}
