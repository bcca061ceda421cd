// Service layer: lifecycle use cases composed over the db layer.
// Each use case validates everything up front, then writes inside one transaction.

pub mod employees;
pub mod placement;
pub mod status;

use crate::db::{DbEmployee, HrDb};
use crate::error::LifecycleError;

/// Trim free text; blank becomes `None`.
pub(crate) fn clean_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub(crate) fn load_employee(db: &HrDb, employee_id: i64) -> Result<DbEmployee, LifecycleError> {
    db.get_employee(employee_id)?
        .ok_or_else(|| LifecycleError::NotFound(format!("employee {}", employee_id)))
}
