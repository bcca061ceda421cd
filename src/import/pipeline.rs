//! Preview and confirm phases of a bulk import.

use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use super::sheet::SheetRow;
use crate::db::HrDb;
use crate::error::LifecycleError;
use crate::identity::normalize_identity_number;
use crate::services::employees::{
    create_employee, edit_employee, plan_create, plan_edit, Channel, CreateEmployeeRequest,
    EditEmployeeRequest, EmployeeInput,
};
use crate::state::{AppState, RequestContext};
use crate::types::{Citizenship, Placement};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowAction {
    Insert,
    Update,
    /// Update that moves the employee to another company.
    Transfer,
    Error,
}

/// The request a valid row replays on confirm.
#[derive(Debug, Clone)]
enum RowRequest {
    Create(Box<CreateEmployeeRequest>),
    Edit(Box<EditEmployeeRequest>),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRow {
    pub line: usize,
    pub national_id: Option<String>,
    pub name: Option<String>,
    pub action: RowAction,
    pub employee_id: Option<i64>,
    pub field: Option<&'static str>,
    pub message: Option<String>,
    pub warnings: Vec<String>,
    #[serde(skip)]
    request: Option<RowRequest>,
}

impl PreviewRow {
    fn error(row: &SheetRow, field: Option<&'static str>, message: String) -> Self {
        Self {
            line: row.line,
            national_id: row.text("national_id").map(str::to_string),
            name: row.text("name").map(str::to_string),
            action: RowAction::Error,
            employee_id: None,
            field,
            message: Some(message),
            warnings: Vec::new(),
            request: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.action != RowAction::Error
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPreview {
    pub token: String,
    /// Only this user may confirm the preview.
    pub created_by: String,
    pub rows: Vec<PreviewRow>,
}

impl ImportPreview {
    pub fn count(&self, action: RowAction) -> usize {
        self.rows.iter().filter(|r| r.action == action).count()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: Vec<RowError>,
    /// Set when the request was cancelled part-way; remaining rows are skipped.
    pub cancelled: bool,
}

// =============================================================================
// Row → request
// =============================================================================

/// Company and org units from `*_id` columns, or by exact name within the
/// parent. Blank lower levels inherit `fallback` while the company is unchanged.
fn resolve_placement(
    db: &HrDb,
    row: &SheetRow,
    fallback: Option<Placement>,
) -> Result<Placement, LifecycleError> {
    let company_id = match (row.id("company_id")?, row.text("company")) {
        (Some(id), _) => id,
        (None, Some(name)) => db
            .find_company_by_name(name)?
            .ok_or_else(|| LifecycleError::validation("company_id", format!("Unknown company '{}'", name)))?,
        (None, None) => fallback
            .map(|p| p.company_id)
            .ok_or_else(|| LifecycleError::validation("company_id", "Company is required"))?,
    };
    let inherited = fallback.filter(|p| p.company_id == company_id);

    let department_id = match (row.id("department_id")?, row.text("department")) {
        (Some(id), _) => Some(id),
        (None, Some(name)) => Some(db.find_department_by_name(company_id, name)?.ok_or_else(|| {
            LifecycleError::validation("department_id", format!("Unknown department '{}'", name))
        })?),
        (None, None) => inherited.and_then(|p| p.department_id),
    };

    let section_id = match (row.id("section_id")?, row.text("section"), department_id) {
        (Some(id), _, _) => Some(id),
        (None, Some(name), Some(dept)) => Some(db.find_section_by_name(dept, name)?.ok_or_else(|| {
            LifecycleError::validation("section_id", format!("Unknown section '{}'", name))
        })?),
        (None, Some(name), None) => {
            return Err(LifecycleError::validation(
                "section_id",
                format!("Section '{}' needs a department", name),
            ))
        }
        (None, None, _) => inherited
            .filter(|p| p.department_id == department_id)
            .and_then(|p| p.section_id),
    };

    let position_id = match (row.id("position_id")?, row.text("position")) {
        (Some(id), _) => Some(id),
        (None, Some(name)) => Some(db.find_position_by_name(company_id, section_id, name)?.ok_or_else(|| {
            LifecycleError::validation("position_id", format!("Unknown position '{}'", name))
        })?),
        (None, None) => inherited
            .filter(|p| p.section_id == section_id)
            .and_then(|p| p.position_id),
    };

    Ok(Placement {
        company_id,
        department_id,
        section_id,
        position_id,
    })
}

fn overlay(target: &mut Option<String>, row: &SheetRow, column: &str) {
    if let Some(value) = row.text(column) {
        *target = Some(value.to_string());
    }
}

fn overlay_date(
    target: &mut Option<chrono::NaiveDate>,
    row: &SheetRow,
    column: &'static str,
) -> Result<(), LifecycleError> {
    if let Some(date) = row.date(column)? {
        *target = Some(date);
    }
    Ok(())
}

/// Non-blank cells replace the corresponding input fields.
fn apply_row(input: &mut EmployeeInput, row: &SheetRow) -> Result<(), LifecycleError> {
    if let Some(nid) = row.text("national_id") {
        input.national_id = nid.to_string();
    }
    if let Some(name) = row.text("name") {
        input.name = name.to_string();
    }
    if let Some(raw) = row.text("citizenship") {
        input.citizenship = raw.to_uppercase().parse::<Citizenship>().map_err(|_| {
            LifecycleError::validation("citizenship", format!("Citizenship must be WNI or WNA, got '{}'", raw))
        })?;
    }
    overlay(&mut input.family_card_number, row, "family_card_number");
    overlay(&mut input.alias, row, "alias");
    overlay(&mut input.gender, row, "gender");
    overlay(&mut input.birth_place, row, "birth_place");
    overlay_date(&mut input.birth_date, row, "birth_date")?;
    overlay(&mut input.marital_status, row, "marital_status");
    overlay(&mut input.personal_email, row, "personal_email");
    overlay(&mut input.phone, row, "phone");
    overlay(&mut input.phone_alt, row, "phone_alt");
    overlay(&mut input.tax_number, row, "tax_number");
    overlay(&mut input.insurance_number, row, "insurance_number");
    overlay(&mut input.province, row, "province");
    overlay(&mut input.regency, row, "regency");
    overlay(&mut input.district, row, "district");
    overlay(&mut input.village, row, "village");
    overlay(&mut input.postal_code, row, "postal_code");
    overlay(&mut input.registration_number, row, "registration_number");
    overlay_date(&mut input.hire_date, row, "hire_date")?;
    overlay_date(&mut input.active_date, row, "active_date")?;
    overlay(&mut input.office_email, row, "office_email");
    overlay(&mut input.role_label, row, "role");
    overlay(&mut input.classification, row, "classification");
    overlay(&mut input.grade, row, "grade");
    overlay(&mut input.roster, row, "roster");
    overlay(&mut input.work_location, row, "work_location");
    Ok(())
}

struct PlannedRow {
    action: RowAction,
    employee_id: Option<i64>,
    /// Batch duplicate key: normalized national ID and target company.
    key: (String, i64),
    warnings: Vec<String>,
    request: RowRequest,
}

/// Rows naming an `employee_code` edit that employee; otherwise the national
/// ID is looked up in the target company, and a miss is an insert.
fn plan_row(
    db: &HrDb,
    state: &AppState,
    ctx: &RequestContext,
    row: &SheetRow,
) -> Result<PlannedRow, LifecycleError> {
    let national_id = row
        .text("national_id")
        .and_then(normalize_identity_number)
        .ok_or_else(|| LifecycleError::validation("national_id", "National ID is required"))?;

    let (existing, placement) = match row.text("employee_code") {
        Some(code) => {
            let employee = db.find_employee_by_code(&code.to_uppercase())?.ok_or_else(|| {
                LifecycleError::validation("employee_code", format!("Unknown employee code '{}'", code))
            })?;
            let placement = resolve_placement(db, row, Some(employee.placement()))?;
            (Some(employee), placement)
        }
        None => {
            let target = resolve_placement(db, row, None)?;
            match db.find_employee_in_company(&national_id, target.company_id)? {
                Some(employee) => {
                    let placement = resolve_placement(db, row, Some(employee.placement()))?;
                    (Some(employee), placement)
                }
                None => (None, target),
            }
        }
    };

    match existing {
        Some(employee) => {
            let person = db
                .get_person(employee.person_id)?
                .ok_or_else(|| LifecycleError::NotFound(format!("person {}", employee.person_id)))?;
            let mut input = EmployeeInput::from_existing(&person, &employee);
            apply_row(&mut input, row)?;
            input.placement = placement;
            let req = EditEmployeeRequest {
                employee_id: employee.id,
                employee_version: employee.version,
                person_version: person.version,
                input,
                statuses: Vec::new(),
                channel: Channel::Import,
            };
            let plan = plan_edit(db, state, ctx, &req)?;
            let action = if plan.changes_company() {
                RowAction::Transfer
            } else {
                RowAction::Update
            };
            Ok(PlannedRow {
                action,
                employee_id: Some(employee.id),
                key: (national_id, placement.company_id),
                warnings: Vec::new(),
                request: RowRequest::Edit(Box::new(req)),
            })
        }
        None => {
            // Blank cells must not wipe the shared personal record of a known person.
            let mut input = match db.find_by_identity(Some(&national_id), None)? {
                Some(person) => EmployeeInput::for_person(&person, &national_id, placement),
                None => EmployeeInput::new(&national_id, "", placement),
            };
            apply_row(&mut input, row)?;
            let mut req = CreateEmployeeRequest::new(input);
            req.channel = Channel::Import;
            let plan = plan_create(db, state, ctx, &req)?;
            Ok(PlannedRow {
                action: RowAction::Insert,
                employee_id: None,
                key: (national_id, placement.company_id),
                warnings: plan.warnings,
                request: RowRequest::Create(Box::new(req)),
            })
        }
    }
}

// =============================================================================
// Preview / confirm
// =============================================================================

/// Validate every row without writing and cache the result under a new token.
/// A bad row becomes a `RowAction::Error` entry; it never fails the preview.
pub fn preview_import(
    db: &HrDb,
    state: &AppState,
    ctx: &RequestContext,
    rows: Vec<SheetRow>,
) -> Result<ImportPreview, LifecycleError> {
    let mut seen: HashMap<(String, i64), usize> = HashMap::new();
    let mut preview_rows = Vec::with_capacity(rows.len());

    for row in &rows {
        ctx.ensure_not_cancelled()?;
        let preview_row = match plan_row(db, state, ctx, row) {
            Ok(planned) => match seen.get(&planned.key) {
                Some(first_line) => PreviewRow::error(
                    row,
                    Some("national_id"),
                    format!("Duplicate of line {} for the same company", first_line),
                ),
                None => {
                    seen.insert(planned.key.clone(), row.line);
                    PreviewRow {
                        line: row.line,
                        national_id: Some(planned.key.0),
                        name: row.text("name").map(str::to_string),
                        action: planned.action,
                        employee_id: planned.employee_id,
                        field: None,
                        message: None,
                        warnings: planned.warnings,
                        request: Some(planned.request),
                    }
                }
            },
            Err(e) => PreviewRow::error(row, e.field(), e.to_string()),
        };
        preview_rows.push(preview_row);
    }

    let preview = ImportPreview {
        token: Uuid::new_v4().to_string(),
        created_by: ctx.actor().to_string(),
        rows: preview_rows,
    };
    let purged = state.previews.purge_expired();
    if purged > 0 {
        log::debug!("Purged {} expired import previews", purged);
    }
    state.previews.insert(preview.clone());

    log::info!(
        "Import preview {} by {}: {} insert, {} update, {} transfer, {} error",
        preview.token,
        ctx.actor(),
        preview.count(RowAction::Insert),
        preview.count(RowAction::Update),
        preview.count(RowAction::Transfer),
        preview.count(RowAction::Error)
    );
    Ok(preview)
}

/// Replay the valid rows of a cached preview and discard the token.
pub fn confirm_import(
    db: &HrDb,
    state: &AppState,
    ctx: &RequestContext,
    token: &str,
) -> Result<ImportSummary, LifecycleError> {
    let missing = || LifecycleError::NotFound(format!("import preview {} (expired or already used)", token));
    let owner = state.previews.get(token).ok_or_else(missing)?.created_by;
    if owner != ctx.actor() {
        return Err(LifecycleError::Authorization(format!(
            "import preview {} belongs to another user",
            token
        )));
    }
    let preview = state.previews.take(token).ok_or_else(missing)?;

    let mut summary = ImportSummary::default();
    let mut rows = preview.rows.into_iter();
    while let Some(row) = rows.next() {
        if ctx.cancel.is_cancelled() {
            let remaining = 1 + rows.len();
            log::warn!("Import {} cancelled with {} rows left", token, remaining);
            summary.cancelled = true;
            summary.skipped += remaining;
            break;
        }

        let outcome = match row.request {
            None => {
                summary.skipped += 1;
                summary.errors.push(RowError {
                    line: row.line,
                    message: row.message.unwrap_or_else(|| "Invalid row".to_string()),
                });
                continue;
            }
            Some(RowRequest::Create(req)) => {
                create_employee(db, state, ctx, *req).map(|_| RowAction::Insert)
            }
            Some(RowRequest::Edit(req)) => edit_employee(db, state, ctx, *req).map(|_| row.action),
        };

        match outcome {
            Ok(RowAction::Insert) => summary.inserted += 1,
            Ok(_) => summary.updated += 1,
            Err(e) => {
                log::warn!("Import {} line {} skipped: {}", token, row.line, e);
                summary.skipped += 1;
                summary.errors.push(RowError {
                    line: row.line,
                    message: e.to_string(),
                });
            }
        }
    }

    log::info!(
        "Import {} confirmed by {}: {} inserted, {} updated, {} skipped",
        token,
        ctx.actor(),
        summary.inserted,
        summary.updated,
        summary.skipped
    );
    Ok(summary)
}
