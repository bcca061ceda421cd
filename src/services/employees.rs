// Employee lifecycle service: create, edit/transfer and the read views.
//
// Every use case is split in two. `plan_*` runs all validation read-only and
// is shared with the import preview; `apply_*` stores uploads, then performs
// the person/employee/placement/status/audit writes in one transaction.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::audit::{diff_fields, emit_best_effort, AuditAction, AuditEvent, AuditValue, FieldChange, FieldSnapshot};
use crate::blob::{Upload, PHOTO_FOLDER};
use crate::db::audits::AuditSubject;
use crate::db::employees::EmployeeQuery;
use crate::db::{
    DbEmployee, DbFieldAudit, DbPerson, DbPlacement, DbStatusEntry, DbVaccination, EmployeeData,
    HrDb, NewPlacement, PersonData,
};
use crate::employee_code::generate_employee_code;
use crate::error::LifecycleError;
use crate::identity::{
    ensure_no_conflicts, normalize_identity_number, validate_family_card, validate_national_id,
};
use crate::state::{AppState, RequestContext};
use crate::types::{AuditSource, Citizenship, Placement, PlacementSource, PlacementStatus, StatusKind};

use super::placement::{placement_changed, resolve_history_classification, HistoryClassification};
use super::status::{
    close_open_inactive, ensure_cool_down_elapsed, ensure_not_blacklisted, prepare_statuses,
    write_statuses, StatusChange,
};
use super::{clean_text, load_employee};

// =============================================================================
// Request types
// =============================================================================

/// Where a lifecycle request came from. Import-driven changes are tagged as
/// such in the placement ledger and the field audit trail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    #[default]
    Form,
    Import,
}

/// Person and employment fields as submitted. Text is cleaned server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeInput {
    pub national_id: String,
    pub family_card_number: Option<String>,
    #[serde(default)]
    pub citizenship: Citizenship,
    pub name: String,
    pub alias: Option<String>,
    pub gender: Option<String>,
    pub birth_place: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub marital_status: Option<String>,
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

    pub registration_number: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub active_date: Option<NaiveDate>,
    pub office_email: Option<String>,
    pub placement: Placement,
    /// Free-text role recorded on the placement entry.
    pub role_label: Option<String>,
    pub classification: Option<String>,
    pub grade: Option<String>,
    pub roster: Option<String>,
    pub work_location: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// New photo; `None` keeps the stored one on edit.
    pub photo: Option<Upload>,
}

fn default_active() -> bool {
    true
}

impl EmployeeInput {
    pub fn new(national_id: &str, name: &str, placement: Placement) -> Self {
        Self {
            national_id: national_id.to_string(),
            family_card_number: None,
            citizenship: Citizenship::Citizen,
            name: name.to_string(),
            alias: None,
            gender: None,
            birth_place: None,
            birth_date: None,
            marital_status: None,
            personal_email: None,
            phone: None,
            phone_alt: None,
            tax_number: None,
            insurance_number: None,
            province: None,
            regency: None,
            district: None,
            village: None,
            postal_code: None,
            registration_number: None,
            hire_date: None,
            active_date: None,
            office_email: None,
            placement,
            role_label: None,
            classification: None,
            grade: None,
            roster: None,
            work_location: None,
            is_active: true,
            photo: None,
        }
    }

    /// A new employment of an already known person, personal fields prefilled.
    pub fn for_person(person: &DbPerson, national_id: &str, placement: Placement) -> Self {
        Self {
            family_card_number: person.family_card_number.clone(),
            citizenship: person.citizenship,
            alias: person.alias.clone(),
            gender: person.gender.clone(),
            birth_place: person.birth_place.clone(),
            birth_date: person.birth_date,
            marital_status: person.marital_status.clone(),
            personal_email: person.personal_email.clone(),
            phone: person.phone.clone(),
            phone_alt: person.phone_alt.clone(),
            tax_number: person.tax_number.clone(),
            insurance_number: person.insurance_number.clone(),
            province: person.province.clone(),
            regency: person.regency.clone(),
            district: person.district.clone(),
            village: person.village.clone(),
            postal_code: person.postal_code.clone(),
            ..Self::new(national_id, &person.name, placement)
        }
    }

    /// The stored values of an employment, ready to be edited.
    pub fn from_existing(person: &DbPerson, employee: &DbEmployee) -> Self {
        Self {
            registration_number: employee.registration_number.clone(),
            hire_date: employee.hire_date,
            active_date: employee.active_date,
            office_email: employee.office_email.clone(),
            classification: employee.classification.clone(),
            grade: employee.grade.clone(),
            roster: employee.roster.clone(),
            work_location: employee.work_location.clone(),
            is_active: employee.is_active,
            ..Self::for_person(person, &employee.national_id, employee.placement())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaccinationInput {
    pub dose: i64,
    pub vaccine: String,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeeRequest {
    pub input: EmployeeInput,
    #[serde(default)]
    pub statuses: Vec<StatusChange>,
    #[serde(default)]
    pub vaccinations: Vec<VaccinationInput>,
    #[serde(default)]
    pub channel: Channel,
}

impl CreateEmployeeRequest {
    pub fn new(input: EmployeeInput) -> Self {
        Self {
            input,
            statuses: Vec::new(),
            vaccinations: Vec::new(),
            channel: Channel::Form,
        }
    }
}

/// Edit (and transfer, when the placement changes) of one employment.
/// Versions are the ones read when the record was loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditEmployeeRequest {
    pub employee_id: i64,
    pub employee_version: i64,
    pub person_version: i64,
    pub input: EmployeeInput,
    #[serde(default)]
    pub statuses: Vec<StatusChange>,
    #[serde(default)]
    pub channel: Channel,
}

// =============================================================================
// Outcomes and views
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOutcome {
    pub employee: DbEmployee,
    pub placement: DbPlacement,
    pub classification: HistoryClassification,
    /// Informational only, e.g. prior employment at another company.
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditOutcome {
    pub employee: DbEmployee,
    pub changes: Vec<FieldChange>,
    pub placement: Option<DbPlacement>,
}

/// Derived lifecycle state. Blacklisted supersedes Inactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeState {
    Active,
    Inactive,
    Blacklisted,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDetail {
    pub employee: DbEmployee,
    pub person: DbPerson,
    pub company_name: Option<String>,
    pub state: EmployeeState,
    pub has_infraction: bool,
    pub placements: Vec<DbPlacement>,
    pub statuses: Vec<DbStatusEntry>,
    pub audits: Vec<DbFieldAudit>,
    pub vaccinations: Vec<DbVaccination>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeSummary {
    pub id: i64,
    pub employee_code: String,
    pub national_id: String,
    pub name: String,
    pub company_id: i64,
    pub company_name: Option<String>,
    pub is_active: bool,
}

// =============================================================================
// Shared validation
// =============================================================================

/// Input after cleaning and format validation.
#[derive(Debug, Clone)]
pub(crate) struct NormalizedInput {
    pub person: PersonData,
    /// `photo_path` is filled in once the upload is stored.
    pub employee: EmployeeData,
    pub role_label: Option<String>,
}

pub(crate) fn normalize_input(input: &EmployeeInput) -> Result<NormalizedInput, LifecycleError> {
    let national_id = normalize_identity_number(&input.national_id)
        .ok_or_else(|| LifecycleError::validation("national_id", "National ID is required"))?;
    validate_national_id(&national_id, input.citizenship)?;

    let family_card_number = input
        .family_card_number
        .as_deref()
        .and_then(normalize_identity_number);
    if let Some(ref kk) = family_card_number {
        validate_family_card(kk)?;
    }

    let name = input.name.trim();
    if name.is_empty() {
        return Err(LifecycleError::validation("name", "Name is required"));
    }

    let person = PersonData {
        national_id: Some(national_id.clone()),
        family_card_number,
        name: name.to_string(),
        alias: clean_text(input.alias.as_deref()),
        gender: clean_text(input.gender.as_deref()),
        birth_place: clean_text(input.birth_place.as_deref()),
        birth_date: input.birth_date,
        marital_status: clean_text(input.marital_status.as_deref()),
        citizenship: input.citizenship,
        personal_email: clean_text(input.personal_email.as_deref()),
        phone: clean_text(input.phone.as_deref()),
        phone_alt: clean_text(input.phone_alt.as_deref()),
        tax_number: clean_text(input.tax_number.as_deref()),
        insurance_number: clean_text(input.insurance_number.as_deref()),
        province: clean_text(input.province.as_deref()),
        regency: clean_text(input.regency.as_deref()),
        district: clean_text(input.district.as_deref()),
        village: clean_text(input.village.as_deref()),
        postal_code: clean_text(input.postal_code.as_deref()),
    };
    let employee = EmployeeData {
        national_id,
        registration_number: clean_text(input.registration_number.as_deref()),
        hire_date: input.hire_date,
        active_date: input.active_date,
        office_email: clean_text(input.office_email.as_deref()),
        photo_path: None,
        placement: input.placement,
        classification: clean_text(input.classification.as_deref()),
        grade: clean_text(input.grade.as_deref()),
        roster: clean_text(input.roster.as_deref()),
        work_location: clean_text(input.work_location.as_deref()),
        is_active: input.is_active,
    };
    Ok(NormalizedInput {
        person,
        employee,
        role_label: clean_text(input.role_label.as_deref()),
    })
}

fn ensure_valid_placement(db: &HrDb, placement: &Placement) -> Result<(), LifecycleError> {
    match db.placement_problem(placement)? {
        Some((field, message)) => Err(LifecycleError::validation(field, message)),
        None => Ok(()),
    }
}

/// The person both identity numbers point at, refusing numbers that belong to
/// different people. `own_person_id` is the person being edited, if any.
fn resolve_person(
    db: &HrDb,
    national_id: &str,
    family_card_number: Option<&str>,
    own_person_id: Option<i64>,
) -> Result<Option<DbPerson>, LifecycleError> {
    let matches = db.find_people_by_identity(Some(national_id), family_card_number)?;
    let foreign = matches.iter().find(|p| match own_person_id {
        Some(own) => p.id != own,
        None => p.national_id.as_deref().is_some_and(|nid| nid != national_id),
    });
    if let Some(other) = foreign {
        let field = if other.national_id.as_deref() == Some(national_id) {
            "national_id"
        } else {
            "family_card_number"
        };
        return Err(LifecycleError::conflict(
            field,
            format!("Identity number already belongs to {}", other.name),
        ));
    }
    Ok(match own_person_id {
        Some(own) => matches.into_iter().find(|p| p.id == own),
        None => matches.into_iter().next(),
    })
}

fn ensure_not_employed_in(
    db: &HrDb,
    national_id: &str,
    company_id: i64,
    except_employee_id: Option<i64>,
) -> Result<(), LifecycleError> {
    if let Some(existing) = db.find_employee_in_company(national_id, company_id)? {
        if Some(existing.id) != except_employee_id {
            let company = db
                .company_name(company_id)?
                .unwrap_or_else(|| company_id.to_string());
            return Err(LifecycleError::conflict(
                "national_id",
                format!(
                    "National ID {} is already employed at {} ({})",
                    national_id, company, existing.employee_code
                ),
            ));
        }
    }
    Ok(())
}

fn validate_vaccinations(vaccinations: &[VaccinationInput]) -> Result<(), LifecycleError> {
    for v in vaccinations {
        if v.dose < 1 {
            return Err(LifecycleError::validation("dose", "Vaccination dose starts at 1"));
        }
        if v.vaccine.trim().is_empty() {
            return Err(LifecycleError::validation("vaccine", "Vaccine name is required"));
        }
    }
    Ok(())
}

/// Active unless switched off or taken out by a requested status.
fn requested_active(is_active: bool, statuses: &[StatusChange]) -> bool {
    is_active
        && !statuses
            .iter()
            .any(|s| matches!(s.kind(), StatusKind::Inactive | StatusKind::Blacklist))
}

/// Every mutable field, normalized for auditing.
pub(crate) fn field_snapshot(person: &PersonData, employee: &EmployeeData) -> FieldSnapshot {
    vec![
        ("national_id", AuditValue::text(Some(&employee.national_id))),
        ("family_card_number", AuditValue::text(person.family_card_number.as_deref())),
        ("name", AuditValue::text(Some(&person.name))),
        ("alias", AuditValue::text(person.alias.as_deref())),
        ("gender", AuditValue::text(person.gender.as_deref())),
        ("birth_place", AuditValue::text(person.birth_place.as_deref())),
        ("birth_date", AuditValue::date(person.birth_date)),
        ("marital_status", AuditValue::text(person.marital_status.as_deref())),
        ("citizenship", AuditValue::text(Some(person.citizenship.as_str()))),
        ("personal_email", AuditValue::text(person.personal_email.as_deref())),
        ("phone", AuditValue::text(person.phone.as_deref())),
        ("phone_alt", AuditValue::text(person.phone_alt.as_deref())),
        ("tax_number", AuditValue::text(person.tax_number.as_deref())),
        ("insurance_number", AuditValue::text(person.insurance_number.as_deref())),
        ("province", AuditValue::text(person.province.as_deref())),
        ("regency", AuditValue::text(person.regency.as_deref())),
        ("district", AuditValue::text(person.district.as_deref())),
        ("village", AuditValue::text(person.village.as_deref())),
        ("postal_code", AuditValue::text(person.postal_code.as_deref())),
        ("registration_number", AuditValue::text(employee.registration_number.as_deref())),
        ("hire_date", AuditValue::date(employee.hire_date)),
        ("active_date", AuditValue::date(employee.active_date)),
        ("office_email", AuditValue::text(employee.office_email.as_deref())),
        ("photo_path", AuditValue::text(employee.photo_path.as_deref())),
        ("company_id", AuditValue::id(Some(employee.placement.company_id))),
        ("department_id", AuditValue::id(employee.placement.department_id)),
        ("section_id", AuditValue::id(employee.placement.section_id)),
        ("position_id", AuditValue::id(employee.placement.position_id)),
        ("classification", AuditValue::text(employee.classification.as_deref())),
        ("grade", AuditValue::text(employee.grade.as_deref())),
        ("roster", AuditValue::text(employee.roster.as_deref())),
        ("work_location", AuditValue::text(employee.work_location.as_deref())),
        ("is_active", AuditValue::flag(employee.is_active)),
    ]
}

// =============================================================================
// Create
// =============================================================================

/// Everything `apply_create` needs, established without writing.
#[derive(Debug, Clone)]
pub(crate) struct CreatePlan {
    pub normalized: NormalizedInput,
    pub classification: HistoryClassification,
    pub warnings: Vec<String>,
}

pub(crate) fn plan_create(
    db: &HrDb,
    state: &AppState,
    ctx: &RequestContext,
    req: &CreateEmployeeRequest,
) -> Result<CreatePlan, LifecycleError> {
    let normalized = normalize_input(&req.input)?;
    for status in &req.statuses {
        status.validate(&ctx.scope)?;
    }
    validate_vaccinations(&req.vaccinations)?;

    let placement = normalized.employee.placement;
    ctx.scope.ensure_can_write(&placement)?;
    ensure_valid_placement(db, &placement)?;

    let national_id = normalized.employee.national_id.as_str();
    let family_card = normalized.person.family_card_number.as_deref();
    ensure_no_conflicts(db, Some(national_id), family_card, None)?;
    resolve_person(db, national_id, family_card, None)?;
    ensure_not_employed_in(db, national_id, placement.company_id, None)?;

    ensure_not_blacklisted(db, &ctx.scope, national_id)?;
    ensure_cool_down_elapsed(
        db,
        &ctx.scope,
        national_id,
        ctx.today(),
        state.config.cool_down_days,
    )?;

    let classification = resolve_history_classification(db, national_id, placement.company_id)?;
    let mut warnings = Vec::new();
    if let Some(last) = classification.last_company_id {
        let company = db.company_name(last)?.unwrap_or_else(|| last.to_string());
        warnings.push(format!("{} was previously employed at {}", national_id, company));
    }

    Ok(CreatePlan {
        normalized,
        classification,
        warnings,
    })
}

fn apply_create(
    db: &HrDb,
    state: &AppState,
    ctx: &RequestContext,
    req: &CreateEmployeeRequest,
    plan: CreatePlan,
) -> Result<CreateOutcome, LifecycleError> {
    let CreatePlan {
        normalized,
        classification,
        warnings,
    } = plan;

    let mut employee_data = normalized.employee;
    employee_data.photo_path = state.blobs.save(req.input.photo.as_ref(), PHOTO_FOLDER)?;
    employee_data.is_active = requested_active(employee_data.is_active, &req.statuses);
    let statuses = prepare_statuses(state, ctx, &req.statuses)?;
    ctx.ensure_not_cancelled()?;

    let source = match req.channel {
        Channel::Import => PlacementSource::Import,
        Channel::Form => classification.source,
    };

    let (employee, placement) = db.with_transaction(|tx| -> Result<_, LifecycleError> {
        let person = tx.upsert_person(&normalized.person, ctx.actor(), ctx.now)?;
        let code = generate_employee_code(state.config.code_attempts, ctx.now, |c| {
            tx.employee_code_exists(c)
        })?;
        let employee =
            tx.insert_employee(person.id, code.as_str(), &employee_data, ctx.actor(), ctx.now)?;

        let placement = tx.append_transition(
            &NewPlacement {
                employee_id: employee.id,
                person_id: person.id,
                national_id: &employee.national_id,
                from_company_id: classification.last_company_id,
                placement: employee.placement(),
                role_label: normalized.role_label.as_deref(),
                start_date: employee.hire_date.unwrap_or_else(|| ctx.today()),
                status: classification.status,
                source,
                actor: ctx.actor(),
            },
            ctx.now,
        )?;

        write_statuses(tx, &employee, &statuses, ctx)?;
        for v in &req.vaccinations {
            tx.insert_vaccination(employee.id, v.dose, v.vaccine.trim(), v.date, ctx.actor(), ctx.now)?;
        }
        Ok((employee, placement))
    })?;

    log::info!(
        "Created employee {} ({}) at company {} as {} by {}",
        employee.id,
        employee.employee_code,
        employee.company_id,
        classification.status,
        ctx.actor()
    );
    emit_best_effort(
        state.audit.as_ref(),
        AuditEvent::employee(
            AuditAction::Create,
            employee.id,
            ctx.actor(),
            format!(
                "Employee {} created ({})",
                employee.employee_code, classification.status
            ),
        ),
    );

    Ok(CreateOutcome {
        employee,
        placement,
        classification,
        warnings,
    })
}

/// Hire a person into a company.
pub fn create_employee(
    db: &HrDb,
    state: &AppState,
    ctx: &RequestContext,
    req: CreateEmployeeRequest,
) -> Result<CreateOutcome, LifecycleError> {
    let plan = plan_create(db, state, ctx, &req)?;
    apply_create(db, state, ctx, &req, plan)
}

// =============================================================================
// Edit / transfer
// =============================================================================

#[derive(Debug, Clone)]
struct PlacementPlan {
    status: PlacementStatus,
    source: PlacementSource,
    from_company_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub(crate) struct EditPlan {
    pub employee: DbEmployee,
    pub person: DbPerson,
    normalized: NormalizedInput,
    placement: Option<PlacementPlan>,
}

impl EditPlan {
    /// Whether the edit moves the employee to another company.
    pub fn changes_company(&self) -> bool {
        self.employee.company_id != self.normalized.employee.placement.company_id
    }
}

pub(crate) fn plan_edit(
    db: &HrDb,
    state: &AppState,
    ctx: &RequestContext,
    req: &EditEmployeeRequest,
) -> Result<EditPlan, LifecycleError> {
    let employee = load_employee(db, req.employee_id)?;
    let person = db
        .get_person(employee.person_id)?
        .ok_or_else(|| LifecycleError::NotFound(format!("person {}", employee.person_id)))?;

    if employee.version != req.employee_version {
        return Err(LifecycleError::conflict(
            "version",
            "Employee was changed by someone else; reload and try again",
        ));
    }
    if person.version != req.person_version {
        return Err(LifecycleError::conflict(
            "version",
            "Personal record was changed by someone else; reload and try again",
        ));
    }

    let normalized = normalize_input(&req.input)?;
    for status in &req.statuses {
        status.validate(&ctx.scope)?;
    }

    let before = employee.placement();
    let after = normalized.employee.placement;
    ctx.scope.ensure_can_write(&before)?;
    ctx.scope.ensure_can_write(&after)?;
    ensure_valid_placement(db, &after)?;

    let national_id = normalized.employee.national_id.as_str();
    let family_card = normalized.person.family_card_number.as_deref();
    ensure_not_blacklisted(db, &ctx.scope, national_id)?;
    if employee.national_id != national_id {
        ensure_not_blacklisted(db, &ctx.scope, &employee.national_id)?;
    }
    ensure_no_conflicts(db, Some(national_id), family_card, Some(person.id))?;
    resolve_person(db, national_id, family_card, Some(person.id))?;
    if employee.national_id != national_id || before.company_id != after.company_id {
        ensure_not_employed_in(db, national_id, after.company_id, Some(employee.id))?;
    }

    let placement = if placement_changed(&before, &after) {
        // Cool-down guards company changes only.
        if before.company_id != after.company_id {
            ensure_cool_down_elapsed(
                db,
                &ctx.scope,
                national_id,
                ctx.today(),
                state.config.cool_down_days,
            )?;
        }
        let classification = resolve_history_classification(db, national_id, after.company_id)?;
        Some(PlacementPlan {
            status: classification.status,
            source: classification.source,
            from_company_id: Some(before.company_id),
        })
    } else {
        None
    };

    Ok(EditPlan {
        employee,
        person,
        normalized,
        placement,
    })
}

fn apply_edit(
    db: &HrDb,
    state: &AppState,
    ctx: &RequestContext,
    req: &EditEmployeeRequest,
    plan: EditPlan,
) -> Result<EditOutcome, LifecycleError> {
    let EditPlan {
        employee: existing,
        person,
        normalized,
        placement,
    } = plan;

    let mut employee_data = normalized.employee;
    employee_data.photo_path = match state.blobs.save(req.input.photo.as_ref(), PHOTO_FOLDER)? {
        Some(path) => Some(path),
        None => existing.photo_path.clone(),
    };
    employee_data.is_active = requested_active(employee_data.is_active, &req.statuses);
    let statuses = prepare_statuses(state, ctx, &req.statuses)?;
    ctx.ensure_not_cancelled()?;

    let before_person = PersonData::from(&person);
    let before_employee = EmployeeData::from(&existing);
    let changes = diff_fields(
        &field_snapshot(&before_person, &before_employee),
        &field_snapshot(&normalized.person, &employee_data),
    );
    let reactivating = employee_data.is_active && !existing.is_active;
    let (audit_source, placement_channel_source) = match req.channel {
        Channel::Import => (AuditSource::Import, Some(PlacementSource::Import)),
        Channel::Form => (AuditSource::Edit, None),
    };

    let (employee, new_placement) = db.with_transaction(|tx| -> Result<_, LifecycleError> {
        if normalized.person != before_person {
            tx.update_person(person.id, &normalized.person, req.person_version, ctx.actor(), ctx.now)?;
        }
        let employee = if employee_data != before_employee {
            tx.update_employee(existing.id, &employee_data, req.employee_version, ctx.actor(), ctx.now)?
        } else {
            existing.clone()
        };

        tx.insert_field_audits(
            AuditSubject {
                employee_id: employee.id,
                person_id: employee.person_id,
                national_id: &employee.national_id,
            },
            &changes,
            audit_source,
            ctx.actor(),
            ctx.now,
        )?;

        let new_placement = match &placement {
            Some(p) => Some(tx.append_transition(
                &NewPlacement {
                    employee_id: employee.id,
                    person_id: employee.person_id,
                    national_id: &employee.national_id,
                    from_company_id: p.from_company_id,
                    placement: employee.placement(),
                    role_label: normalized.role_label.as_deref(),
                    start_date: ctx.today(),
                    status: p.status,
                    source: placement_channel_source.unwrap_or(p.source),
                    actor: ctx.actor(),
                },
                ctx.now,
            )?),
            None => None,
        };

        write_statuses(tx, &employee, &statuses, ctx)?;
        if reactivating {
            let closed = close_open_inactive(tx, &employee, ctx)?;
            log::debug!("Closed {} inactive entries for employee {}", closed, employee.id);
        }
        Ok((employee, new_placement))
    })?;

    if changes.is_empty() && new_placement.is_none() && statuses.is_empty() {
        log::debug!("Edit of employee {} changed nothing", employee.id);
        return Ok(EditOutcome {
            employee,
            changes,
            placement: None,
        });
    }

    log::info!(
        "Updated employee {} ({} fields) by {}",
        employee.id,
        changes.len(),
        ctx.actor()
    );
    let fields: Vec<&str> = changes.iter().map(|c| c.field.as_str()).collect();
    emit_best_effort(
        state.audit.as_ref(),
        AuditEvent::employee(
            AuditAction::Update,
            employee.id,
            ctx.actor(),
            format!("Employee {} updated: {}", employee.employee_code, fields.join(", ")),
        ),
    );

    Ok(EditOutcome {
        employee,
        changes,
        placement: new_placement,
    })
}

/// Edit an employment. A changed company/department/section/position is a
/// transfer and appends to the placement ledger.
pub fn edit_employee(
    db: &HrDb,
    state: &AppState,
    ctx: &RequestContext,
    req: EditEmployeeRequest,
) -> Result<EditOutcome, LifecycleError> {
    let plan = plan_edit(db, state, ctx, &req)?;
    apply_edit(db, state, ctx, &req, plan)
}

// =============================================================================
// Reads
// =============================================================================

fn derive_state(db: &HrDb, employee: &DbEmployee) -> Result<EmployeeState, LifecycleError> {
    if db.is_blacklisted(&employee.national_id)? {
        return Ok(EmployeeState::Blacklisted);
    }
    let open_inactive = !db
        .open_statuses_for_employee(employee.id, StatusKind::Inactive)?
        .is_empty();
    if !employee.is_active || open_inactive {
        Ok(EmployeeState::Inactive)
    } else {
        Ok(EmployeeState::Active)
    }
}

pub fn get_employee_detail(
    db: &HrDb,
    ctx: &RequestContext,
    employee_id: i64,
) -> Result<EmployeeDetail, LifecycleError> {
    let employee = load_employee(db, employee_id)?;
    if !ctx.scope.can_read(&employee.placement()) {
        return Err(LifecycleError::Authorization(format!(
            "employee {} is outside your scope",
            employee_id
        )));
    }
    let person = db
        .get_person(employee.person_id)?
        .ok_or_else(|| LifecycleError::NotFound(format!("person {}", employee.person_id)))?;

    let state = derive_state(db, &employee)?;
    let statuses = db.list_statuses(employee.id)?;
    let has_infraction = statuses.iter().any(|s| s.kind == StatusKind::Infraction);

    Ok(EmployeeDetail {
        company_name: db.company_name(employee.company_id)?,
        state,
        has_infraction,
        placements: db.list_placements(employee.id)?,
        statuses,
        audits: db.list_field_audits(employee.id)?,
        vaccinations: db.list_vaccinations(employee.id)?,
        person,
        employee,
    })
}

/// Employees visible to the caller.
pub fn list_employees(
    db: &HrDb,
    ctx: &RequestContext,
    query: &EmployeeQuery,
) -> Result<Vec<EmployeeSummary>, LifecycleError> {
    let employees = db.list_employees(&ctx.scope.filter(), query)?;
    let mut summaries = Vec::with_capacity(employees.len());
    for e in employees {
        let name = db
            .get_person(e.person_id)?
            .map(|p| p.name)
            .unwrap_or_default();
        summaries.push(EmployeeSummary {
            company_name: db.company_name(e.company_id)?,
            id: e.id,
            employee_code: e.employee_code,
            national_id: e.national_id,
            name,
            company_id: e.company_id,
            is_active: e.is_active,
        });
    }
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::status::{clear_blacklist, deactivate_employee, DeactivateRequest};
    use crate::test_support::{
        department_ctx, owner_ctx, seed_org, staff_ctx, test_db, test_state, ts, unscoped_staff_ctx,
        COMPANY_A, COMPANY_B, COMPANY_C, DEPT_A_OPS, POSITION_A_OPERATOR, SECTION_A_OPS_1,
    };
    use tokio_util::sync::CancellationToken;

    const NIK: &str = "1234567890123456";

    fn create_in(company_id: i64) -> CreateEmployeeRequest {
        CreateEmployeeRequest::new(EmployeeInput::new(NIK, "Budi Santoso", Placement::company(company_id)))
    }

    fn edit_of(db: &HrDb, employee_id: i64) -> EditEmployeeRequest {
        let employee = db.get_employee(employee_id).expect("q").expect("employee");
        let person = db.get_person(employee.person_id).expect("q").expect("person");
        EditEmployeeRequest {
            employee_id,
            employee_version: employee.version,
            person_version: person.version,
            input: EmployeeInput::from_existing(&person, &employee),
            statuses: Vec::new(),
            channel: Channel::Form,
        }
    }

    fn deactivate_on(db: &HrDb, state: &AppState, employee_id: i64, day: chrono::DateTime<chrono::Utc>) {
        deactivate_employee(
            db,
            state,
            &owner_ctx(day),
            DeactivateRequest {
                employee_id,
                reason: "Resigned".into(),
                ..Default::default()
            },
        )
        .expect("deactivate");
    }

    #[test]
    fn test_scenario_a_create_round_trip() {
        let db = test_db();
        seed_org(&db);
        let (state, sink) = test_state();
        let mut req = create_in(COMPANY_A);
        req.input.placement = Placement {
            company_id: COMPANY_A,
            department_id: Some(DEPT_A_OPS),
            section_id: Some(SECTION_A_OPS_1),
            position_id: Some(POSITION_A_OPERATOR),
        };
        req.input.alias = Some("   ".into());

        let outcome = create_employee(&db, &state, &owner_ctx(ts(2025, 1, 10)), req.clone()).expect("create");
        assert!(outcome.warnings.is_empty());
        assert!(outcome.employee.employee_code.starts_with("IC-"));
        assert_eq!(outcome.employee.placement(), req.input.placement);

        let history = db.list_placements(outcome.employee.id).expect("history");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].end_date, None);
        assert_eq!(history[0].from_company_id, None);
        assert_eq!(history[0].to_company_id, COMPANY_A);
        assert_eq!(history[0].status, PlacementStatus::ActiveHire);
        assert_eq!(history[0].source, PlacementSource::Recruit);

        let person = db.get_person(outcome.employee.person_id).expect("q").expect("person");
        assert_eq!(person.alias, None);
        assert_eq!(sink.events().len(), 1);
        assert_eq!(sink.events()[0].action, AuditAction::Create);
    }

    #[test]
    fn test_scenario_b_duplicate_in_same_company() {
        let db = test_db();
        seed_org(&db);
        let (state, _) = test_state();
        create_employee(&db, &state, &owner_ctx(ts(2025, 1, 10)), create_in(COMPANY_A)).expect("first");

        let err = create_employee(&db, &state, &owner_ctx(ts(2025, 1, 11)), create_in(COMPANY_A))
            .expect_err("duplicate");
        assert_eq!(err.kind(), "conflict");
        assert_eq!(err.field(), Some("national_id"));
    }

    #[test]
    fn test_scenario_c_second_company_is_contract() {
        let db = test_db();
        seed_org(&db);
        let (state, _) = test_state();
        let first = create_employee(&db, &state, &owner_ctx(ts(2025, 1, 10)), create_in(COMPANY_A)).expect("A");

        let second = create_employee(&db, &state, &owner_ctx(ts(2025, 2, 10)), create_in(COMPANY_B)).expect("B");
        assert_eq!(second.classification.status, PlacementStatus::Contract);
        assert_eq!(second.placement.source, PlacementSource::Contract);
        assert_eq!(second.placement.from_company_id, Some(COMPANY_A));
        assert_eq!(second.warnings.len(), 1);
        assert!(second.warnings[0].contains("PT Alpha"));
        assert_eq!(first.employee.person_id, second.employee.person_id);
    }

    #[test]
    fn test_scenario_d_cool_down_blocks_non_owner() {
        let db = test_db();
        seed_org(&db);
        let (state, _) = test_state();
        let a = create_employee(&db, &state, &owner_ctx(ts(2025, 1, 1)), create_in(COMPANY_A)).expect("A");
        deactivate_on(&db, &state, a.employee.id, ts(2025, 1, 1));

        let err = create_employee(&db, &state, &staff_ctx(COMPANY_C, ts(2025, 1, 31)), create_in(COMPANY_C))
            .expect_err("cool-down");
        assert_eq!(err.kind(), "business_rule");
        assert_eq!(err.field(), Some("national_id"));
        assert!(db.find_employee_in_company(NIK, COMPANY_C).expect("q").is_none());

        let owner = create_employee(&db, &state, &owner_ctx(ts(2025, 1, 31)), create_in(COMPANY_C)).expect("owner");
        assert_eq!(owner.classification.status, PlacementStatus::Rehire);
        assert_eq!(owner.placement.from_company_id, Some(COMPANY_A));
    }

    #[test]
    fn test_scenario_e_blacklist_on_create_then_clear() {
        let db = test_db();
        seed_org(&db);
        let (state, _) = test_state();
        let mut req = create_in(COMPANY_A);
        req.statuses.push(StatusChange::Blacklist {
            reason: "Document fraud".into(),
            date: None,
            document: None,
        });

        let staff_err = create_employee(&db, &state, &staff_ctx(COMPANY_A, ts(2025, 1, 1)), req.clone())
            .expect_err("owner only");
        assert_eq!(staff_err.kind(), "authorization");

        let created = create_employee(&db, &state, &owner_ctx(ts(2025, 1, 1)), req).expect("create");
        assert!(!created.employee.is_active);
        assert!(db.is_blacklisted(NIK).expect("q"));
        let detail = get_employee_detail(&db, &owner_ctx(ts(2025, 1, 2)), created.employee.id).expect("detail");
        assert_eq!(detail.state, EmployeeState::Blacklisted);

        let blocked = create_employee(&db, &state, &staff_ctx(COMPANY_B, ts(2025, 6, 1)), create_in(COMPANY_B))
            .expect_err("blacklisted");
        assert_eq!(blocked.kind(), "business_rule");

        let cleared = clear_blacklist(&db, &state, &owner_ctx(ts(2025, 6, 2)), NIK).expect("clear");
        assert!(cleared.end_date.is_some());
        let audits = db.list_field_audits(created.employee.id).expect("audits");
        assert!(audits.iter().any(|a| a.field == "blacklist_status"
            && a.old_value.as_deref() == Some("blacklist")
            && a.new_value.as_deref() == Some("cleared")));
    }

    #[test]
    fn test_invalid_national_id_is_rejected_before_writes() {
        let db = test_db();
        seed_org(&db);
        let (state, sink) = test_state();
        let mut req = create_in(COMPANY_A);
        req.input.national_id = "123456789012345".into();
        let err = create_employee(&db, &state, &owner_ctx(ts(2025, 1, 1)), req).expect_err("15 digits");
        assert_eq!(err.kind(), "validation");
        assert_eq!(err.field(), Some("national_id"));
        assert!(db.find_by_identity(Some("123456789012345"), None).expect("q").is_none());
        assert!(sink.events().is_empty());

        let mut foreign = create_in(COMPANY_A);
        foreign.input.national_id = "a1b2 c3".into();
        foreign.input.citizenship = Citizenship::Foreign;
        let created = create_employee(&db, &state, &owner_ctx(ts(2025, 1, 1)), foreign).expect("foreign");
        assert_eq!(created.employee.national_id, "A1B2C3");
    }

    #[test]
    fn test_family_card_of_another_person_conflicts() {
        let db = test_db();
        seed_org(&db);
        let (state, _) = test_state();
        let mut first = create_in(COMPANY_A);
        first.input.family_card_number = Some("3201000000000001".into());
        create_employee(&db, &state, &owner_ctx(ts(2025, 1, 1)), first).expect("first");

        let mut second = CreateEmployeeRequest::new(EmployeeInput::new(
            "6543210987654321",
            "Sari",
            Placement::company(COMPANY_B),
        ));
        second.input.family_card_number = Some("3201000000000001".into());
        let err = create_employee(&db, &state, &owner_ctx(ts(2025, 1, 2)), second).expect_err("conflict");
        assert_eq!(err.kind(), "conflict");
        assert_eq!(err.field(), Some("family_card_number"));
    }

    #[test]
    fn test_create_with_inactive_status_and_vaccinations() {
        let db = test_db();
        seed_org(&db);
        let (state, _) = test_state();
        let mut req = create_in(COMPANY_A);
        req.input.photo = Some(Upload {
            file_name: "budi.png".into(),
            bytes: vec![0x89, 0x50],
        });
        req.statuses.push(StatusChange::Inactive {
            reason: "Imported as former staff".into(),
            date: None,
            document: None,
        });
        req.vaccinations.push(VaccinationInput {
            dose: 1,
            vaccine: " Sinovac ".into(),
            date: None,
        });

        let created = create_employee(&db, &state, &owner_ctx(ts(2025, 1, 5)), req).expect("create");
        assert!(!created.employee.is_active);
        assert!(created
            .employee
            .photo_path
            .as_deref()
            .expect("photo")
            .starts_with("karyawan/"));
        let detail = get_employee_detail(&db, &owner_ctx(ts(2025, 1, 5)), created.employee.id).expect("detail");
        assert_eq!(detail.state, EmployeeState::Inactive);
        assert_eq!(detail.vaccinations.len(), 1);
        assert_eq!(detail.vaccinations[0].vaccine, "Sinovac");
        assert_eq!(detail.statuses.len(), 1);
    }

    #[test]
    fn test_edit_is_idempotent_and_audited() {
        let db = test_db();
        seed_org(&db);
        let (state, sink) = test_state();
        let created = create_employee(&db, &state, &owner_ctx(ts(2025, 1, 1)), create_in(COMPANY_A)).expect("create");
        let id = created.employee.id;

        let unchanged = edit_of(&db, id);
        let outcome = edit_employee(&db, &state, &owner_ctx(ts(2025, 1, 2)), unchanged.clone()).expect("noop");
        assert!(outcome.changes.is_empty());
        let again = edit_employee(&db, &state, &owner_ctx(ts(2025, 1, 3)), unchanged).expect("noop again");
        assert!(again.changes.is_empty());
        assert!(db.list_field_audits(id).expect("audits").is_empty());
        assert_eq!(sink.events().len(), 1);

        let mut req = edit_of(&db, id);
        req.input.grade = Some(" B2 ".into());
        req.input.hire_date = NaiveDate::from_ymd_opt(2024, 12, 1);
        let outcome = edit_employee(&db, &state, &owner_ctx(ts(2025, 1, 4)), req).expect("edit");
        assert_eq!(outcome.changes.len(), 2);
        let trail = db.list_field_audits(id).expect("audits");
        let hire = trail.iter().find(|a| a.field == "hire_date").expect("hire audit");
        assert_eq!(hire.old_value, None);
        assert_eq!(hire.new_value.as_deref(), Some("2024-12-01"));
        assert!(trail.iter().all(|a| a.source == "edit"));
        assert!(outcome.placement.is_none());
    }

    #[test]
    fn test_edit_with_stale_version_conflicts() {
        let db = test_db();
        seed_org(&db);
        let (state, _) = test_state();
        let created = create_employee(&db, &state, &owner_ctx(ts(2025, 1, 1)), create_in(COMPANY_A)).expect("create");

        let stale = edit_of(&db, created.employee.id);
        let mut first = stale.clone();
        first.input.grade = Some("B1".into());
        edit_employee(&db, &state, &owner_ctx(ts(2025, 1, 2)), first).expect("first edit");

        let mut second = stale;
        second.input.grade = Some("C1".into());
        let err = edit_employee(&db, &state, &owner_ctx(ts(2025, 1, 3)), second).expect_err("stale");
        assert_eq!(err.kind(), "conflict");
        assert_eq!(err.field(), Some("version"));
    }

    #[test]
    fn test_department_move_is_classified_afresh() {
        let db = test_db();
        seed_org(&db);
        let (state, _) = test_state();
        let created = create_employee(&db, &state, &owner_ctx(ts(2025, 1, 1)), create_in(COMPANY_A)).expect("create");

        let mut req = edit_of(&db, created.employee.id);
        req.input.placement.department_id = Some(DEPT_A_OPS);
        req.input.role_label = Some("Operator".into());
        let outcome = edit_employee(&db, &state, &staff_ctx(COMPANY_A, ts(2025, 3, 1)), req).expect("edit");

        let placement = outcome.placement.expect("new placement");
        assert_eq!(placement.status, PlacementStatus::ActiveHire);
        assert_eq!(placement.source, PlacementSource::Recruit);
        assert_eq!(placement.from_company_id, Some(COMPANY_A));
        assert_eq!(placement.role_label.as_deref(), Some("Operator"));

        let history = db.list_placements(created.employee.id).expect("history");
        assert_eq!(history.len(), 2);
        assert_eq!(history.iter().filter(|p| p.end_date.is_none()).count(), 1);
        assert_eq!(history[0].end_date, Some(ts(2025, 3, 1).date_naive()));
    }

    #[test]
    fn test_transfer_cool_down_boundary_and_reactivation() {
        let db = test_db();
        seed_org(&db);
        let (state, _) = test_state();
        let mut req = create_in(COMPANY_B);
        req.input.hire_date = NaiveDate::from_ymd_opt(2024, 6, 1);
        let created = create_employee(&db, &state, &owner_ctx(ts(2024, 6, 1)), req).expect("create");
        let id = created.employee.id;
        deactivate_on(&db, &state, id, ts(2025, 1, 1));

        let mut day_89 = edit_of(&db, id);
        day_89.input.placement = Placement::company(COMPANY_C);
        day_89.input.is_active = true;
        let err = edit_employee(&db, &state, &unscoped_staff_ctx(ts(2025, 3, 31)), day_89.clone())
            .expect_err("89 days");
        assert_eq!(err.kind(), "business_rule");
        assert_eq!(db.list_placements(id).expect("history").len(), 1);

        let outcome = edit_employee(&db, &state, &unscoped_staff_ctx(ts(2025, 4, 1)), day_89).expect("90 days");
        assert_eq!(outcome.employee.company_id, COMPANY_C);
        assert!(outcome.employee.is_active);
        let placement = outcome.placement.expect("placement");
        assert_eq!(placement.status, PlacementStatus::Rehire);
        assert_eq!(placement.from_company_id, Some(COMPANY_B));

        assert!(db
            .open_statuses_for_employee(id, StatusKind::Inactive)
            .expect("q")
            .is_empty());
        let fields: Vec<String> = outcome.changes.iter().map(|c| c.field.clone()).collect();
        assert!(fields.contains(&"company_id".to_string()));
        assert!(fields.contains(&"is_active".to_string()));

        let detail = get_employee_detail(&db, &owner_ctx(ts(2025, 4, 2)), id).expect("detail");
        assert_eq!(detail.state, EmployeeState::Active);
    }

    #[test]
    fn test_transfer_outside_scope_is_unauthorized() {
        let db = test_db();
        seed_org(&db);
        let (state, _) = test_state();
        let created = create_employee(&db, &state, &owner_ctx(ts(2025, 1, 1)), create_in(COMPANY_B)).expect("create");

        for target in [COMPANY_A, COMPANY_C] {
            let mut req = edit_of(&db, created.employee.id);
            req.input.placement = Placement::company(target);
            let err = edit_employee(&db, &state, &staff_ctx(COMPANY_B, ts(2025, 2, 1)), req).expect_err("scope");
            assert_eq!(err.kind(), "authorization");
        }
        assert_eq!(db.list_placements(created.employee.id).expect("history").len(), 1);
    }

    #[test]
    fn test_department_scope_limits_writes() {
        let db = test_db();
        seed_org(&db);
        let (state, _) = test_state();
        let mut in_ops = create_in(COMPANY_A);
        in_ops.input.placement.department_id = Some(DEPT_A_OPS);
        let inside = create_employee(&db, &state, &owner_ctx(ts(2025, 1, 1)), in_ops).expect("ops");
        let mut other = create_in(COMPANY_A);
        other.input.national_id = "6543210987654321".into();
        let outside = create_employee(&db, &state, &owner_ctx(ts(2025, 1, 1)), other).expect("no dept");

        let ops_staff = department_ctx(COMPANY_A, DEPT_A_OPS, ts(2025, 2, 1));

        let mut rename = edit_of(&db, outside.employee.id);
        rename.input.name = "Renamed".into();
        let err = edit_employee(&db, &state, &ops_staff, rename).expect_err("outside department");
        assert_eq!(err.kind(), "authorization");

        // Pulling someone into the department needs the source to be visible too.
        let mut pull = edit_of(&db, outside.employee.id);
        pull.input.placement.department_id = Some(DEPT_A_OPS);
        let err = edit_employee(&db, &state, &ops_staff, pull).expect_err("source outside");
        assert_eq!(err.kind(), "authorization");

        // Moving someone out of the department lands outside the caller's view.
        let mut push = edit_of(&db, inside.employee.id);
        push.input.placement.department_id = None;
        let err = edit_employee(&db, &state, &ops_staff, push).expect_err("destination outside");
        assert_eq!(err.kind(), "authorization");

        let err = create_employee(&db, &state, &ops_staff, {
            let mut req = create_in(COMPANY_A);
            req.input.national_id = "1111222233334444".into();
            req
        })
        .expect_err("create outside department");
        assert_eq!(err.kind(), "authorization");

        let mut rename = edit_of(&db, inside.employee.id);
        rename.input.name = "Budi S.".into();
        let outcome = edit_employee(&db, &state, &ops_staff, rename).expect("inside department");
        assert_eq!(outcome.changes.len(), 1);
        assert_eq!(db.get_employee(outside.employee.id).expect("q").expect("row").department_id, None);
    }

    #[test]
    fn test_cancelled_request_writes_nothing() {
        let db = test_db();
        seed_org(&db);
        let (state, sink) = test_state();
        let token = CancellationToken::new();
        token.cancel();
        let ctx = owner_ctx(ts(2025, 1, 1)).with_cancel(token);

        let err = create_employee(&db, &state, &ctx, create_in(COMPANY_A)).expect_err("cancelled");
        assert!(matches!(err, LifecycleError::Cancelled));
        assert!(db.find_by_identity(Some(NIK), None).expect("q").is_none());
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_list_and_detail_respect_scope() {
        let db = test_db();
        seed_org(&db);
        let (state, _) = test_state();
        let a = create_employee(&db, &state, &owner_ctx(ts(2025, 1, 1)), create_in(COMPANY_A)).expect("A");
        let other = CreateEmployeeRequest::new(EmployeeInput::new(
            "6543210987654321",
            "Sari Dewi",
            Placement::company(COMPANY_B),
        ));
        create_employee(&db, &state, &owner_ctx(ts(2025, 1, 1)), other).expect("B");

        let staff_b = staff_ctx(COMPANY_B, ts(2025, 1, 2));
        let visible = list_employees(&db, &staff_b, &EmployeeQuery::default()).expect("list");
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "Sari Dewi");
        assert_eq!(visible[0].company_name.as_deref(), Some("PT Beta"));

        let all = list_employees(&db, &owner_ctx(ts(2025, 1, 2)), &EmployeeQuery::default()).expect("list");
        assert_eq!(all.len(), 2);

        let err = get_employee_detail(&db, &staff_b, a.employee.id).expect_err("hidden");
        assert_eq!(err.kind(), "authorization");
        let missing = get_employee_detail(&db, &staff_b, 999).expect_err("missing");
        assert_eq!(missing.kind(), "not_found");
    }
}
