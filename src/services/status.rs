// Employee status service: blacklist and cool-down guards, deactivation,
// blacklist clearing and disciplinary infractions.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::audit::{emit_best_effort, AuditAction, AuditEvent, FieldChange};
use crate::blob::{Upload, DOCUMENT_FOLDER};
use crate::db::audits::AuditSubject;
use crate::db::{DbEmployee, DbStatusEntry, HrDb, NewStatus};
use crate::error::LifecycleError;
use crate::identity::normalize_identity_number;
use crate::scope::Scope;
use crate::state::{AppState, RequestContext};
use crate::types::{AuditSource, StatusKind};

use super::{clean_text, load_employee};

/// A requested status entry. Each kind carries the fields it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatusChange {
    /// Resigned or otherwise out of employment. Defaults to today.
    Inactive {
        reason: String,
        date: Option<NaiveDate>,
        document: Option<Upload>,
    },
    /// Owner-only.
    Blacklist {
        reason: String,
        date: Option<NaiveDate>,
        document: Option<Upload>,
    },
    /// Orthogonal flag; never ends and never touches the active flag.
    Infraction {
        category: String,
        reason: String,
        date: NaiveDate,
        document: Option<Upload>,
    },
}

impl StatusChange {
    pub fn kind(&self) -> StatusKind {
        match self {
            StatusChange::Inactive { .. } => StatusKind::Inactive,
            StatusChange::Blacklist { .. } => StatusKind::Blacklist,
            StatusChange::Infraction { .. } => StatusKind::Infraction,
        }
    }

    fn document(&self) -> Option<&Upload> {
        match self {
            StatusChange::Inactive { document, .. }
            | StatusChange::Blacklist { document, .. }
            | StatusChange::Infraction { document, .. } => document.as_ref(),
        }
    }

    /// Check required fields and the owner rule without touching storage.
    pub fn validate(&self, scope: &Scope) -> Result<(), LifecycleError> {
        let reason = match self {
            StatusChange::Inactive { reason, .. } | StatusChange::Blacklist { reason, .. } => reason,
            StatusChange::Infraction {
                category, reason, ..
            } => {
                if category.trim().is_empty() {
                    return Err(LifecycleError::validation(
                        "category",
                        "Infraction category is required",
                    ));
                }
                reason
            }
        };
        if reason.trim().is_empty() {
            return Err(LifecycleError::validation("reason", "A reason is required"));
        }
        if self.kind() == StatusKind::Blacklist {
            scope.ensure_owner("Blacklisting an employee")?;
        }
        Ok(())
    }
}

/// A validated status change whose document has already been stored.
#[derive(Debug, Clone)]
pub(crate) struct PreparedStatus {
    pub kind: StatusKind,
    pub reason: String,
    pub category: Option<String>,
    pub start_date: NaiveDate,
    pub document_path: Option<String>,
}

/// Store supporting documents and resolve default dates.
pub(crate) fn prepare_statuses(
    state: &AppState,
    ctx: &RequestContext,
    changes: &[StatusChange],
) -> Result<Vec<PreparedStatus>, LifecycleError> {
    changes
        .iter()
        .map(|change| -> Result<PreparedStatus, LifecycleError> {
            let document_path = state.blobs.save(change.document(), DOCUMENT_FOLDER)?;
            let prepared = match change {
                StatusChange::Inactive { reason, date, .. }
                | StatusChange::Blacklist { reason, date, .. } => PreparedStatus {
                    kind: change.kind(),
                    reason: reason.trim().to_string(),
                    category: None,
                    start_date: date.unwrap_or_else(|| ctx.today()),
                    document_path,
                },
                StatusChange::Infraction {
                    category,
                    reason,
                    date,
                    ..
                } => PreparedStatus {
                    kind: StatusKind::Infraction,
                    reason: reason.trim().to_string(),
                    category: clean_text(Some(category.as_str())),
                    start_date: *date,
                    document_path,
                },
            };
            Ok(prepared)
        })
        .collect()
}

pub(crate) fn write_statuses(
    db: &HrDb,
    employee: &DbEmployee,
    statuses: &[PreparedStatus],
    ctx: &RequestContext,
) -> Result<Vec<DbStatusEntry>, LifecycleError> {
    let mut written = Vec::with_capacity(statuses.len());
    for status in statuses {
        let entry = db.record_status(
            &NewStatus {
                employee_id: employee.id,
                person_id: employee.person_id,
                national_id: &employee.national_id,
                kind: status.kind,
                reason: &status.reason,
                category: status.category.as_deref(),
                start_date: status.start_date,
                document_path: status.document_path.as_deref(),
                actor: ctx.actor(),
            },
            ctx.now,
        )?;
        written.push(entry);
    }
    Ok(written)
}

// =============================================================================
// Guards
// =============================================================================

/// Non-owners may not write to a blacklisted national ID.
pub fn ensure_not_blacklisted(
    db: &HrDb,
    scope: &Scope,
    national_id: &str,
) -> Result<(), LifecycleError> {
    if scope.is_owner {
        return Ok(());
    }
    if db.is_blacklisted(national_id)? {
        return Err(LifecycleError::business_rule(
            "national_id",
            format!("National ID {} is blacklisted", national_id),
        ));
    }
    Ok(())
}

/// Non-owners must wait `cool_down_days` after the latest inactive date before
/// hiring or transferring the same national ID. Exactly `cool_down_days` passes.
pub fn ensure_cool_down_elapsed(
    db: &HrDb,
    scope: &Scope,
    national_id: &str,
    today: NaiveDate,
    cool_down_days: i64,
) -> Result<(), LifecycleError> {
    if scope.is_owner {
        return Ok(());
    }
    let Some(inactive_since) = db.latest_inactive_date(national_id)? else {
        return Ok(());
    };
    let elapsed = (today - inactive_since).num_days();
    if elapsed < cool_down_days {
        return Err(LifecycleError::business_rule(
            "national_id",
            format!(
                "Inactive since {}; {} of {} cool-down days have passed",
                inactive_since.format("%Y-%m-%d"),
                elapsed.max(0),
                cool_down_days
            ),
        ));
    }
    Ok(())
}

// =============================================================================
// Use cases
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeactivateRequest {
    pub employee_id: i64,
    /// Honored for owners only; everyone else records an inactive entry.
    #[serde(default)]
    pub blacklist: bool,
    pub reason: String,
    pub category: Option<String>,
    pub date: Option<NaiveDate>,
    pub document: Option<Upload>,
}

/// Take an employee out of employment (inactive, or blacklisted by an owner).
pub fn deactivate_employee(
    db: &HrDb,
    state: &AppState,
    ctx: &RequestContext,
    req: DeactivateRequest,
) -> Result<DbStatusEntry, LifecycleError> {
    let reason = req.reason.trim();
    if reason.is_empty() {
        return Err(LifecycleError::validation("reason", "A reason is required"));
    }

    let employee = load_employee(db, req.employee_id)?;
    ctx.scope.ensure_can_write(&employee.placement())?;

    let kind = if req.blacklist && ctx.scope.is_owner {
        StatusKind::Blacklist
    } else {
        if req.blacklist {
            log::info!(
                "Blacklist requested by non-owner {}; recording inactive instead",
                ctx.actor()
            );
        }
        StatusKind::Inactive
    };

    if db.is_blacklisted(&employee.national_id)? {
        return Err(LifecycleError::business_rule(
            "national_id",
            format!("National ID {} is already blacklisted", employee.national_id),
        ));
    }

    let document_path = state.blobs.save(req.document.as_ref(), DOCUMENT_FOLDER)?;
    ctx.ensure_not_cancelled()?;

    let status = PreparedStatus {
        kind,
        reason: reason.to_string(),
        category: clean_text(req.category.as_deref()),
        start_date: req.date.unwrap_or_else(|| ctx.today()),
        document_path,
    };

    let entry = db.with_transaction(|tx| -> Result<DbStatusEntry, LifecycleError> {
        tx.set_employee_active(employee.id, false, ctx.actor(), ctx.now)?;
        let mut written = write_statuses(tx, &employee, std::slice::from_ref(&status), ctx)?;
        if employee.is_active {
            tx.insert_field_audits(
                AuditSubject {
                    employee_id: employee.id,
                    person_id: employee.person_id,
                    national_id: &employee.national_id,
                },
                &[FieldChange {
                    field: "is_active".to_string(),
                    old_value: Some("true".to_string()),
                    new_value: Some("false".to_string()),
                }],
                AuditSource::Deactivate,
                ctx.actor(),
                ctx.now,
            )?;
        }
        written
            .pop()
            .ok_or_else(|| LifecycleError::Transient("status entry was not written".to_string()))
    })?;

    log::info!(
        "Employee {} ({}) marked {} by {}",
        employee.id,
        employee.employee_code,
        kind,
        ctx.actor()
    );
    emit_best_effort(
        state.audit.as_ref(),
        AuditEvent::employee(
            AuditAction::Update,
            employee.id,
            ctx.actor(),
            format!("Employee {} marked {}: {}", employee.employee_code, kind, reason),
        ),
    );
    Ok(entry)
}

/// End the open blacklist entry of a national ID. Owner-only.
pub fn clear_blacklist(
    db: &HrDb,
    state: &AppState,
    ctx: &RequestContext,
    national_id: &str,
) -> Result<DbStatusEntry, LifecycleError> {
    ctx.scope.ensure_owner("Clearing a blacklist")?;
    let national_id = normalize_identity_number(national_id)
        .ok_or_else(|| LifecycleError::validation("national_id", "National ID is required"))?;

    let mut entry = db
        .open_blacklist(&national_id)?
        .ok_or_else(|| LifecycleError::NotFound(format!("open blacklist for {}", national_id)))?;
    ctx.ensure_not_cancelled()?;

    let today = ctx.today();
    db.with_transaction(|tx| -> Result<(), LifecycleError> {
        tx.end_status(entry.id, today, ctx.actor(), ctx.now)?;
        tx.insert_field_audits(
            AuditSubject {
                employee_id: entry.employee_id,
                person_id: entry.person_id,
                national_id: &entry.national_id,
            },
            &[FieldChange {
                field: "blacklist_status".to_string(),
                old_value: Some("blacklist".to_string()),
                new_value: Some("cleared".to_string()),
            }],
            AuditSource::ClearBlacklist,
            ctx.actor(),
            ctx.now,
        )?;
        Ok(())
    })?;
    entry.end_date = Some(today);

    log::info!("Blacklist on {} cleared by {}", national_id, ctx.actor());
    emit_best_effort(
        state.audit.as_ref(),
        AuditEvent::employee(
            AuditAction::Update,
            entry.employee_id,
            ctx.actor(),
            format!("Blacklist on {} cleared", national_id),
        ),
    );
    Ok(entry)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfractionRequest {
    pub employee_id: i64,
    pub category: String,
    pub reason: String,
    pub date: NaiveDate,
    pub document: Option<Upload>,
}

/// Record a disciplinary infraction. The active flag is left alone.
pub fn record_infraction(
    db: &HrDb,
    state: &AppState,
    ctx: &RequestContext,
    req: InfractionRequest,
) -> Result<DbStatusEntry, LifecycleError> {
    let change = StatusChange::Infraction {
        category: req.category,
        reason: req.reason,
        date: req.date,
        document: req.document,
    };
    change.validate(&ctx.scope)?;

    let employee = load_employee(db, req.employee_id)?;
    ctx.scope.ensure_can_write(&employee.placement())?;
    ensure_not_blacklisted(db, &ctx.scope, &employee.national_id)?;

    let prepared = prepare_statuses(state, ctx, std::slice::from_ref(&change))?;
    ctx.ensure_not_cancelled()?;

    let mut written = db.with_transaction(|tx| write_statuses(tx, &employee, &prepared, ctx))?;
    let entry = written
        .pop()
        .ok_or_else(|| LifecycleError::Transient("status entry was not written".to_string()))?;

    emit_best_effort(
        state.audit.as_ref(),
        AuditEvent::employee(
            AuditAction::Update,
            employee.id,
            ctx.actor(),
            format!(
                "Infraction recorded for {}: {}",
                employee.employee_code,
                entry.category.as_deref().unwrap_or("-")
            ),
        ),
    );
    Ok(entry)
}

/// Close open inactive entries of an employee being reactivated.
pub(crate) fn close_open_inactive(
    db: &HrDb,
    employee: &DbEmployee,
    ctx: &RequestContext,
) -> Result<usize, LifecycleError> {
    let open = db.open_statuses_for_employee(employee.id, StatusKind::Inactive)?;
    for entry in &open {
        db.end_status(entry.id, ctx.today(), ctx.actor(), ctx.now)?;
    }
    Ok(open.len())
}
