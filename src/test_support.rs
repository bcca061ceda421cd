//! Shared fixtures for unit tests: throwaway databases, a small seeded
//! organization and request contexts for owner and scoped callers.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use crate::audit::MemoryAuditSink;
use crate::blob::FsBlobStore;
use crate::db::{DbEmployee, EmployeeData, HrDb, PersonData};
use crate::scope::{Caller, Scope};
use crate::state::{AppState, RequestContext};
use crate::types::{Citizenship, Config, Placement};

/// PT Alpha, top-level.
pub const COMPANY_A: i64 = 1;
/// PT Beta, main contractor.
pub const COMPANY_B: i64 = 2;
/// PT Gamma, vendor under PT Beta.
pub const COMPANY_C: i64 = 3;

pub const DEPT_A_OPS: i64 = 1;
pub const DEPT_B_WAREHOUSE: i64 = 2;
pub const SECTION_A_OPS_1: i64 = 1;
pub const POSITION_A_OPERATOR: i64 = 1;

pub const ROLE_STAFF: i64 = 1;
pub const ROLE_OWNER: i64 = 2;

pub fn test_db() -> HrDb {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("test.db");
    // Keep the directory alive for the duration of the test
    std::mem::forget(dir);
    HrDb::open_at(&path).expect("open test db")
}

pub fn ts(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub fn person_data(national_id: &str, name: &str) -> PersonData {
    PersonData {
        national_id: Some(national_id.to_string()),
        name: name.to_string(),
        citizenship: Citizenship::Citizen,
        ..Default::default()
    }
}

pub fn employee_data(national_id: &str, company_id: i64) -> EmployeeData {
    EmployeeData {
        national_id: national_id.to_string(),
        registration_number: None,
        hire_date: None,
        active_date: None,
        office_email: None,
        photo_path: None,
        placement: Placement::company(company_id),
        classification: None,
        grade: None,
        roster: None,
        work_location: None,
        is_active: true,
    }
}

/// Seed companies, org units and roles. Ids follow insertion order on a fresh
/// database and match the constants above.
pub fn seed_org(db: &HrDb) {
    let a = db.insert_company("PT Alpha", None).expect("company A");
    let b = db.insert_company("PT Beta", None).expect("company B");
    let c = db.insert_company("PT Gamma", Some(b)).expect("company C");
    assert_eq!((a, b, c), (COMPANY_A, COMPANY_B, COMPANY_C));

    let ops = db.insert_department(a, "Operations").expect("dept");
    let warehouse = db.insert_department(b, "Warehouse").expect("dept");
    assert_eq!((ops, warehouse), (DEPT_A_OPS, DEPT_B_WAREHOUSE));

    let shift = db.insert_section(ops, "Shift 1").expect("section");
    assert_eq!(shift, SECTION_A_OPS_1);
    let operator = db.insert_position(a, Some(shift), "Operator").expect("position");
    assert_eq!(operator, POSITION_A_OPERATOR);

    let staff = db.insert_role("Staff", 1).expect("role");
    let owner = db.insert_role("Owner", 9).expect("role");
    assert_eq!((staff, owner), (ROLE_STAFF, ROLE_OWNER));
}

/// Insert a person and an active employee directly through the store.
pub fn seed_employee(db: &HrDb, national_id: &str, company_id: i64) -> DbEmployee {
    let now = ts(2025, 1, 1);
    let person = db
        .upsert_person(&person_data(national_id, "Seeded"), "seed", now)
        .expect("person");
    let code = crate::employee_code::generate_employee_code(20, now, |c| db.employee_code_exists(c))
        .expect("code");
    db.insert_employee(
        person.id,
        code.as_str(),
        &employee_data(national_id, company_id),
        "seed",
        now,
    )
    .expect("employee")
}

/// App state backed by a temp blob root and an in-memory audit sink.
pub fn test_state() -> (AppState, Arc<MemoryAuditSink>) {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path().to_path_buf();
    std::mem::forget(dir);

    let sink = Arc::new(MemoryAuditSink::default());
    let config = Config::rooted_at(&root);
    let blobs = Arc::new(FsBlobStore::new(config.blob_root.clone()));
    (AppState::with_collaborators(config, sink.clone(), blobs), sink)
}

pub fn owner_ctx(now: DateTime<Utc>) -> RequestContext {
    let caller = Caller {
        user: "owner".into(),
        role_id: ROLE_OWNER,
        company_id: None,
        department_id: None,
        section_id: None,
        position_id: None,
    };
    RequestContext::new(caller, Scope::owner(), now)
}

pub fn staff_ctx(company_id: i64, now: DateTime<Utc>) -> RequestContext {
    let caller = Caller {
        user: "hr-staff".into(),
        role_id: ROLE_STAFF,
        company_id: Some(company_id),
        department_id: None,
        section_id: None,
        position_id: None,
    };
    RequestContext::new(caller, Scope::company(company_id), now)
}

/// Staff whose session is narrowed to one department.
pub fn department_ctx(company_id: i64, department_id: i64, now: DateTime<Utc>) -> RequestContext {
    let caller = Caller {
        user: "dept-staff".into(),
        role_id: ROLE_STAFF,
        company_id: Some(company_id),
        department_id: Some(department_id),
        section_id: None,
        position_id: None,
    };
    let mut scope = Scope::company(company_id);
    scope.department_id = Some(department_id);
    RequestContext::new(caller, scope, now)
}

/// Non-owner whose session carries no org unit: unrestricted, but still
/// subject to the blacklist and cool-down rules.
pub fn unscoped_staff_ctx(now: DateTime<Utc>) -> RequestContext {
    let caller = Caller {
        user: "central-hr".into(),
        role_id: ROLE_STAFF,
        company_id: None,
        department_id: None,
        section_id: None,
        position_id: None,
    };
    let scope = Scope {
        is_owner: false,
        company_id: None,
        department_id: None,
        section_id: None,
        position_id: None,
    };
    RequestContext::new(caller, scope, now)
}
