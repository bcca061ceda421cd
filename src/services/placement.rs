// Placement classification for new hires, contract moves and rehires.

use serde::Serialize;

use crate::db::{DbError, HrDb};
use crate::types::{Placement, PlacementSource, PlacementStatus};

/// How a placement into a company is classified, and where the person came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryClassification {
    pub status: PlacementStatus,
    pub source: PlacementSource,
    pub last_company_id: Option<i64>,
}

/// Classify a placement of `national_id` into `target_company_id`.
///
/// Looks at the most recent employment in a different company:
/// none means a fresh hire; otherwise any inactive history makes it a rehire,
/// and a plain move between companies is a contract placement.
pub fn resolve_history_classification(
    db: &HrDb,
    national_id: &str,
    target_company_id: i64,
) -> Result<HistoryClassification, DbError> {
    let Some(previous) = db.latest_employee_elsewhere(national_id, target_company_id)? else {
        return Ok(HistoryClassification {
            status: PlacementStatus::ActiveHire,
            source: PlacementSource::Recruit,
            last_company_id: None,
        });
    };

    let (status, source) = if db.has_inactive_history(national_id)? {
        (PlacementStatus::Rehire, PlacementSource::Rehire)
    } else {
        (PlacementStatus::Contract, PlacementSource::Contract)
    };
    Ok(HistoryClassification {
        status,
        source,
        last_company_id: Some(previous.company_id),
    })
}

/// Field-by-field comparison of two placements.
pub fn placement_changed(before: &Placement, after: &Placement) -> bool {
    before.company_id != after.company_id
        || before.department_id != after.department_id
        || before.section_id != after.section_id
        || before.position_id != after.position_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::NewStatus;
    use crate::test_support::{seed_employee, seed_org, test_db, ts, COMPANY_A, COMPANY_B, COMPANY_C};
    use crate::types::StatusKind;

    #[test]
    fn test_first_placement_is_active_hire() {
        let db = test_db();
        seed_org(&db);
        let c = resolve_history_classification(&db, "1234567890123456", COMPANY_A).expect("classify");
        assert_eq!(c.status, PlacementStatus::ActiveHire);
        assert_eq!(c.source, PlacementSource::Recruit);
        assert_eq!(c.last_company_id, None);
    }

    #[test]
    fn test_same_company_record_is_ignored() {
        let db = test_db();
        seed_org(&db);
        seed_employee(&db, "1234567890123456", COMPANY_A);
        let c = resolve_history_classification(&db, "1234567890123456", COMPANY_A).expect("classify");
        assert_eq!(c.status, PlacementStatus::ActiveHire);
    }

    #[test]
    fn test_contract_versus_rehire() {
        let db = test_db();
        seed_org(&db);
        let emp = seed_employee(&db, "1234567890123456", COMPANY_A);

        let c = resolve_history_classification(&db, "1234567890123456", COMPANY_B).expect("classify");
        assert_eq!(c.status, PlacementStatus::Contract);
        assert_eq!(c.source, PlacementSource::Contract);
        assert_eq!(c.last_company_id, Some(COMPANY_A));

        db.record_status(
            &NewStatus {
                employee_id: emp.id,
                person_id: emp.person_id,
                national_id: &emp.national_id,
                kind: StatusKind::Inactive,
                reason: "resigned",
                category: None,
                start_date: ts(2025, 2, 1).date_naive(),
                document_path: None,
                actor: "hr",
            },
            ts(2025, 2, 1),
        )
        .expect("status");

        let c = resolve_history_classification(&db, "1234567890123456", COMPANY_C).expect("classify");
        assert_eq!(c.status, PlacementStatus::Rehire);
        assert_eq!(c.source, PlacementSource::Rehire);
        assert_eq!(c.last_company_id, Some(COMPANY_A));
    }

    #[test]
    fn test_placement_changed_compares_every_level() {
        let base = Placement::company(COMPANY_A);
        assert!(!placement_changed(&base, &base));
        assert!(placement_changed(&base, &Placement { section_id: Some(1), ..base }));
        assert!(placement_changed(&base, &Placement::company(COMPANY_B)));
    }
}
