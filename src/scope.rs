//! Access scope resolution.
//!
//! A caller is either an owner (sees and writes everything) or scoped to the
//! most specific organizational unit their session carries.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbRole, HrDb};
use crate::error::LifecycleError;
use crate::types::Placement;

/// Role metadata provider (the permission service).
pub trait RoleLookup {
    fn role(&self, role_id: i64) -> Result<Option<DbRole>, DbError>;
}

impl RoleLookup for HrDb {
    fn role(&self, role_id: i64) -> Result<Option<DbRole>, DbError> {
        self.get_role(role_id)
    }
}

impl RoleLookup for HashMap<i64, DbRole> {
    fn role(&self, role_id: i64) -> Result<Option<DbRole>, DbError> {
        Ok(self.get(&role_id).cloned())
    }
}

/// Identity of the authenticated caller, as carried by the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Caller {
    /// Recorded in audit stamps.
    pub user: String,
    pub role_id: i64,
    pub company_id: Option<i64>,
    pub department_id: Option<i64>,
    pub section_id: Option<i64>,
    pub position_id: Option<i64>,
}

/// Read filter derived from a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeFilter {
    Unrestricted,
    Company(i64),
    Department(i64),
    Section(i64),
    Position(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    pub is_owner: bool,
    pub company_id: Option<i64>,
    pub department_id: Option<i64>,
    pub section_id: Option<i64>,
    pub position_id: Option<i64>,
}

impl Scope {
    pub fn owner() -> Self {
        Self {
            is_owner: true,
            company_id: None,
            department_id: None,
            section_id: None,
            position_id: None,
        }
    }

    /// Non-owner scope pinned to one company.
    pub fn company(company_id: i64) -> Self {
        Self {
            is_owner: false,
            company_id: Some(company_id),
            department_id: None,
            section_id: None,
            position_id: None,
        }
    }

    /// Most specific non-null level wins: position, section, department, company.
    pub fn filter(&self) -> ScopeFilter {
        if self.is_owner {
            return ScopeFilter::Unrestricted;
        }
        if let Some(id) = self.position_id {
            ScopeFilter::Position(id)
        } else if let Some(id) = self.section_id {
            ScopeFilter::Section(id)
        } else if let Some(id) = self.department_id {
            ScopeFilter::Department(id)
        } else if let Some(id) = self.company_id {
            ScopeFilter::Company(id)
        } else {
            ScopeFilter::Unrestricted
        }
    }

    /// Whether a record placed as given is visible through this scope.
    pub fn can_read(&self, placement: &Placement) -> bool {
        match self.filter() {
            ScopeFilter::Unrestricted => true,
            ScopeFilter::Company(id) => placement.company_id == id,
            ScopeFilter::Department(id) => placement.department_id == Some(id),
            ScopeFilter::Section(id) => placement.section_id == Some(id),
            ScopeFilter::Position(id) => placement.position_id == Some(id),
        }
    }

    /// Writes follow the read filter: the caller must be able to see the
    /// placement being written, both where a record is and where it goes.
    pub fn ensure_can_write(&self, placement: &Placement) -> Result<(), LifecycleError> {
        if self.can_read(placement) {
            return Ok(());
        }
        Err(LifecycleError::Authorization(match self.filter() {
            ScopeFilter::Company(id) => format!(
                "company {} is outside your scope (company {})",
                placement.company_id, id
            ),
            ScopeFilter::Department(id) => format!("placement is outside your department ({})", id),
            ScopeFilter::Section(id) => format!("placement is outside your section ({})", id),
            ScopeFilter::Position(id) => format!("placement is outside your position ({})", id),
            ScopeFilter::Unrestricted => "placement is outside your scope".to_string(),
        }))
    }

    pub fn ensure_owner(&self, action: &str) -> Result<(), LifecycleError> {
        if self.is_owner {
            Ok(())
        } else {
            Err(LifecycleError::Authorization(format!("{} requires the owner role", action)))
        }
    }
}

/// Derive the caller's scope from role metadata.
///
/// Owner when the role level reaches `owner_level` or the role is named
/// `Owner`. An unknown role resolves to a plain scoped caller.
pub fn resolve_scope(
    roles: &dyn RoleLookup,
    owner_level: i64,
    caller: &Caller,
) -> Result<Scope, LifecycleError> {
    let role = roles.role(caller.role_id)?;
    let is_owner = role
        .as_ref()
        .map(|r| r.level >= owner_level || r.name.trim().eq_ignore_ascii_case("owner"))
        .unwrap_or(false);

    if role.is_none() {
        log::warn!("Unknown role {} for user {}", caller.role_id, caller.user);
    }

    let scope = if is_owner {
        Scope::owner()
    } else {
        Scope {
            is_owner: false,
            company_id: caller.company_id,
            department_id: caller.department_id,
            section_id: caller.section_id,
            position_id: caller.position_id,
        }
    };

    if scope.filter() == ScopeFilter::Unrestricted && !scope.is_owner {
        log::warn!(
            "User {} has no organizational scope; reads are unfiltered",
            caller.user
        );
    }
    Ok(scope)
}
