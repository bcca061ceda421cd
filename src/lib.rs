//! Employee lifecycle and cross-company transfer engine.
//!
//! People, their employments per company, placement history, statuses
//! (inactive / blacklist / infraction) and field-level audits, over a SQLite
//! store. Entry points live in [`services`] and [`import`]; every operation takes
//! a [`state::RequestContext`] resolved from the caller's session.

pub mod audit;
pub mod blob;
pub mod db;
pub mod employee_code;
pub mod error;
pub mod identity;
pub mod import;
mod migrations;
pub mod scope;
pub mod services;
pub mod state;
pub mod types;

#[cfg(test)]
mod test_support;
