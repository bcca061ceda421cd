//! Employee code generation: `IC-` plus seven random uppercase alphanumerics,
//! retried against a uniqueness check, then a timestamp fallback.
//!
//! The fallback (`IC-yyMMddHH`) is only unique per hour. A collision there
//! surfaces as a UNIQUE violation on insert, which is an accepted risk.

use chrono::{DateTime, Utc};
use rand::seq::IndexedRandom;

use crate::db::DbError;

pub const CODE_PREFIX: &str = "IC-";
const CODE_LEN: usize = 7;
const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// How the returned code was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmployeeCode {
    Random(String),
    Fallback(String),
}

impl EmployeeCode {
    pub fn as_str(&self) -> &str {
        match self {
            EmployeeCode::Random(code) | EmployeeCode::Fallback(code) => code,
        }
    }
}

fn random_code() -> String {
    let mut rng = rand::rng();
    let body: String = (0..CODE_LEN)
        .filter_map(|_| CHARSET.choose(&mut rng).map(|b| *b as char))
        .collect();
    format!("{CODE_PREFIX}{body}")
}

pub fn fallback_code(now: DateTime<Utc>) -> String {
    format!("{CODE_PREFIX}{}", now.format("%y%m%d%H"))
}

/// Try up to `attempts` random codes; `is_taken` answers the uniqueness check.
pub fn generate_employee_code<F>(
    attempts: u32,
    now: DateTime<Utc>,
    mut is_taken: F,
) -> Result<EmployeeCode, DbError>
where
    F: FnMut(&str) -> Result<bool, DbError>,
{
    for _ in 0..attempts {
        let candidate = random_code();
        if !is_taken(&candidate)? {
            return Ok(EmployeeCode::Random(candidate));
        }
    }
    let code = fallback_code(now);
    log::warn!("Employee code space exhausted after {} attempts, using {}", attempts, code);
    Ok(EmployeeCode::Fallback(code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_random_code_shape() {
        let code = generate_employee_code(20, Utc::now(), |_| Ok(false)).expect("code");
        let EmployeeCode::Random(code) = code else {
            panic!("expected random code");
        };
        assert_eq!(code.len(), 10);
        assert!(code.starts_with("IC-"));
        assert!(code[3..]
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_fallback_after_exhausted_attempts() {
        let now = Utc.with_ymd_and_hms(2025, 7, 9, 14, 30, 0).single().expect("time");
        let mut calls = 0;
        let code = generate_employee_code(20, now, |_| {
            calls += 1;
            Ok(true)
        })
        .expect("code");
        assert_eq!(calls, 20);
        assert_eq!(code, EmployeeCode::Fallback("IC-25070914".into()));
    }

    #[test]
    fn test_retries_until_free() {
        let mut calls = 0;
        let code = generate_employee_code(20, Utc::now(), |_| {
            calls += 1;
            Ok(calls < 3)
        })
        .expect("code");
        assert!(matches!(code, EmployeeCode::Random(_)));
        assert_eq!(calls, 3);
    }
}
