//! Shared domain types and configuration.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found at {0}")]
    NotFound(PathBuf),

    #[error("Failed to read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Engine configuration, read from a camelCase JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub database_path: PathBuf,
    /// Root directory for uploaded photos and supporting documents.
    pub blob_root: PathBuf,
    #[serde(default = "default_preview_ttl_secs")]
    pub preview_ttl_secs: u64,
    /// Minimum days between an inactive date and a new hire/transfer (non-owners).
    #[serde(default = "default_cool_down_days")]
    pub cool_down_days: i64,
    /// Role level at or above which a caller is treated as owner.
    #[serde(default = "default_owner_role_level")]
    pub owner_role_level: i64,
    #[serde(default = "default_code_attempts")]
    pub code_attempts: u32,
}

fn default_preview_ttl_secs() -> u64 {
    30 * 60
}

fn default_cool_down_days() -> i64 {
    90
}

fn default_owner_role_level() -> i64 {
    4
}

fn default_code_attempts() -> u32 {
    20
}

impl Config {
    /// Configuration rooted at `dir`, all tunables at their defaults.
    pub fn rooted_at(dir: &Path) -> Self {
        Self {
            database_path: dir.join("karyawan.db"),
            blob_root: dir.join("uploads"),
            preview_ttl_secs: default_preview_ttl_secs(),
            cool_down_days: default_cool_down_days(),
            owner_role_level: default_owner_role_level(),
            code_attempts: default_code_attempts(),
        }
    }
}

/// Load and validate the configuration file.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&content)?;

    if config.cool_down_days < 0 {
        return Err(ConfigError::Invalid("coolDownDays must not be negative".into()));
    }
    if config.code_attempts == 0 {
        return Err(ConfigError::Invalid("codeAttempts must be at least 1".into()));
    }
    Ok(config)
}

// ---------------------------------------------------------------------------
// Text-backed enums
// ---------------------------------------------------------------------------

/// Stored as text columns; unknown values surface as a conversion error.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("Unknown {}: {}", stringify!($name), other)),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let text = value.as_str()?;
                text.parse()
                    .map_err(|e: String| FromSqlError::Other(e.into()))
            }
        }
    };
}

/// Citizenship drives the national-ID format rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Citizenship {
    #[default]
    #[serde(rename = "WNI")]
    Citizen,
    #[serde(rename = "WNA")]
    Foreign,
}

text_enum!(Citizenship {
    Citizen => "WNI",
    Foreign => "WNA",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Inactive,
    Blacklist,
    Infraction,
}

text_enum!(StatusKind {
    Inactive => "inactive",
    Blacklist => "blacklist",
    Infraction => "infraction",
});

/// How a placement came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementStatus {
    ActiveHire,
    Contract,
    Rehire,
    Transfer,
    Unspecified,
}

text_enum!(PlacementStatus {
    ActiveHire => "active_hire",
    Contract => "contract",
    Rehire => "rehire",
    Transfer => "transfer",
    Unspecified => "unspecified",
});

/// Which path triggered a placement transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementSource {
    Recruit,
    Edit,
    Rehire,
    Contract,
    Import,
}

text_enum!(PlacementSource {
    Recruit => "recruit",
    Edit => "edit",
    Rehire => "rehire",
    Contract => "contract",
    Import => "import",
});

/// Source tag stamped on field audit rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSource {
    Edit,
    Deactivate,
    ClearBlacklist,
    Import,
}

text_enum!(AuditSource {
    Edit => "edit",
    Deactivate => "deactivate",
    ClearBlacklist => "clear_blacklist",
    Import => "import",
});

// ---------------------------------------------------------------------------
// Organizational placement
// ---------------------------------------------------------------------------

/// Company / department / section / position assignment of one employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub company_id: i64,
    pub department_id: Option<i64>,
    pub section_id: Option<i64>,
    pub position_id: Option<i64>,
}

impl Placement {
    pub fn company(company_id: i64) -> Self {
        Self {
            company_id,
            department_id: None,
            section_id: None,
            position_id: None,
        }
    }
}
