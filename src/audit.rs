//! Field-level audit deltas and the outbound audit sink.
//!
//! Values are normalized to text by the domain layer before diffing: dates as
//! `yyyy-MM-dd`, booleans as `true`/`false`, everything else trimmed with empty
//! text treated as absent. `diff_fields` only ever compares those strings.

use chrono::NaiveDate;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Normalized values and diffs
// ---------------------------------------------------------------------------

/// A field value already normalized for comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditValue(Option<String>);

impl AuditValue {
    pub fn text(value: Option<&str>) -> Self {
        Self(value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string))
    }

    pub fn date(value: Option<NaiveDate>) -> Self {
        Self(value.map(|d| d.format("%Y-%m-%d").to_string()))
    }

    pub fn flag(value: bool) -> Self {
        Self(Some(value.to_string()))
    }

    pub fn id(value: Option<i64>) -> Self {
        Self(value.map(|v| v.to_string()))
    }

    pub fn into_inner(self) -> Option<String> {
        self.0
    }
}

/// Ordered list of `(field name, normalized value)` pairs describing a record.
pub type FieldSnapshot = Vec<(&'static str, AuditValue)>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub field: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

/// Changes between two snapshots of the same shape. Fields missing from
/// `before` are compared against an absent value.
pub fn diff_fields(before: &FieldSnapshot, after: &FieldSnapshot) -> Vec<FieldChange> {
    after
        .iter()
        .filter_map(|(field, new)| {
            let old = before
                .iter()
                .find(|(name, _)| name == field)
                .map(|(_, v)| v.clone())
                .unwrap_or(AuditValue(None));
            if &old == new {
                None
            } else {
                Some(FieldChange {
                    field: (*field).to_string(),
                    old_value: old.into_inner(),
                    new_value: new.clone().into_inner(),
                })
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Audit sink (fire-and-forget broadcaster)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
    Create,
    Update,
}

/// One completed lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub action: AuditAction,
    pub entity_type: String,
    pub key: String,
    pub description: String,
    pub actor: String,
}

impl AuditEvent {
    pub fn employee(action: AuditAction, employee_id: i64, actor: &str, description: String) -> Self {
        Self {
            action,
            entity_type: "karyawan".to_string(),
            key: employee_id.to_string(),
            description,
            actor: actor.to_string(),
        }
    }
}

pub trait AuditSink: Send + Sync {
    fn emit(&self, event: &AuditEvent) -> Result<(), String>;
}

/// Deliver after commit; delivery failures are logged and dropped.
pub fn emit_best_effort(sink: &dyn AuditSink, event: AuditEvent) {
    if let Err(e) = sink.emit(&event) {
        log::warn!(
            "Audit sink rejected {:?} for {} {}: {}",
            event.action,
            event.entity_type,
            event.key,
            e
        );
    }
}

/// Writes events to the application log.
#[derive(Debug, Default)]
pub struct LogAuditSink;

impl AuditSink for LogAuditSink {
    fn emit(&self, event: &AuditEvent) -> Result<(), String> {
        log::info!(
            "audit {:?} {}:{} by {}: {}",
            event.action,
            event.entity_type,
            event.key,
            event.actor,
            event.description
        );
        Ok(())
    }
}

/// Keeps events in memory, for embedding hosts that forward them in batches.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().clone()
    }

    pub fn drain(&self) -> Vec<AuditEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl AuditSink for MemoryAuditSink {
    fn emit(&self, event: &AuditEvent) -> Result<(), String> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSink;

    impl AuditSink for FailingSink {
        fn emit(&self, _event: &AuditEvent) -> Result<(), String> {
            Err("broker down".to_string())
        }
    }

    fn snapshot(grade: Option<&str>, active: bool, hired: Option<NaiveDate>) -> FieldSnapshot {
        vec![
            ("grade", AuditValue::text(grade)),
            ("is_active", AuditValue::flag(active)),
            ("hire_date", AuditValue::date(hired)),
        ]
    }

    #[test]
    fn test_unchanged_snapshot_yields_no_changes() {
        let day = NaiveDate::from_ymd_opt(2025, 1, 2);
        let before = snapshot(Some("B1"), true, day);
        let after = snapshot(Some("  B1 "), true, day);
        assert!(diff_fields(&before, &after).is_empty());
    }

    #[test]
    fn test_empty_text_equals_absent() {
        let before = snapshot(None, true, None);
        let after = snapshot(Some("   "), true, None);
        assert!(diff_fields(&before, &after).is_empty());
    }

    #[test]
    fn test_changes_are_normalized_text() {
        let before = snapshot(Some("B1"), true, None);
        let after = snapshot(Some("B2"), false, NaiveDate::from_ymd_opt(2025, 3, 4));
        let changes = diff_fields(&before, &after);
        assert_eq!(changes.len(), 3);
        assert_eq!(changes[1].old_value.as_deref(), Some("true"));
        assert_eq!(changes[1].new_value.as_deref(), Some("false"));
        assert_eq!(changes[2].old_value, None);
        assert_eq!(changes[2].new_value.as_deref(), Some("2025-03-04"));
    }

    #[test]
    fn test_memory_sink_collects_and_drains() {
        let sink = MemoryAuditSink::default();
        emit_best_effort(
            &sink,
            AuditEvent::employee(AuditAction::Create, 5, "hr", "Created employee".into()),
        );
        assert_eq!(sink.events().len(), 1);
        assert_eq!(sink.events()[0].entity_type, "karyawan");
        assert_eq!(sink.drain().len(), 1);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_failing_sink_is_swallowed() {
        emit_best_effort(
            &FailingSink,
            AuditEvent::employee(AuditAction::Update, 1, "hr", "x".into()),
        );
    }
}
