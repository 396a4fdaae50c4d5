//! Audit trail of state-changing calls.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::ids::ActorId;

/// One state-changing call: who did what to which record, with snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEntry {
    pub actor: ActorId,
    pub action: &'static str,
    pub resource: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<Value>,
    pub at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        actor: &ActorId,
        action: &'static str,
        resource: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            actor: actor.clone(),
            action,
            resource: resource.into(),
            before: None,
            after: None,
            at,
        }
    }

    pub fn with_before<T: Serialize>(mut self, before: &T) -> Self {
        self.before = serde_json::to_value(before).ok();
        self
    }

    pub fn with_after<T: Serialize>(mut self, after: &T) -> Self {
        self.after = serde_json::to_value(after).ok();
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit sink unavailable: {0}")]
    Unavailable(String),
}

pub trait AuditSink: Send + Sync {
    fn record(&self, entry: AuditEntry) -> Result<(), AuditError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, entry: AuditEntry) -> Result<(), AuditError> {
        tracing::info!(
            target: "audit",
            actor = %entry.actor,
            action = entry.action,
            resource = %entry.resource,
            at = %entry.at,
            "audit"
        );
        Ok(())
    }
}

/// In-memory sink for tests and the demo.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditSink {
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, entry: AuditEntry) -> Result<(), AuditError> {
        self.entries
            .lock()
            .map_err(|_| AuditError::Unavailable("memory sink poisoned".to_string()))?
            .push(entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn entries_capture_before_and_after_snapshots() {
        let sink = MemoryAuditSink::default();
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();
        let entry = AuditEntry::new(&ActorId::new("usr-1"), "requirement.approve", "req-9", at)
            .with_before(&json!({"status": "submitted"}))
            .with_after(&json!({"status": "approved"}));

        sink.record(entry).unwrap();
        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].before, Some(json!({"status": "submitted"})));
        assert_eq!(entries[0].after.as_ref().unwrap()["status"], "approved");
    }
}
