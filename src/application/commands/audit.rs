//! Audit trail for resolved command invocations

use chrono::{DateTime, Utc};
use std::fmt;

/// How a resolved command was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    Executed,
    PermissionDenied,
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditOutcome::Executed => f.write_str("used"),
            AuditOutcome::PermissionDenied => f.write_str("was denied"),
        }
    }
}

/// One audit record, written before the command hook runs
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub actor_id: String,
    pub actor_name: String,
    pub command: String,
    pub raw: String,
    pub outcome: AuditOutcome,
}

impl fmt::Display for AuditEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}({}) {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.actor_name,
            self.actor_id,
            self.outcome,
            self.raw
        )
    }
}

/// Destination for audit records
pub trait AuditSink: Send + Sync {
    fn record(&self, entry: &AuditEntry);
}

/// Emits audit records as `tracing` events under the `audit` target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, entry: &AuditEntry) {
        tracing::info!(
            target: "audit",
            actor = %entry.actor_id,
            command = %entry.command,
            outcome = ?entry.outcome,
            "{}({}) {} {}",
            entry.actor_name,
            entry.actor_id,
            entry.outcome,
            entry.raw
        );
    }
}

/// Drops every record; for hosts with auditing turned off
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _entry: &AuditEntry) {}
}
