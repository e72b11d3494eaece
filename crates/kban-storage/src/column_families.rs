//! Column family definitions.

/// Session records: kban → SessionRecord
pub const CF_KBAN_SESSIONS: &str = "kban_sessions";

/// Audit events: sequence (big-endian) → AuditEvent
pub const CF_AUDIT_EVENTS: &str = "audit_events";

/// Audit events by kban: (kban, sequence) → AuditEvent
pub const CF_AUDIT_EVENTS_BY_KBAN: &str = "audit_events_by_kban";

/// Get all column family names
pub fn all_column_families() -> Vec<&'static str> {
    vec![CF_KBAN_SESSIONS, CF_AUDIT_EVENTS, CF_AUDIT_EVENTS_BY_KBAN]
}
