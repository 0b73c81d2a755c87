//! Audit event recording.

use std::sync::{Mutex, MutexGuard};

use super::AuditEvent;

/// Destination for audit events, in addition to `tracing`.
pub trait AuditSink: Send + Sync {
    /// Records one event.
    fn record(&self, event: AuditEvent);
}

/// In-memory recorder for audit events.
///
/// # Example
///
/// ```
/// use auth_gate::audit::{AuditAction, AuditEvent, AuditOutcome, AuditSink, AuditTrail};
///
/// let trail = AuditTrail::new();
/// trail.record(AuditEvent::new(
///     "req-1",
///     42,
///     "jdoe",
///     AuditAction::AccountDeleted,
///     AuditOutcome::Success,
/// ));
///
/// assert_eq!(trail.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct AuditTrail {
    events: Mutex<Vec<AuditEvent>>,
}

impl AuditTrail {
    /// Creates a new empty audit trail.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all recorded events, oldest first.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.guard().clone()
    }

    /// Returns the number of recorded events.
    pub fn len(&self) -> usize {
        self.guard().len()
    }

    /// Returns true if no events have been recorded.
    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    /// Clears all recorded events.
    pub fn clear(&self) {
        self.guard().clear();
    }

    fn guard(&self) -> MutexGuard<'_, Vec<AuditEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl AuditSink for AuditTrail {
    fn record(&self, event: AuditEvent) {
        self.guard().push(event);
    }
}
