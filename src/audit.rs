//! Audit trail for forced account removals.
//!
//! Every cleanup produces an `AuditEvent` that is emitted through `tracing`
//! (target `auth_gate::audit`) and, when the gate was built with one, handed
//! to an `AuditSink`. Events carry identifiers only, never credentials.

mod event;
mod trail;

pub use event::{AuditAction, AuditEvent, AuditOutcome};
pub use trail::{AuditSink, AuditTrail};
