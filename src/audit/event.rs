//! Audit event schema for forced account removals.

use std::fmt;

/// What happened to the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    /// Ending the account's sessions; only recorded when that step failed
    Logout,
    /// The backing user record was deleted, or deleting it failed
    AccountDeleted,
    /// The record was already gone, e.g. removed by a concurrent request
    AlreadyDeleted,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditAction::Logout => write!(f, "logout"),
            AuditAction::AccountDeleted => write!(f, "account_deleted"),
            AuditAction::AlreadyDeleted => write!(f, "already_deleted"),
        }
    }
}

/// Outcome of the cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    /// Cleanup finished and a redirect was issued
    Success,
    /// Cleanup failed; the request is aborted
    Error,
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditOutcome::Success => write!(f, "success"),
            AuditOutcome::Error => write!(f, "error"),
        }
    }
}

/// A record of one forced removal.
///
/// # Example
///
/// ```
/// use auth_gate::audit::{AuditAction, AuditEvent, AuditOutcome};
///
/// let event = AuditEvent::new(
///     "req-1",
///     42,
///     "jdoe",
///     AuditAction::AccountDeleted,
///     AuditOutcome::Success,
/// )
/// .with_redirect("/user/logout")
/// .with_sessions_ended(2);
///
/// assert_eq!(event.account_name(), "jdoe");
/// assert_eq!(event.redirect(), Some("/user/logout"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    request_id: String,
    account_id: u64,
    account_name: String,
    action: AuditAction,
    outcome: AuditOutcome,
    sessions_ended: usize,
    redirect: Option<String>,
}

impl AuditEvent {
    /// Creates an event with the required fields.
    pub fn new(
        request_id: impl Into<String>,
        account_id: u64,
        account_name: impl Into<String>,
        action: AuditAction,
        outcome: AuditOutcome,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            account_id,
            account_name: account_name.into(),
            action,
            outcome,
            sessions_ended: 0,
            redirect: None,
        }
    }

    /// Sets the redirect location issued to the account.
    pub fn with_redirect(mut self, location: impl Into<String>) -> Self {
        self.redirect = Some(location.into());
        self
    }

    /// Sets how many sessions were ended.
    pub fn with_sessions_ended(mut self, count: usize) -> Self {
        self.sessions_ended = count;
        self
    }

    /// Returns the request identifier.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Returns the removed account's id.
    pub fn account_id(&self) -> u64 {
        self.account_id
    }

    /// Returns the removed account's name.
    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    /// Returns the action taken.
    pub fn action(&self) -> AuditAction {
        self.action
    }

    /// Returns the outcome.
    pub fn outcome(&self) -> AuditOutcome {
        self.outcome
    }

    /// Returns the number of sessions ended.
    pub fn sessions_ended(&self) -> usize {
        self.sessions_ended
    }

    /// Returns the redirect location, if one was issued.
    pub fn redirect(&self) -> Option<&str> {
        self.redirect.as_deref()
    }

    /// Emits the event through `tracing` under the `auth_gate::audit` target.
    pub fn emit(&self) {
        tracing::info!(
            target: "auth_gate::audit",
            request_id = %self.request_id,
            account_id = self.account_id,
            account_name = %self.account_name,
            action = %self.action,
            outcome = %self.outcome,
            sessions_ended = self.sessions_ended,
            redirect = ?self.redirect,
            "audit event"
        );
    }
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AuditEvent[action={}, outcome={}, request_id={}, account={}({})",
            self.action, self.outcome, self.request_id, self.account_name, self.account_id
        )?;
        if self.sessions_ended > 0 {
            write!(f, ", sessions_ended={}", self.sessions_ended)?;
        }
        if let Some(redirect) = &self.redirect {
            write!(f, ", redirect={}", redirect)?;
        }
        write!(f, "]")
    }
}
