use std::fmt;
use std::sync::Arc;

use crate::audit::{AuditAction, AuditEvent, AuditOutcome, AuditSink};
use crate::config::GateConfig;
use crate::context::RequestCycle;
use crate::error::Error;
use crate::logging::GateLog;
use crate::modules::ModuleRegistry;
use crate::policy::RoleDeficiency;
use crate::redirect::RedirectPolicy;
use crate::request::Principal;
use crate::session::SessionStore;
use crate::state::CycleState;
use crate::storage::UserStorage;
use crate::web::{HttpError, Redirect, RequestKind};

/// Pipeline stage a hook is registered against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    /// Unhandled exception responses (403, 404)
    Exception,
    /// Incoming requests
    Request,
}

/// A hook registration: stage, entry point, priority (0 runs first).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    /// Pipeline stage
    pub hook: Hook,
    /// Name of the `AuthGate` method to call
    pub handler: &'static str,
    /// Ordering among listeners of the same stage
    pub priority: i32,
}

/// Logs out and deletes accounts that hold only the baseline role.
///
/// The gate is shared by all request threads. Everything that belongs to a
/// single request lives in the [`RequestCycle`] passed to each hook.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use auth_gate::{
///     AuthGate, CycleState, EnabledModules, MemorySessionStore, MemoryUserStorage, Principal,
///     RequestCycle, RequestKind, UserRecord,
/// };
///
/// let users = Arc::new(MemoryUserStorage::new());
/// users.insert(UserRecord::new(42, "jdoe"));
///
/// let gate = AuthGate::builder(
///     users.clone(),
///     Arc::new(MemorySessionStore::new()),
///     Arc::new(EnabledModules::none()),
/// )
/// .build()
/// .unwrap();
///
/// let mut cycle = RequestCycle::new("req-1", Some(Principal::authenticated(42, "jdoe")));
/// gate.on_request(&mut cycle, RequestKind::Main).unwrap();
///
/// assert_eq!(cycle.state(), CycleState::Redirected);
/// assert_eq!(cycle.response().unwrap().location(), "/user/logout");
/// assert!(!users.contains(42));
/// ```
pub struct AuthGate {
    deficiency: RoleDeficiency,
    redirect: RedirectPolicy,
    request_priority: i32,
    users: Arc<dyn UserStorage>,
    sessions: Arc<dyn SessionStore>,
    modules: Arc<dyn ModuleRegistry>,
    audit: Option<Arc<dyn AuditSink>>,
}

impl AuthGate {
    /// Starts building a gate around the given collaborators.
    pub fn builder(
        users: Arc<dyn UserStorage>,
        sessions: Arc<dyn SessionStore>,
        modules: Arc<dyn ModuleRegistry>,
    ) -> AuthGateBuilder {
        AuthGateBuilder {
            config: GateConfig::default(),
            users,
            sessions,
            modules,
            audit: None,
        }
    }

    /// Returns the hook registrations for the host's event dispatcher.
    pub fn subscriptions(&self) -> [Subscription; 2] {
        [
            Subscription {
                hook: Hook::Exception,
                handler: "on_exception",
                priority: 0,
            },
            Subscription {
                hook: Hook::Request,
                handler: "on_request",
                priority: self.request_priority,
            },
        ]
    }

    /// Exception hook.
    ///
    /// For not-found and access-denied errors, evaluates the principal and
    /// cleans up if it is role-deficient. The cycle is then flagged so the
    /// request hook skips it, whether or not cleanup ran. Other errors are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Propagates cleanup failures.
    pub fn on_exception(&self, cycle: &mut RequestCycle, error: &HttpError) -> Result<(), Error> {
        if !error.is_gated() {
            cycle
                .log()
                .debug(format_args!("ignoring exception: {}", error));
            return Ok(());
        }

        if cycle.state().is_evaluated() {
            cycle
                .log()
                .debug(format_args!("principal already evaluated ({:?})", cycle.state()));
        } else if self.is_role_deficient(cycle) {
            self.cleanup_and_redirect(cycle)?;
        } else {
            cycle.advance(CycleState::ExceptionEvaluated);
        }

        cycle.mark_exception_handled();
        Ok(())
    }

    /// Request hook.
    ///
    /// Sub-requests and cycles already handled by the exception hook are
    /// skipped. Otherwise a role-deficient principal is cleaned up and the
    /// response replaced with a redirect.
    ///
    /// # Errors
    ///
    /// Propagates cleanup failures.
    pub fn on_request(&self, cycle: &mut RequestCycle, kind: RequestKind) -> Result<(), Error> {
        if kind == RequestKind::Sub {
            cycle.log().debug(format_args!("skipping sub-request"));
            return Ok(());
        }

        if cycle.exception_handled() {
            cycle.advance(CycleState::Passthrough);
            return Ok(());
        }

        if cycle.state().is_terminal() {
            return Ok(());
        }

        if self.is_role_deficient(cycle) {
            self.cleanup_and_redirect(cycle)
        } else {
            cycle.advance(CycleState::Passthrough);
            Ok(())
        }
    }

    /// Returns true if the cycle's principal holds only the baseline role
    /// and is not protected. Anonymous requests are never deficient.
    pub fn is_role_deficient(&self, cycle: &RequestCycle) -> bool {
        self.deficiency.is_deficient(cycle.principal())
    }

    /// Logs the account out, deletes it, and replaces the response with a
    /// redirect.
    ///
    /// Storage failures are returned, not swallowed: the host must turn them
    /// into a server error rather than continue serving the account.
    fn cleanup_and_redirect(&self, cycle: &mut RequestCycle) -> Result<(), Error> {
        let Some(principal) = cycle.principal().cloned() else {
            return Ok(());
        };
        let request_id = cycle.request_id().to_owned();
        let log = GateLog::new(&request_id).for_account(principal.id);

        log.notice(format_args!(
            "The account with username {} was automatically deleted \
             since the account had no roles.",
            principal.name
        ));

        let sessions_ended = self.sessions.invalidate(principal.id).map_err(|source| {
            self.record_failure(&log, &principal, AuditAction::Logout);
            Error::Logout {
                account_id: principal.id,
                source,
            }
        })?;

        let action = self.delete_account(&log, &principal)?;

        let target = self.redirect.resolve(self.modules.as_ref()).clone();
        log.info(format_args!(
            "redirecting account {} to {}{}",
            principal.id,
            target.location(),
            if target.is_trusted() { " (trusted)" } else { "" }
        ));

        self.audit(
            AuditEvent::new(
                &request_id,
                principal.id,
                &principal.name,
                action,
                AuditOutcome::Success,
            )
            .with_sessions_ended(sessions_ended)
            .with_redirect(target.location()),
        );
        cycle.redirect(Redirect::to(target));
        Ok(())
    }

    fn delete_account(
        &self,
        log: &GateLog<'_>,
        principal: &Principal,
    ) -> Result<AuditAction, Error> {
        let record = self.users.load(principal.id).map_err(|source| {
            self.record_failure(log, principal, AuditAction::AccountDeleted);
            Error::Load {
                account_id: principal.id,
                source,
            }
        })?;

        let Some(record) = record else {
            log.warn(format_args!(
                "account {} was already deleted, possibly by a concurrent request",
                principal.id
            ));
            return Ok(AuditAction::AlreadyDeleted);
        };

        self.users.delete(&record).map_err(|source| {
            self.record_failure(log, principal, AuditAction::AccountDeleted);
            Error::Delete {
                account_id: principal.id,
                source,
            }
        })?;
        Ok(AuditAction::AccountDeleted)
    }

    fn record_failure(&self, log: &GateLog<'_>, principal: &Principal, stage: AuditAction) {
        log.error(format_args!("cleanup of account {} failed at {}", principal.id, stage));
        self.audit(AuditEvent::new(
            log.request_id(),
            principal.id,
            &principal.name,
            stage,
            AuditOutcome::Error,
        ));
    }

    fn audit(&self, event: AuditEvent) {
        event.emit();
        if let Some(sink) = &self.audit {
            sink.record(event);
        }
    }
}

impl fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthGate")
            .field("deficiency", &self.deficiency)
            .field("redirect", &self.redirect)
            .field("request_priority", &self.request_priority)
            .field("audit", &self.audit.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`AuthGate`].
pub struct AuthGateBuilder {
    config: GateConfig,
    users: Arc<dyn UserStorage>,
    sessions: Arc<dyn SessionStore>,
    modules: Arc<dyn ModuleRegistry>,
    audit: Option<Arc<dyn AuditSink>>,
}

impl AuthGateBuilder {
    /// Replaces the whole configuration.
    pub fn config(mut self, config: GateConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the redirect policy.
    pub fn redirect(mut self, policy: RedirectPolicy) -> Self {
        self.config.redirect = policy;
        self
    }

    /// Records audit events to `sink` as well as `tracing`.
    pub fn audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    /// Validates the configuration and builds the gate.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration is invalid.
    pub fn build(self) -> Result<AuthGate, Error> {
        self.config.validate()?;

        Ok(AuthGate {
            deficiency: self.config.deficiency(),
            redirect: self.config.redirect,
            request_priority: self.config.request_priority,
            users: self.users,
            sessions: self.sessions,
            modules: self.modules,
            audit: self.audit,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::audit::AuditTrail;
    use crate::config::REQUEST_PRIORITY;
    use crate::error::{ConfigError, StorageError, StorageErrorKind};
    use crate::modules::EnabledModules;
    use crate::redirect::{RedirectTarget, ENTERPRISE_LOGOUT_URL, LOGOUT_PATH};
    use crate::session::MemorySessionStore;
    use crate::storage::{MemoryUserStorage, UserRecord};

    struct Fixture {
        users: Arc<MemoryUserStorage>,
        sessions: Arc<MemorySessionStore>,
        trail: Arc<AuditTrail>,
        gate: AuthGate,
    }

    fn fixture(modules: EnabledModules) -> Fixture {
        let users = Arc::new(MemoryUserStorage::new());
        let sessions = Arc::new(MemorySessionStore::new());
        let trail = Arc::new(AuditTrail::new());
        for (id, name) in [(1, "admin"), (42, "jdoe"), (43, "editor")] {
            users.insert(UserRecord::new(id, name));
            sessions.open(id, format!("sess-{}", id));
        }
        let gate = AuthGate::builder(users.clone(), sessions.clone(), Arc::new(modules))
            .audit_sink(trail.clone())
            .build()
            .expect("default config is valid");
        Fixture {
            users,
            sessions,
            trail,
            gate,
        }
    }

    fn jdoe() -> Principal {
        Principal::authenticated(42, "jdoe")
    }

    #[test]
    fn subscriptions_register_both_hooks() {
        let f = fixture(EnabledModules::none());
        let [exception, request] = f.gate.subscriptions();

        assert_eq!(exception.hook, Hook::Exception);
        assert_eq!(exception.handler, "on_exception");
        assert_eq!(request.hook, Hook::Request);
        assert_eq!(request.handler, "on_request");
        assert_eq!(request.priority, REQUEST_PRIORITY);
    }

    #[test]
    fn deficient_request_is_cleaned_up() {
        let f = fixture(EnabledModules::none());
        let mut cycle = RequestCycle::new("req-1", Some(jdoe()));

        f.gate.on_request(&mut cycle, RequestKind::Main).unwrap();

        assert!(!f.users.contains(42));
        assert!(!f.sessions.is_active("sess-42"));
        assert_eq!(cycle.state(), CycleState::Redirected);
        let redirect = cycle.response().expect("redirect set");
        assert_eq!(redirect.location(), LOGOUT_PATH);
        assert!(!redirect.is_trusted());
    }

    #[test]
    fn sso_deployments_redirect_to_trusted_logout() {
        let f = fixture(["samlauth"].into_iter().collect());
        let mut cycle = RequestCycle::new("req-1", Some(jdoe()));

        f.gate.on_request(&mut cycle, RequestKind::Main).unwrap();

        let redirect = cycle.response().expect("redirect set");
        assert_eq!(redirect.location(), ENTERPRISE_LOGOUT_URL);
        assert!(redirect.is_trusted());
    }

    #[test]
    fn audit_event_names_account() {
        let f = fixture(EnabledModules::none());
        let mut cycle = RequestCycle::new("req-audit", Some(jdoe()));

        f.gate.on_request(&mut cycle, RequestKind::Main).unwrap();

        let events = f.trail.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].account_name(), "jdoe");
        assert_eq!(events[0].request_id(), "req-audit");
        assert_eq!(events[0].action(), AuditAction::AccountDeleted);
        assert_eq!(events[0].sessions_ended(), 1);
        assert_eq!(events[0].redirect(), Some(LOGOUT_PATH));
    }

    #[test]
    fn acceptable_roles_pass_through() {
        let f = fixture(EnabledModules::none());
        let mut cycle = RequestCycle::new(
            "req-1",
            Some(Principal::authenticated(43, "editor").with_role("editor")),
        );

        f.gate.on_request(&mut cycle, RequestKind::Main).unwrap();

        assert!(f.users.contains(43));
        assert_eq!(cycle.state(), CycleState::Passthrough);
        assert!(cycle.response().is_none());
        assert!(f.trail.is_empty());
    }

    #[test]
    fn superuser_is_never_deleted() {
        let f = fixture(EnabledModules::none());
        let mut cycle = RequestCycle::new("req-1", Some(Principal::authenticated(1, "admin")));

        f.gate.on_request(&mut cycle, RequestKind::Main).unwrap();

        assert!(f.users.contains(1));
        assert!(f.sessions.is_active("sess-1"));
        assert_eq!(cycle.state(), CycleState::Passthrough);
    }

    #[test]
    fn anonymous_request_passes_through() {
        let f = fixture(EnabledModules::none());
        let mut cycle = RequestCycle::anonymous("req-1");

        assert!(!f.gate.is_role_deficient(&cycle));
        f.gate.on_request(&mut cycle, RequestKind::Main).unwrap();

        assert_eq!(f.users.len(), 3);
        assert_eq!(cycle.state(), CycleState::Passthrough);
    }

    #[test]
    fn sub_requests_are_ignored() {
        let f = fixture(EnabledModules::none());
        let mut cycle = RequestCycle::new("req-1", Some(jdoe()));

        f.gate.on_request(&mut cycle, RequestKind::Sub).unwrap();

        assert!(f.users.contains(42));
        assert_eq!(cycle.state(), CycleState::Start);
    }

    #[test]
    fn not_found_cleans_up_once() {
        let f = fixture(EnabledModules::none());
        let mut cycle = RequestCycle::new("req-1", Some(jdoe()));

        f.gate.on_exception(&mut cycle, &HttpError::NotFound).unwrap();
        assert!(cycle.exception_handled());
        assert_eq!(cycle.state(), CycleState::Redirected);

        f.gate.on_request(&mut cycle, RequestKind::Main).unwrap();

        assert_eq!(f.users.deletions(), 1);
        assert_eq!(f.trail.len(), 1);
    }

    #[test]
    fn gated_exception_sets_flag_without_cleanup() {
        let f = fixture(EnabledModules::none());
        let mut cycle = RequestCycle::new(
            "req-1",
            Some(Principal::authenticated(43, "editor").with_role("editor")),
        );

        f.gate.on_exception(&mut cycle, &HttpError::AccessDenied).unwrap();

        assert!(cycle.exception_handled());
        assert_eq!(cycle.state(), CycleState::ExceptionEvaluated);

        f.gate.on_request(&mut cycle, RequestKind::Main).unwrap();
        assert_eq!(cycle.state(), CycleState::Passthrough);
    }

    #[test]
    fn other_exceptions_are_ignored() {
        let f = fixture(EnabledModules::none());
        let mut cycle = RequestCycle::new("req-1", Some(jdoe()));

        f.gate
            .on_exception(&mut cycle, &HttpError::from_status(http::StatusCode::BAD_GATEWAY))
            .unwrap();

        assert!(!cycle.exception_handled());
        assert!(f.users.contains(42));

        // The request hook still gets its chance.
        f.gate.on_request(&mut cycle, RequestKind::Main).unwrap();
        assert!(!f.users.contains(42));
    }

    #[test]
    fn exception_after_passthrough_does_not_reevaluate() {
        let f = fixture(EnabledModules::none());
        let mut cycle = RequestCycle::new(
            "req-1",
            Some(Principal::authenticated(43, "editor").with_role("editor")),
        );

        f.gate.on_request(&mut cycle, RequestKind::Main).unwrap();
        f.gate.on_exception(&mut cycle, &HttpError::NotFound).unwrap();

        assert!(cycle.exception_handled());
        assert_eq!(cycle.state(), CycleState::Passthrough);
    }

    #[test]
    fn already_deleted_record_is_benign() {
        let f = fixture(EnabledModules::none());
        f.users.delete(&UserRecord::new(42, "jdoe")).unwrap();
        let mut cycle = RequestCycle::new("req-1", Some(jdoe()));

        f.gate.on_request(&mut cycle, RequestKind::Main).unwrap();

        assert_eq!(cycle.state(), CycleState::Redirected);
        assert_eq!(f.trail.events()[0].action(), AuditAction::AlreadyDeleted);
    }

    struct BrokenStorage;

    impl UserStorage for BrokenStorage {
        fn load(&self, id: u64) -> Result<Option<UserRecord>, StorageError> {
            Ok(Some(UserRecord::new(id, "jdoe")))
        }

        fn delete(&self, _record: &UserRecord) -> Result<(), StorageError> {
            Err(StorageError::with_message(StorageErrorKind::Backend, "locked"))
        }
    }

    #[test]
    fn delete_failure_propagates_without_redirect() {
        let trail = Arc::new(AuditTrail::new());
        let gate = AuthGate::builder(
            Arc::new(BrokenStorage),
            Arc::new(MemorySessionStore::new()),
            Arc::new(EnabledModules::none()),
        )
        .audit_sink(trail.clone())
        .build()
        .unwrap();
        let mut cycle = RequestCycle::new("req-1", Some(jdoe()));

        let err = gate.on_request(&mut cycle, RequestKind::Main).unwrap_err();

        assert!(matches!(err, Error::Delete { account_id: 42, .. }));
        assert!(cycle.response().is_none());
        assert_eq!(trail.events()[0].outcome(), AuditOutcome::Error);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let err = AuthGate::builder(
            Arc::new(MemoryUserStorage::new()),
            Arc::new(MemorySessionStore::new()),
            Arc::new(EnabledModules::none()),
        )
        .redirect(RedirectPolicy::new(RedirectTarget::Local("//evil.example.com".into())))
        .build()
        .unwrap_err();

        assert!(matches!(err, Error::Config(ConfigError::InvalidLocalTarget(_))));
    }

    #[test]
    fn header_breaking_target_is_rejected_before_any_request() {
        let err = AuthGate::builder(
            Arc::new(MemoryUserStorage::new()),
            Arc::new(MemorySessionStore::new()),
            Arc::new(EnabledModules::none()),
        )
        .redirect(RedirectPolicy::new(RedirectTarget::Local(
            "/user/logout\r\nX-Injected: y".into(),
        )))
        .build()
        .unwrap_err();

        assert!(matches!(err, Error::Config(ConfigError::InvalidLocalTarget(_))));
    }

    struct FailingSessions;

    impl SessionStore for FailingSessions {
        fn invalidate(&self, _account_id: u64) -> Result<usize, StorageError> {
            Err(StorageError::with_message(StorageErrorKind::Unavailable, "redis down"))
        }
    }

    #[test]
    fn logout_failure_aborts_before_delete() {
        let users = Arc::new(MemoryUserStorage::new());
        users.insert(UserRecord::new(42, "jdoe"));
        let trail = Arc::new(AuditTrail::new());
        let gate = AuthGate::builder(
            users.clone(),
            Arc::new(FailingSessions),
            Arc::new(EnabledModules::none()),
        )
        .audit_sink(trail.clone())
        .build()
        .unwrap();
        let mut cycle = RequestCycle::new("req-1", Some(jdoe()));

        let err = gate.on_request(&mut cycle, RequestKind::Main).unwrap_err();

        assert!(matches!(err, Error::Logout { account_id: 42, .. }));
        assert!(users.contains(42));
        assert_eq!(users.deletions(), 0);
        assert!(cycle.response().is_none());

        let events = trail.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action(), AuditAction::Logout);
        assert_eq!(events[0].outcome(), AuditOutcome::Error);
    }

    type CallLog = Arc<Mutex<Vec<&'static str>>>;

    struct RecordingSessions(CallLog);

    impl SessionStore for RecordingSessions {
        fn invalidate(&self, _account_id: u64) -> Result<usize, StorageError> {
            self.0.lock().unwrap().push("invalidate");
            Ok(1)
        }
    }

    struct RecordingUsers(CallLog);

    impl UserStorage for RecordingUsers {
        fn load(&self, id: u64) -> Result<Option<UserRecord>, StorageError> {
            self.0.lock().unwrap().push("load");
            Ok(Some(UserRecord::new(id, "jdoe")))
        }

        fn delete(&self, _record: &UserRecord) -> Result<(), StorageError> {
            self.0.lock().unwrap().push("delete");
            Ok(())
        }
    }

    #[test]
    fn sessions_end_before_record_is_deleted() {
        let calls: CallLog = Arc::default();
        let gate = AuthGate::builder(
            Arc::new(RecordingUsers(calls.clone())),
            Arc::new(RecordingSessions(calls.clone())),
            Arc::new(EnabledModules::none()),
        )
        .build()
        .unwrap();
        let mut cycle = RequestCycle::new("req-1", Some(jdoe()));

        gate.on_request(&mut cycle, RequestKind::Main).unwrap();

        assert_eq!(*calls.lock().unwrap(), vec!["invalidate", "load", "delete"]);
        assert_eq!(cycle.state(), CycleState::Redirected);
    }

    #[test]
    fn access_denied_policy_redirects_locally() {
        let users = Arc::new(MemoryUserStorage::new());
        users.insert(UserRecord::new(42, "jdoe"));
        let gate = AuthGate::builder(
            users,
            Arc::new(MemorySessionStore::new()),
            Arc::new(["samlauth"].into_iter().collect::<EnabledModules>()),
        )
        .redirect(RedirectPolicy::access_denied())
        .build()
        .unwrap();
        let mut cycle = RequestCycle::new("req-1", Some(jdoe()));

        gate.on_request(&mut cycle, RequestKind::Main).unwrap();

        assert_eq!(cycle.response().unwrap().location(), "/system/403");
    }
}
