use crate::logging::GateLog;
use crate::request::Principal;
use crate::state::CycleState;
use crate::web::Redirect;

/// Request-scoped state for one request/response cycle.
///
/// The host creates one `RequestCycle` per inbound request and passes it to
/// both gate hooks. The duplicate-suppression flag and the substituted
/// response live here, never on the shared [`AuthGate`](crate::AuthGate), so
/// concurrent requests cannot observe each other's state.
///
/// # Examples
///
/// ```
/// use auth_gate::{CycleState, Principal, RequestCycle};
///
/// let cycle = RequestCycle::new("req-1", Some(Principal::authenticated(42, "jdoe")));
/// assert_eq!(cycle.request_id(), "req-1");
/// assert!(!cycle.is_anonymous());
/// assert!(!cycle.exception_handled());
/// assert_eq!(cycle.state(), CycleState::Start);
/// assert!(cycle.response().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct RequestCycle {
    request_id: String,
    principal: Option<Principal>,
    exception_handled: bool,
    state: CycleState,
    response: Option<Redirect>,
}

impl RequestCycle {
    /// Starts a cycle for a request made by `principal` (`None` if anonymous).
    pub fn new(request_id: impl Into<String>, principal: Option<Principal>) -> Self {
        Self {
            request_id: request_id.into(),
            principal,
            exception_handled: false,
            state: CycleState::Start,
            response: None,
        }
    }

    /// Starts a cycle for an anonymous request.
    pub fn anonymous(request_id: impl Into<String>) -> Self {
        Self::new(request_id, None)
    }

    /// Returns the request ID.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Returns the principal, if the request is authenticated.
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// Returns true if no principal is attached.
    pub fn is_anonymous(&self) -> bool {
        self.principal.is_none()
    }

    /// Returns true once the exception hook has acted on this cycle.
    pub fn exception_handled(&self) -> bool {
        self.exception_handled
    }

    /// Returns the current gate state.
    pub fn state(&self) -> CycleState {
        self.state
    }

    /// Returns the substituted redirect, if the gate replaced the response.
    pub fn response(&self) -> Option<&Redirect> {
        self.response.as_ref()
    }

    /// Takes the substituted redirect out of the cycle.
    ///
    /// The state stays `Redirected`, so later hooks remain no-ops.
    pub fn take_response(&mut self) -> Option<Redirect> {
        self.response.take()
    }

    /// Returns a logger stamped with this cycle's request ID.
    pub fn log(&self) -> GateLog<'_> {
        GateLog::new(&self.request_id)
    }

    pub(crate) fn mark_exception_handled(&mut self) {
        self.exception_handled = true;
    }

    pub(crate) fn advance(&mut self, state: CycleState) {
        if !self.state.is_terminal() {
            self.state = state;
        }
    }

    pub(crate) fn redirect(&mut self, redirect: Redirect) {
        self.response = Some(redirect);
        self.state = CycleState::Redirected;
    }
}
