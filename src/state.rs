//! Per-request gate state.
//!
//! ```text
//! Start --exception hook--> ExceptionEvaluated --request hook--> Passthrough
//!   |                            (deficient)
//!   |--exception hook--------------------------------------> Redirected
//!   |--request hook (deficient)----------------------------> Redirected
//!   `--request hook (fine)---------------------------------> Passthrough
//! ```
//!
//! The principal is evaluated at most once per cycle; terminal states are
//! never left.

/// Where a request cycle stands with respect to the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CycleState {
    /// No hook has evaluated the principal yet
    #[default]
    Start,
    /// The exception hook evaluated the principal and let it pass
    ExceptionEvaluated,
    /// Normal handling continues
    Passthrough,
    /// The response was replaced with a redirect
    Redirected,
}

impl CycleState {
    /// Returns true for `Passthrough` and `Redirected`.
    pub fn is_terminal(self) -> bool {
        matches!(self, CycleState::Passthrough | CycleState::Redirected)
    }

    /// Returns true once a hook has looked at the principal.
    pub fn is_evaluated(self) -> bool {
        self != CycleState::Start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_start() {
        assert_eq!(CycleState::default(), CycleState::Start);
    }

    #[test]
    fn terminal_states() {
        assert!(!CycleState::Start.is_terminal());
        assert!(!CycleState::ExceptionEvaluated.is_terminal());
        assert!(CycleState::Passthrough.is_terminal());
        assert!(CycleState::Redirected.is_terminal());
    }

    #[test]
    fn only_start_is_unevaluated() {
        assert!(!CycleState::Start.is_evaluated());
        assert!(CycleState::ExceptionEvaluated.is_evaluated());
        assert!(CycleState::Redirected.is_evaluated());
    }
}
