use std::fmt;

/// Request-scoped logging handle.
///
/// Every event carries the request id so that a deletion can be traced back
/// to the request that triggered it, and, once cleanup targets an account,
/// that account's id. Borrowed from the `RequestCycle`, so it cannot outlive
/// the request.
#[derive(Debug, Clone, Copy)]
pub struct GateLog<'a> {
    request_id: &'a str,
    account_id: Option<u64>,
}

macro_rules! gate_event {
    ($level:ident, $log:expr, $args:expr $(, $field:ident = $value:expr)*) => {
        tracing::$level!(
            request_id = %$log.request_id,
            account_id = $log.account_id,
            $($field = $value,)*
            "{}",
            $args
        )
    };
}

impl<'a> GateLog<'a> {
    pub(crate) fn new(request_id: &'a str) -> Self {
        Self {
            request_id,
            account_id: None,
        }
    }

    /// Returns a handle that also stamps `account_id` on every event.
    pub fn for_account(self, account_id: u64) -> Self {
        Self {
            account_id: Some(account_id),
            ..self
        }
    }

    /// Returns the request ID associated with this logger.
    pub fn request_id(&self) -> &str {
        self.request_id
    }

    /// Returns the account events are attributed to, if any.
    pub fn account_id(&self) -> Option<u64> {
        self.account_id
    }

    /// Site-log notice announcing an automatic removal. `tracing` has no
    /// notice level, so this is `info` tagged with `notice = true`.
    pub fn notice(&self, args: fmt::Arguments<'_>) {
        gate_event!(info, self, args, notice = true);
    }

    /// Progress of a cleanup, such as the chosen redirect.
    pub fn info(&self, args: fmt::Arguments<'_>) {
        gate_event!(info, self, args);
    }

    /// Recoverable oddities, such as a record already gone.
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        gate_event!(warn, self, args);
    }

    /// Cleanup failures that abort the request.
    pub fn error(&self, args: fmt::Arguments<'_>) {
        gate_event!(error, self, args);
    }

    /// Hook decisions that leave the request untouched.
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        gate_event!(debug, self, args);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_is_attached_on_demand() {
        let log = GateLog::new("req-9");
        assert_eq!(log.account_id(), None);

        let scoped = log.for_account(42);
        assert_eq!(scoped.request_id(), "req-9");
        assert_eq!(scoped.account_id(), Some(42));
        scoped.notice(format_args!("removing account {}", 42));
    }
}
