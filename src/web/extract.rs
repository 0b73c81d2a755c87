//! Building a `RequestCycle` from a framework request.

use http::Request;

use crate::context::RequestCycle;
use crate::request::Principal;

/// Header carrying the request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request id used when the header is missing or not valid UTF-8.
pub const UNKNOWN_REQUEST_ID: &str = "-";

/// Extracts the gate's per-request state from a framework request.
///
/// This trait only maps framework types to gate types; it does not
/// authenticate. The host's authentication layer must already have resolved
/// the principal.
///
/// # Examples
///
/// ```
/// use auth_gate::web::ExtractCycle;
/// use auth_gate::Principal;
///
/// let mut request = http::Request::builder()
///     .header("x-request-id", "req-77")
///     .body(())
///     .unwrap();
/// request.extensions_mut().insert(Principal::authenticated(42, "jdoe"));
///
/// let cycle = request.extract_cycle();
/// assert_eq!(cycle.request_id(), "req-77");
/// assert_eq!(cycle.principal().unwrap().id, 42);
/// ```
pub trait ExtractCycle {
    /// Starts a fresh `RequestCycle` for this request.
    fn extract_cycle(&self) -> RequestCycle;
}

/// Reads the request id from `x-request-id` and the principal from the
/// request extensions, where authentication middleware leaves it.
impl<B> ExtractCycle for Request<B> {
    fn extract_cycle(&self) -> RequestCycle {
        let request_id = self
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or(UNKNOWN_REQUEST_ID);
        let principal = self.extensions().get::<Principal>().cloned();

        RequestCycle::new(request_id, principal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_header_and_principal() {
        let request = Request::builder().body(()).unwrap();
        let cycle = request.extract_cycle();

        assert_eq!(cycle.request_id(), UNKNOWN_REQUEST_ID);
        assert!(cycle.is_anonymous());
    }

    #[test]
    fn principal_comes_from_extensions() {
        let mut request = Request::builder()
            .header(REQUEST_ID_HEADER, "req-9")
            .body(())
            .unwrap();
        request
            .extensions_mut()
            .insert(Principal::authenticated(5, "ann").with_role("editor"));

        let cycle = request.extract_cycle();
        let principal = cycle.principal().expect("principal extracted");

        assert_eq!(principal.name, "ann");
        assert!(principal.has_role("editor"));
    }
}
