//! Reference wiring of the gate's hooks into a request pipeline.
//!
//! Hosts with their own event dispatcher register the two hooks from
//! [`AuthGate::subscriptions`]. Hosts without one can drive a request
//! through [`dispatch`], which reproduces the ordering the hooks rely on:
//!
//! ```text
//! resolve (routing, access checks)      may throw 403/404
//!   ↓ ok                                     ↓ err
//! on_request(Main)                       on_exception
//!   ↓ passthrough                            ↓ no redirect
//! controller                             on_request(Sub) + error page
//!   ↓ err
//! on_exception → error page sub-request
//! ```

use http::{Response, StatusCode};

use crate::context::RequestCycle;
use crate::error::Error;
use crate::gate::AuthGate;

use super::{HttpError, RequestKind};

/// Runs one request through the gate.
///
/// `resolve` stands for the listeners that run before the gate's request
/// hook (routing, authentication, access checks); `controller` produces the
/// normal response. Either may fail with an [`HttpError`], which is routed
/// through the exception hook and, if the gate does not redirect, rendered
/// as an error page through a sub-request.
///
/// # Errors
///
/// Returns `Error` when cleanup fails; the host should answer with a
/// server error.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use auth_gate::web::dispatch;
/// use auth_gate::{
///     AuthGate, EnabledModules, HttpError, MemorySessionStore, MemoryUserStorage, Principal,
///     RequestCycle, UserRecord,
/// };
/// use http::StatusCode;
///
/// let users = Arc::new(MemoryUserStorage::new());
/// users.insert(UserRecord::new(42, "jdoe"));
/// let gate = AuthGate::builder(
///     users.clone(),
///     Arc::new(MemorySessionStore::new()),
///     Arc::new(EnabledModules::none()),
/// )
/// .build()
/// .unwrap();
///
/// let mut cycle = RequestCycle::new("req-1", Some(Principal::authenticated(42, "jdoe")));
/// let response = dispatch(&gate, &mut cycle, |_| Err(HttpError::NotFound), |_| {
///     Ok(http::Response::new(String::from("never reached")))
/// })
/// .unwrap();
///
/// assert_eq!(response.status(), StatusCode::FOUND);
/// assert_eq!(users.deletions(), 1);
/// ```
pub fn dispatch<R, C>(
    gate: &AuthGate,
    cycle: &mut RequestCycle,
    resolve: R,
    controller: C,
) -> Result<Response<String>, Error>
where
    R: FnOnce(&RequestCycle) -> Result<(), HttpError>,
    C: FnOnce(&RequestCycle) -> Result<Response<String>, HttpError>,
{
    let handled = match resolve(&*cycle) {
        Ok(()) => {
            gate.on_request(cycle, RequestKind::Main)?;
            if let Some(redirect) = cycle.take_response() {
                return redirect.into_response();
            }
            controller(&*cycle)
        }
        Err(error) => Err(error),
    };

    match handled {
        Ok(response) => Ok(response),
        Err(error) => {
            gate.on_exception(cycle, &error)?;
            if let Some(redirect) = cycle.take_response() {
                return redirect.into_response();
            }
            render_error_page(gate, cycle, &error)
        }
    }
}

/// Renders the error page through an internal sub-request, the way hosts
/// with custom error pages re-dispatch.
fn render_error_page(
    gate: &AuthGate,
    cycle: &mut RequestCycle,
    error: &HttpError,
) -> Result<Response<String>, Error> {
    gate.on_request(cycle, RequestKind::Sub)?;

    let status = error.status();
    let body = status
        .canonical_reason()
        .unwrap_or("Error")
        .to_string();
    let mut response = Response::new(body);
    *response.status_mut() = if status.is_client_error() || status.is_server_error() {
        status
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    Ok(response)
}
