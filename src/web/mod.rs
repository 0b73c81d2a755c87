//! Web framework integration surface.
//!
//! This module is the boundary between HTTP frameworks and the gate:
//! - building a [`RequestCycle`](crate::RequestCycle) from an `http::Request`
//! - classifying thrown errors and sub-requests
//! - turning the gate's decision into a `302 Found` response
//!
//! It holds no framework-specific code beyond the `http` types every Rust
//! web stack shares, and no global state: everything flows through the
//! `RequestCycle` value.
//!
//! # Integration Model
//!
//! ```ignore
//! // Per request, after authentication has attached the principal:
//! let mut cycle = request.extract_cycle();
//!
//! // Request hook, registered at priority 31:
//! gate.on_request(&mut cycle, RequestKind::Main)?;
//! if let Some(redirect) = cycle.take_response() {
//!     return redirect.into_response();
//! }
//!
//! // Exception hook, when routing or a handler throws:
//! gate.on_exception(&mut cycle, &HttpError::NotFound)?;
//! ```

mod event;
mod extract;
mod middleware;
mod response;

pub use event::{HttpError, RequestKind};
pub use extract::{ExtractCycle, REQUEST_ID_HEADER, UNKNOWN_REQUEST_ID};
pub use middleware::dispatch;
pub use response::{Redirect, TrustedRedirect};
