//! Request gate for accounts that were never given a real role.
//!
//! Accounts are expected to be provisioned with at least one meaningful role
//! by an external process. An account whose only role is the baseline
//! `authenticated` role is incompletely provisioned (or its roles were
//! revoked) and must not use the system, not even for one request. The
//! [`AuthGate`] inspects every inbound request and, for such an account:
//!
//! 1. logs a notice naming the account,
//! 2. ends its sessions,
//! 3. hard-deletes the backing user record,
//! 4. replaces the response with a `302 Found` to a logout, access-denied
//!    or single-logout destination chosen by a [`RedirectPolicy`].
//!
//! # Core Types
//!
//! - [`AuthGate`]: the interceptor, with its exception and request hooks
//! - [`RequestCycle`]: request-scoped state passed to both hooks
//! - [`Principal`]: the account attached to the request
//! - [`RoleDeficiency`]: the "baseline role only" predicate
//! - [`RedirectPolicy`]: ordered first-match redirect rules
//! - [`UserStorage`], [`SessionStore`], [`ModuleRegistry`]: injected
//!   collaborators
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use auth_gate::{
//!     AuthGate, EnabledModules, HttpError, MemorySessionStore, MemoryUserStorage, Principal,
//!     RequestCycle, RequestKind, UserRecord,
//! };
//!
//! let users = Arc::new(MemoryUserStorage::new());
//! users.insert(UserRecord::new(42, "jdoe"));
//!
//! let sso: EnabledModules = ["samlauth"].into_iter().collect();
//! let gate = AuthGate::builder(users.clone(), Arc::new(MemorySessionStore::new()), Arc::new(sso))
//!     .build()
//!     .expect("default configuration is valid");
//!
//! // Routing threw a 404 for a deficient account.
//! let mut cycle = RequestCycle::new("req-1", Some(Principal::authenticated(42, "jdoe")));
//! gate.on_exception(&mut cycle, &HttpError::NotFound).unwrap();
//! gate.on_request(&mut cycle, RequestKind::Main).unwrap(); // suppressed
//!
//! let redirect = cycle.response().expect("response replaced");
//! assert!(redirect.is_trusted());
//! assert_eq!(users.deletions(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod audit;
mod config;
mod context;
mod error;
mod gate;
mod logging;
mod modules;
mod policy;
mod redirect;
mod request;
mod session;
mod state;
mod storage;
pub mod web;

pub use config::{GateConfig, REQUEST_PRIORITY};
pub use context::RequestCycle;
pub use error::{ConfigError, Error, StorageError, StorageErrorKind};
pub use gate::{AuthGate, AuthGateBuilder, Hook, Subscription};
pub use logging::GateLog;
pub use modules::{EnabledModules, ModuleRegistry};
pub use policy::RoleDeficiency;
pub use redirect::{
    RedirectCondition, RedirectPolicy, RedirectRule, RedirectTarget, ACCESS_DENIED_PATH,
    ENTERPRISE_AUTH_MODULE, ENTERPRISE_LOGOUT_URL, LOGOUT_PATH,
};
pub use request::{Principal, AUTHENTICATED_ROLE, SUPERUSER_ID};
pub use session::{MemorySessionStore, SessionStore};
pub use state::CycleState;
pub use storage::{MemoryUserStorage, UserRecord, UserStorage};
pub use web::{HttpError, Redirect, RequestKind, TrustedRedirect};
