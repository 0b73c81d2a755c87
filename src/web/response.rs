//! Redirect responses substituted by the gate.

use http::header::LOCATION;
use http::{Response, StatusCode};

use crate::error::Error;
use crate::redirect::RedirectTarget;

/// Response extension marking a redirect as allowed to leave the origin.
///
/// Hosts that guard against open redirects should let responses carrying
/// this extension through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrustedRedirect;

/// A `302 Found` redirect that replaces the in-flight response.
///
/// # Examples
///
/// ```
/// use auth_gate::{Redirect, RedirectTarget, TrustedRedirect};
/// use http::{header::LOCATION, StatusCode};
///
/// let redirect = Redirect::to(RedirectTarget::Trusted("https://idp.example.com/logout".into()));
/// let response: http::Response<()> = redirect.into_response().unwrap();
///
/// assert_eq!(response.status(), StatusCode::FOUND);
/// assert_eq!(response.headers()[LOCATION], "https://idp.example.com/logout");
/// assert!(response.extensions().get::<TrustedRedirect>().is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    target: RedirectTarget,
}

impl Redirect {
    /// Creates a redirect to `target`.
    pub fn to(target: RedirectTarget) -> Self {
        Self { target }
    }

    /// Always `302 Found`.
    pub fn status(&self) -> StatusCode {
        StatusCode::FOUND
    }

    /// Returns the `Location` value.
    pub fn location(&self) -> &str {
        self.target.location()
    }

    /// Returns true if the redirect may leave the origin.
    pub fn is_trusted(&self) -> bool {
        self.target.is_trusted()
    }

    /// Returns the target.
    pub fn target(&self) -> &RedirectTarget {
        &self.target
    }

    /// Materialises the redirect as an `http::Response` with an empty body.
    ///
    /// # Errors
    ///
    /// Returns `Error::Response` if the location is not a valid header value.
    pub fn into_response<B: Default>(self) -> Result<Response<B>, Error> {
        let mut builder = Response::builder()
            .status(self.status())
            .header(LOCATION, self.location());
        if self.is_trusted() {
            builder = builder.extension(TrustedRedirect);
        }
        Ok(builder.body(B::default())?)
    }
}
