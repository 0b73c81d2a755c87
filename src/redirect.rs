//! Redirect target selection.
//!
//! Where a cleaned-up account is sent depends on the deployment: a local
//! logout path, a local access-denied page, or the single-logout endpoint of
//! an external identity provider when its integration module is enabled.
//! A [`RedirectPolicy`] is an ordered list of `(condition, target)` rules
//! evaluated first-match, with a fallback target.

use http::HeaderValue;
use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;
use crate::modules::ModuleRegistry;

/// Module whose presence means enterprise single sign-on is in use.
pub const ENTERPRISE_AUTH_MODULE: &str = "samlauth";

/// Single-logout endpoint of the enterprise identity provider.
pub const ENTERPRISE_LOGOUT_URL: &str = "https://enterprise.login.utexas.edu/idp/profile/Logout";

/// Local logout path.
pub const LOGOUT_PATH: &str = "/user/logout";

/// Local access-denied page.
pub const ACCESS_DENIED_PATH: &str = "/system/403";

/// Where a redirect points.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectTarget {
    /// A same-origin absolute path
    Local(String),
    /// An external URL allowed to bypass open-redirect protection
    Trusted(String),
}

impl RedirectTarget {
    /// Returns the `Location` value.
    pub fn location(&self) -> &str {
        match self {
            RedirectTarget::Local(path) => path,
            RedirectTarget::Trusted(url) => url,
        }
    }

    /// Returns true for cross-origin trusted targets.
    pub fn is_trusted(&self) -> bool {
        matches!(self, RedirectTarget::Trusted(_))
    }

    /// Checks that the target is well formed.
    ///
    /// Local targets must be absolute paths and must not be protocol-relative
    /// (`//host/...`). Trusted targets must be absolute `http`/`https` URLs
    /// with a host. Both must be usable as a `Location` header value.
    ///
    /// # Errors
    ///
    /// Returns the matching `ConfigError` variant for a malformed target.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            RedirectTarget::Local(path) => {
                if !path.starts_with('/')
                    || path.starts_with("//")
                    || path.contains('\\')
                    || HeaderValue::from_str(path).is_err()
                {
                    return Err(ConfigError::InvalidLocalTarget(path.clone()));
                }
            }
            RedirectTarget::Trusted(raw) => {
                // the url parser drops tabs and newlines, the header would not
                HeaderValue::from_str(raw)
                    .map_err(|_| ConfigError::InvalidTrustedTarget(raw.clone()))?;
                let parsed =
                    Url::parse(raw).map_err(|_| ConfigError::InvalidTrustedTarget(raw.clone()))?;
                let web_scheme = matches!(parsed.scheme(), "http" | "https");
                if !web_scheme || parsed.host_str().is_none() {
                    return Err(ConfigError::InvalidTrustedTarget(raw.clone()));
                }
            }
        }
        Ok(())
    }
}

/// Condition under which a rule applies.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectCondition {
    /// Always matches
    Always,
    /// Matches when the named module is enabled
    ModuleEnabled(String),
}

impl RedirectCondition {
    fn holds(&self, modules: &dyn ModuleRegistry) -> bool {
        match self {
            RedirectCondition::Always => true,
            RedirectCondition::ModuleEnabled(name) => modules.module_exists(name),
        }
    }
}

/// One `(condition, target)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RedirectRule {
    /// When the rule applies
    pub when: RedirectCondition,
    /// Where to send the account
    pub target: RedirectTarget,
}

/// Ordered first-match redirect rules with a fallback.
///
/// # Examples
///
/// ```
/// use auth_gate::{EnabledModules, RedirectPolicy, RedirectTarget};
///
/// let policy = RedirectPolicy::default();
///
/// let plain = EnabledModules::none();
/// assert_eq!(policy.resolve(&plain), &RedirectTarget::Local("/user/logout".into()));
///
/// let sso: EnabledModules = ["samlauth"].into_iter().collect();
/// assert!(policy.resolve(&sso).is_trusted());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RedirectPolicy {
    #[serde(default)]
    rules: Vec<RedirectRule>,
    fallback: RedirectTarget,
}

impl RedirectPolicy {
    /// Creates a policy with no rules that always resolves to `fallback`.
    pub fn new(fallback: RedirectTarget) -> Self {
        Self {
            rules: Vec::new(),
            fallback,
        }
    }

    /// Appends a rule. Rules are evaluated in insertion order.
    pub fn rule(mut self, when: RedirectCondition, target: RedirectTarget) -> Self {
        self.rules.push(RedirectRule { when, target });
        self
    }

    /// Sends accounts to the enterprise single-logout endpoint when single
    /// sign-on is enabled, otherwise to the local logout path.
    pub fn logout() -> Self {
        Self::enterprise_logout(ENTERPRISE_AUTH_MODULE, ENTERPRISE_LOGOUT_URL)
    }

    /// Always sends accounts to the local access-denied page.
    pub fn access_denied() -> Self {
        Self::new(RedirectTarget::Local(ACCESS_DENIED_PATH.to_string()))
    }

    /// Sends accounts to `logout_url` when `module` is enabled, otherwise to
    /// the local logout path.
    pub fn enterprise_logout(module: impl Into<String>, logout_url: impl Into<String>) -> Self {
        Self::new(RedirectTarget::Local(LOGOUT_PATH.to_string())).rule(
            RedirectCondition::ModuleEnabled(module.into()),
            RedirectTarget::Trusted(logout_url.into()),
        )
    }

    /// Returns the rules in evaluation order.
    pub fn rules(&self) -> &[RedirectRule] {
        &self.rules
    }

    /// Returns the fallback target.
    pub fn fallback(&self) -> &RedirectTarget {
        &self.fallback
    }

    /// Returns the target of the first matching rule, or the fallback.
    pub fn resolve(&self, modules: &dyn ModuleRegistry) -> &RedirectTarget {
        self.rules
            .iter()
            .find(|rule| rule.when.holds(modules))
            .map_or(&self.fallback, |rule| &rule.target)
    }

    /// Validates every target, fallback included.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for rule in &self.rules {
            rule.target.validate()?;
        }
        self.fallback.validate()
    }
}

impl Default for RedirectPolicy {
    fn default() -> Self {
        Self::logout()
    }
}
