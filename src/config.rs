use serde::Deserialize;

use crate::error::ConfigError;
use crate::policy::RoleDeficiency;
use crate::redirect::RedirectPolicy;
use crate::request::AUTHENTICATED_ROLE;

/// Priority of the request hook: after routing and authentication
/// listeners have resolved the principal, before response handlers.
pub const REQUEST_PRIORITY: i32 = 31;

/// Gate settings.
///
/// Deserializes from any serde format; every field is optional and falls
/// back to the defaults below.
///
/// # Examples
///
/// ```
/// use auth_gate::GateConfig;
///
/// let config = GateConfig::default();
/// assert_eq!(config.baseline_role, "authenticated");
/// assert!(config.protected_ids.is_empty());
/// assert_eq!(config.request_priority, 31);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GateConfig {
    /// Role every logged-in principal carries
    pub baseline_role: String,
    /// Accounts never deleted in addition to the superuser, which is always
    /// protected
    pub protected_ids: Vec<u64>,
    /// Priority the request hook registers with
    pub request_priority: i32,
    /// Where cleaned-up accounts are sent
    pub redirect: RedirectPolicy,
}

impl GateConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for an empty baseline role or a malformed
    /// redirect target.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.baseline_role.trim().is_empty() {
            return Err(ConfigError::EmptyBaselineRole);
        }
        self.redirect.validate()
    }

    /// Builds the deficiency check described by this configuration.
    pub fn deficiency(&self) -> RoleDeficiency {
        RoleDeficiency::new(self.baseline_role.clone(), self.protected_ids.iter().copied())
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            baseline_role: AUTHENTICATED_ROLE.to_string(),
            protected_ids: Vec::new(),
            request_priority: REQUEST_PRIORITY,
            redirect: RedirectPolicy::default(),
        }
    }
}
