use std::collections::BTreeSet;

use crate::request::{Principal, AUTHENTICATED_ROLE, SUPERUSER_ID};

/// Classifies principals whose only role is the baseline role.
///
/// A principal is role-deficient iff it is not protected and its role set is
/// exactly `{baseline_role}`. Supersets and the empty set do not qualify.
/// The superuser is always protected; configured ids are protected on top.
///
/// # Examples
///
/// ```
/// use auth_gate::{Principal, RoleDeficiency};
///
/// let check = RoleDeficiency::default();
///
/// assert!(check.is_deficient(Some(&Principal::authenticated(42, "jdoe"))));
/// assert!(!check.is_deficient(Some(&Principal::authenticated(1, "admin"))));
/// assert!(!check.is_deficient(None));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDeficiency {
    baseline_role: String,
    protected_ids: BTreeSet<u64>,
}

impl RoleDeficiency {
    /// Creates a check for the given baseline role and extra protected
    /// account ids. [`SUPERUSER_ID`] is protected whatever `protected_ids`
    /// holds.
    pub fn new(
        baseline_role: impl Into<String>,
        protected_ids: impl IntoIterator<Item = u64>,
    ) -> Self {
        let mut protected_ids: BTreeSet<u64> = protected_ids.into_iter().collect();
        protected_ids.insert(SUPERUSER_ID);
        Self {
            baseline_role: baseline_role.into(),
            protected_ids,
        }
    }

    /// Returns the baseline role name.
    pub fn baseline_role(&self) -> &str {
        &self.baseline_role
    }

    /// Returns true if `id` can never be deleted.
    pub fn is_protected(&self, id: u64) -> bool {
        self.protected_ids.contains(&id)
    }

    /// Returns true if `principal` holds nothing but the baseline role.
    ///
    /// Anonymous requests (`None`) are never deficient.
    pub fn is_deficient(&self, principal: Option<&Principal>) -> bool {
        match principal {
            None => false,
            Some(p) => !self.is_protected(p.id) && p.has_only_role(&self.baseline_role),
        }
    }
}

impl Default for RoleDeficiency {
    fn default() -> Self {
        Self::new(AUTHENTICATED_ROLE, [])
    }
}
