use std::collections::BTreeSet;

/// The baseline role every logged-in principal carries.
pub const AUTHENTICATED_ROLE: &str = "authenticated";

/// Identifier of the primordial superuser account. Never deleted.
pub const SUPERUSER_ID: u64 = 1;

/// An authenticated account attached to the in-flight request.
///
/// Anonymous requests carry no principal at all, so anonymity is modelled as
/// `Option<Principal>` rather than a flag on this type.
///
/// # Examples
///
/// ```
/// use auth_gate::Principal;
///
/// let jdoe = Principal::authenticated(42, "jdoe").with_role("editor");
/// assert!(jdoe.has_role("authenticated"));
/// assert!(jdoe.has_role("editor"));
/// assert!(!jdoe.has_only_role("authenticated"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Unique, immutable account identifier
    pub id: u64,
    /// Account name, used for logging only
    pub name: String,
    /// Role identifiers held by the account
    pub roles: BTreeSet<String>,
}

impl Principal {
    /// Creates a principal with an empty role set.
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            roles: BTreeSet::new(),
        }
    }

    /// Creates a principal holding only the baseline `authenticated` role.
    pub fn authenticated(id: u64, name: impl Into<String>) -> Self {
        Self::new(id, name).with_role(AUTHENTICATED_ROLE)
    }

    /// Adds a role and returns the principal for chaining.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    /// Returns true if the principal holds `role`.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// Returns true if `role` is the one and only role held.
    pub fn has_only_role(&self, role: &str) -> bool {
        self.roles.len() == 1 && self.has_role(role)
    }

    /// Returns true for the superuser account.
    pub fn is_superuser(&self) -> bool {
        self.id == SUPERUSER_ID
    }
}
