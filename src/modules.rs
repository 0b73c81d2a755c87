use std::collections::BTreeSet;

/// Registry answering whether an optional module is enabled.
pub trait ModuleRegistry: Send + Sync {
    /// Returns true if the module called `name` is enabled.
    fn module_exists(&self, name: &str) -> bool;
}

/// A fixed set of enabled module names.
///
/// # Examples
///
/// ```
/// use auth_gate::{EnabledModules, ModuleRegistry};
///
/// let modules: EnabledModules = ["samlauth", "views"].into_iter().collect();
/// assert!(modules.module_exists("samlauth"));
/// assert!(!modules.module_exists("ldap"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnabledModules {
    names: BTreeSet<String>,
}

impl EnabledModules {
    /// Creates a registry with no modules enabled.
    pub fn none() -> Self {
        Self::default()
    }

    /// Enables `name`.
    pub fn enable(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }
}

impl<S: Into<String>> FromIterator<S> for EnabledModules {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl ModuleRegistry for EnabledModules {
    fn module_exists(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}
