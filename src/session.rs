use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use crate::error::{StorageError, StorageErrorKind};

/// Session backend able to log an account out everywhere.
pub trait SessionStore: Send + Sync {
    /// Ends every session held by `account_id` and returns how many ended.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    fn invalidate(&self, account_id: u64) -> Result<usize, StorageError>;
}

/// In-memory session store keyed by account id.
///
/// # Examples
///
/// ```
/// use auth_gate::{MemorySessionStore, SessionStore};
///
/// let sessions = MemorySessionStore::new();
/// sessions.open(42, "sess-a");
/// sessions.open(42, "sess-b");
///
/// assert_eq!(sessions.invalidate(42).unwrap(), 2);
/// assert!(!sessions.is_active("sess-a"));
/// ```
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: Mutex<BTreeMap<u64, BTreeSet<String>>>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an open session for `account_id`.
    pub fn open(&self, account_id: u64, session_id: impl Into<String>) {
        self.table()
            .entry(account_id)
            .or_default()
            .insert(session_id.into());
    }

    /// Returns true if `session_id` is still open for any account.
    pub fn is_active(&self, session_id: &str) -> bool {
        self.table().values().any(|ids| ids.contains(session_id))
    }

    /// Returns the number of sessions open for `account_id`.
    pub fn count(&self, account_id: u64) -> usize {
        self.table().get(&account_id).map_or(0, BTreeSet::len)
    }

    fn table(&self) -> MutexGuard<'_, BTreeMap<u64, BTreeSet<String>>> {
        self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionStore for MemorySessionStore {
    fn invalidate(&self, account_id: u64) -> Result<usize, StorageError> {
        let mut table = self.sessions.lock().map_err(|_| {
            StorageError::with_message(StorageErrorKind::Backend, "session table poisoned")
        })?;
        Ok(table.remove(&account_id).map_or(0, |ids| ids.len()))
    }
}
