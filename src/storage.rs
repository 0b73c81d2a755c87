use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::{StorageError, StorageErrorKind};

/// The persisted user entity backing a principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Account identifier
    pub id: u64,
    /// Account name
    pub name: String,
}

impl UserRecord {
    /// Creates a user record.
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Entity storage for user records.
///
/// Implementations must be safe to share across request threads. Two
/// concurrent requests from the same account can both reach `delete`, so
/// deleting a record that no longer exists must succeed.
pub trait UserStorage: Send + Sync {
    /// Loads the record for `id`, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    fn load(&self, id: u64) -> Result<Option<UserRecord>, StorageError>;

    /// Hard-deletes `record`. Deleting a missing record is `Ok`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    fn delete(&self, record: &UserRecord) -> Result<(), StorageError>;
}

/// In-memory user storage.
///
/// Keeps a count of records actually removed so tests and embedders can
/// observe that concurrent cleanups delete exactly once.
///
/// # Examples
///
/// ```
/// use auth_gate::{MemoryUserStorage, UserRecord, UserStorage};
///
/// let storage = MemoryUserStorage::new();
/// storage.insert(UserRecord::new(42, "jdoe"));
///
/// let record = storage.load(42).unwrap().expect("present");
/// storage.delete(&record).unwrap();
/// storage.delete(&record).unwrap(); // idempotent
///
/// assert!(!storage.contains(42));
/// assert_eq!(storage.deletions(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MemoryUserStorage {
    inner: Mutex<MemoryUsers>,
}

#[derive(Debug, Default)]
struct MemoryUsers {
    records: BTreeMap<u64, UserRecord>,
    deletions: usize,
}

impl MemoryUserStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a record.
    pub fn insert(&self, record: UserRecord) {
        self.users().records.insert(record.id, record);
    }

    /// Returns true if a record with `id` exists.
    pub fn contains(&self, id: u64) -> bool {
        self.users().records.contains_key(&id)
    }

    /// Returns the number of stored records.
    pub fn len(&self) -> usize {
        self.users().records.len()
    }

    /// Returns true if no records are stored.
    pub fn is_empty(&self) -> bool {
        self.users().records.is_empty()
    }

    /// Returns how many records have actually been removed.
    pub fn deletions(&self) -> usize {
        self.users().deletions
    }

    fn users(&self) -> MutexGuard<'_, MemoryUsers> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn try_users(&self) -> Result<MutexGuard<'_, MemoryUsers>, StorageError> {
        self.inner.lock().map_err(|_| {
            StorageError::with_message(StorageErrorKind::Backend, "user table poisoned")
        })
    }
}

impl UserStorage for MemoryUserStorage {
    fn load(&self, id: u64) -> Result<Option<UserRecord>, StorageError> {
        Ok(self.try_users()?.records.get(&id).cloned())
    }

    fn delete(&self, record: &UserRecord) -> Result<(), StorageError> {
        let mut users = self.try_users()?;
        if users.records.remove(&record.id).is_some() {
            users.deletions += 1;
        }
        Ok(())
    }
}
