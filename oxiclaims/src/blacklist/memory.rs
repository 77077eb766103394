//! Provides a reference [`MemoryStorage`] which implements the [`Storage`] trait
use std::{
    collections::HashMap,
    sync::{
        Arc,
        Mutex,
        MutexGuard,
    },
};

use serde_json::Value;
use thiserror::Error;

use crate::{
    blacklist::storage::Storage,
    time::{
        Clock,
        SharedClock,
        system_clock,
    },
};

/// Errors raised by [`MemoryStorage`]
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum MemoryStorageError {
    /// Error raised when a thread panicked while holding the storage lock
    #[error("memory storage lock poisoned")]
    Poisoned,
}

#[derive(Debug)]
struct Entry {
    value: Value,
    expires_at: Option<i64>,
}
impl Entry {
    const fn is_live(&self, now: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => now < expires_at,
            None => true,
        }
    }
}

/// In-process [`Storage`] implementation with per-entry expiry.
///
/// Expired entries are dropped on every write, and on reads of their own key.
/// Suitable for a single process; revocations are not shared between instances.
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, Entry>>,
    clock: SharedClock,
}

impl MemoryStorage {
    /// Instantiates a new, empty [`MemoryStorage`] on the system clock
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock: system_clock(),
        }
    }

    /// Expire entries against `clock` instead of the system clock
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Number of live entries
    ///
    /// # Errors
    ///
    /// [`MemoryStorageError::Poisoned`] if the lock is poisoned.
    pub fn len(&self) -> Result<usize, MemoryStorageError> {
        let now = self.clock.now();
        Ok(self
            .lock()?
            .values()
            .filter(|entry| entry.is_live(now))
            .count())
    }

    /// Whether no live entries remain
    ///
    /// # Errors
    ///
    /// [`MemoryStorageError::Poisoned`] if the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, MemoryStorageError> {
        self.len().map(|len| len == 0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Entry>>, MemoryStorageError> {
        self.entries
            .lock()
            .map_err(|_| MemoryStorageError::Poisoned)
    }

    /// Lock the map for a write at `now`, dropping every expired entry first
    fn lock_pruned(
        &self,
        now: i64,
    ) -> Result<MutexGuard<'_, HashMap<String, Entry>>, MemoryStorageError> {
        let mut entries = self.lock()?;
        entries.retain(|_, entry| entry.is_live(now));
        Ok(entries)
    }

    fn insert(
        &self,
        key: &str,
        value: Value,
        ttl: Option<u64>,
    ) -> Result<(), MemoryStorageError> {
        let now = self.clock.now();
        let expires_at = ttl.map(|ttl| expiry(now, ttl));
        self.lock_pruned(now)?
            .insert(key.to_owned(), Entry { value, expires_at });
        Ok(())
    }
}

fn expiry(now: i64, ttl: u64) -> i64 {
    now.saturating_add(i64::try_from(ttl).unwrap_or(i64::MAX))
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    type Error = MemoryStorageError;

    fn get(&self, key: &str) -> Result<Option<Value>, Self::Error> {
        let now = self.clock.now();
        let mut entries = self.lock()?;
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn add(&self, key: &str, value: Value, ttl: u64) -> Result<(), Self::Error> {
        self.insert(key, value, Some(ttl))
    }

    fn forever(&self, key: &str, value: Value) -> Result<(), Self::Error> {
        self.insert(key, value, None)
    }

    fn destroy(&self, key: &str) -> Result<bool, Self::Error> {
        let now = self.clock.now();
        Ok(self
            .lock()?
            .remove(key)
            .is_some_and(|entry| entry.is_live(now)))
    }

    fn flush(&self) -> Result<(), Self::Error> {
        self.lock()?.clear();
        Ok(())
    }

    fn add_if_absent(
        &self,
        key: &str,
        value: Value,
        ttl: Option<u64>,
    ) -> Result<bool, Self::Error> {
        let now = self.clock.now();
        let mut entries = self.lock_pruned(now)?;
        if entries.contains_key(key) {
            return Ok(false);
        }
        let expires_at = ttl.map(|ttl| expiry(now, ttl));
        entries.insert(key.to_owned(), Entry { value, expires_at });
        Ok(true)
    }
}
