//! Provides the token revocation [`Blacklist`] and its [`Storage`] seam
//!
//! Revoked tokens are recorded under the value of a configurable key claim
//! (`jti` by default). A token carrying `exp` is recorded with a grace window
//! and expires from storage once it could no longer be refreshed; a token
//! without `exp` is revoked forever.
//!
//! ```rust
//! use oxiclaims::{
//!     Payload,
//!     blacklist::{
//!         Blacklist,
//!         MemoryStorage,
//!     },
//!     claims::{
//!         Claim,
//!         ClaimSet,
//!     },
//!     validation::PayloadValidator,
//! };
//!
//! let validator = PayloadValidator::builder()
//!     .with_required_claims(["jti"])
//!     .build();
//! let payload = Payload::new(
//!     ClaimSet::new().with(Claim::jwt_id("foo")),
//!     &validator,
//!     false,
//! )
//! .unwrap();
//!
//! let blacklist = Blacklist::new(MemoryStorage::new());
//! assert!(!blacklist.has(&payload).unwrap());
//! assert!(blacklist.add(&payload).unwrap());
//! assert!(blacklist.has(&payload).unwrap());
//! ```
use std::sync::Arc;

use serde_json::Value;

use crate::{
    Payload,
    claims::{
        Claim,
        Exp,
    },
    error::BlacklistError,
    time::{
        Clock,
        SharedClock,
        system_clock,
    },
};

mod memory;
pub use memory::{
    MemoryStorage,
    MemoryStorageError,
};

mod storage;
pub use storage::{
    FOREVER,
    RevocationEntry,
    Storage,
    VALID_UNTIL,
};

/// Default refresh TTL: two weeks, in seconds
pub const DEFAULT_REFRESH_TTL: u64 = 20_160 * 60;

/// Default extra lifetime given to stored entries beyond the refresh TTL
pub const DEFAULT_TTL_BUFFER: u64 = 60;

/// Default claim whose value keys the store
pub const DEFAULT_KEY: &str = "jti";

/// Token revocation list over a [`Storage`] backend.
///
/// The [`Blacklist`] itself only holds configuration; every revocation lives in
/// the backend, so a single instance may be shared across request handlers.
pub struct Blacklist<S: Storage> {
    storage: S,
    grace_period: u64,
    refresh_ttl: u64,
    ttl_buffer: u64,
    key: String,
    clock: SharedClock,
}

impl<S: Storage> Blacklist<S> {
    /// Instantiates a [`Blacklist`] over `storage` with default configuration:
    /// no grace period, a two week refresh TTL, and `jti` as key claim.
    #[must_use]
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            grace_period: 0,
            refresh_ttl: DEFAULT_REFRESH_TTL,
            ttl_buffer: DEFAULT_TTL_BUFFER,
            key: DEFAULT_KEY.to_owned(),
            clock: system_clock(),
        }
    }

    /// Evaluate grace windows against `clock` instead of the system clock
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Backing store
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Value of the configured key claim in `payload`
    ///
    /// # Errors
    ///
    /// [`BlacklistError::MissingKey`] if `payload` lacks the key claim.
    pub fn get_key<'p>(
        &self,
        payload: &'p Payload,
    ) -> Result<&'p Value, BlacklistError<S::Error>> {
        payload
            .claim(&self.key)
            .map(Claim::value)
            .ok_or_else(|| BlacklistError::MissingKey(self.key.clone()))
    }

    /// Revoke the token carried by `payload`. Returns `true` once the token is
    /// recorded, including when it already was.
    ///
    /// A token already recorded keeps its entry untouched, so repeated calls
    /// during the grace window do not move `valid_until`.
    ///
    /// # Errors
    ///
    /// [`BlacklistError::MissingKey`] if `payload` lacks the key claim, or any
    /// [`BlacklistError::Storage`] error raised by the backend.
    pub fn add(&self, payload: &Payload) -> Result<bool, BlacklistError<S::Error>> {
        let key = self.storage_key(payload)?;
        let now = self.clock.now();

        // an existing entry, even one still in its grace window, is never reset
        if let Some(existing) = self
            .storage
            .get(&key)?
            .as_ref()
            .and_then(RevocationEntry::from_record)
        {
            tracing::trace!(%key, ?existing, "jwt already blacklisted");
            return Ok(true);
        }

        match self.entry(payload, now) {
            RevocationEntry::Forever => {
                tracing::debug!(%key, "blacklisting jwt forever");
                self.storage
                    .forever(&key, RevocationEntry::Forever.to_record())?;
            }
            entry @ RevocationEntry::GraceUntil(valid_until) => {
                let ttl = self.entry_ttl();
                tracing::debug!(%key, valid_until, ttl, "blacklisting jwt");
                self.storage.add(&key, entry.to_record(), ttl)?;
            }
        }
        Ok(true)
    }

    /// Revoke the token carried by `payload` unless the backend already holds
    /// an entry for it. Returns whether this call created the entry.
    ///
    /// Atomic when the backend overrides [`Storage::add_if_absent`].
    ///
    /// # Errors
    ///
    /// [`BlacklistError::MissingKey`] if `payload` lacks the key claim, or any
    /// [`BlacklistError::Storage`] error raised by the backend.
    pub fn add_if_absent(&self, payload: &Payload) -> Result<bool, BlacklistError<S::Error>> {
        let key = self.storage_key(payload)?;
        let entry = self.entry(payload, self.clock.now());
        let ttl = match entry {
            RevocationEntry::Forever => None,
            RevocationEntry::GraceUntil(_) => Some(self.entry_ttl()),
        };

        let created = self
            .storage
            .add_if_absent(&key, entry.to_record(), ttl)?;
        tracing::debug!(%key, ?ttl, created, "conditionally blacklisting jwt");
        Ok(created)
    }

    /// Whether the token carried by `payload` is revoked at this instant.
    ///
    /// Tokens revoked with a grace period keep passing until the window closes.
    ///
    /// # Errors
    ///
    /// [`BlacklistError::MissingKey`] if `payload` lacks the key claim, or any
    /// [`BlacklistError::Storage`] error raised by the backend.
    pub fn has(&self, payload: &Payload) -> Result<bool, BlacklistError<S::Error>> {
        let key = self.storage_key(payload)?;
        let record = self.storage.get(&key)?;
        tracing::trace!(%key, found = record.is_some(), "blacklist lookup");

        Ok(record
            .as_ref()
            .and_then(RevocationEntry::from_record)
            .is_some_and(|entry| entry.is_active(self.clock.now())))
    }

    /// Drop the entry for the token carried by `payload`, returning whether the
    /// backend removed anything.
    ///
    /// # Errors
    ///
    /// [`BlacklistError::MissingKey`] if `payload` lacks the key claim, or any
    /// [`BlacklistError::Storage`] error raised by the backend.
    pub fn remove(&self, payload: &Payload) -> Result<bool, BlacklistError<S::Error>> {
        let key = self.storage_key(payload)?;
        let removed = self.storage.destroy(&key)?;
        tracing::debug!(%key, removed, "removed jwt from blacklist");
        Ok(removed)
    }

    /// Drop every entry in the backend.
    ///
    /// # Errors
    ///
    /// Any [`BlacklistError::Storage`] error raised by the backend.
    pub fn clear(&self) -> Result<bool, BlacklistError<S::Error>> {
        self.storage.flush()?;
        tracing::debug!("flushed jwt blacklist");
        Ok(true)
    }

    /// Set how long, in seconds, a revoked token keeps passing [`Blacklist::has`]
    pub const fn set_grace_period(&mut self, seconds: u64) -> &mut Self {
        self.grace_period = seconds;
        self
    }

    /// Set the refresh TTL, in seconds, that bounds how long entries are stored
    pub const fn set_refresh_ttl(&mut self, seconds: u64) -> &mut Self {
        self.refresh_ttl = seconds;
        self
    }

    /// Set the seconds added to the refresh TTL when storing entries
    pub const fn set_ttl_buffer(&mut self, seconds: u64) -> &mut Self {
        self.ttl_buffer = seconds;
        self
    }

    /// Set the claim whose value keys the store
    pub fn set_key(&mut self, claim: impl Into<String>) -> &mut Self {
        self.key = claim.into();
        self
    }

    /// Grace period in seconds
    #[must_use]
    pub const fn grace_period(&self) -> u64 {
        self.grace_period
    }

    /// Refresh TTL in seconds
    #[must_use]
    pub const fn refresh_ttl(&self) -> u64 {
        self.refresh_ttl
    }

    /// Seconds added to the refresh TTL when storing entries
    #[must_use]
    pub const fn ttl_buffer(&self) -> u64 {
        self.ttl_buffer
    }

    /// Name of the key claim
    #[must_use]
    pub fn key_name(&self) -> &str {
        &self.key
    }

    fn storage_key(&self, payload: &Payload) -> Result<String, BlacklistError<S::Error>> {
        Ok(match self.get_key(payload)? {
            Value::String(key) => key.clone(),
            other => other.to_string(),
        })
    }

    fn entry(&self, payload: &Payload, now: i64) -> RevocationEntry {
        if payload.exp().is_none() {
            return RevocationEntry::Forever;
        }
        let grace = i64::try_from(self.grace_period).unwrap_or(i64::MAX);
        RevocationEntry::GraceUntil(now.saturating_add(grace))
    }

    const fn entry_ttl(&self) -> u64 {
        self.refresh_ttl.saturating_add(self.ttl_buffer)
    }
}
