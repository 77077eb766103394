use std::sync::Arc;

use serde_json::{
    Value,
    json,
};

/// Marker persisted for tokens revoked with no expiry
pub const FOREVER: &str = "forever";

/// Field holding the end of the grace window in a stored entry
pub const VALID_UNTIL: &str = "valid_until";

/// Key-value store backing a [`Blacklist`].
///
/// Implementations are expected to be shared by many request handlers at once,
/// so every method takes `&self`.
///
/// [`Blacklist`]: crate::blacklist::Blacklist
pub trait Storage {
    /// Store backend error, passed through [`BlacklistError::Storage`] unmodified
    ///
    /// [`BlacklistError::Storage`]: crate::error::BlacklistError::Storage
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch the record stored under `key`
    ///
    /// # Errors
    ///
    /// Any backend failure. A missing key is `Ok(None)`, not an error.
    fn get(&self, key: &str) -> Result<Option<Value>, Self::Error>;

    /// Store `value` under `key`, expiring after `ttl` seconds. Overwrites any
    /// existing record.
    ///
    /// # Errors
    ///
    /// Any backend failure. Writes MUST NOT fail silently.
    fn add(&self, key: &str, value: Value, ttl: u64) -> Result<(), Self::Error>;

    /// Store `value` under `key` with no expiry
    ///
    /// # Errors
    ///
    /// Any backend failure. Writes MUST NOT fail silently.
    fn forever(&self, key: &str, value: Value) -> Result<(), Self::Error>;

    /// Delete the record under `key`, returning the backend's deletion result
    ///
    /// # Errors
    ///
    /// Any backend failure.
    fn destroy(&self, key: &str) -> Result<bool, Self::Error>;

    /// Delete every record
    ///
    /// # Errors
    ///
    /// Any backend failure.
    fn flush(&self) -> Result<(), Self::Error>;

    /// Store `value` under `key` only if no record exists, returning whether this
    /// call wrote it. Any existing record, whatever its value, keeps the first
    /// writer. `ttl` of [`None`] stores with no expiry.
    ///
    /// The provided implementation is a plain read followed by a write and is
    /// therefore racy; backends with an atomic "set if absent" primitive should
    /// override it.
    ///
    /// # Errors
    ///
    /// Any backend failure.
    fn add_if_absent(
        &self,
        key: &str,
        value: Value,
        ttl: Option<u64>,
    ) -> Result<bool, Self::Error> {
        if self.get(key)?.is_some() {
            return Ok(false);
        }
        match ttl {
            Some(ttl) => self.add(key, value, ttl)?,
            None => self.forever(key, value)?,
        }
        Ok(true)
    }
}

impl<S: Storage + ?Sized> Storage for Arc<S> {
    type Error = S::Error;

    fn get(&self, key: &str) -> Result<Option<Value>, Self::Error> {
        (**self).get(key)
    }

    fn add(&self, key: &str, value: Value, ttl: u64) -> Result<(), Self::Error> {
        (**self).add(key, value, ttl)
    }

    fn forever(&self, key: &str, value: Value) -> Result<(), Self::Error> {
        (**self).forever(key, value)
    }

    fn destroy(&self, key: &str) -> Result<bool, Self::Error> {
        (**self).destroy(key)
    }

    fn flush(&self) -> Result<(), Self::Error> {
        (**self).flush()
    }

    fn add_if_absent(
        &self,
        key: &str,
        value: Value,
        ttl: Option<u64>,
    ) -> Result<bool, Self::Error> {
        (**self).add_if_absent(key, value, ttl)
    }
}

/// Revocation state of a single token, as decoded from its stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationEntry {
    /// Revoked with no end; stored as the string `"forever"`
    Forever,
    /// Revoked once the grace window closes at the given Unix timestamp;
    /// stored as `{"valid_until": <timestamp>}`
    GraceUntil(i64),
}

impl RevocationEntry {
    /// Decode a stored record. Blank or unrecognized records yield [`None`].
    #[must_use]
    pub fn from_record(record: &Value) -> Option<Self> {
        match record {
            Value::String(marker) if marker == FOREVER => Some(Self::Forever),
            Value::Object(entry) => entry
                .get(VALID_UNTIL)
                .and_then(Value::as_i64)
                .map(Self::GraceUntil),
            _ => None,
        }
    }

    /// Encode for storage
    #[must_use]
    pub fn to_record(self) -> Value {
        match self {
            Self::Forever => Value::String(FOREVER.to_owned()),
            Self::GraceUntil(valid_until) => json!({ VALID_UNTIL: valid_until }),
        }
    }

    /// Whether the token counts as revoked at `now`. A grace window ending
    /// exactly at `now` has elapsed.
    #[must_use]
    pub const fn is_active(self, now: i64) -> bool {
        match self {
            Self::Forever => true,
            Self::GraceUntil(valid_until) => now >= valid_until,
        }
    }
}
