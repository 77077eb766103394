//! Wall-clock time source shared by validation, the blacklist, and storage
use std::{
    sync::{
        Arc,
        atomic::{
            AtomicI64,
            Ordering,
        },
    },
    time::{
        SystemTime,
        UNIX_EPOCH,
    },
};

/// Source of the current Unix timestamp, in seconds.
///
/// Claim validation and blacklist bookkeeping must agree on "now", so a single
/// [`Clock`] should be handed to the [`PayloadValidator`], the [`Blacklist`],
/// and any [`Storage`] that expires entries itself.
///
/// [`PayloadValidator`]: crate::validation::PayloadValidator
/// [`Blacklist`]: crate::blacklist::Blacklist
/// [`Storage`]: crate::blacklist::Storage
pub trait Clock {
    /// Return the current Unix timestamp in seconds
    fn now(&self) -> i64;
}

/// [`Clock`] backed by [`SystemTime`]
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        // SAFETY: system time should never be before the unix epoch, and at second-precision,
        // we've got a couple hundred billion years to go before we wraparound an i64
        #[allow(clippy::expect_used)]
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("'tis sadly no longer the summer of '69")
            .as_secs()
            .cast_signed()
    }
}

/// Manually driven [`Clock`], for tests and simulations.
#[derive(Debug, Default)]
pub struct FixedClock {
    now: AtomicI64,
}

impl FixedClock {
    /// Instantiate a [`FixedClock`] frozen at `now`
    #[must_use]
    pub const fn new(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    /// Move the clock to `now`
    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Move the clock forward by `seconds`
    pub fn advance(&self, seconds: i64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> i64 {
        (**self).now()
    }
}

pub(crate) type SharedClock = Arc<dyn Clock + Send + Sync>;

pub(crate) fn system_clock() -> SharedClock {
    Arc::new(SystemClock)
}
