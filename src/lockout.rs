//! Account lockout policy and lock-state evaluation.
//!
//! Lockout state lives entirely on the account record (attempt counter plus
//! lock expiry); there is no scheduler. Expiry is lazy: [`LockState::of`] is
//! a pure function of the record and `now`, so a lock that has run out reads
//! as open at the next attempt without anything having cleared it.
//!
//! The bookkeeping itself goes through the credential store's atomic
//! [`record_failed_login`](crate::store::CredentialStore::record_failed_login)
//! operation, because two concurrent failures for the same account must not
//! both read `counter = threshold - 1` and miss the lock.

use serde::Serialize;
use std::time::{Duration, SystemTime};

/// Default maximum failed attempts before lockout.
const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default lockout duration (10 minutes).
const DEFAULT_LOCK_DURATION: Duration = Duration::from_secs(10 * 60);

/// Lockout policy configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockoutPolicy {
    /// Failed attempts at which the account locks.
    pub max_attempts: u32,
    /// How long the account stays locked.
    pub lock_duration: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            lock_duration: DEFAULT_LOCK_DURATION,
        }
    }
}

impl LockoutPolicy {
    /// Create a new policy with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum failed attempts before lockout.
    #[must_use]
    pub fn max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max;
        self
    }

    /// Set the lockout duration.
    #[must_use]
    pub fn lock_duration(mut self, duration: Duration) -> Self {
        self.lock_duration = duration;
        self
    }
}

/// Lockout state of an account at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockState {
    /// Attempts below threshold, no active lock.
    Open {
        /// Effective failed-attempt count. Zero when a previous lock has
        /// expired, regardless of the stored counter.
        attempts: u32,
    },
    /// Lock expiry is in the future.
    Locked { until: SystemTime },
}

impl LockState {
    /// Evaluate the state from the stored counter and lock expiry.
    ///
    /// A lock expiry in the past means the account is open and the counter
    /// is conceptually reset; the stored fields get cleared by whichever
    /// attempt is processed next.
    #[must_use]
    pub fn of(attempts: u32, lock_expires_at: Option<SystemTime>, now: SystemTime) -> Self {
        match lock_expires_at {
            Some(until) if until > now => Self::Locked { until },
            Some(_) => Self::Open { attempts: 0 },
            None => Self::Open { attempts },
        }
    }

    /// Remaining lock time at `now`; zero when open or already expired.
    #[must_use]
    pub fn remaining(&self, now: SystemTime) -> Duration {
        match self {
            Self::Locked { until } => until.duration_since(now).unwrap_or_default(),
            Self::Open { .. } => Duration::ZERO,
        }
    }
}

/// Disclosed lockout status: safe metadata for a rejected attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct LockoutStatus {
    pub locked: bool,
    pub remaining_seconds: u64,
}

impl LockoutStatus {
    /// Build the disclosed view of a state at `now`.
    #[must_use]
    pub fn of(state: &LockState, now: SystemTime) -> Self {
        Self {
            locked: matches!(state, LockState::Locked { .. }),
            remaining_seconds: state.remaining(now).as_secs(),
        }
    }
}
